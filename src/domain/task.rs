use serde::{Deserialize, Serialize};

/// Store-assigned identifier. `0` means the task has not been persisted yet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub i64);

impl TaskId {
    pub const UNSET: TaskId = TaskId(0);

    pub fn is_unset(self) -> bool { self.0 == 0 }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// A task that has not been stored yet; the store picks its id.
    pub fn new(title: impl Into<String>, description: Option<String>, is_completed: bool) -> Self {
        Self { id: TaskId::UNSET, title: title.into(), description, is_completed }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_unpersisted_and_pending_by_default() {
        let task = Task::new("Buy milk", None, false);
        assert!(task.id.is_unset());
        assert!(!task.is_completed);
    }

    #[test]
    fn equality_covers_every_field() {
        let a = Task::new("A", None, false).with_id(TaskId(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, Task { is_completed: true, ..a.clone() });
        assert_ne!(a, Task { description: Some("d".into()), ..a.clone() });
        assert_ne!(a, a.clone().with_id(TaskId(2)));
    }
}

use crate::domain::task::{Task, TaskId};

/// Raw add/edit form input, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("title required")]
    BlankTitle,
}

/// Form input that passed validation. Only `TaskForm::validate` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTaskForm {
    title: String,
    description: Option<String>,
    is_completed: bool,
}

impl TaskForm {
    pub fn validate(self) -> Result<ValidTaskForm, FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::BlankTitle);
        }
        let description = if self.description.trim().is_empty() { None } else { Some(self.description) };
        Ok(ValidTaskForm { title: self.title, description, is_completed: self.is_completed })
    }
}

impl ValidTaskForm {
    pub fn title(&self) -> &str { &self.title }

    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    pub fn is_completed(&self) -> bool { self.is_completed }

    pub fn into_new_task(self) -> Task { Task::new(self.title, self.description, self.is_completed) }

    /// Form fields over `existing`, keeping its id.
    pub fn merge_into(self, existing: Task) -> Task {
        Task { id: existing.id, title: self.title, description: self.description, is_completed: self.is_completed }
    }
}

/// What `save_task` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(TaskId),
    Updated(TaskId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, description: &str) -> TaskForm {
        TaskForm { title: title.into(), description: description.into(), is_completed: false }
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(form("", "x").validate(), Err(FormError::BlankTitle));
        assert_eq!(form("   \t", "x").validate(), Err(FormError::BlankTitle));
    }

    #[test]
    fn blank_description_becomes_absent() {
        let valid = form("Buy milk", "  ").validate().unwrap();
        assert_eq!(valid.description(), None);
        let valid = form("Buy milk", "2 litres").validate().unwrap();
        assert_eq!(valid.description(), Some("2 litres"));
    }

    #[test]
    fn merge_keeps_the_existing_id() {
        let existing = Task::new("Old", Some("d".into()), false).with_id(TaskId(4));
        let merged = TaskForm { title: "New".into(), description: String::new(), is_completed: true }
            .validate()
            .unwrap()
            .merge_into(existing);
        assert_eq!(merged, Task { id: TaskId(4), title: "New".into(), description: None, is_completed: true });
    }
}

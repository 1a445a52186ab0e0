use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::task::Task;

/// Which tasks the list shows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterState {
    #[default]
    All,
    Pending,
    Completed,
}

impl FilterState {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterState::All => true,
            FilterState::Pending => !task.is_completed,
            FilterState::Completed => task.is_completed,
        }
    }

    /// Keeps the input order.
    pub fn apply(self, tasks: &[Task]) -> Vec<Task> {
        match self {
            FilterState::All => tasks.to_vec(),
            _ => tasks.iter().filter(|t| self.matches(t)).cloned().collect(),
        }
    }

    /// What a list shows when nothing passes the filter.
    pub fn empty_message(self) -> &'static str {
        match self {
            FilterState::All => "No tasks yet",
            FilterState::Pending => "No pending tasks",
            FilterState::Completed => "No completed tasks",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterState::All => "all",
            FilterState::Pending => "pending",
            FilterState::Completed => "completed",
        }
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter `{0}` (expected all, pending or completed)")]
pub struct UnknownFilter(pub String);

impl FromStr for FilterState {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterState::All),
            "pending" => Ok(FilterState::Pending),
            "completed" => Ok(FilterState::Completed),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskId;

    fn sample() -> Vec<Task> {
        vec![
            Task::new("one", None, true).with_id(TaskId(1)),
            Task::new("two", None, false).with_id(TaskId(2)),
            Task::new("three", None, true).with_id(TaskId(3)),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<i64> { tasks.iter().map(|t| t.id.0).collect() }

    #[test]
    fn apply_partitions_by_completion() {
        let tasks = sample();
        assert_eq!(ids(&FilterState::All.apply(&tasks)), vec![1, 2, 3]);
        assert_eq!(ids(&FilterState::Completed.apply(&tasks)), vec![1, 3]);
        assert_eq!(ids(&FilterState::Pending.apply(&tasks)), vec![2]);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Completed".parse::<FilterState>().unwrap(), FilterState::Completed);
        assert_eq!(" pending ".parse::<FilterState>().unwrap(), FilterState::Pending);
        assert_eq!("ALL".parse::<FilterState>().unwrap(), FilterState::All);
        assert!("done".parse::<FilterState>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for state in [FilterState::All, FilterState::Pending, FilterState::Completed] {
            assert_eq!(state.to_string().parse::<FilterState>().unwrap(), state);
        }
    }

    #[test]
    fn default_is_all() {
        assert_eq!(FilterState::default(), FilterState::All);
    }
}

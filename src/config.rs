use std::time::Duration;

use crate::{
    application::task_view_model::{DEFAULT_GRACE, SharingPolicy},
    domain::filter::{FilterState, UnknownFilter},
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TASKS_SHARING: unknown policy `{0}` (expected eager or while-subscribed)")]
    UnknownSharing(String),
    #[error("TASKS_GRACE_MS: `{0}` is not a whole number of milliseconds")]
    InvalidGrace(String),
    #[error("TASKS_FILTER: {0}")]
    Filter(#[from] UnknownFilter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub sharing: SharingPolicy,
    pub filter: FilterState,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let grace = match lookup("TASKS_GRACE_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| ConfigError::InvalidGrace(raw))?),
            None => DEFAULT_GRACE,
        };
        let sharing = match lookup("TASKS_SHARING").as_deref().map(str::trim) {
            None | Some("while-subscribed") => SharingPolicy::WhileSubscribed { grace },
            Some("eager") => SharingPolicy::Eager,
            Some(other) => return Err(ConfigError::UnknownSharing(other.to_string())),
        };
        let filter = match lookup("TASKS_FILTER") {
            Some(raw) => raw.parse()?,
            None => FilterState::default(),
        };

        Ok(Self { database_url, sharing, filter })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.sharing, SharingPolicy::WhileSubscribed { grace: Duration::from_secs(5) });
        assert_eq!(cfg.filter, FilterState::All);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("TASKS_SHARING", "while-subscribed"),
            ("TASKS_GRACE_MS", "250"),
            ("TASKS_FILTER", "Completed"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.sharing, SharingPolicy::WhileSubscribed { grace: Duration::from_millis(250) });
        assert_eq!(cfg.filter, FilterState::Completed);
    }

    #[test]
    fn eager_ignores_grace() {
        let cfg = config(&[("TASKS_SHARING", "eager"), ("TASKS_GRACE_MS", "10")]).unwrap();
        assert_eq!(cfg.sharing, SharingPolicy::Eager);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(config(&[("TASKS_SHARING", "lazy")]), Err(ConfigError::UnknownSharing(_))));
        assert!(matches!(config(&[("TASKS_GRACE_MS", "soon")]), Err(ConfigError::InvalidGrace(_))));
        assert!(matches!(config(&[("TASKS_FILTER", "done")]), Err(ConfigError::Filter(_))));
    }
}

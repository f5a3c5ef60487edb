//! Logger configuration read from the environment.

use crate::level::LogLevel;

const ENV_LOG_LEVEL: &str = "CHRONICLE_LOG_LEVEL";
const ENV_LOG_JSON: &str = "CHRONICLE_LOG_JSON";
const ENV_APP_ID: &str = "CHRONICLE_APP_ID";

/// Settings applied to every logger a registry hands out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Emit JSON records instead of text.
    pub json: bool,
    /// Minimum level written.
    pub level: LogLevel,
    /// Value of the `app_id` field.
    pub app_id: Option<String>,
}

impl LoggerOptions {
    /// Reads `CHRONICLE_LOG_LEVEL`, `CHRONICLE_LOG_JSON` and
    /// `CHRONICLE_APP_ID`, falling back to defaults for unset values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoggerOptions::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let level = match lookup(ENV_LOG_LEVEL).map(|raw| LogLevel::parse(&raw)) {
            Some(LogLevel::Undefined) | None => defaults.level,
            Some(level) => level,
        };
        let json = lookup(ENV_LOG_JSON).map_or(defaults.json, |raw| {
            matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
        });
        let app_id = lookup(ENV_APP_ID).filter(|id| !id.is_empty());

        Self {
            json,
            level,
            app_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn options_from(vars: &[(&str, &str)]) -> LoggerOptions {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        LoggerOptions::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        assert_eq!(options_from(&[]), LoggerOptions::default());
    }

    #[test]
    fn test_reads_all_variables() {
        let options = options_from(&[
            ("CHRONICLE_LOG_LEVEL", "debug"),
            ("CHRONICLE_LOG_JSON", "true"),
            ("CHRONICLE_APP_ID", "orders"),
        ]);

        assert_eq!(
            options,
            LoggerOptions {
                json: true,
                level: LogLevel::Debug,
                app_id: Some("orders".into()),
            }
        );
    }

    #[test]
    fn test_unknown_level_falls_back_to_default() {
        let options = options_from(&[("CHRONICLE_LOG_LEVEL", "chatty")]);

        assert_eq!(options.level, LogLevel::Info);
    }

    #[test]
    fn test_json_flag_accepts_common_spellings() {
        assert!(options_from(&[("CHRONICLE_LOG_JSON", "1")]).json);
        assert!(options_from(&[("CHRONICLE_LOG_JSON", "YES")]).json);
        assert!(!options_from(&[("CHRONICLE_LOG_JSON", "off")]).json);
    }
}

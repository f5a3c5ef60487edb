//! Named logger registry.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::logger::Logger;
use crate::options::LoggerOptions;

/// Hands out one shared [`Logger`] per name.
///
/// Construct one at process start and pass it to whatever needs loggers.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    options: RwLock<LoggerOptions>,
    loggers: RwLock<HashMap<String, Logger>>,
}

impl LoggerRegistry {
    /// Creates an empty registry whose loggers start with `options`.
    #[must_use]
    pub fn new(options: LoggerOptions) -> Self {
        Self {
            options: RwLock::new(options),
            loggers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the logger named `name`, creating it on first use.
    pub fn logger(&self, name: &str) -> Logger {
        if let Some(logger) = self.read_loggers().get(name) {
            return logger.clone();
        }

        let mut loggers = self.loggers.write().unwrap_or_else(PoisonError::into_inner);
        loggers
            .entry(name.to_owned())
            .or_insert_with(|| {
                let options = self.options.read().unwrap_or_else(PoisonError::into_inner);
                Logger::new(name, &options)
            })
            .clone()
    }

    /// Returns a copy of the registered loggers by name.
    #[must_use]
    pub fn loggers(&self) -> HashMap<String, Logger> {
        self.read_loggers().clone()
    }

    /// Applies `options` to every registered logger and to loggers created
    /// from now on.
    pub fn apply_options(&self, options: &LoggerOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options.clone();

        for logger in self.read_loggers().values() {
            logger.set_output_level(options.level);
            logger.enable_json_output(options.json);
            if let Some(app_id) = &options.app_id {
                logger.set_app_id(app_id.clone());
            }
        }
    }

    fn read_loggers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Logger>> {
        self.loggers.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;

    #[test]
    fn test_repeated_lookup_returns_the_same_logger() {
        let registry = LoggerRegistry::new(LoggerOptions::default());

        let first = registry.logger("events");
        let second = registry.logger("events");
        let other = registry.logger("store");

        assert!(first.shares_output_with(&second));
        assert!(!first.shares_output_with(&other));
        assert_eq!(registry.loggers().len(), 2);
    }

    #[test]
    fn test_new_loggers_start_with_registry_options() {
        let registry = LoggerRegistry::new(LoggerOptions {
            level: LogLevel::Warn,
            ..LoggerOptions::default()
        });

        let logger = registry.logger("events");

        assert!(!logger.is_output_level_enabled(LogLevel::Info));
        assert!(logger.is_output_level_enabled(LogLevel::Warn));
    }

    #[test]
    fn test_apply_options_updates_existing_and_future_loggers() {
        // Arrange
        let registry = LoggerRegistry::new(LoggerOptions::default());
        let existing = registry.logger("events");
        let debug = LoggerOptions {
            level: LogLevel::Debug,
            ..LoggerOptions::default()
        };

        // Act
        registry.apply_options(&debug);

        // Assert
        assert!(existing.is_output_level_enabled(LogLevel::Debug));
        assert!(registry.logger("store").is_output_level_enabled(LogLevel::Debug));
    }

    #[test]
    fn test_concurrent_lookups_create_one_logger_per_name() {
        let registry = std::sync::Arc::new(LoggerRegistry::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || registry.logger("shared"))
            })
            .collect();
        let loggers: Vec<Logger> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(loggers.windows(2).all(|w| w[0].shares_output_with(&w[1])));
        assert_eq!(registry.loggers().len(), 1);
    }
}

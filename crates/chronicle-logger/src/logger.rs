//! The structured logger.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::Dispatch;
use tracing::level_filters::LevelFilter;

use crate::level::LogLevel;
use crate::options::LoggerOptions;
use crate::writer::SharedWriter;

/// Log type of ordinary records.
pub const LOG_TYPE_LOG: &str = "log";
/// Log type of request records.
pub const LOG_TYPE_REQUEST: &str = "request";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output settings shared by a logger and everything derived from it.
struct Output {
    level: LogLevel,
    json: bool,
    app_id: String,
    instance: String,
    writer: SharedWriter,
    dispatch: Dispatch,
}

impl Output {
    fn new(options: &LoggerOptions) -> Self {
        let writer = SharedWriter::stdout();
        let dispatch = build_dispatch(options.json, writer.clone());
        Self {
            level: options.level,
            json: options.json,
            app_id: options.app_id.clone().unwrap_or_default(),
            instance: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_owned()),
            writer,
            dispatch,
        }
    }

    fn rebuild(&mut self) {
        self.dispatch = build_dispatch(self.json, self.writer.clone());
    }
}

/// Builds the formatting subscriber. Level filtering happens in [`Logger`],
/// so the subscriber itself lets everything through.
fn build_dispatch(json: bool, writer: SharedWriter) -> Dispatch {
    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(LevelFilter::TRACE)
        .with_target(false)
        .with_ansi(false);

    if json {
        Dispatch::new(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        Dispatch::new(builder.finish())
    }
}

/// A named structured logger.
///
/// Clones and loggers derived with [`Logger::with_fields`] or
/// [`Logger::with_log_type`] share output settings, so changing the level or
/// destination on one affects all of them.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    log_type: Arc<str>,
    fields: Arc<Map<String, Value>>,
    output: Arc<RwLock<Output>>,
}

impl Logger {
    pub(crate) fn new(name: &str, options: &LoggerOptions) -> Self {
        Self {
            name: Arc::from(name),
            log_type: Arc::from(LOG_TYPE_LOG),
            fields: Arc::new(Map::new()),
            output: Arc::new(RwLock::new(Output::new(options))),
        }
    }

    /// Returns the logger's name, written as the `scope` field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Switches between JSON and text records.
    pub fn enable_json_output(&self, enabled: bool) {
        let mut output = self.output_mut();
        output.json = enabled;
        output.rebuild();
    }

    /// Sets the `app_id` field.
    pub fn set_app_id(&self, id: impl Into<String>) {
        self.output_mut().app_id = id.into();
    }

    /// Sets the minimum level written. [`LogLevel::Undefined`] is ignored.
    pub fn set_output_level(&self, level: LogLevel) {
        if level != LogLevel::Undefined {
            self.output_mut().level = level;
        }
    }

    /// Redirects records to `sink`.
    pub fn set_output<W>(&self, sink: W)
    where
        W: Write + Send + 'static,
    {
        let mut output = self.output_mut();
        output.writer = SharedWriter::new(sink);
        output.rebuild();
    }

    /// Returns `true` if records at `level` are written.
    #[must_use]
    pub fn is_output_level_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Undefined && level >= self.output_ref().level
    }

    /// Returns a logger that writes `log_type` as its log type.
    #[must_use]
    pub fn with_log_type(&self, log_type: &str) -> Self {
        Self {
            log_type: Arc::from(log_type),
            ..self.clone()
        }
    }

    /// Returns a logger that adds `fields` to every record. Later values
    /// replace earlier ones with the same key.
    #[must_use]
    pub fn with_fields<I, K>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut merged = (*self.fields).clone();
        merged.extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        Self {
            fields: Arc::new(merged),
            ..self.clone()
        }
    }

    /// Logs at debug level.
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(LogLevel::Debug, &message);
    }

    /// Logs at info level.
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(LogLevel::Info, &message);
    }

    /// Logs at warn level.
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(LogLevel::Warn, &message);
    }

    /// Logs at error level.
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(LogLevel::Error, &message);
    }

    /// Logs at fatal level, then exits the process with status 1.
    ///
    /// The record is written as a tracing `ERROR` event whose `severity`
    /// field is `"fatal"`; every other record's `severity` matches its level.
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.emit(LogLevel::Fatal, &message);
        std::process::exit(1)
    }

    fn emit(&self, level: LogLevel, message: &dyn fmt::Display) {
        if !self.is_output_level_enabled(level) {
            return;
        }

        let output = self.output_ref();
        let fields = Value::Object((*self.fields).clone()).to_string();
        let scope = &*self.name;
        let log_type = &*self.log_type;
        let instance = output.instance.as_str();
        let app_id = output.app_id.as_str();
        let severity = level.as_str();

        tracing::dispatcher::with_default(&output.dispatch, || match level {
            LogLevel::Debug => tracing::debug!(
                severity, scope, log_type, instance, ver = VERSION, app_id, fields = %fields,
                "{}", message
            ),
            LogLevel::Info => tracing::info!(
                severity, scope, log_type, instance, ver = VERSION, app_id, fields = %fields,
                "{}", message
            ),
            LogLevel::Warn => tracing::warn!(
                severity, scope, log_type, instance, ver = VERSION, app_id, fields = %fields,
                "{}", message
            ),
            // tracing has no level above ERROR; `severity` tells the two apart.
            LogLevel::Error | LogLevel::Fatal => tracing::error!(
                severity, scope, log_type, instance, ver = VERSION, app_id, fields = %fields,
                "{}", message
            ),
            LogLevel::Undefined => {}
        });
    }

    fn output_ref(&self) -> std::sync::RwLockReadGuard<'_, Output> {
        self.output.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn output_mut(&self) -> std::sync::RwLockWriteGuard<'_, Output> {
        self.output.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn shares_output_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.output, &other.output)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = self.output_ref();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("log_type", &self.log_type)
            .field("fields", &self.fields)
            .field("level", &output.level)
            .field("json", &output.json)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// In-memory sink whose contents the test can read back.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_logger(options: &LoggerOptions) -> (Logger, Capture) {
        let logger = Logger::new("orders", options);
        let capture = Capture::default();
        logger.set_output(capture.clone());
        (logger, capture)
    }

    fn json_options() -> LoggerOptions {
        LoggerOptions {
            json: true,
            level: LogLevel::Info,
            app_id: Some("shop".into()),
        }
    }

    #[test]
    fn test_json_record_carries_scope_and_fields() {
        // Arrange
        let (logger, capture) = captured_logger(&json_options());

        // Act
        logger
            .with_fields([("order_id", json!("a1"))])
            .info("order created");

        // Assert
        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let record: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record["message"], "order created");
        assert_eq!(record["scope"], "orders");
        assert_eq!(record["log_type"], LOG_TYPE_LOG);
        assert_eq!(record["app_id"], "shop");
        assert_eq!(record["ver"], VERSION);
        let fields: Value = serde_json::from_str(record["fields"].as_str().unwrap()).unwrap();
        assert_eq!(fields, json!({"order_id": "a1"}));
    }

    #[test]
    fn test_fatal_record_is_distinguishable_from_error() {
        // Arrange
        let (logger, capture) = captured_logger(&json_options());

        // Act
        logger.error("store unavailable");
        logger.emit(LogLevel::Fatal, &"shutting down");

        // Assert
        let records: Vec<Value> = capture
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["level"], "ERROR");
        assert_eq!(records[0]["severity"], "error");
        assert_eq!(records[1]["level"], "ERROR");
        assert_eq!(records[1]["severity"], "fatal");
        assert_eq!(records[1]["message"], "shutting down");
    }

    #[test]
    fn test_records_below_level_are_suppressed() {
        let (logger, capture) = captured_logger(&json_options());

        logger.debug("hidden");
        logger.warn("shown");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("shown"));
    }

    #[test]
    fn test_level_change_applies_to_derived_loggers() {
        let (logger, capture) = captured_logger(&json_options());
        let request_logger = logger.with_log_type(LOG_TYPE_REQUEST);

        logger.set_output_level(LogLevel::Debug);
        request_logger.debug("request received");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let record: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record["log_type"], LOG_TYPE_REQUEST);
        assert!(request_logger.is_output_level_enabled(LogLevel::Debug));
    }

    #[test]
    fn test_undefined_level_is_ignored() {
        let (logger, _capture) = captured_logger(&json_options());

        logger.set_output_level(LogLevel::Undefined);

        assert!(logger.is_output_level_enabled(LogLevel::Info));
        assert!(!logger.is_output_level_enabled(LogLevel::Debug));
        assert!(!logger.is_output_level_enabled(LogLevel::Undefined));
    }

    #[test]
    fn test_text_output_is_not_json() {
        let (logger, capture) = captured_logger(&LoggerOptions::default());

        logger.error("store unavailable");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("store unavailable"));
        assert!(lines[0].contains("scope=\"orders\""));
        assert!(serde_json::from_str::<Value>(&lines[0]).is_err());
    }

    #[test]
    fn test_with_fields_merges_over_existing_fields() {
        let (logger, capture) = captured_logger(&json_options());

        logger
            .with_fields([("order_id", json!("a1")), ("step", json!(1))])
            .with_fields([("step", json!(2))])
            .info("step done");

        let record: Value = serde_json::from_str(&capture.lines()[0]).unwrap();
        let fields: Value = serde_json::from_str(record["fields"].as_str().unwrap()).unwrap();
        assert_eq!(fields, json!({"order_id": "a1", "step": 2}));
    }
}

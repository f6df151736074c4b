//! Structured, leveled logging to a rotating log file.
//!
//! A [`Logger`] is built once from a [`LoggerConfiguration`] and then cloned
//! and derived freely:
//! - every logger derived through the `with*` methods shares the file sink
//!   and the level threshold with its parent, so [`Logger::set_level`]
//!   affects all of them;
//! - the fields a derived logger attaches are its own and never leak into
//!   its parent.
//!
//! In development mode records are rendered as coloured, human-readable
//! lines and mirrored to the console; otherwise they are written to the
//! log file only, one JSON object per line.
//!
//! Records written through `tracing` macros can be routed through the same
//! logger with [`Logger::install_global`] or [`Logger::tracing_layer`].

mod builder;
mod configuration;
mod context;
mod encoder;
mod error;
mod fields;
mod layer;
mod level;
mod path;
mod rotation;
mod sink;

use std::{
    backtrace::Backtrace,
    fmt,
    ops::Deref,
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{Local, SecondsFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use self::{
    builder::LoggerBuilder,
    configuration::LoggerConfiguration,
    context::{RequestContext, REQUEST_ID_KEY},
    encoder::Encoding,
    error::LoggerError,
    fields::{field, Field, Fields},
    layer::LoggerLayer,
    level::{Level, ParseLevelError, SharedLevel},
    path::{ensure_parent_directory, expand_home},
    rotation::{Backup, RotatingFileWriter, RotationPolicy},
};
use self::{
    encoder::{Caller, Record},
    sink::Sink,
};


pub(crate) struct LoggerCore {
    sink: Sink,
    encoding: Encoding,
    /// Log file path after `~` expansion.
    path: PathBuf,
}

/// Leveled, structured logger.
///
/// Cloning is cheap; clones and derived loggers share the sink and level.
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    level: SharedLevel,
    fields: Fields,
}

impl Logger {
    /// Creates a logger, see [`LoggerBuilder::build`].
    pub fn new(configuration: LoggerConfiguration) -> Result<Self, LoggerError> {
        LoggerBuilder::from_config(configuration).build()
    }

    #[must_use]
    pub fn builder(configuration: LoggerConfiguration) -> LoggerBuilder {
        LoggerBuilder::from_config(configuration)
    }

    /// Debug-level, development-mode logger writing to the default path.
    pub fn development() -> Result<Self, LoggerError> {
        Self::new(LoggerConfiguration::development())
    }

    /// Info-level, JSON-only logger writing to `output_path`.
    pub fn production<S: Into<String>>(output_path: S) -> Result<Self, LoggerError> {
        Self::new(LoggerConfiguration::production(output_path))
    }


    #[track_caller]
    pub fn debug<M: AsRef<str>>(&self, message: M) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info<M: AsRef<str>>(&self, message: M) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warn<M: AsRef<str>>(&self, message: M) {
        self.log(Level::Warn, message);
    }

    #[track_caller]
    pub fn error<M: AsRef<str>>(&self, message: M) {
        self.log(Level::Error, message);
    }

    /// Logs at [`Level::Fatal`] and flushes. The process is not terminated;
    /// that decision is left to the caller.
    #[track_caller]
    pub fn fatal<M: AsRef<str>>(&self, message: M) {
        self.log(Level::Fatal, message);
    }

    #[track_caller]
    pub fn log<M: AsRef<str>>(&self, level: Level, message: M) {
        self.log_with(level, message, std::iter::empty::<Field>());
    }

    /// Logs `message` with additional fields for this record only.
    #[track_caller]
    pub fn log_with<M, I>(&self, level: Level, message: M, fields: I)
    where
        M: AsRef<str>,
        I: IntoIterator<Item = Field>,
    {
        if !self.enabled(level) {
            return;
        }

        let extra: Vec<Field> = fields.into_iter().collect();
        self.emit(
            level,
            message.as_ref(),
            &extra,
            Some(Caller::from(Location::caller())),
        );
    }

    #[track_caller]
    pub fn debug_with<M, I>(&self, message: M, fields: I)
    where
        M: AsRef<str>,
        I: IntoIterator<Item = Field>,
    {
        self.log_with(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info_with<M, I>(&self, message: M, fields: I)
    where
        M: AsRef<str>,
        I: IntoIterator<Item = Field>,
    {
        self.log_with(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn_with<M, I>(&self, message: M, fields: I)
    where
        M: AsRef<str>,
        I: IntoIterator<Item = Field>,
    {
        self.log_with(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error_with<M, I>(&self, message: M, fields: I)
    where
        M: AsRef<str>,
        I: IntoIterator<Item = Field>,
    {
        self.log_with(Level::Error, message, fields);
    }

    /// Encodes and writes a record if `level` passes the threshold.
    pub(crate) fn emit(
        &self,
        level: Level,
        message: &str,
        extra: &[Field],
        caller: Option<Caller<'_>>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let record = Record {
            time: Local::now(),
            level,
            message,
            caller,
            context: self.fields.as_slice(),
            extra,
            stacktrace: level
                .captures_stacktrace()
                .then(|| Backtrace::force_capture().to_string()),
        };

        // Same as the sink itself, the caller has nowhere to handle a failed write.
        if let Err(error) = self.core.sink.write(&self.core.encoding.encode(&record)) {
            eprintln!(
                "{} logger write error: {error}",
                record.time.to_rfc3339_opts(SecondsFormat::Millis, false)
            );
        }

        if level == Level::Fatal {
            if let Err(error) = self.sync() {
                eprintln!("logger sync error: {error}");
            }
        }
    }


    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level.get()
    }

    /// Changes the threshold of this logger and every logger sharing its sink.
    /// On error the previous threshold stays in place.
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        let level = level.parse::<Level>()?;
        self.level.set(level);

        Ok(())
    }


    /// Returns a logger that attaches `fields` to every record, in addition
    /// to the fields this logger already attaches.
    #[must_use = "`with` returns a new logger and leaves this one unchanged"]
    pub fn with<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        Logger {
            core: Arc::clone(&self.core),
            level: self.level.clone(),
            fields: self.fields.extended(fields),
        }
    }

    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Logger
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.with([Field::new(key, value)])
    }

    #[must_use]
    pub fn with_user<S: Into<String>>(&self, user_id: S) -> Logger {
        self.with_field("user_id", user_id.into())
    }

    #[must_use]
    pub fn with_request<I, M, P>(&self, request_id: I, method: M, path: P) -> Logger
    where
        I: Into<String>,
        M: Into<String>,
        P: Into<String>,
    {
        self.with([
            Field::new("request_id", request_id.into()),
            Field::new("method", method.into()),
            Field::new("path", path.into()),
        ])
    }

    #[must_use]
    pub fn with_component<S: Into<String>>(&self, component: S) -> Logger {
        self.with_field("component", component.into())
    }

    #[must_use]
    pub fn with_error<E>(&self, error: &E) -> Logger
    where
        E: std::error::Error + ?Sized,
    {
        self.with_field("error", error.to_string())
    }

    /// Attaches the context's deadline and request id, whichever are present.
    #[must_use]
    pub fn with_context(&self, context: &RequestContext) -> Logger {
        let mut fields = Vec::with_capacity(2);

        if let Some(deadline) = context.deadline() {
            fields.push(Field::new(
                "deadline",
                deadline.to_rfc3339_opts(SecondsFormat::Millis, true),
            ));
        }

        if let Some(request_id) = context.request_id() {
            fields.push(Field::new(REQUEST_ID_KEY, request_id));
        }

        self.with(fields)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }


    /// Flushes buffered output.
    pub fn sync(&self) -> Result<(), LoggerError> {
        self.core.sink.sync().map_err(LoggerError::FlushFailed)
    }

    /// Returns a guard that flushes this logger when dropped, including
    /// when unwinding from a panic.
    pub fn sync_on_drop(&self) -> SyncGuard {
        SyncGuard {
            logger: self.clone(),
        }
    }

    /// Path of the active log file, after `~` expansion.
    pub fn log_path(&self) -> &Path {
        &self.core.path
    }

    pub fn encoding(&self) -> Encoding {
        self.core.encoding
    }

    /// Whether records are mirrored to the console.
    pub fn mirrors_to_console(&self) -> bool {
        self.core.sink.mirrors_to_console()
    }

    /// Rotated log files, newest first.
    pub fn backups(&self) -> std::io::Result<Vec<Backup>> {
        self.core.sink.file().backups()
    }


    /// A `tracing` layer routing events through this logger, fields included.
    pub fn tracing_layer(&self) -> LoggerLayer {
        LoggerLayer::new(self.clone())
    }

    /// Installs [`Logger::tracing_layer`] as the global `tracing` subscriber.
    pub fn install_global(&self) -> Result<(), LoggerError> {
        tracing_subscriber::registry()
            .with(self.tracing_layer())
            .try_init()?;

        Ok(())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.core.path)
            .field("encoding", &self.core.encoding)
            .field("level", &self.level.get())
            .field("fields", &self.fields)
            .finish()
    }
}


/// Flushes the logger it was created from when dropped.
#[must_use = "the logger is flushed when the guard is dropped"]
#[derive(Debug)]
pub struct SyncGuard {
    logger: Logger,
}

impl Deref for SyncGuard {
    type Target = Logger;

    fn deref(&self) -> &Self::Target {
        &self.logger
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        if let Err(error) = self.logger.sync() {
            eprintln!("Failed to flush logger: {error}");
        }
    }
}

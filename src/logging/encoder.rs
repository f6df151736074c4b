//! Rendering of log records into bytes.
//!
//! Two encodings exist: a human-readable, ANSI-coloured line format for
//! development and a JSON-per-line format for production.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use colored::{Color, Colorize};
use serde_json::{Map, Value};

use super::{fields::Field, level::Level};


const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const SEPARATOR: &str = " ";

/// Keys every record owns. Attached fields with these names are written
/// under [`RESERVED_KEY_PREFIX`] instead.
const RESERVED_KEYS: [&str; 5] = ["level", "time", "caller", "msg", "stacktrace"];

const RESERVED_KEY_PREFIX: &str = "fields.";


/// Source location a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Caller<'a> {
    pub(crate) file: &'a str,
    pub(crate) line: u32,
}

impl<'a> Caller<'a> {
    /// Formats the caller as `directory/file.rs:line`, dropping
    /// every path component but the last directory.
    pub(crate) fn short(&self) -> String {
        let trimmed = match self.file.rfind(['/', '\\']) {
            Some(last) => match self.file[..last].rfind(['/', '\\']) {
                Some(second_to_last) => &self.file[second_to_last + 1..],
                None => self.file,
            },
            None => self.file,
        };

        format!("{}:{}", trimmed.replace('\\', "/"), self.line)
    }
}

impl From<&'static std::panic::Location<'static>> for Caller<'static> {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}


/// Everything known about a single log event.
#[derive(Debug)]
pub(crate) struct Record<'a> {
    pub(crate) time: DateTime<Local>,
    pub(crate) level: Level,
    pub(crate) message: &'a str,
    pub(crate) caller: Option<Caller<'a>>,
    /// Fields attached to the logger emitting the record.
    pub(crate) context: &'a [Field],
    /// Fields passed along with this particular record.
    pub(crate) extra: &'a [Field],
    pub(crate) stacktrace: Option<String>,
}

impl<'a> Record<'a> {
    fn fields(&self) -> impl Iterator<Item = &'a Field> {
        self.context.iter().chain(self.extra.iter())
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `time LEVEL caller message {"key":"value"}` with a coloured level.
    Console,
    /// One JSON object per line.
    Json,
}

impl Encoding {
    pub(crate) fn encode(self, record: &Record<'_>) -> Vec<u8> {
        let mut line = match self {
            Encoding::Console => encode_console(record),
            Encoding::Json => encode_json(record),
        };

        line.push('\n');
        line.into_bytes()
    }
}


fn level_color(level: Level) -> Color {
    match level {
        Level::Debug => Color::Magenta,
        Level::Info => Color::Blue,
        Level::Warn => Color::Yellow,
        Level::Error | Level::Fatal => Color::Red,
    }
}

fn encode_console(record: &Record<'_>) -> String {
    let mut line = String::with_capacity(128);

    let _ = write!(line, "{}", record.time.format(TIME_FORMAT));
    line.push_str(SEPARATOR);
    let _ = write!(
        line,
        "{}",
        record.level.as_upper_str().color(level_color(record.level))
    );

    if let Some(caller) = record.caller {
        line.push_str(SEPARATOR);
        line.push_str(&caller.short());
    }

    line.push_str(SEPARATOR);
    line.push_str(record.message);

    let fields = fields_object(record.fields());
    if !fields.is_empty() {
        line.push_str(SEPARATOR);
        line.push_str(&Value::Object(fields).to_string());
    }

    if let Some(stacktrace) = record.stacktrace.as_deref() {
        line.push('\n');
        line.push_str(stacktrace.trim_end());
    }

    line
}

fn encode_json(record: &Record<'_>) -> String {
    let mut object = Map::new();

    object.insert("level".into(), record.level.as_upper_str().into());
    object.insert(
        "time".into(),
        record.time.format(TIME_FORMAT).to_string().into(),
    );
    if let Some(caller) = record.caller {
        object.insert("caller".into(), caller.short().into());
    }
    object.insert("msg".into(), record.message.into());
    if let Some(stacktrace) = record.stacktrace.as_deref() {
        object.insert("stacktrace".into(), stacktrace.into());
    }

    object.extend(fields_object(record.fields()));

    Value::Object(object).to_string()
}

fn fields_object<'a, I>(fields: I) -> Map<String, Value>
where
    I: Iterator<Item = &'a Field>,
{
    fields
        .map(|field| (field_key(field.key()), field.value().clone()))
        .collect()
}

fn field_key(key: &str) -> String {
    if RESERVED_KEYS.contains(&key) {
        format!("{RESERVED_KEY_PREFIX}{key}")
    } else {
        key.to_string()
    }
}

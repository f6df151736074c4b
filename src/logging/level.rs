//! Log levels and the shared, atomically mutable level threshold.

use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use thiserror::Error;


/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Canonical lower-case name (`"debug"`, `"info"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Upper-case name as it appears in emitted records.
    pub const fn as_upper_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Matches only the canonical names, ignoring letter case.
    /// Aliases such as `warning` are not accepted here.
    pub fn from_canonical_name(name: &str) -> Option<Level> {
        let name = name.to_ascii_lowercase();

        Level::ALL
            .into_iter()
            .find(|level| level.as_str() == name)
    }

    /// Whether records at this level carry a captured stack trace.
    pub fn captures_stacktrace(self) -> bool {
        self >= Level::Error
    }

    const fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            _ => Level::Fatal,
        }
    }

    /// Maps a `tracing` level onto ours. `TRACE` has no counterpart and is dropped.
    pub(crate) fn from_tracing(level: &tracing::Level) -> Option<Level> {
        match *level {
            tracing::Level::TRACE => None,
            tracing::Level::DEBUG => Some(Level::Debug),
            tracing::Level::INFO => Some(Level::Info),
            tracing::Level::WARN => Some(Level::Warn),
            tracing::Level::ERROR => Some(Level::Error),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name in any letter case, additionally accepting
    /// the aliases `warning` (for `warn`) and `err` (for `error`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(level) = Level::from_canonical_name(value) {
            return Ok(level);
        }

        match value.to_ascii_lowercase().as_str() {
            "warning" => Ok(Level::Warn),
            "err" => Ok(Level::Error),
            _ => Err(ParseLevelError(value.to_string())),
        }
    }
}


/// Level threshold shared by a logger and every logger derived from it.
///
/// Cloning shares the cell: a change made through any clone is observed by all of them.
#[derive(Debug, Clone)]
pub struct SharedLevel(Arc<AtomicU8>);

impl SharedLevel {
    pub fn new(level: Level) -> Self {
        Self(Arc::new(AtomicU8::new(level as u8)))
    }

    #[inline]
    pub fn get(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    /// Returns `true` if a record at `level` passes the current threshold.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.get()
    }
}

impl Default for SharedLevel {
    fn default() -> Self {
        Self::new(Level::default())
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("debug", Level::Debug)]
    #[case("INFO", Level::Info)]
    #[case("Warn", Level::Warn)]
    #[case("warning", Level::Warn)]
    #[case("WARNING", Level::Warn)]
    #[case("err", Level::Error)]
    #[case("error", Level::Error)]
    #[case("FaTaL", Level::Fatal)]
    fn parses_names_and_aliases(#[case] input: &str, #[case] expected: Level) {
        assert_eq!(input.parse::<Level>(), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("trace")]
    #[case("verbose")]
    #[case("panic")]
    fn rejects_unknown_names(#[case] input: &str) {
        assert_eq!(
            input.parse::<Level>(),
            Err(ParseLevelError(input.to_string()))
        );
    }

    #[test]
    fn canonical_names_do_not_accept_aliases() {
        assert_eq!(Level::from_canonical_name("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::from_canonical_name("warning"), None);
        assert_eq!(Level::from_canonical_name("err"), None);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);

        assert!(!Level::Warn.captures_stacktrace());
        assert!(Level::Error.captures_stacktrace());
        assert!(Level::Fatal.captures_stacktrace());
    }

    #[test]
    fn shared_level_is_visible_through_clones() {
        let level = SharedLevel::new(Level::Info);
        let clone = level.clone();

        assert!(!clone.enabled(Level::Debug));

        level.set(Level::Debug);
        assert_eq!(clone.get(), Level::Debug);
        assert!(clone.enabled(Level::Debug));

        clone.set(Level::Error);
        assert_eq!(level.get(), Level::Error);
        assert!(!level.enabled(Level::Warn));
        assert!(level.enabled(Level::Fatal));
    }
}

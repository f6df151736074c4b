//! Logger construction.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use super::{
    encoder::Encoding,
    fields::Fields,
    level::SharedLevel,
    path::{ensure_parent_directory, expand_home},
    rotation::RotatingFileWriter,
    sink::{ConsoleWriter, Sink},
    Logger,
    LoggerConfiguration,
    LoggerCore,
    LoggerError,
};


/// Builds a [`Logger`] from a [`LoggerConfiguration`].
///
/// The home directory used to expand `~/` and the console destination used
/// in development mode default to the current user's home directory and
/// standard output, and can both be overridden.
pub struct LoggerBuilder {
    configuration: LoggerConfiguration,
    home_directory: Option<PathBuf>,
    console: Option<ConsoleWriter>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn from_config(configuration: LoggerConfiguration) -> Self {
        Self {
            configuration,
            home_directory: None,
            console: None,
        }
    }

    /// Expand `~/` against `home_directory` instead of the current user's home.
    #[must_use]
    pub fn home_directory<P: Into<PathBuf>>(mut self, home_directory: P) -> Self {
        self.home_directory = Some(home_directory.into());
        self
    }

    /// Mirror development output to `console` instead of standard output.
    /// Ignored outside development mode.
    #[must_use]
    pub fn console_writer<W>(mut self, console: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.console = Some(Box::new(console));
        self
    }

    /// Validate the configuration, prepare the log file and build the logger.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the configuration is invalid
    /// - the path starts with `~/` and no home directory is known
    /// - the log directory cannot be created
    /// - the log file cannot be opened
    pub fn build(self) -> Result<Logger, LoggerError> {
        self.configuration.validate()?;
        let initial_level = self.configuration.parsed_level()?;

        let home_directory = self.home_directory.or_else(dirs::home_dir);
        let log_path = expand_home(&self.configuration.output_path, home_directory.as_deref())?;

        ensure_parent_directory(&log_path)?;

        let file = RotatingFileWriter::open(&log_path, self.configuration.rotation_policy())
            .map_err(|source| LoggerError::OpenFailed {
                path: log_path.clone(),
                source,
            })?;


        let (encoding, console) = if self.configuration.development {
            let console = self
                .console
                .unwrap_or_else(|| Box::new(io::stdout()) as ConsoleWriter);

            (Encoding::Console, Some(console))
        } else {
            (Encoding::Json, None)
        };


        Ok(Logger {
            core: Arc::new(LoggerCore {
                sink: Sink::new(file, console),
                encoding,
                path: log_path,
            }),
            level: SharedLevel::new(initial_level),
            fields: Fields::default(),
        })
    }
}

impl std::fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("configuration", &self.configuration)
            .field("home_directory", &self.home_directory)
            .field("console", &self.console.is_some())
            .finish()
    }
}

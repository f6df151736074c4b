//! Output destinations of a logger: the rotating file, optionally mirrored
//! to a console writer.

use std::io::{self, Write};

use parking_lot::Mutex;

use super::rotation::RotatingFileWriter;


pub(crate) type ConsoleWriter = Box<dyn Write + Send>;

pub(crate) struct Sink {
    file: RotatingFileWriter,
    console: Option<Mutex<ConsoleWriter>>,
}

impl Sink {
    pub(crate) fn new(file: RotatingFileWriter, console: Option<ConsoleWriter>) -> Self {
        Self {
            file,
            console: console.map(Mutex::new),
        }
    }

    pub(crate) fn file(&self) -> &RotatingFileWriter {
        &self.file
    }

    pub(crate) fn mirrors_to_console(&self) -> bool {
        self.console.is_some()
    }

    /// Writes `record` to every destination. All destinations are attempted
    /// even if one fails; the first error is returned.
    pub(crate) fn write(&self, record: &[u8]) -> io::Result<()> {
        let console_result = match &self.console {
            Some(console) => console.lock().write_all(record),
            None => Ok(()),
        };
        let file_result = self.file.write_record(record);

        console_result.and(file_result)
    }

    /// Flushes every destination, treating errors that flushing
    /// a console-like descriptor produces harmlessly as success.
    pub(crate) fn sync(&self) -> io::Result<()> {
        let console_result = match &self.console {
            Some(console) => ignore_benign(console.lock().flush()),
            None => Ok(()),
        };
        let file_result = ignore_benign(self.file.flush());

        console_result.and(file_result)
    }
}


/// Errors a flush of a terminal, pipe or closed standard stream reports
/// without any output having been lost.
pub(crate) fn is_benign_flush_error(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::Unsupported || is_benign_descriptor_error(error)
}

#[cfg(unix)]
fn is_benign_descriptor_error(error: &io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(libc::EBADF | libc::EINVAL | libc::ENOTTY)
    )
}

#[cfg(not(unix))]
fn is_benign_descriptor_error(_error: &io::Error) -> bool {
    false
}

fn ignore_benign(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if is_benign_flush_error(&error) => Ok(()),
        other => other,
    }
}

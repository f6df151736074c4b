//! Size-based rotating log file writer.
//!
//! The active file is rotated as soon as the next write would push it past
//! the configured maximum size. A rotated file is renamed to
//! `<stem>-<timestamp>.<extension>` (timestamp in UTC, millisecond precision),
//! then gzip-compressed. Afterwards the backups are pruned: only the newest
//! `max_backups` are retained and backups older than `max_age` are removed.
//!
//! Pruning and compression run after the active file lock is released, so
//! other writers only wait for the rename. Cleanup failures are reported on
//! stderr; emitting them as log records could re-enter this writer.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use flate2::{write::GzEncoder, Compression};
use parking_lot::Mutex;


const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const COMPRESSED_SUFFIX: &str = ".gz";

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

const MAX_AGE_DAYS_LIMIT: u64 = 1_000_000;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes the active file may not exceed.
    pub max_size_bytes: u64,

    /// Number of rotated files to retain. `0` retains none.
    pub max_backups: u64,

    /// Rotated files older than this are removed.
    pub max_age: Duration,
}

impl RotationPolicy {
    pub fn new(max_size_mb: u64, max_backups: u64, max_age_days: u64) -> Self {
        Self {
            max_size_bytes: max_size_mb.saturating_mul(BYTES_PER_MEGABYTE),
            max_backups,
            max_age: Duration::days(max_age_days.min(MAX_AGE_DAYS_LIMIT) as i64),
        }
    }
}


/// A rotated log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub rotated_at: DateTime<Utc>,
    pub compressed: bool,
}


struct ActiveFile {
    writer: BufWriter<File>,
    size: u64,
}

/// A log file writer that rotates by size. Safe to share between threads.
pub struct RotatingFileWriter {
    path: PathBuf,
    policy: RotationPolicy,
    active: Mutex<Option<ActiveFile>>,
    /// Serializes pruning and compression between rotating threads.
    cleanup: Mutex<()>,
}

impl RotatingFileWriter {
    /// Opens (or creates) the file at `path` for appending.
    /// The parent directory must already exist.
    pub fn open<P: Into<PathBuf>>(path: P, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        let active = open_active_file(&path)?;

        Ok(Self {
            path,
            policy,
            active: Mutex::new(Some(active)),
            cleanup: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Writes one complete record, rotating first if it would not fit.
    ///
    /// A record larger than the maximum file size is rejected.
    pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let record_length = record.len() as u64;
        if record_length > self.policy.max_size_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    record_length, self.policy.max_size_bytes
                ),
            ));
        }

        let rotated = {
            let mut active = self.active.lock();

            let needs_rotation = match active.as_ref() {
                Some(file) => {
                    file.size > 0 && file.size + record_length > self.policy.max_size_bytes
                }
                None => false,
            };

            if needs_rotation {
                self.rotate_locked(&mut active)?;
            }

            let file = match active.take() {
                Some(file) => file,
                None => open_active_file(&self.path)?,
            };
            let file = active.insert(file);

            file.writer.write_all(record)?;
            file.size += record_length;

            needs_rotation
        };

        // The record is written; a failed cleanup must not be reported as a failed write.
        if rotated {
            if let Err(error) = self.prune_and_compress() {
                eprintln!(
                    "Failed to clean up rotated log files of {}: {error}",
                    self.path.display()
                );
            }
        }

        Ok(())
    }

    pub fn flush(&self) -> io::Result<()> {
        match self.active.lock().as_mut() {
            Some(file) => file.writer.flush(),
            None => Ok(()),
        }
    }

    /// Rotates the active file regardless of its size, then prunes and
    /// compresses the backups.
    ///
    /// The first cleanup error is returned after every backup was processed.
    pub fn rotate(&self) -> io::Result<()> {
        {
            let mut active = self.active.lock();
            self.rotate_locked(&mut active)?;
        }

        self.prune_and_compress()
    }

    /// Lists rotated files belonging to this writer, newest first.
    pub fn backups(&self) -> io::Result<Vec<Backup>> {
        list_backups(&self.path)
    }

    /// Current size of the active file in bytes, including unflushed data.
    pub fn active_size(&self) -> u64 {
        self.active.lock().as_ref().map_or(0, |file| file.size)
    }

    fn rotate_locked(&self, active: &mut Option<ActiveFile>) -> io::Result<()> {
        // Close the active file before renaming it.
        if let Some(mut file) = active.take() {
            file.writer.flush()?;
        }

        if self.path.exists() {
            // Backups are ordered by their timestamp, so a new one must never
            // sort before an existing one.
            let mut rotated_at = Utc::now().trunc_subsecs(3);
            if let Some(newest) = list_backups(&self.path)?.first() {
                if newest.rotated_at >= rotated_at {
                    rotated_at = newest.rotated_at + Duration::milliseconds(1);
                }
            }

            let backup_path = unused_backup_path(&self.path, rotated_at);
            fs::rename(&self.path, &backup_path)?;
        }

        *active = Some(open_active_file(&self.path)?);

        Ok(())
    }

    /// Must not be called with `self.active` held.
    fn prune_and_compress(&self) -> io::Result<()> {
        let _cleanup = self.cleanup.lock();

        let cutoff = Utc::now() - self.policy.max_age;
        let retained_count = usize::try_from(self.policy.max_backups).unwrap_or(usize::MAX);

        let mut first_error = None;
        for (index, backup) in list_backups(&self.path)?.into_iter().enumerate() {
            let result = if index >= retained_count || backup.rotated_at < cutoff {
                fs::remove_file(&backup.path)
            } else if !backup.compressed {
                compress(&backup.path)
            } else {
                Ok(())
            };

            if let Err(error) = result {
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}


fn open_active_file(path: &Path) -> io::Result<ActiveFile> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();

    Ok(ActiveFile {
        writer: BufWriter::new(file),
        size,
    })
}

/// Splits `hub.log` into (`hub`, `.log`).
fn file_name_parts(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    (stem, extension)
}

fn backup_path(path: &Path, rotated_at: DateTime<Utc>) -> PathBuf {
    let (stem, extension) = file_name_parts(path);
    let file_name = format!(
        "{stem}-{}{extension}",
        rotated_at.format(BACKUP_TIME_FORMAT)
    );

    path.with_file_name(file_name)
}

/// Picks a backup name not used by any existing (compressed or not) backup,
/// moving the timestamp forward a millisecond at a time on collision.
fn unused_backup_path(path: &Path, mut rotated_at: DateTime<Utc>) -> PathBuf {
    loop {
        let candidate = backup_path(path, rotated_at);
        if !candidate.exists() && !compressed_path(&candidate).exists() {
            return candidate;
        }

        rotated_at += Duration::milliseconds(1);
    }
}

fn compressed_path(path: &Path) -> PathBuf {
    let mut file_name = path.as_os_str().to_owned();
    file_name.push(COMPRESSED_SUFFIX);
    PathBuf::from(file_name)
}

/// Parses the rotation timestamp out of a backup file name,
/// or returns `None` if the name does not belong to `path`'s backups.
fn parse_backup_name(
    file_name: &str,
    stem: &str,
    extension: &str,
) -> Option<(DateTime<Utc>, bool)> {
    let (file_name, compressed) = match file_name.strip_suffix(COMPRESSED_SUFFIX) {
        Some(uncompressed) => (uncompressed, true),
        None => (file_name, false),
    };

    let timestamp = file_name
        .strip_prefix(stem)?
        .strip_prefix('-')?
        .strip_suffix(extension)?;

    let rotated_at = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIME_FORMAT).ok()?;

    Some((rotated_at.and_utc(), compressed))
}

fn list_backups(path: &Path) -> io::Result<Vec<Backup>> {
    let (stem, extension) = file_name_parts(path);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut backups = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        if let Some((rotated_at, compressed)) = parse_backup_name(file_name, &stem, &extension) {
            backups.push(Backup {
                path: entry.path(),
                rotated_at,
                compressed,
            });
        }
    }

    backups.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
    Ok(backups)
}

/// Gzips `path` into `path.gz` and removes the original.
fn compress(path: &Path) -> io::Result<()> {
    let destination_path = compressed_path(path);

    let result = (|| -> io::Result<()> {
        let mut source = BufReader::new(File::open(path)?);
        let destination = File::create(&destination_path)?;

        let mut encoder = GzEncoder::new(BufWriter::new(destination), Compression::default());
        io::copy(&mut source, &mut encoder)?;
        encoder.finish()?.flush()
    })();

    match result {
        Ok(()) => fs::remove_file(path),
        Err(error) => {
            let _ = fs::remove_file(&destination_path);
            Err(error)
        }
    }
}


#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn small_policy(max_backups: u64) -> RotationPolicy {
        RotationPolicy {
            max_size_bytes: 48,
            max_backups,
            max_age: Duration::days(30),
        }
    }

    fn record(index: usize) -> Vec<u8> {
        format!("{{\"msg\":\"record number {index:04}\"}}\n").into_bytes()
    }

    #[test]
    fn policy_converts_megabytes_and_days() {
        let policy = RotationPolicy::new(100, 5, 30);

        assert_eq!(policy.max_size_bytes, 100 * 1024 * 1024);
        assert_eq!(policy.max_backups, 5);
        assert_eq!(policy.max_age, Duration::days(30));
    }

    #[test]
    fn backup_names_round_trip() {
        let path = Path::new("/var/log/hub.log");
        let rotated_at = NaiveDateTime::parse_from_str("2024-03-01T10-20-30.456", BACKUP_TIME_FORMAT)
            .unwrap()
            .and_utc();

        let backup = backup_path(path, rotated_at);
        assert_eq!(backup, Path::new("/var/log/hub-2024-03-01T10-20-30.456.log"));

        assert_eq!(
            parse_backup_name("hub-2024-03-01T10-20-30.456.log.gz", "hub", ".log"),
            Some((rotated_at, true))
        );
        assert_eq!(parse_backup_name("hub.log", "hub", ".log"), None);
        assert_eq!(parse_backup_name("other-2024-03-01T10-20-30.456.log", "hub", ".log"), None);
    }

    #[test]
    fn rotates_when_next_record_would_overflow() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");
        let writer = RotatingFileWriter::open(&path, small_policy(10)).unwrap();

        // Each record is 29 bytes, so only one fits in 48 bytes.
        writer.write_record(&record(0)).unwrap();
        assert!(writer.backups().unwrap().is_empty());

        writer.write_record(&record(1)).unwrap();
        writer.flush().unwrap();

        let backups = writer.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].compressed);

        let active = fs::read_to_string(&path).unwrap();
        assert_eq!(active.as_bytes(), record(1).as_slice());

        let mut decompressed = String::new();
        GzDecoder::new(File::open(&backups[0].path).unwrap())
            .read_to_string(&mut decompressed)
            .unwrap();
        assert_eq!(decompressed.as_bytes(), record(0).as_slice());
    }

    #[test]
    fn retains_at_most_max_backups() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");
        let writer = RotatingFileWriter::open(&path, small_policy(2)).unwrap();

        for index in 0..6 {
            writer.write_record(&record(index)).unwrap();
        }
        writer.flush().unwrap();

        let backups = writer.backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].rotated_at > backups[1].rotated_at);

        // The newest backup holds the second-to-last record.
        let mut newest = String::new();
        GzDecoder::new(File::open(&backups[0].path).unwrap())
            .read_to_string(&mut newest)
            .unwrap();
        assert_eq!(newest.as_bytes(), record(4).as_slice());
    }

    #[test]
    fn zero_max_backups_keeps_no_backups() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");
        let writer = RotatingFileWriter::open(&path, small_policy(0)).unwrap();

        for index in 0..3 {
            writer.write_record(&record(index)).unwrap();
        }

        assert!(writer.backups().unwrap().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn removes_backups_older_than_max_age() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");

        let stale_path = backup_path(&path, Utc::now() - Duration::days(45));
        fs::write(&stale_path, b"stale").unwrap();
        let recent_path = backup_path(&path, Utc::now() - Duration::days(2));
        fs::write(&recent_path, b"recent").unwrap();

        let writer = RotatingFileWriter::open(&path, small_policy(10)).unwrap();
        writer.write_record(&record(0)).unwrap();
        writer.rotate().unwrap();

        assert!(!stale_path.exists());
        assert!(!compressed_path(&stale_path).exists());
        assert!(compressed_path(&recent_path).exists());
        assert_eq!(writer.backups().unwrap().len(), 2);
    }

    #[test]
    fn failed_compression_does_not_stop_cleanup() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");

        // A directory in place of the `.gz` target makes compressing this backup fail.
        let blocked_path = backup_path(&path, Utc::now() - Duration::days(2));
        fs::write(&blocked_path, b"blocked").unwrap();
        fs::create_dir(compressed_path(&blocked_path)).unwrap();

        let older_path = backup_path(&path, Utc::now() - Duration::days(3));
        fs::write(&older_path, b"older").unwrap();

        let writer = RotatingFileWriter::open(&path, small_policy(10)).unwrap();
        writer.write_record(&record(0)).unwrap();

        assert!(writer.rotate().is_err());

        assert!(blocked_path.exists());
        assert!(!older_path.exists());
        assert!(compressed_path(&older_path).exists());

        let newest = &writer.backups().unwrap()[0];
        assert!(newest.compressed);
    }

    #[test]
    fn failed_cleanup_does_not_fail_the_write() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");

        let blocked_path = backup_path(&path, Utc::now() - Duration::days(2));
        fs::write(&blocked_path, b"blocked").unwrap();
        fs::create_dir(compressed_path(&blocked_path)).unwrap();

        let writer = RotatingFileWriter::open(&path, small_policy(10)).unwrap();
        writer.write_record(&record(0)).unwrap();
        writer.write_record(&record(1)).unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), record(1));
    }

    #[test]
    fn rejects_records_larger_than_the_maximum() {
        let directory = tempfile::tempdir().unwrap();
        let writer =
            RotatingFileWriter::open(directory.path().join("hub.log"), small_policy(1)).unwrap();

        let error = writer.write_record(&[b'x'; 49]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(writer.active_size(), 0);
    }

    #[test]
    fn appends_to_an_existing_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("hub.log");
        fs::write(&path, b"previous run\n").unwrap();

        let writer = RotatingFileWriter::open(&path, small_policy(1)).unwrap();
        assert_eq!(writer.active_size(), 13);

        writer.write_record(b"next run\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "previous run\nnext run\n");
    }
}

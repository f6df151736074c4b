//! End-to-end tests: settings file → settings → logger.

use std::{
    fs,
    io::Write,
    path::Path,
    sync::Arc,
};

use parking_lot::Mutex;
use podploy_hub::{
    configuration::{DEFAULT_OUTPUT_PATH, DEFAULT_PORT},
    load_settings,
    logging::{field, Encoding},
    ConfigError,
    Level,
    Logger,
    LoggerConfiguration,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;


#[derive(Clone, Default)]
struct Console(Arc<Mutex<Vec<u8>>>);

impl Console {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}


fn write_settings(directory: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = directory.path().join("configuration.toml");
    fs::write(&path, contents).unwrap();
    path
}

fn read_json_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}


#[test]
fn unset_values_are_defaulted_and_level_is_case_folded() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_settings(
        &directory,
        r#"
[hub]
port = 0
host = ""
log_level = "DEBUG"
output_path = ""
"#,
    );

    let settings = load_settings(&path).unwrap();

    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.port, 8080);
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.log_level, Level::Debug);
    assert_eq!(settings.log_level.as_str(), "debug");
    assert_eq!(settings.output_path, DEFAULT_OUTPUT_PATH);
    assert!(settings.output_path.starts_with("~/"));
}

#[test]
fn out_of_range_port_names_the_value() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_settings(&directory, "[hub]\nport = 70000\n");

    let error = load_settings(&path).unwrap_err();

    assert!(matches!(error, ConfigError::InvalidValue { field: "port", .. }));
    assert!(error.to_string().contains("70000"), "{error}");
}

#[test]
fn loading_is_idempotent() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_settings(
        &directory,
        r#"
[hub]
host = "10.0.0.5"
port = 9443
log_level = "Error"
environment = "staging"
max_size = 5
"#,
    );

    assert_eq!(load_settings(&path).unwrap(), load_settings(&path).unwrap());
}

#[test]
fn settings_drive_a_development_logger() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_settings(
        &directory,
        r#"
[hub]
log_level = "debug"
environment = "development"
output_path = "~/podploy/hub.log"
"#,
    );
    let settings = load_settings(&path).unwrap();
    let console = Console::default();

    let logger = Logger::builder(settings.logger_configuration())
        .home_directory(directory.path())
        .console_writer(console.clone())
        .build()
        .unwrap();

    assert_eq!(logger.log_path(), directory.path().join("podploy/hub.log"));
    assert_eq!(logger.encoding(), Encoding::Console);

    logger.debug("test record");
    logger.sync().unwrap();

    let file = fs::read_to_string(logger.log_path()).unwrap();
    assert!(console.contents().contains("test record"));
    assert!(file.contains("test record"));
}

#[test]
fn production_logger_writes_structured_records_to_the_file_only() {
    let directory = tempfile::tempdir().unwrap();
    let console = Console::default();

    let logger = Logger::builder(LoggerConfiguration::production(
        directory.path().join("logs/hub.log").to_string_lossy(),
    ))
    .console_writer(console.clone())
    .build()
    .unwrap();

    logger
        .with_request("req-1", "POST", "/deployments")
        .info_with("test record", [field("replicas", 3)]);
    logger.sync().unwrap();

    assert!(console.contents().is_empty());

    let records = read_json_lines(logger.log_path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], json!("test record"));
    assert_eq!(records[0]["level"], json!("INFO"));
    assert_eq!(records[0]["request_id"], json!("req-1"));
    assert_eq!(records[0]["method"], json!("POST"));
    assert_eq!(records[0]["path"], json!("/deployments"));
    assert_eq!(records[0]["replicas"], json!(3));
}

#[test]
fn threshold_is_shared_across_derived_loggers() {
    let directory = tempfile::tempdir().unwrap();
    let logger = Logger::new(LoggerConfiguration::production(
        directory.path().join("hub.log").to_string_lossy(),
    ))
    .unwrap();

    let api = logger.with_component("api");
    let scheduler = logger.with_component("scheduler");

    api.set_level("error").unwrap();
    scheduler.warn("below threshold");
    logger.info("below threshold");
    scheduler.error("at threshold");

    logger.sync().unwrap();
    let records = read_json_lines(logger.log_path());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["component"], json!("scheduler"));
    assert_eq!(records[0]["msg"], json!("at threshold"));
}

#[test]
fn writing_past_max_size_rotates_and_bounds_backups() {
    let directory = tempfile::tempdir().unwrap();
    let logger = Logger::new(LoggerConfiguration {
        output_path: directory.path().join("hub.log").to_string_lossy().into_owned(),
        max_size_mb: 1,
        max_backups: 2,
        max_age_days: 30,
        ..LoggerConfiguration::default()
    })
    .unwrap();

    // Roughly 3.7 MB of records against a 1 MB limit.
    let payload = "x".repeat(1000);
    for index in 0..3600 {
        logger.info_with(&payload, [field("index", index)]);
    }
    logger.sync().unwrap();

    let backups = logger.backups().unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|backup| backup.compressed));

    let active_size = fs::metadata(logger.log_path()).unwrap().len();
    assert!(active_size <= 1024 * 1024);

    let last = read_json_lines(logger.log_path()).pop().unwrap();
    assert_eq!(last["index"], json!(3599));
}

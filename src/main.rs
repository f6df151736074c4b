use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use podploy_hub::{
    configuration::{get_default_configuration_file_path, load_settings_section},
    logging::field,
    Logger,
};

use crate::cli::CLIArgs;

mod cli;


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    // Load configuration.
    let configuration_file_path = match cli_args.configuration_file_path {
        Some(path) => path,
        None => {
            println!("Loading configuration at default path.");
            get_default_configuration_file_path()
                .into_diagnostic()
                .wrap_err("Could not determine the default configuration file path.")?
        }
    };

    println!(
        "Loading configuration: {} [{}]",
        configuration_file_path.display(),
        cli_args.section
    );

    let settings = load_settings_section(&configuration_file_path, &cli_args.section)
        .into_diagnostic()
        .wrap_err("Failed to load configuration file.")?;


    let logger = Logger::new(settings.logger_configuration())
        .into_diagnostic()
        .wrap_err("Failed to initialize logger.")?;

    // Flushes on every way out of `main`, unwinding included.
    let logger = logger.sync_on_drop();

    logger
        .install_global()
        .into_diagnostic()
        .wrap_err("Failed to route tracing events to the logger.")?;

    let startup = logger.with_component("bootstrap");

    startup.info_with(
        "Server configuration loaded.",
        [
            field("host", settings.host.as_str()),
            field("port", settings.port),
            field("environment", settings.environment.as_str()),
        ],
    );
    startup.info_with(
        "Logger initialized.",
        [
            field("level", settings.log_level.as_str()),
            field("output_path", logger.log_path().display().to_string()),
        ],
    );
    startup.info_with(
        "Log rotation configured.",
        [
            field("max_size_mb", settings.max_size_mb),
            field("max_backups", settings.max_backups),
            field("max_age_days", settings.max_age_days),
        ],
    );

    tracing::debug!(bind_address = %settings.bind_address(), "Bootstrap complete.");

    Ok(())
}

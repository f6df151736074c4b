//! Command-line interface definitions for the hub binary.

use std::path::PathBuf;

use clap::Parser;
use podploy_hub::configuration::DEFAULT_SECTION;


/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "podploy-hub",
    author,
    about = "The podploy hub server.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, this defaults to `./data/configuration.toml`.
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        help = "Path to the configuration file to use. Defaults to ./data/configuration.toml"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[arg(
        short = 's',
        long = "section",
        default_value = DEFAULT_SECTION,
        help = "Configuration file section holding the hub settings."
    )]
    pub section: String,
}

//! Errors of the rna CLI.
//!
//! Library errors convert into [`CliError`] through `#[from]`; `main` renders
//! the result with [`cli_error_to_miette`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] rna_config::ConfigError),

    #[error(transparent)]
    Plugin(#[from] rna_plugin::PluginError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Directory not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Render a CLI error for the terminal.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Config(e) => miette::miette!(
            help = "Check rna.toml, the \"rna\" field of package.json and RNA_* variables",
            "Configuration error: {}",
            e
        ),
        CliError::Plugin(e) => miette::Report::new(e),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Pass an existing directory with --root",
            "Directory not found: {}",
            path.display()
        ),
        other => miette::miette!("{}", other),
    }
}

//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// rna - serve a project as native ES modules
#[derive(Parser, Debug)]
#[command(
    name = "rna",
    version,
    about = "Development server for native ES modules",
    long_about = "rna serves a project directory to the browser as native ES modules.\n\
                  Sources are compiled per file on request, stylesheets, JSON and assets\n\
                  are wrapped in small modules, and npm packages are bundled on first use."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server
    Serve(ServeArgs),
}

/// Arguments for `rna serve`. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Directory to serve (defaults to the config's root_dir, then the
    /// current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Config file (rna.toml, *.json or package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

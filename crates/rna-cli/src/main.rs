//! rna - development server for browser-native ES modules.

use clap::Parser;
use miette::Result;
use rna_cli::{cli, commands, error, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color || !logger::should_use_colors());

    let result = match args.command {
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}

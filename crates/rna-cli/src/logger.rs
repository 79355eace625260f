//! Logging setup for the rna CLI.
//!
//! Verbosity comes from the global flags:
//! 1. `--verbose`: debug for the rna crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`, when set
//! 4. otherwise info for the rna crates
//!
//! ```rust,no_run
//! use rna_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("server starting");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "rna=debug,rna_cli=debug,rna_plugin=debug,rna_engine=debug,rna_config=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "rna=info,rna_cli=info,rna_plugin=info,rna_engine=info,rna_config=info";

/// Filter for the given flags, before `RUST_LOG` is consulted.
fn filter_directives(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some(VERBOSE_FILTER)
    } else if quiet {
        Some(QUIET_FILTER)
    } else {
        None
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = match filter_directives(verbose, quiet) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Whether stdout should get ANSI colors.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` enables them even off a TTY.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stdout().features().colors_supported()
}

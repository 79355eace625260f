//! Subcommand implementations.

mod serve;

pub use serve::{plugin_options, serve_execute, server_config};

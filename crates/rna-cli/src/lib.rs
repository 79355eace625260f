//! Command-line host for the rna plugin.
//!
//! `rna serve` runs an axum server over a project directory. Every request goes
//! through a [`pipeline::RequestPipeline`], which drives the dev-server plugin
//! hooks in the order the hooks expect: serve, file read, transform, MIME type
//! and finally import rewriting for scripts.
//!
//! - [`cli`] - argument parsing
//! - [`commands`] - subcommand implementations
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`pipeline`] - per-request hook driver
//! - [`server`] - HTTP layer

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod server;

pub use error::{CliError, Result};
pub use pipeline::{PipelineError, PipelineResponse, RequestPipeline};

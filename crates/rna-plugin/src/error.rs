//! Error types for hooks, dependency builds and collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for hook operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Failure reported by the resolver or the build engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The specifier could not be resolved from the importer.
    #[error("cannot resolve '{specifier}' from {}", importer.display())]
    Unresolved { specifier: String, importer: PathBuf },

    /// Compiling a single module failed.
    #[error("failed to transform {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    /// Building a dependency graph failed.
    #[error("failed to build {}: {message}", path.display())]
    Build { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a dependency build.
///
/// Cloned to every request waiting on the same build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    /// The engine returned no output files.
    #[error("failed to bundle dependency {}: no output files", .0.display())]
    NoOutput(PathBuf),

    /// Output files were produced but none of them is the requested module.
    #[error("failed to bundle dependency {}: entry output missing", .0.display())]
    MissingEntry(PathBuf),

    /// The engine reported an error.
    #[error("failed to bundle dependency {}: {message}", path.display())]
    Engine { path: PathBuf, message: String },

    /// The background build task panicked or was cancelled.
    #[error("build task for {} did not complete: {message}", path.display())]
    Aborted { path: PathBuf, message: String },
}

/// Error returned by plugin hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    /// `server_start` ran more than once.
    #[error("server configuration was already captured")]
    AlreadyStarted,

    /// A hook needing the server configuration ran before `server_start`.
    #[error("hook called before server start")]
    NotStarted,

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl miette::Diagnostic for PluginError {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            PluginError::AlreadyStarted => "ALREADY_STARTED",
            PluginError::NotStarted => "NOT_STARTED",
            PluginError::Bundle(_) => "DEPENDENCY_BUILD_FAILED",
            PluginError::Engine(_) => "ENGINE_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            PluginError::NotStarted => Some(Box::new(
                "Call server_start with the server configuration before serving requests.",
            )),
            PluginError::Bundle(BundleError::NoOutput(path)) => Some(Box::new(format!(
                "Check that {} is a valid module entry.",
                path.display()
            ))),
            PluginError::Bundle(_) => Some(Box::new(
                "The failed build stays cached until the server restarts.",
            )),
            _ => None,
        }
    }
}

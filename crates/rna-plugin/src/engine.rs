//! Transform and bundle engine seam.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::entry::TransformConfig;
use crate::error::EngineError;

/// Result of compiling a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
}

/// One in-memory file produced by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Absolute path the file would have been written to.
    pub path: PathBuf,
    pub text: String,
}

/// Result of building a dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub output_files: Vec<OutputFile>,
}

/// Compiles modules and bundles dependency graphs.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Compile the entry of `config` alone, leaving its imports untouched.
    async fn transform(&self, config: &TransformConfig) -> Result<TransformOutput, EngineError>;

    /// Bundle the entry of `config` with its dependencies. Nothing is written
    /// to disk; every produced file is returned.
    async fn build(&self, config: &TransformConfig) -> Result<BuildOutput, EngineError>;
}

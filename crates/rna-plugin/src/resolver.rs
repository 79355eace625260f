//! Module resolution seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::EngineError;

/// Resolves import specifiers to files on disk.
///
/// Implementations must not follow symlinks in [`ModuleResolver::resolve`]:
/// the dependency bundler compares the resolved path with
/// [`ModuleResolver::real_path`] to detect linked packages.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Resolve `specifier` as imported from the file `importer`.
    async fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf, EngineError>;

    /// Whether `specifier` names a runtime built-in such as `fs` or `node:path`.
    fn is_core(&self, specifier: &str) -> bool;

    /// Canonical path with every symlink resolved.
    async fn real_path(&self, path: &Path) -> Result<PathBuf, EngineError>;

    /// Nearest directory at or above `path` holding a `package.json`.
    async fn package_root(&self, path: &Path) -> Option<PathBuf>;
}

//! Node-style module resolution for browser builds.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use oxc_resolver::{ResolveOptions, Resolver};
use rna_plugin::{EngineError, ModuleResolver};

/// Node.js built-in modules, without the `node:` prefix.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Whether `specifier` names a Node.js built-in, including subpaths such as
/// `fs/promises` and the `node:` scheme.
pub fn is_node_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    let name = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.contains(&name)
}

/// Resolver following package.json `exports`, `browser` and `module` fields.
///
/// Symlinks are not followed, so a linked workspace package resolves to its
/// path under `node_modules` rather than its real location.
#[derive(Clone)]
pub struct NodeResolver {
    resolver: Arc<Resolver>,
}

impl NodeResolver {
    pub fn new() -> Self {
        Self::with_options(Self::browser_options())
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(options)),
        }
    }

    /// Options used by [`NodeResolver::new`].
    pub fn browser_options() -> ResolveOptions {
        ResolveOptions {
            condition_names: ["browser", "import", "module", "default"]
                .map(String::from)
                .to_vec(),
            main_fields: ["browser", "module", "main"].map(String::from).to_vec(),
            extensions: [".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".json", ".css"]
                .map(String::from)
                .to_vec(),
            symlinks: false,
            ..Default::default()
        }
    }
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl ModuleResolver for NodeResolver {
    async fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf, EngineError> {
        let from_dir = importer.parent().unwrap_or(importer);
        self.resolver
            .resolve(from_dir, specifier)
            .map(|resolution| resolution.path().to_path_buf())
            .map_err(|err| {
                tracing::trace!(specifier, error = ?err, "resolution failed");
                EngineError::Unresolved {
                    specifier: specifier.to_string(),
                    importer: importer.to_path_buf(),
                }
            })
    }

    fn is_core(&self, specifier: &str) -> bool {
        is_node_builtin(specifier)
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf, EngineError> {
        Ok(tokio::fs::canonicalize(path).await?)
    }

    async fn package_root(&self, path: &Path) -> Option<PathBuf> {
        let start = path.parent()?;
        for dir in start.ancestors() {
            if tokio::fs::try_exists(dir.join("package.json"))
                .await
                .unwrap_or(false)
            {
                return Some(dir.to_path_buf());
            }
        }
        None
    }
}

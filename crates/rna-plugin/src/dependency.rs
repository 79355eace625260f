//! Bundling of bare package imports.
//!
//! A bare import such as `lodash` is resolved to a file, bundled once in the
//! background, and rewritten to a specifier pointing at that file. Requests for
//! the file, and for every chunk the build produced, are then answered from the
//! virtual file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::classify::{Loader, is_bare_module_source};
use crate::context::{ServerConfig, relative_path, resolve_relative_import, to_url_path};
use crate::engine::BuildEngine;
use crate::entry::{Entrypoint, create_config};
use crate::error::BundleError;
use crate::plugins::PluginOptions;
use crate::resolver::ModuleResolver;
use crate::virtual_fs::{BodyResult, ModuleBody, Slot, VirtualFs};

/// Resolves bare imports and bundles each resolved file exactly once.
#[derive(Clone)]
pub struct DependencyBundler {
    server: Arc<ServerConfig>,
    options: Arc<PluginOptions>,
    resolver: Arc<dyn ModuleResolver>,
    engine: Arc<dyn BuildEngine>,
    virtual_fs: VirtualFs,
}

impl DependencyBundler {
    pub fn new(
        server: Arc<ServerConfig>,
        options: Arc<PluginOptions>,
        resolver: Arc<dyn ModuleResolver>,
        engine: Arc<dyn BuildEngine>,
        virtual_fs: VirtualFs,
    ) -> Self {
        Self {
            server,
            options,
            resolver,
            engine,
            virtual_fs,
        }
    }

    /// Rewrite `source`, imported from the file `importer`, to the bundled
    /// dependency.
    ///
    /// Returns `None` when the import is not a bare package name, cannot be
    /// resolved, or resolves through a symlink. Build failures are not
    /// reported here; they surface when the rewritten module is served.
    pub async fn bundle_import(&self, source: &str, importer: &Path) -> Option<String> {
        let specifier = self.options.apply_alias(source);
        if !is_bare_module_source(specifier) {
            return None;
        }

        let resolved = match self.resolver.resolve(specifier, importer).await {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!(specifier, error = %err, "dependency left to the host");
                return None;
            }
        };

        match self.resolver.real_path(&resolved).await {
            Ok(real) if real == resolved => {}
            Ok(real) => {
                debug!(
                    specifier,
                    resolved = %resolved.display(),
                    real = %real.display(),
                    "linked dependency left to the host"
                );
                return None;
            }
            Err(err) => {
                debug!(specifier, error = %err, "cannot canonicalize dependency");
                return None;
            }
        }

        let slot = self
            .virtual_fs
            .register(resolved.clone(), || self.start_build(resolved.clone()).boxed());
        match slot {
            Slot::Registered(_) => {
                info!(specifier, path = %resolved.display(), "bundling dependency")
            }
            Slot::Existing(_) => debug!(specifier, "dependency already bundled"),
        }

        Some(resolve_relative_import(
            &resolved,
            importer,
            &self.server.root_dir,
        ))
    }

    /// Spawn the build for `resolved` and return a future for its entry body.
    fn start_build(
        &self,
        resolved: PathBuf,
    ) -> impl std::future::Future<Output = BodyResult> + Send + 'static {
        let bundler = self.clone();
        let path = resolved.clone();
        let handle = tokio::spawn(async move { bundler.build(resolved).await });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(BundleError::Aborted {
                    path,
                    message: err.to_string(),
                }),
            }
        }
    }

    async fn build(&self, resolved: PathBuf) -> BodyResult {
        let module_root = self
            .resolver
            .package_root(&resolved)
            .await
            .unwrap_or_else(|| self.server.root_dir.clone());

        let input = format!("./{}", to_url_path(&relative_path(&module_root, &resolved)));
        let entrypoint = Entrypoint {
            loader: Loader::from_path(&input),
            root: module_root,
            input,
            code: None,
            bundle: false,
            chunk: Default::default(),
        };
        let config = create_config(
            entrypoint,
            &self.server,
            &self.options,
            Arc::clone(&self.resolver),
        )
        .for_dependency(resolved.clone());

        let output = self.engine.build(&config).await.map_err(|err| {
            warn!(path = %resolved.display(), error = %err, "dependency build failed");
            BundleError::Engine {
                path: resolved.clone(),
                message: err.to_string(),
            }
        })?;

        if output.output_files.is_empty() {
            warn!(path = %resolved.display(), "dependency build produced no output");
            return Err(BundleError::NoOutput(resolved));
        }

        let files = output.output_files.len();
        let mut output_files = output.output_files;
        let Some(index) = output_files.iter().position(|file| file.path == resolved) else {
            warn!(path = %resolved.display(), files, "dependency build is missing its entry");
            return Err(BundleError::MissingEntry(resolved));
        };
        let entry = ModuleBody::from(output_files.swap_remove(index).text);

        // Only whole builds are published.
        for file in output_files {
            self.virtual_fs.publish(file.path, ModuleBody::from(file.text));
        }

        info!(path = %resolved.display(), files, "dependency bundled");
        Ok(entry)
    }
}

impl std::fmt::Debug for DependencyBundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyBundler")
            .field("root_dir", &self.server.root_dir)
            .field("virtual_fs", &self.virtual_fs)
            .finish_non_exhaustive()
    }
}

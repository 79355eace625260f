//! The `rna` dev-server plugin.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::debug;

use crate::classify::{
    Loader, RequestKind, classify_request, extension, is_css, is_helper_import, is_js, is_json,
};
use crate::context::{
    RequestContext, ServerConfig, relative_path, request_file_path, resolve_relative_import,
    to_url_path,
};
use crate::dependency::DependencyBundler;
use crate::engine::BuildEngine;
use crate::entry::{ChunkOptions, Entrypoint, create_config};
use crate::error::{PluginError, Result};
use crate::hooks::{DevServerPlugin, MimeType, ServeResponse};
use crate::params::{
    append_css_module_param, append_file_param, append_json_module_param, split_search_params,
};
use crate::plugins::PluginOptions;
use crate::resolver::ModuleResolver;
use crate::synthetic::{css_module_source, file_module_source};
use crate::virtual_fs::VirtualFs;

/// State available once the server has started.
struct Started {
    server: Arc<ServerConfig>,
    dependencies: DependencyBundler,
}

/// Dev-server plugin compiling sources on demand and bundling dependencies.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use rna_plugin::{PluginOptions, RnaPlugin, ServerConfig};
///
/// let plugin = RnaPlugin::new(PluginOptions::default(), resolver, engine);
/// plugin.server_start(ServerConfig::new("/srv/app")).await?;
/// ```
pub struct RnaPlugin {
    options: Arc<PluginOptions>,
    resolver: Arc<dyn ModuleResolver>,
    engine: Arc<dyn BuildEngine>,
    virtual_fs: VirtualFs,
    started: OnceLock<Started>,
}

impl RnaPlugin {
    pub const NAME: &'static str = "rna";

    pub fn new(
        options: PluginOptions,
        resolver: Arc<dyn ModuleResolver>,
        engine: Arc<dyn BuildEngine>,
    ) -> Self {
        Self {
            options: Arc::new(options),
            resolver,
            engine,
            virtual_fs: VirtualFs::new(),
            started: OnceLock::new(),
        }
    }

    /// Modules produced by dependency builds.
    pub fn virtual_fs(&self) -> &VirtualFs {
        &self.virtual_fs
    }

    pub fn server_config(&self) -> Option<&ServerConfig> {
        self.started.get().map(|started| started.server.as_ref())
    }

    fn started(&self) -> Result<&Started> {
        self.started.get().ok_or(PluginError::NotStarted)
    }

    /// Capture the server configuration. Fails if called twice.
    pub fn start(&self, config: ServerConfig) -> Result<()> {
        let server = Arc::new(config);
        let dependencies = DependencyBundler::new(
            Arc::clone(&server),
            Arc::clone(&self.options),
            Arc::clone(&self.resolver),
            Arc::clone(&self.engine),
            self.virtual_fs.clone(),
        );
        self.started
            .set(Started {
                server,
                dependencies,
            })
            .map_err(|_| PluginError::AlreadyStarted)
    }

    /// Content type for requests this plugin turns into script or stylesheet.
    pub fn mime_type(&self, ctx: &RequestContext) -> Option<MimeType> {
        match classify_request(&ctx.url, &ctx.path) {
            RequestKind::File | RequestKind::CssModule | RequestKind::JsonModule => {
                Some(MimeType::Js)
            }
            RequestKind::Source(Loader::Css) => Some(MimeType::Css),
            RequestKind::Source(loader) if loader.is_script() => Some(MimeType::Js),
            RequestKind::Source(_) | RequestKind::Passthrough => None,
        }
    }

    /// Answer synthetic and virtual requests.
    pub async fn serve_request(&self, ctx: &RequestContext) -> Result<Option<ServeResponse>> {
        let started = self.started()?;
        let root_dir = &started.server.root_dir;

        match classify_request(&ctx.url, &ctx.path) {
            RequestKind::File => {
                let (path, params) = split_search_params(&ctx.url);
                let file_path = request_file_path(&path, root_dir);
                let relative = resolve_relative_import(&file_path, &file_path, root_dir);
                // A bare name resolves against the asset's own URL; keep `./`
                // when the name would read as a URL scheme.
                let relative = match relative.strip_prefix("./") {
                    Some(name) if !name.contains(':') => name.to_string(),
                    _ => relative,
                };
                let source = if params.is_empty() {
                    relative
                } else {
                    format!("{relative}?{params}")
                };
                Ok(Some(ServeResponse::script(file_module_source(&source))))
            }
            RequestKind::CssModule => Ok(Some(ServeResponse::script(css_module_source(&ctx.url)))),
            _ => {
                let file_path = request_file_path(&ctx.url, root_dir);
                let Some(pending) = self.virtual_fs.get(&file_path) else {
                    return Ok(None);
                };
                let body = pending.await?;
                Ok(Some(ServeResponse {
                    body: body.to_string(),
                    content_type: None,
                    transform_cache: false,
                }))
            }
        }
    }

    /// Compile the request body with the transform engine.
    pub async fn transform_request(&self, ctx: &RequestContext) -> Result<Option<String>> {
        if is_helper_import(&ctx.path) {
            return Ok(None);
        }
        let started = self.started()?;
        let root_dir = &started.server.root_dir;

        let loader = match classify_request(&ctx.url, &ctx.path) {
            RequestKind::Source(loader) => loader,
            RequestKind::JsonModule => Loader::Json,
            RequestKind::File | RequestKind::CssModule | RequestKind::Passthrough => {
                return Ok(None);
            }
        };

        let file_path = request_file_path(&ctx.url, root_dir);
        if self.virtual_fs.contains(&file_path) {
            return Ok(None);
        }

        let entrypoint = Entrypoint {
            root: root_dir.clone(),
            input: format!("./{}", to_url_path(&relative_path(root_dir, &file_path))),
            code: ctx.body.clone(),
            loader: Some(loader),
            bundle: false,
            chunk: ChunkOptions::from_url(&ctx.url),
        };
        let config = create_config(
            entrypoint,
            &started.server,
            &self.options,
            Arc::clone(&self.resolver),
        );

        debug!(path = %file_path.display(), %loader, "transforming");
        let output = self.engine.transform(&config).await?;
        Ok(Some(output.code))
    }

    /// Tag a resolved import so the follow-up request is classified.
    ///
    /// JSON and stylesheets become modules, other assets are imported by URL.
    /// Scripts, extensionless specifiers and absolute URLs are left alone.
    pub fn tag_import(&self, source: &str) -> Option<String> {
        if source.contains("://") || source.starts_with("data:") {
            return None;
        }
        if is_json(source) {
            Some(append_json_module_param(source))
        } else if is_css(source) {
            Some(append_css_module_param(source))
        } else if !is_js(source) && extension(source).is_some() {
            Some(append_file_param(source))
        } else {
            None
        }
    }

    /// Rewrite a bare import of the module in `ctx` to its bundled dependency.
    pub async fn resolve_dependency(
        &self,
        source: &str,
        ctx: &RequestContext,
    ) -> Result<Option<String>> {
        let started = self.started()?;
        let importer = request_file_path(&ctx.url, &started.server.root_dir);
        Ok(started.dependencies.bundle_import(source, &importer).await)
    }
}

#[async_trait]
impl DevServerPlugin for RnaPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn server_start(&self, config: ServerConfig) -> Result<()> {
        self.start(config)
    }

    fn resolve_mime_type(&self, ctx: &RequestContext) -> Option<MimeType> {
        self.mime_type(ctx)
    }

    async fn serve(&self, ctx: &RequestContext) -> Result<Option<ServeResponse>> {
        self.serve_request(ctx).await
    }

    async fn transform(&self, ctx: &RequestContext) -> Result<Option<String>> {
        self.transform_request(ctx).await
    }

    async fn transform_import(
        &self,
        source: &str,
        _ctx: &RequestContext,
    ) -> Result<Option<String>> {
        Ok(self.tag_import(source))
    }

    async fn resolve_import(&self, source: &str, ctx: &RequestContext) -> Result<Option<String>> {
        self.resolve_dependency(source, ctx).await
    }
}

impl std::fmt::Debug for RnaPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RnaPlugin")
            .field("options", &self.options)
            .field("server", &self.server_config())
            .field("virtual_fs", &self.virtual_fs)
            .finish_non_exhaustive()
    }
}

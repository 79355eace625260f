//! Per-request driver for the dev-server plugin hooks.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rna_plugin::context::request_file_path;
use rna_plugin::{DevServerPlugin, MimeType, PluginError, RequestContext, ServerConfig};
use thiserror::Error;

/// Why a request could not be answered.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResponse {
    pub body: Vec<u8>,
    pub content_type: Cow<'static, str>,
}

/// Runs every request through the registered plugins.
///
/// Order per request: `serve` until one plugin answers; otherwise the file is
/// read from the root. File bodies go through every `transform` hook. The
/// content type comes from the serve response, then `resolve_mime_type`, then
/// the file extension. Script bodies finally have each import specifier
/// passed through `resolve_import` and `transform_import`.
pub struct RequestPipeline {
    plugins: Vec<Arc<dyn DevServerPlugin>>,
    config: ServerConfig,
}

impl RequestPipeline {
    pub fn new(config: ServerConfig, plugins: Vec<Arc<dyn DevServerPlugin>>) -> Self {
        Self { plugins, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run every `server_start` hook.
    pub async fn start(&self) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "starting plugin");
            plugin.server_start(self.config.clone()).await?;
        }
        Ok(())
    }

    /// Answer one request URL (path plus query string).
    pub async fn handle(&self, url: &str) -> Result<PipelineResponse, PipelineError> {
        let mut ctx = RequestContext::new(url);
        let mut served_type = None;
        let mut synthetic = false;
        let mut type_path = PathBuf::from(&ctx.path);

        for plugin in &self.plugins {
            if let Some(response) = plugin.serve(&ctx).await? {
                tracing::debug!(plugin = plugin.name(), url, "served by plugin");
                ctx.body = Some(response.body);
                served_type = response.content_type;
                synthetic = true;
                break;
            }
        }

        if !synthetic {
            let path = self.file_path(url);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if is_missing(&e) => return Err(PipelineError::NotFound(path)),
                Err(e) => return Err(e.into()),
            };
            match String::from_utf8(bytes) {
                Ok(text) => ctx.body = Some(text),
                Err(binary) => {
                    return Ok(PipelineResponse {
                        body: binary.into_bytes(),
                        content_type: Cow::Borrowed(determine_content_type(&path)),
                    });
                }
            }
            type_path = path;

            for plugin in &self.plugins {
                if let Some(body) = plugin.transform(&ctx).await? {
                    ctx.body = Some(body);
                }
            }
        }

        let content_type = match served_type {
            Some(content_type) => content_type,
            None => self
                .plugins
                .iter()
                .find_map(|plugin| plugin.resolve_mime_type(&ctx))
                .map(|mime| mime.content_type())
                .unwrap_or_else(|| determine_content_type(&type_path)),
        };

        let mut body = ctx.body.take().unwrap_or_default();
        if content_type == MimeType::Js.content_type() {
            body = self.rewrite_imports(body, &ctx).await?;
        }

        Ok(PipelineResponse {
            body: body.into_bytes(),
            content_type: Cow::Borrowed(content_type),
        })
    }

    fn file_path(&self, url: &str) -> PathBuf {
        let path = request_file_path(url, &self.config.root_dir);
        if url.split('?').next().is_some_and(|p| p.ends_with('/')) {
            path.join("index.html")
        } else {
            path
        }
    }

    async fn rewrite_imports(
        &self,
        code: String,
        ctx: &RequestContext,
    ) -> Result<String, PipelineError> {
        let imports = match rna_engine::scan_imports(&code, Path::new(&ctx.path)) {
            Ok(imports) => imports,
            Err(e) => {
                // Left for the browser to report.
                tracing::warn!(url = %ctx.url, error = %e, "serving script without import rewriting");
                return Ok(code);
            }
        };

        let mut replacements = Vec::new();
        for import in imports {
            let rewritten = self.rewrite_specifier(&import.specifier, ctx).await?;
            if rewritten != import.specifier {
                replacements.push((import, rewritten));
            }
        }

        if replacements.is_empty() {
            return Ok(code);
        }
        Ok(rna_engine::rewrite_imports(&code, &replacements))
    }

    async fn rewrite_specifier(
        &self,
        specifier: &str,
        ctx: &RequestContext,
    ) -> Result<String, PluginError> {
        let mut source = specifier.to_string();
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve_import(&source, ctx).await? {
                source = resolved;
                break;
            }
        }
        for plugin in &self.plugins {
            if let Some(transformed) = plugin.transform_import(&source, ctx).await? {
                source = transformed;
            }
        }
        Ok(source)
    }
}

fn is_missing(err: &std::io::Error) -> bool {
    // Reading a directory fails with an OS-specific kind.
    matches!(
        err.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
    )
}

/// Content type by file extension.
pub fn determine_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs" | "cjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("map") => "application/json",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

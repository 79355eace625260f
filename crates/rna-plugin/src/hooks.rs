//! Host dev-server plugin contract.
//!
//! The host calls these hooks for every request, in this order: `serve` until a
//! plugin answers, `transform` on the body, `resolve_mime_type` for the
//! content type, and for script responses `resolve_import` followed by
//! `transform_import` on every import specifier. `server_start` runs once
//! before any request.

use async_trait::async_trait;

use crate::context::{RequestContext, ServerConfig};
use crate::error::Result;

/// Content type a plugin assigns to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Js,
    Css,
}

impl MimeType {
    pub fn content_type(&self) -> &'static str {
        match self {
            MimeType::Js => "text/javascript",
            MimeType::Css => "text/css",
        }
    }
}

/// Response produced by a `serve` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeResponse {
    pub body: String,
    /// Overrides the content type chosen by `resolve_mime_type`.
    pub content_type: Option<&'static str>,
    /// Whether the host may cache transform results for this response.
    pub transform_cache: bool,
}

impl ServeResponse {
    /// Synthetic script body.
    pub fn script(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: Some(MimeType::Js.content_type()),
            transform_cache: true,
        }
    }
}

/// A plugin of the host development server.
///
/// Every hook has a no-op default, so plugins implement only what they need.
#[async_trait]
pub trait DevServerPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn server_start(&self, _config: ServerConfig) -> Result<()> {
        Ok(())
    }

    fn resolve_mime_type(&self, _ctx: &RequestContext) -> Option<MimeType> {
        None
    }

    async fn serve(&self, _ctx: &RequestContext) -> Result<Option<ServeResponse>> {
        Ok(None)
    }

    /// Return `Some(body)` to replace the response body.
    async fn transform(&self, _ctx: &RequestContext) -> Result<Option<String>> {
        Ok(None)
    }

    /// Rewrite an import specifier after resolution.
    async fn transform_import(
        &self,
        _source: &str,
        _ctx: &RequestContext,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    /// Resolve an import specifier of the module in `ctx`.
    async fn resolve_import(&self, _source: &str, _ctx: &RequestContext) -> Result<Option<String>> {
        Ok(None)
    }
}

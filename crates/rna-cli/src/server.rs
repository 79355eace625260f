//! HTTP layer: every request goes to the [`RequestPipeline`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, Uri, header},
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{CliError, Result};
use crate::pipeline::{PipelineError, RequestPipeline};

pub struct DevServer {
    pipeline: Arc<RequestPipeline>,
}

impl DevServer {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Bind the configured address and serve until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let config = self.pipeline.config();
        let bind = (config.hostname.as_str(), config.port);

        let listener = tokio::net::TcpListener::bind(bind).await.map_err(|e| {
            CliError::Server(format!("Failed to bind to {}:{}: {}", bind.0, bind.1, e))
        })?;
        let addr: SocketAddr = listener.local_addr()?;

        tracing::info!(
            root = %config.root_dir.display(),
            "Development server running at http://{addr}"
        );

        axum::serve(listener, router(self.pipeline))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Router with the pipeline as fallback for every path.
pub fn router(pipeline: Arc<RequestPipeline>) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(pipeline)
}

async fn handle_request(State(pipeline): State<Arc<RequestPipeline>>, uri: Uri) -> Response {
    let url = uri.path_and_query().map_or("/", |pq| pq.as_str());
    respond(&pipeline, url).await
}

/// Turn the pipeline result for `url` into an HTTP response.
pub async fn respond(pipeline: &RequestPipeline, url: &str) -> Response {
    match pipeline.handle(url).await {
        Ok(response) => build_response(
            StatusCode::OK,
            response.content_type.as_ref(),
            Body::from(response.body),
        ),
        Err(PipelineError::NotFound(path)) => {
            tracing::debug!(url, path = %path.display(), "not found");
            build_response(
                StatusCode::NOT_FOUND,
                "text/plain; charset=utf-8",
                Body::from(format!("Not found: {url}")),
            )
        }
        Err(e) => {
            tracing::error!(url, error = %e, "request failed");
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain; charset=utf-8",
                Body::from(e.to_string()),
            )
        }
    }
}

fn build_response(status: StatusCode, content_type: &str, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    if let Ok(value) = content_type.parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    response
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

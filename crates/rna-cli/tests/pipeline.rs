//! Request pipeline and HTTP responses over a temporary project.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use rna_cli::pipeline::{PipelineError, RequestPipeline};
use rna_cli::server::respond;
use rna_engine::{NodeResolver, RolldownEngine};
use rna_plugin::{
    BundleError, DevServerPlugin, MimeType, PluginError, PluginOptions, RequestContext,
    RnaPlugin, ServeResponse, ServerConfig,
};
use tempfile::TempDir;

/// Plugin exercising every hook with fixed answers.
struct Stub;

#[async_trait]
impl DevServerPlugin for Stub {
    fn name(&self) -> &str {
        "stub"
    }

    fn resolve_mime_type(&self, ctx: &RequestContext) -> Option<MimeType> {
        ctx.path.ends_with(".ts").then_some(MimeType::Js)
    }

    async fn serve(&self, ctx: &RequestContext) -> rna_plugin::Result<Option<ServeResponse>> {
        match ctx.path.as_str() {
            "/virtual.js" => Ok(Some(ServeResponse::script(
                "import dep from 'dep';\nexport default '__VERSION__';\n",
            ))),
            "/broken.js" => Err(PluginError::Bundle(BundleError::NoOutput(PathBuf::from(
                "/node_modules/broken/index.js",
            )))),
            _ => Ok(None),
        }
    }

    async fn transform(&self, ctx: &RequestContext) -> rna_plugin::Result<Option<String>> {
        Ok(ctx.body.as_deref().map(|body| body.replace("__VERSION__", "1.0.0")))
    }

    async fn transform_import(
        &self,
        source: &str,
        _ctx: &RequestContext,
    ) -> rna_plugin::Result<Option<String>> {
        Ok(source.starts_with("/deps/").then(|| format!("{source}?v=1")))
    }

    async fn resolve_import(
        &self,
        source: &str,
        _ctx: &RequestContext,
    ) -> rna_plugin::Result<Option<String>> {
        Ok((source == "dep").then(|| "/deps/dep.js".to_string()))
    }
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<script type=module src=/app.ts></script>").unwrap();
    fs::write(
        dir.path().join("app.ts"),
        "import dep from 'dep';\nimport './local.js';\nconsole.log(dep, '__VERSION__');\n",
    )
    .unwrap();
    fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0xff, 0xfe]).unwrap();
    dir
}

async fn stub_pipeline(dir: &TempDir) -> RequestPipeline {
    let pipeline = RequestPipeline::new(ServerConfig::new(dir.path()), vec![Arc::new(Stub)]);
    pipeline.start().await.unwrap();
    pipeline
}

fn text(body: Vec<u8>) -> String {
    String::from_utf8(body).unwrap()
}

#[tokio::test]
async fn file_is_transformed_and_imports_rewritten() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = pipeline.handle("/app.ts").await.unwrap();
    assert_eq!(response.content_type, "text/javascript");

    let body = text(response.body);
    assert!(body.contains("from '/deps/dep.js?v=1'"), "{body}");
    assert!(body.contains("import './local.js'"), "{body}");
    assert!(body.contains("'1.0.0'"), "{body}");
}

#[tokio::test]
async fn synthetic_responses_skip_transform() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = pipeline.handle("/virtual.js").await.unwrap();
    let body = text(response.body);
    assert!(body.contains("'__VERSION__'"), "{body}");
    assert!(body.contains("'/deps/dep.js?v=1'"), "{body}");
}

#[tokio::test]
async fn directories_serve_index_html() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = pipeline.handle("/").await.unwrap();
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert!(text(response.body).contains("src=/app.ts"));
}

#[tokio::test]
async fn binary_files_pass_through() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = pipeline.handle("/logo.png").await.unwrap();
    assert_eq!(response.content_type, "image/png");
    assert_eq!(response.body, [0x89, b'P', b'N', b'G', 0xff, 0xfe]);
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    assert!(matches!(
        pipeline.handle("/nope.js").await,
        Err(PipelineError::NotFound(_))
    ));

    let response = respond(&pipeline, "/nope.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
}

#[tokio::test]
async fn hook_failures_are_server_errors() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = respond(&pipeline, "/broken.js").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let message = String::from_utf8(body.to_vec()).unwrap();
    assert!(message.contains("failed to bundle dependency"), "{message}");
}

#[tokio::test]
async fn ok_responses_carry_content_type_and_no_cache() {
    let dir = project();
    let pipeline = stub_pipeline(&dir).await;

    let response = respond(&pipeline, "/app.ts").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
}

#[tokio::test]
async fn rna_plugin_tags_stylesheet_imports() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.js"), "import './style.css';\nconsole.log(1);\n").unwrap();
    fs::write(dir.path().join("style.css"), "body { color: red; }\n").unwrap();

    let plugin = RnaPlugin::new(
        PluginOptions::default(),
        Arc::new(NodeResolver::new()),
        Arc::new(RolldownEngine::new()),
    );
    let root = dir.path().canonicalize().unwrap();
    let pipeline = RequestPipeline::new(ServerConfig::new(root), vec![Arc::new(plugin)]);
    pipeline.start().await.unwrap();

    let script = pipeline.handle("/main.js").await.unwrap();
    assert_eq!(script.content_type, "text/javascript");
    let body = text(script.body);
    assert!(body.contains("./style.css?loader=css"), "{body}");

    let module = pipeline.handle("/style.css?loader=css").await.unwrap();
    assert_eq!(module.content_type, "text/javascript");

    let stylesheet = pipeline.handle("/style.css").await.unwrap();
    assert_eq!(stylesheet.content_type, "text/css");
}

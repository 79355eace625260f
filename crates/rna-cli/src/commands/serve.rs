//! `rna serve`: load config, start the plugin and run the HTTP server.

use std::path::Path;
use std::sync::Arc;

use rna_config::{RnaConfig, TransformSettings};
use rna_engine::{NodeResolver, RolldownEngine};
use rna_plugin::{DevServerPlugin, JsxOptions, PluginOptions, RnaPlugin, ServerConfig};

use crate::cli::ServeArgs;
use crate::error::{CliError, Result};
use crate::pipeline::RequestPipeline;
use crate::server::DevServer;

pub async fn serve_execute(args: ServeArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let base = args.root.as_deref().map_or_else(|| cwd.clone(), |root| cwd.join(root));
    let config = RnaConfig::load(&base, args.config.as_deref())?;

    let mut server = server_config(&args, &config, &cwd);
    server.root_dir = match tokio::fs::canonicalize(&server.root_dir).await {
        Ok(root) if root.is_dir() => root,
        _ => return Err(CliError::FileNotFound(server.root_dir)),
    };

    let plugin = RnaPlugin::new(
        plugin_options(&config.transform)?,
        Arc::new(NodeResolver::new()),
        Arc::new(RolldownEngine::new()),
    );
    let plugins: Vec<Arc<dyn DevServerPlugin>> = vec![Arc::new(plugin)];

    let pipeline = RequestPipeline::new(server, plugins);
    pipeline.start().await?;

    DevServer::new(Arc::new(pipeline)).start().await
}

/// Server settings with CLI flags taking precedence over the config.
///
/// A relative `root_dir` from the config is taken from the working directory.
pub fn server_config(args: &ServeArgs, config: &RnaConfig, cwd: &Path) -> ServerConfig {
    let root = args
        .root
        .as_deref()
        .or(config.dev.root_dir.as_deref())
        .map_or_else(|| cwd.to_path_buf(), |root| cwd.join(root));

    let mut server = ServerConfig::new(root);
    server.hostname = args.host.clone().unwrap_or_else(|| config.dev.host.clone());
    server.port = args.port.unwrap_or(config.dev.port);
    server
}

pub fn plugin_options(transform: &TransformSettings) -> Result<PluginOptions> {
    let export = transform
        .jsx_export
        .parse()
        .map_err(CliError::InvalidArgument)?;

    Ok(PluginOptions {
        jsx: JsxOptions {
            factory: transform.jsx_factory.clone(),
            fragment: transform.jsx_fragment.clone(),
            module: transform.jsx_module.clone(),
            export,
        },
        alias: transform.alias.clone(),
        ..Default::default()
    })
}

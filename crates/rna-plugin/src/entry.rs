//! Entry points and the transform configurations built from them.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use path_clean::PathClean;

use crate::classify::Loader;
use crate::context::ServerConfig;
use crate::logging::LogLevel;
use crate::params::split_search_params;
use crate::plugins::{
    BuildPluginSpec, CommonjsInterop, JsxOptions, PluginOptions, StyleImports,
    TransformPluginSpec, WorkerOptions,
};
use crate::resolver::ModuleResolver;

/// ECMAScript version emitted for the browser.
pub const TARGET: &str = "es2020";

/// Chunk naming pattern for dependency builds.
pub const DEPENDENCY_CHUNK_NAMES: &str = "[name]-[hash]";

/// Output module format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Esm,
    Iife,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "esm" => Ok(OutputFormat::Esm),
            "iife" => Ok(OutputFormat::Iife),
            other => Err(format!("Invalid output format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceMapMode {
    #[default]
    Inline,
    External,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Browser,
    Node,
}

/// Per-request overrides read from the request URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOptions {
    /// `?bundle` / `?bundle=false`
    pub bundle: Option<bool>,
    /// `?format=esm|iife`
    pub format: Option<OutputFormat>,
}

impl ChunkOptions {
    pub fn from_url(url: &str) -> Self {
        let (_, params) = split_search_params(url);
        let bundle = params.get("bundle").map(|value| !matches!(value, "false" | "0"));
        let format = params.get("format").and_then(|value| value.parse().ok());
        Self { bundle, format }
    }
}

/// A module to compile, relative to a root directory.
#[derive(Debug, Clone, Default)]
pub struct Entrypoint {
    pub root: PathBuf,
    /// Input path relative to `root`, e.g. `./src/app.tsx`.
    pub input: String,
    /// In-memory source replacing the file contents.
    pub code: Option<String>,
    pub loader: Option<Loader>,
    pub bundle: bool,
    pub chunk: ChunkOptions,
}

impl Entrypoint {
    pub fn input_path(&self) -> PathBuf {
        self.root.join(&self.input).clean()
    }
}

/// Everything the engine needs to compile one entry point.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub root: PathBuf,
    /// Absolute input path.
    pub input: PathBuf,
    pub code: Option<String>,
    pub loader: Option<Loader>,
    pub bundle: bool,
    pub format: OutputFormat,
    pub sourcemap: SourceMapMode,
    pub target: &'static str,
    pub platform: Platform,
    pub jsx: JsxOptions,
    pub alias: IndexMap<String, String>,
    /// Built-ins first, then caller plugins.
    pub plugins: Vec<BuildPluginSpec>,
    /// Built-ins first, then caller plugins.
    pub transform_plugins: Vec<TransformPluginSpec>,
    pub log_level: LogLevel,
    /// Path the entry output is written to (in memory).
    pub output: Option<PathBuf>,
    pub chunk_names: Option<String>,
    pub write: bool,
}

impl TransformConfig {
    /// Derive the configuration used to bundle a dependency into `output`.
    pub fn for_dependency(mut self, output: PathBuf) -> Self {
        self.bundle = true;
        self.chunk_names = Some(DEPENDENCY_CHUNK_NAMES.to_string());
        self.output = Some(output);
        self.jsx.module = None;
        self.write = false;
        self
    }

    pub fn style_imports(&self) -> Option<&StyleImports> {
        self.plugins.iter().find_map(|plugin| match plugin {
            BuildPluginSpec::StyleImports(style) => Some(style),
            BuildPluginSpec::Custom(_) => None,
        })
    }

    pub fn commonjs(&self) -> Option<&CommonjsInterop> {
        self.transform_plugins.iter().find_map(|plugin| match plugin {
            TransformPluginSpec::Commonjs(commonjs) => Some(commonjs),
            _ => None,
        })
    }
}

/// Assemble the transform configuration for `entrypoint`.
///
/// Source maps are inline, the target is es2020 for the browser and the engine
/// reports errors only. The built-in plugins always precede caller plugins.
pub fn create_config(
    entrypoint: Entrypoint,
    server: &ServerConfig,
    options: &PluginOptions,
    resolver: Arc<dyn ModuleResolver>,
) -> TransformConfig {
    let input = entrypoint.input_path();
    let Entrypoint {
        root,
        code,
        loader,
        bundle,
        chunk,
        ..
    } = entrypoint;

    let mut plugins = vec![BuildPluginSpec::StyleImports(StyleImports::new(
        Arc::clone(&resolver),
        server.root_dir.clone(),
    ))];
    plugins.extend(options.plugins.iter().cloned().map(BuildPluginSpec::Custom));

    let mut transform_plugins = vec![
        TransformPluginSpec::Commonjs(CommonjsInterop::new(resolver)),
        TransformPluginSpec::Worker(WorkerOptions { proxy: true }),
    ];
    transform_plugins.extend(
        options
            .transform_plugins
            .iter()
            .cloned()
            .map(TransformPluginSpec::Custom),
    );

    TransformConfig {
        root,
        input,
        code,
        loader,
        bundle: chunk.bundle.unwrap_or(bundle),
        format: chunk.format.unwrap_or_default(),
        sourcemap: SourceMapMode::Inline,
        target: TARGET,
        platform: Platform::Browser,
        jsx: options.jsx.clone(),
        alias: options.alias.clone(),
        plugins,
        transform_plugins,
        log_level: LogLevel::Error,
        output: None,
        chunk_names: None,
        write: false,
    }
}

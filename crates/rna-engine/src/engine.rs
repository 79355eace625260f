//! [`BuildEngine`] backed by rolldown, lightningcss and serde_json.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform, ResolveOptions,
    SourceMapType,
};
use either::Either;
use rolldown_common::{
    BundlerTransformOptions, ChunkFilenamesOutputOption, LogLevel as RolldownLogLevel, Output,
    StrOrBytes,
};
use rna_plugin::entry::{self, SourceMapMode};
use rna_plugin::{
    BuildEngine, BuildOutput, EngineError, Loader, LogLevel, OutputFile, TransformConfig,
    TransformOutput,
};

use crate::css::transform_stylesheet;
use crate::plugins::rolldown_plugins;

/// Compiles modules with rolldown; stylesheets and JSON take dedicated paths.
#[derive(Debug, Clone, Default)]
pub struct RolldownEngine;

impl RolldownEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BuildEngine for RolldownEngine {
    async fn transform(&self, config: &TransformConfig) -> Result<TransformOutput, EngineError> {
        let loader = config
            .loader
            .or_else(|| Loader::from_path(&config.input.to_string_lossy()));
        tracing::debug!(input = %config.input.display(), ?loader, "transform");

        let code = match loader {
            Some(Loader::Css) => {
                let source = entry_source(config).await?;
                transform_stylesheet(&source, &config.input, config.style_imports()).await?
            }
            Some(Loader::Json) => json_module(&entry_source(config).await?, &config.input)?,
            _ => {
                let outputs = generate(config, !config.bundle).await?;
                outputs
                    .into_iter()
                    .find_map(|output| match output {
                        Output::Chunk(chunk) if chunk.is_entry => Some(chunk.code.clone()),
                        _ => None,
                    })
                    .ok_or_else(|| EngineError::Transform {
                        path: config.input.clone(),
                        message: "no entry chunk was produced".to_string(),
                    })?
            }
        };
        Ok(TransformOutput { code })
    }

    async fn build(&self, config: &TransformConfig) -> Result<BuildOutput, EngineError> {
        let entry_path = config.output.clone().unwrap_or_else(|| config.input.clone());

        let outputs = generate(config, false).await?;
        let output_files = outputs
            .into_iter()
            .map(|output| match output {
                Output::Chunk(chunk) => {
                    let path = if chunk.is_entry {
                        entry_path.clone()
                    } else {
                        sibling_output(&entry_path, chunk.filename.as_str())
                    };
                    OutputFile {
                        path,
                        text: chunk.code.clone(),
                    }
                }
                Output::Asset(asset) => OutputFile {
                    path: sibling_output(&entry_path, asset.filename.as_str()),
                    text: match &asset.source {
                        StrOrBytes::Str(s) => s.clone(),
                        StrOrBytes::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
                    },
                },
            })
            .collect();

        if config.write {
            tracing::warn!(
                input = %config.input.display(),
                "build outputs are kept in memory; write is ignored"
            );
        }
        Ok(BuildOutput { output_files })
    }
}

async fn entry_source(config: &TransformConfig) -> Result<String, EngineError> {
    match &config.code {
        Some(code) => Ok(code.clone()),
        None => Ok(tokio::fs::read_to_string(&config.input).await?),
    }
}

fn json_module(source: &str, path: &Path) -> Result<String, EngineError> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| EngineError::Transform {
            path: path.to_path_buf(),
            message: format!("invalid JSON: {e}"),
        })?;
    Ok(format!("export default {value};\n"))
}

/// Run rolldown over `config` and return every output.
async fn generate(config: &TransformConfig, isolate: bool) -> Result<Vec<Output>, EngineError> {
    let failed = |message: String| {
        if isolate {
            EngineError::Transform {
                path: config.input.clone(),
                message,
            }
        } else {
            EngineError::Build {
                path: config.input.clone(),
                message,
            }
        }
    };

    let mut bundler = BundlerBuilder::default()
        .with_options(bundler_options(config))
        .with_plugins(rolldown_plugins(config, isolate))
        .build()
        .map_err(|e| failed(format!("{e:?}")))?;

    let bundle = bundler
        .generate()
        .await
        .map_err(|e| failed(format!("{e:?}")))?;

    Ok(bundle.assets)
}

fn bundler_options(config: &TransformConfig) -> BundlerOptions {
    let name = config
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());

    BundlerOptions {
        input: Some(vec![InputItem {
            name,
            import: config.input.to_string_lossy().into_owned(),
        }]),
        cwd: Some(config.root.clone()),
        format: Some(match config.format {
            entry::OutputFormat::Esm => OutputFormat::Esm,
            entry::OutputFormat::Iife => OutputFormat::Iife,
        }),
        sourcemap: match config.sourcemap {
            SourceMapMode::Inline => Some(SourceMapType::Inline),
            SourceMapMode::External => Some(SourceMapType::File),
            SourceMapMode::None => None,
        },
        platform: Some(match config.platform {
            entry::Platform::Browser => Platform::Browser,
            entry::Platform::Node => Platform::Node,
        }),
        external: Some(IsExternal::from(vec![])),
        resolve: Some(resolve_options(config)),
        transform: Some(BundlerTransformOptions {
            target: Some(Either::Left(config.target.to_string())),
            ..Default::default()
        }),
        chunk_filenames: config
            .chunk_names
            .as_ref()
            .map(|names| ChunkFilenamesOutputOption::String(format!("{names}.js"))),
        log_level: Some(log_level(config.log_level)),
        ..Default::default()
    }
}

/// Rolldown has no error-only level; errors are returned, never logged.
fn log_level(level: LogLevel) -> RolldownLogLevel {
    match level {
        LogLevel::Silent | LogLevel::Error => RolldownLogLevel::Silent,
        LogLevel::Warn => RolldownLogLevel::Warn,
        LogLevel::Info => RolldownLogLevel::Info,
        LogLevel::Debug => RolldownLogLevel::Debug,
    }
}

fn resolve_options(config: &TransformConfig) -> ResolveOptions {
    let alias = (!config.alias.is_empty()).then(|| {
        config
            .alias
            .iter()
            .map(|(from, to)| (from.clone(), vec![Some(to.clone())]))
            .collect()
    });

    let mut modules = Vec::new();
    let mut current: Option<&Path> = Some(&config.root);
    while let Some(dir) = current {
        modules.push(dir.join("node_modules").to_string_lossy().into_owned());
        current = dir.parent();
    }
    modules.push("node_modules".to_string());

    ResolveOptions {
        alias,
        main_fields: Some(["browser", "module", "main"].map(String::from).to_vec()),
        condition_names: Some(
            ["browser", "import", "module", "default"]
                .map(String::from)
                .to_vec(),
        ),
        extensions: Some(
            [".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".json", ".css"]
                .map(String::from)
                .to_vec(),
        ),
        modules: Some(modules),
        symlinks: Some(false),
        ..Default::default()
    }
}

/// Output path of a non-entry file of a dependency build.
pub fn sibling_output(entry_output: &Path, filename: &str) -> PathBuf {
    entry_output
        .parent()
        .map(|dir| dir.join(filename))
        .unwrap_or_else(|| PathBuf::from(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_modules_export_the_value() {
        let code = json_module("{ \"a\": [1, 2] }", Path::new("/d.json")).unwrap();
        assert_eq!(code, "export default {\"a\":[1,2]};\n");
    }

    #[test]
    fn invalid_json_is_a_transform_error() {
        let err = json_module("{ a: 1 }", Path::new("/d.json")).unwrap_err();
        assert!(matches!(err, EngineError::Transform { ref path, .. } if path == Path::new("/d.json")));
    }

    fn dependency_config() -> TransformConfig {
        let root = PathBuf::from("/p/node_modules/x");
        let entry = rna_plugin::Entrypoint {
            root: root.clone(),
            input: "./index.js".into(),
            code: None,
            loader: Some(Loader::Js),
            bundle: false,
            chunk: Default::default(),
        };
        rna_plugin::create_config(
            entry,
            &rna_plugin::ServerConfig::new("/p"),
            &rna_plugin::PluginOptions::default(),
            std::sync::Arc::new(crate::NodeResolver::new()),
        )
        .for_dependency(root.join("index.js"))
    }

    #[test]
    fn fixed_settings_reach_rolldown() {
        let options = bundler_options(&dependency_config());

        let target = options.transform.and_then(|transform| transform.target);
        assert!(matches!(target, Some(Either::Left(ref t)) if t == "es2020"));
        assert!(matches!(
            options.chunk_filenames,
            Some(ChunkFilenamesOutputOption::String(ref names)) if names == "[name]-[hash].js"
        ));
        assert!(matches!(options.log_level, Some(RolldownLogLevel::Silent)));
    }

    #[test]
    fn single_file_transforms_keep_default_chunk_names() {
        let mut config = dependency_config();
        config.chunk_names = None;
        assert!(bundler_options(&config).chunk_filenames.is_none());
    }

    #[test]
    fn chunks_land_next_to_the_entry() {
        assert_eq!(
            sibling_output(Path::new("/p/node_modules/x/index.js"), "chunk-1a2b.js"),
            PathBuf::from("/p/node_modules/x/chunk-1a2b.js")
        );
    }
}

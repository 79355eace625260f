//! In-memory resolver and engine used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use path_clean::PathClean;
use rna_plugin::{
    BuildEngine, BuildOutput, EngineError, ModuleResolver, OutputFile, TransformConfig,
    TransformOutput,
};

pub const ROOT: &str = "/project";

#[derive(Default)]
pub struct MockResolver {
    modules: HashMap<String, PathBuf>,
    links: HashMap<PathBuf, PathBuf>,
    packages: HashSet<PathBuf>,
    core: HashSet<String>,
    pub resolve_calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        let mut resolver = Self::default();
        resolver.core.extend(["fs", "path", "events"].map(String::from));
        resolver
    }

    /// Register an installed package whose entry is `<root>/node_modules/<name>/<main>`.
    pub fn with_package(mut self, name: &str, main: &str) -> Self {
        let package_root = Path::new(ROOT).join("node_modules").join(name);
        self.modules
            .insert(name.to_string(), package_root.join(main));
        self.packages.insert(package_root);
        self
    }

    /// Make the package entry a symlink to somewhere else.
    pub fn with_link(mut self, name: &str, target: &str) -> Self {
        let resolved = self.modules[name].clone();
        self.links.insert(resolved, PathBuf::from(target));
        self
    }
}

#[async_trait]
impl ModuleResolver for MockResolver {
    async fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf, EngineError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = importer.parent().unwrap_or(Path::new(ROOT));
            return Ok(base.join(specifier).clean());
        }
        self.modules
            .get(specifier)
            .cloned()
            .ok_or_else(|| EngineError::Unresolved {
                specifier: specifier.to_string(),
                importer: importer.to_path_buf(),
            })
    }

    fn is_core(&self, specifier: &str) -> bool {
        self.core
            .contains(specifier.strip_prefix("node:").unwrap_or(specifier))
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf, EngineError> {
        Ok(self
            .links
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_path_buf()))
    }

    async fn package_root(&self, path: &Path) -> Option<PathBuf> {
        path.ancestors()
            .find(|dir| self.packages.contains(*dir))
            .map(Path::to_path_buf)
    }
}

/// Outcome the engine produces for builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Entry plus one shared chunk.
    #[default]
    WithChunk,
    Empty,
    Fail,
    /// Outputs that never include the entry.
    WrongEntry,
}

#[derive(Default)]
pub struct CountingEngine {
    pub mode: BuildMode,
    pub builds: AtomicUsize,
    pub transforms: AtomicUsize,
    pub build_configs: Mutex<Vec<TransformConfig>>,
    pub transform_configs: Mutex<Vec<TransformConfig>>,
}

impl CountingEngine {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.load(Ordering::SeqCst)
    }

    pub fn last_transform(&self) -> TransformConfig {
        self.transform_configs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("engine transformed something")
    }

    pub fn last_build(&self) -> TransformConfig {
        self.build_configs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("engine built something")
    }
}

#[async_trait]
impl BuildEngine for CountingEngine {
    async fn transform(&self, config: &TransformConfig) -> Result<TransformOutput, EngineError> {
        self.transforms.fetch_add(1, Ordering::SeqCst);
        self.transform_configs.lock().unwrap().push(config.clone());
        let loader = config.loader.map(|l| l.to_string()).unwrap_or_default();
        Ok(TransformOutput {
            code: format!(
                "// {loader} {}\n{}",
                config.input.display(),
                config.code.clone().unwrap_or_default()
            ),
        })
    }

    async fn build(&self, config: &TransformConfig) -> Result<BuildOutput, EngineError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.build_configs.lock().unwrap().push(config.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let output = config.output.clone().unwrap_or_else(|| config.input.clone());
        let dir = output.parent().unwrap_or(Path::new(ROOT)).to_path_buf();
        match self.mode {
            BuildMode::Fail => Err(EngineError::Build {
                path: config.input.clone(),
                message: "unexpected token".to_string(),
            }),
            BuildMode::Empty => Ok(BuildOutput::default()),
            BuildMode::WrongEntry => Ok(BuildOutput {
                output_files: vec![OutputFile {
                    path: dir.join("other.js"),
                    text: "export {};".to_string(),
                }],
            }),
            BuildMode::WithChunk => Ok(BuildOutput {
                output_files: vec![
                    OutputFile {
                        path: output.clone(),
                        text: format!(
                            "import './chunk-abc123.js';\n// bundled {}\n",
                            config.input.display()
                        ),
                    },
                    OutputFile {
                        path: dir.join("chunk-abc123.js"),
                        text: "export const shared = 1;\n".to_string(),
                    },
                ],
            }),
        }
    }
}

//! Build and transform plugins passed to the engine.
//!
//! Every transform configuration carries the built-in plugins first, followed by
//! whatever the caller registered. The engine decides how each plugin is
//! realised; the built-ins expose their decisions as plain async methods so the
//! engine can call them from its own hook machinery.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::context::{is_outside_root_dir, resolve_relative_import};
use crate::resolver::ModuleResolver;

/// Result type for caller-supplied plugin hooks.
pub type PluginResult<T> = anyhow::Result<T>;

/// Resolution returned by a caller build plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub id: String,
    pub external: bool,
}

/// Caller plugin participating in module resolution and loading.
#[async_trait]
pub trait BuildPlugin: Send + Sync + fmt::Debug {
    fn name(&self) -> Cow<'static, str>;

    async fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
    ) -> PluginResult<Option<ResolvedModule>> {
        Ok(None)
    }

    async fn load(&self, _id: &str) -> PluginResult<Option<String>> {
        Ok(None)
    }
}

/// Caller plugin rewriting module source after loading.
#[async_trait]
pub trait TransformPlugin: Send + Sync + fmt::Debug {
    fn name(&self) -> Cow<'static, str>;

    /// Return `Some(code)` to replace the module source.
    async fn transform(&self, code: &str, id: &str) -> PluginResult<Option<String>>;
}

/// Rewrites stylesheet `@import` references into host-relative specifiers.
#[derive(Clone)]
pub struct StyleImports {
    resolver: Arc<dyn ModuleResolver>,
    root_dir: PathBuf,
}

impl StyleImports {
    pub fn new(resolver: Arc<dyn ModuleResolver>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// New reference for `@import "<import_path>"` found in `file_path`.
    ///
    /// `None` leaves the reference untouched: it already points outside the
    /// root, or it cannot be resolved.
    pub async fn rewrite(&self, import_path: &str, file_path: &Path) -> Option<String> {
        if is_outside_root_dir(import_path) {
            return None;
        }
        match self.resolver.resolve(import_path, file_path).await {
            Ok(resolved) => Some(resolve_relative_import(
                &resolved,
                file_path,
                &self.root_dir,
            )),
            Err(err) => {
                tracing::debug!(import = import_path, error = %err, "style import left untouched");
                None
            }
        }
    }
}

impl fmt::Debug for StyleImports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleImports")
            .field("root_dir", &self.root_dir)
            .finish_non_exhaustive()
    }
}

/// CommonJS interop: decides which `require` targets stay external.
#[derive(Clone)]
pub struct CommonjsInterop {
    resolver: Arc<dyn ModuleResolver>,
}

impl CommonjsInterop {
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self { resolver }
    }

    /// A specifier is ignored only when it cannot be resolved and names a
    /// runtime built-in.
    pub async fn should_ignore(&self, specifier: &str, importer: &Path) -> bool {
        match self.resolver.resolve(specifier, importer).await {
            Ok(_) => false,
            Err(_) => self.resolver.is_core(specifier),
        }
    }
}

impl fmt::Debug for CommonjsInterop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonjsInterop").finish_non_exhaustive()
    }
}

/// Web worker handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Proxy worker construction through a same-origin blob instead of
    /// inlining the worker source.
    pub proxy: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self { proxy: true }
    }
}

/// Plugins taking part in resolution and loading.
#[derive(Debug, Clone)]
pub enum BuildPluginSpec {
    StyleImports(StyleImports),
    Custom(Arc<dyn BuildPlugin>),
}

impl BuildPluginSpec {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            BuildPluginSpec::StyleImports(_) => "rna:style-imports".into(),
            BuildPluginSpec::Custom(plugin) => plugin.name(),
        }
    }
}

/// Plugins rewriting loaded source.
#[derive(Debug, Clone)]
pub enum TransformPluginSpec {
    Commonjs(CommonjsInterop),
    Worker(WorkerOptions),
    Custom(Arc<dyn TransformPlugin>),
}

impl TransformPluginSpec {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            TransformPluginSpec::Commonjs(_) => "rna:commonjs".into(),
            TransformPluginSpec::Worker(_) => "rna:worker".into(),
            TransformPluginSpec::Custom(plugin) => plugin.name(),
        }
    }
}

/// How the JSX runtime module exposes its factory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsxExport {
    /// `import { h, Fragment } from 'module'`
    #[default]
    Named,
    /// `import h from 'module'`
    Default,
    /// `import * as h from 'module'`
    Namespace,
}

impl std::str::FromStr for JsxExport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "named" => Ok(JsxExport::Named),
            "default" => Ok(JsxExport::Default),
            "namespace" => Ok(JsxExport::Namespace),
            other => Err(format!("Invalid JSX export kind: {other}")),
        }
    }
}

/// JSX compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsxOptions {
    /// Factory expression, e.g. `h` or `React.createElement`.
    pub factory: Option<String>,
    /// Fragment expression, e.g. `Fragment` or `React.Fragment`.
    pub fragment: Option<String>,
    /// Module the factory is imported from.
    pub module: Option<String>,
    pub export: JsxExport,
}

impl JsxOptions {
    /// Import statement bringing the factory into scope, if a module is set.
    pub fn import_statement(&self) -> Option<String> {
        let module = self.module.as_deref()?;
        let factory = binding(self.factory.as_deref().unwrap_or("React.createElement"));
        let statement = match self.export {
            JsxExport::Named => {
                let mut names = vec![factory];
                if let Some(fragment) = self.fragment.as_deref().map(binding) {
                    if fragment != factory {
                        names.push(fragment);
                    }
                }
                format!("import {{ {} }} from '{}';", names.join(", "), module)
            }
            JsxExport::Default => format!("import {factory} from '{module}';"),
            JsxExport::Namespace => format!("import * as {factory} from '{module}';"),
        };
        Some(statement)
    }
}

/// Root binding of a dotted expression: `React.createElement` -> `React`.
fn binding(expression: &str) -> &str {
    expression.split('.').next().unwrap_or(expression)
}

/// Caller options shared by every transform configuration.
#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    pub jsx: JsxOptions,
    /// Exact-match specifier substitutions.
    pub alias: IndexMap<String, String>,
    /// Appended after the built-in build plugins.
    pub plugins: Vec<Arc<dyn BuildPlugin>>,
    /// Appended after the built-in transform plugins.
    pub transform_plugins: Vec<Arc<dyn TransformPlugin>>,
}

impl PluginOptions {
    /// Apply the alias table to `specifier`.
    pub fn apply_alias<'a>(&'a self, specifier: &'a str) -> &'a str {
        self.alias
            .get(specifier)
            .map(String::as_str)
            .unwrap_or(specifier)
    }
}

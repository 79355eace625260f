//! Rolldown plugins realising a [`TransformConfig`].
//!
//! Order matters: the entry source comes first, then isolation (single-module
//! transforms), then the build plugins and the transform plugins of the
//! configuration in the order they were listed.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    __inner::SharedPluginable, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs,
    HookResolveIdOutput, HookResolveIdReturn, HookTransformArgs, HookTransformOutput,
    HookTransformReturn, HookUsage, Plugin, PluginContext, SharedTransformPluginContext,
};
use rna_plugin::{
    BuildPlugin, BuildPluginSpec, CommonjsInterop, Loader, StyleImports, TransformConfig,
    TransformPlugin, TransformPluginSpec, WorkerOptions,
};

use crate::css::rewrite_style_imports;
use crate::jsx::{accepts_jsx, jsx_prelude};
use crate::worker::proxy_workers;

pub(crate) fn module_type(loader: Loader) -> ModuleType {
    match loader {
        Loader::Js => ModuleType::Js,
        Loader::Jsx => ModuleType::Jsx,
        Loader::Ts => ModuleType::Ts,
        Loader::Tsx => ModuleType::Tsx,
        Loader::Json => ModuleType::Json,
        Loader::Css => ModuleType::Css,
    }
}

fn replaced(code: String) -> HookTransformReturn {
    Ok(Some(HookTransformOutput {
        code: Some(code),
        map: None,
        side_effects: None,
        module_type: None,
    }))
}

fn external(id: String) -> HookResolveIdReturn {
    Ok(Some(HookResolveIdOutput {
        id: id.into(),
        external: Some(ResolvedExternal::Bool(true)),
        ..Default::default()
    }))
}

/// Serves in-memory source for the entry module.
#[derive(Debug, Clone)]
pub struct EntrySourcePlugin {
    id: String,
    code: Arc<str>,
    loader: Option<Loader>,
}

impl EntrySourcePlugin {
    pub fn new(id: impl Into<String>, code: impl Into<Arc<str>>, loader: Option<Loader>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            loader,
        }
    }
}

impl Plugin for EntrySourcePlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:entry-source".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let claimed = args.specifier == self.id;
        let id = self.id.clone();

        async move {
            if !claimed {
                return Ok(None);
            }
            Ok(Some(HookResolveIdOutput {
                id: id.into(),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let claimed = args.id == self.id;
        let code = Arc::clone(&self.code);
        let module_type = self
            .loader
            .or_else(|| Loader::from_path(&self.id))
            .map(module_type);

        async move {
            if !claimed {
                return Ok(None);
            }
            Ok(Some(HookLoadOutput {
                code: code.to_string().into(),
                module_type,
                ..Default::default()
            }))
        }
    }
}

/// Marks every import of the entry external, so only the entry is compiled.
#[derive(Debug, Clone)]
pub struct IsolateEntryPlugin {
    entry: String,
}

impl IsolateEntryPlugin {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
        }
    }
}

impl Plugin for IsolateEntryPlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:isolate-entry".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let from_entry = args.importer.is_some_and(|importer| importer == self.entry);
        let specifier = args.specifier.to_string();

        async move {
            if from_entry {
                external(specifier)
            } else {
                Ok(None)
            }
        }
    }
}

/// Rewrites `@import` rules of stylesheets in the graph.
#[derive(Debug, Clone)]
pub struct StyleImportsPlugin {
    style: StyleImports,
}

impl StyleImportsPlugin {
    pub fn new(style: StyleImports) -> Self {
        Self { style }
    }
}

impl Plugin for StyleImportsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:style-imports".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let id = args.id.to_string();
        let code = args.code.to_string();
        let style = self.style.clone();

        async move {
            if Loader::from_path(&id) != Some(Loader::Css) {
                return Ok(None);
            }
            let rewritten = rewrite_style_imports(&code, Path::new(&id), &style).await;
            if rewritten == code {
                Ok(None)
            } else {
                replaced(rewritten)
            }
        }
    }
}

/// Keeps unresolvable runtime built-ins out of the bundle.
#[derive(Debug, Clone)]
pub struct CommonjsPlugin {
    interop: CommonjsInterop,
}

impl CommonjsPlugin {
    pub fn new(interop: CommonjsInterop) -> Self {
        Self { interop }
    }
}

impl Plugin for CommonjsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:commonjs".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(str::to_string);
        let interop = self.interop.clone();

        async move {
            let Some(importer) = importer else {
                return Ok(None);
            };
            if interop.should_ignore(&specifier, Path::new(&importer)).await {
                tracing::debug!(%specifier, %importer, "built-in left external");
                return external(specifier);
            }
            Ok(None)
        }
    }
}

/// Proxies module worker construction through a blob URL.
#[derive(Debug, Clone)]
pub struct WorkerPlugin {
    options: WorkerOptions,
}

impl WorkerPlugin {
    pub fn new(options: WorkerOptions) -> Self {
        Self { options }
    }
}

impl Plugin for WorkerPlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:worker".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let enabled = self.options.proxy;
        let code = args.code.to_string();

        async move {
            match proxy_workers(&code) {
                Some(proxied) if enabled => replaced(proxied),
                _ => Ok(None),
            }
        }
    }
}

/// Prepends JSX pragmas (and the factory import) to JSX modules.
#[derive(Debug, Clone)]
pub struct JsxPreludePlugin {
    prelude: String,
    entry: String,
    entry_loader: Option<Loader>,
}

impl JsxPreludePlugin {
    pub fn new(prelude: String, entry: impl Into<String>, entry_loader: Option<Loader>) -> Self {
        Self {
            prelude,
            entry: entry.into(),
            entry_loader,
        }
    }
}

impl Plugin for JsxPreludePlugin {
    fn name(&self) -> Cow<'static, str> {
        "rna:jsx".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let loader = if args.id == self.entry {
            self.entry_loader.or_else(|| Loader::from_path(args.id))
        } else {
            Loader::from_path(args.id)
        };
        let wanted = loader.is_some_and(accepts_jsx);
        let code = args.code.to_string();
        let prelude = self.prelude.clone();

        async move {
            if !wanted {
                return Ok(None);
            }
            replaced(format!("{prelude}{code}"))
        }
    }
}

/// Runs a caller [`BuildPlugin`] inside rolldown.
#[derive(Debug, Clone)]
pub struct BuildPluginAdapter(pub Arc<dyn BuildPlugin>);

impl Plugin for BuildPluginAdapter {
    fn name(&self) -> Cow<'static, str> {
        self.0.name()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let plugin = Arc::clone(&self.0);
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(str::to_string);

        async move {
            let resolved = plugin.resolve_id(&specifier, importer.as_deref()).await?;
            Ok(resolved.map(|module| HookResolveIdOutput {
                id: module.id.into(),
                external: Some(ResolvedExternal::Bool(module.external)),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let plugin = Arc::clone(&self.0);
        let id = args.id.to_string();

        async move {
            let code = plugin.load(&id).await?;
            Ok(code.map(|code| HookLoadOutput {
                code: code.into(),
                module_type: Loader::from_path(&id).map(module_type),
                ..Default::default()
            }))
        }
    }
}

/// Runs a caller [`TransformPlugin`] inside rolldown.
#[derive(Debug, Clone)]
pub struct TransformPluginAdapter(pub Arc<dyn TransformPlugin>);

impl Plugin for TransformPluginAdapter {
    fn name(&self) -> Cow<'static, str> {
        self.0.name()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let plugin = Arc::clone(&self.0);
        let id = args.id.to_string();
        let code = args.code.to_string();

        async move {
            match plugin.transform(&code, &id).await? {
                Some(code) => replaced(code),
                None => Ok(None),
            }
        }
    }
}

/// Rolldown plugin list for `config`.
///
/// With `isolate` set, every import of the entry stays external.
pub fn rolldown_plugins(config: &TransformConfig, isolate: bool) -> Vec<SharedPluginable> {
    let entry = config.input.to_string_lossy().into_owned();
    let mut plugins: Vec<SharedPluginable> = Vec::new();

    if let Some(code) = &config.code {
        plugins.push(Arc::new(EntrySourcePlugin::new(
            entry.clone(),
            code.as_str(),
            config.loader,
        )));
    }
    if isolate {
        plugins.push(Arc::new(IsolateEntryPlugin::new(entry.clone())));
    }

    for plugin in &config.plugins {
        match plugin {
            BuildPluginSpec::StyleImports(style) => {
                plugins.push(Arc::new(StyleImportsPlugin::new(style.clone())));
            }
            BuildPluginSpec::Custom(custom) => {
                plugins.push(Arc::new(BuildPluginAdapter(Arc::clone(custom))));
            }
        }
    }

    if let Some(prelude) = jsx_prelude(&config.jsx) {
        plugins.push(Arc::new(JsxPreludePlugin::new(prelude, entry, config.loader)));
    }

    for plugin in &config.transform_plugins {
        match plugin {
            TransformPluginSpec::Commonjs(interop) => {
                plugins.push(Arc::new(CommonjsPlugin::new(interop.clone())));
            }
            TransformPluginSpec::Worker(options) => {
                plugins.push(Arc::new(WorkerPlugin::new(*options)));
            }
            TransformPluginSpec::Custom(custom) => {
                plugins.push(Arc::new(TransformPluginAdapter(Arc::clone(custom))));
            }
        }
    }

    plugins
}

//! # rna-plugin
//!
//! On-demand module handling for a development server.
//!
//! Browsers import everything as ES modules, but a project imports stylesheets,
//! JSON, images and npm packages too. This crate sits between the browser and
//! the host server and makes every such request answerable:
//!
//! - imports are tagged (`?loader=css`, `?loader=json`, `?loader=file`) so the
//!   follow-up request says how it wants to be handled;
//! - tagged stylesheets and assets are answered with small synthetic modules;
//! - sources are compiled one file at a time by a [`BuildEngine`];
//! - bare package imports are bundled once per resolved file and served from
//!   an in-memory [`VirtualFs`], with concurrent requests sharing one build.
//!
//! The host drives everything through the [`DevServerPlugin`] hooks that
//! [`RnaPlugin`] implements. Resolution and compilation are behind the
//! [`ModuleResolver`] and [`BuildEngine`] traits; `rna-engine` provides
//! implementations on top of oxc and rolldown.
//!
//! rna emits `tracing` events and never installs a subscriber.

pub mod classify;
pub mod context;
pub mod dependency;
pub mod engine;
pub mod entry;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod params;
pub mod plugin;
pub mod plugins;
pub mod resolver;
pub mod synthetic;
pub mod virtual_fs;

pub use classify::{Loader, RequestKind, classify_request};
pub use context::{RequestContext, ServerConfig};
pub use dependency::DependencyBundler;
pub use engine::{BuildEngine, BuildOutput, OutputFile, TransformOutput};
pub use entry::{ChunkOptions, Entrypoint, OutputFormat, TransformConfig, create_config};
pub use error::{BundleError, EngineError, PluginError, Result};
pub use hooks::{DevServerPlugin, MimeType, ServeResponse};
pub use logging::LogLevel;
pub use plugin::RnaPlugin;
pub use plugins::{
    BuildPlugin, BuildPluginSpec, CommonjsInterop, JsxExport, JsxOptions, PluginOptions,
    PluginResult, ResolvedModule, StyleImports, TransformPlugin, TransformPluginSpec,
    WorkerOptions,
};
pub use resolver::ModuleResolver;
pub use virtual_fs::VirtualFs;

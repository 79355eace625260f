//! # rna-engine
//!
//! Concrete collaborators for [`rna_plugin`]:
//!
//! - [`NodeResolver`]: package resolution via `oxc_resolver`, symlinks kept
//! - [`RolldownEngine`]: module transforms and dependency bundles via rolldown,
//!   stylesheets via lightningcss
//! - [`scan_imports`] / [`rewrite_imports`]: specifier rewriting for served
//!   modules
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rna_engine::{NodeResolver, RolldownEngine};
//! use rna_plugin::{PluginOptions, RnaPlugin};
//!
//! let plugin = RnaPlugin::new(
//!     PluginOptions::default(),
//!     Arc::new(NodeResolver::new()),
//!     Arc::new(RolldownEngine::new()),
//! );
//! # let _ = plugin;
//! ```

pub mod css;
pub mod engine;
pub mod imports;
pub mod jsx;
pub mod plugins;
pub mod resolver;
pub mod worker;

pub use engine::RolldownEngine;
pub use imports::{ImportSpecifier, rewrite_imports, scan_imports};
pub use resolver::{NodeResolver, is_node_builtin};

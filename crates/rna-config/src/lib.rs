pub mod config;
pub mod discovery;
pub mod error;
pub mod loading;

pub use config::*;
pub use discovery::ConfigDiscovery;
pub use error::*;
pub use loading::ENV_PREFIX;

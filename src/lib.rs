pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::HttpRegistryClient;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{service::MarkService, sql::Transition};
pub use utils::error::{MarkError, Result};

// src/config/mod.rs

//! Configuration for the `hmr` binary (`Hmr.toml`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, NamespaceSection, RawConfigFile, UnitEntry, WatchSection};

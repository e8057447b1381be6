//! Fixed names used under the config and data directories

pub const APP_DIR: &str = "hafiz";
pub const CONFIG_FILE: &str = "config.toml";
pub const CATALOG_FILE: &str = "catalog.toml";
pub const CONTENT_DIR: &str = "content";

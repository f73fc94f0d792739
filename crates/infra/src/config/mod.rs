//! Configuration loading
//!
//! Loads the application [`Config`](questlog_domain::Config) from the
//! environment, a JSON/TOML file, or defaults.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

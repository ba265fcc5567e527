pub mod config;
pub mod paths;

pub use config::{Config, LoggingConfig, StoreConfig, UserConfig, default_collection};
pub use paths::{PathManager, base_path_override};

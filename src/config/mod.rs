//! Configuration loading and validation for the EVM chain indexer.
//!
//! Configuration is loaded from two sources, in order of precedence:
//! 1. Environment variables (`EVMI_` prefix, `__` nesting separator)
//! 2. The file at `CONFIG_FILE_PATH` (default `/tmp/evm-indexer/config.json`)
//!
//! # Example
//!
//! ```ignore
//! use evm_indexer::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("instance: {}", settings.instance_id);
//! ```

mod settings;

pub use settings::{
    ApiSettings, CacheSettings, DatabaseSettings, IggySettings, LoggingSettings, MetricsSettings,
    Settings, DEFAULT_CONFIG_FILE_PATH, DEFAULT_INSTANCE_ID,
};

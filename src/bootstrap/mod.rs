//! Process bootstrap helpers: configuration loading and logging setup.

pub mod config;
pub mod tracing;

pub use config::{load_config, EventSourceConfig, LoggingConfig, SignalConfig};
pub use self::tracing::init_tracing_subscriber;

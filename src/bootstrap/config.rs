//! # Configuration Loader / 配置加载器
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Read a TOML file into [`SignalConfig`] / 将 TOML 文件读入 [`SignalConfig`]
//! - ✅ Fill missing sections and keys with defaults / 缺失的段和键使用默认值
//! - ✅ Report I/O and parsing errors with the file path / 报告带文件路径的 I/O 和解析错误
//!
//! An empty file is a valid config.
//!
//! ```toml
//! [event_source]
//! thread_name = "clipsignal-event-source"
//! poll_interval_ms = 500
//! window_class = "Button"
//! open_attempts = 5
//! open_retry_delay_ms = 10
//!
//! [logging]
//! level = "info"
//! log_dir = "/var/log/clipsignal"
//! ansi = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use cs_platform::PlatformOptions;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub event_source: EventSourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventSourceConfig {
    pub thread_name: String,
    pub poll_interval_ms: u64,
    pub window_class: String,
    pub open_attempts: u32,
    pub open_retry_delay_ms: u64,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        let options = PlatformOptions::default();
        Self {
            thread_name: options.thread_name,
            poll_interval_ms: duration_ms(options.poll_interval),
            window_class: options.window_class,
            open_attempts: options.open_attempts,
            open_retry_delay_ms: duration_ms(options.open_retry_delay),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a log file here when set.
    pub log_dir: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            ansi: true,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl SignalConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse config as TOML")
    }

    pub fn platform_options(&self) -> PlatformOptions {
        let source = &self.event_source;
        PlatformOptions {
            thread_name: source.thread_name.clone(),
            poll_interval: Duration::from_millis(source.poll_interval_ms),
            window_class: source.window_class.clone(),
            open_attempts: source.open_attempts,
            open_retry_delay: Duration::from_millis(source.open_retry_delay_ms),
        }
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// this structure (for example a string where a number is expected).
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<SignalConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    SignalConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))
}

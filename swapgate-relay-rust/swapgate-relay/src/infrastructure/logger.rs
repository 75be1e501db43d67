use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{Once, OnceLock};
use tracing::{error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling, rolling::Rotation};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

static INIT: Once = Once::new();
// Keeps the non-blocking file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub service_name: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_directory: String,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "swapgate-relay".to_string(),
            enable_console: true,
            enable_file: false,
            log_directory: "logs".to_string(),
            enable_colors: true,
            enable_thread_ids: false,
            enable_file_line: false,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    /// Daily-rotated file output is opt-in through `LOG_DIR`.
    pub fn from_env(level: &str) -> Self {
        let mut config = Self::default().with_level(level);
        if let Ok(dir) = std::env::var("LOG_DIR") {
            if !dir.is_empty() {
                config.enable_file = true;
                config.log_directory = dir;
            }
        }
        config
    }

    pub fn tracing_level(&self) -> Level {
        parse_level(&self.level)
    }

    /// Default directive when `RUST_LOG` is unset: our crates at the
    /// configured level, actix access logs at info.
    pub fn default_directive(&self) -> String {
        let level = self.tracing_level();
        format!("swapgate_relay={level},swapgate_core={level},actix_web=info")
    }
}

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

pub struct Logger;

impl Logger {
    pub fn init(log_level: &str) {
        Self::init_with(LogConfig::from_env(log_level));
    }

    pub fn init_with(config: LogConfig) {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

            let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

            if config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(config.enable_thread_ids)
                    .with_file(config.enable_file_line)
                    .with_line_number(config.enable_file_line)
                    .with_ansi(config.enable_colors)
                    .with_writer(std::io::stdout);
                layers.push(Box::new(console_layer));
            }

            if config.enable_file {
                if let Err(e) = fs::create_dir_all(&config.log_directory) {
                    eprintln!("Failed to create log directory {}: {e}", config.log_directory);
                } else {
                    let file_appender = rolling::RollingFileAppender::new(
                        Rotation::DAILY,
                        &config.log_directory,
                        format!("{}.log", config.service_name),
                    );
                    let (writer, guard) = non_blocking(file_appender);
                    let _ = FILE_GUARD.set(guard);
                    let file_layer = fmt::layer()
                        .with_timer(UtcTime::rfc_3339())
                        .with_thread_ids(config.enable_thread_ids)
                        .with_ansi(false)
                        .with_writer(writer);
                    layers.push(Box::new(file_layer));
                }
            }

            // `log` records from swapgate-core flow through the same subscriber.
            if let Err(e) = Registry::default().with(env_filter).with(layers).try_init() {
                eprintln!("Logger already initialised: {e}");
            }
        });
    }

    pub fn swap_request(kind: &str, chain_id: u64, sell_token: &str, buy_token: &str) {
        info!(kind, chain_id, sell_token, buy_token, "Swap request received");
    }

    pub fn swap_served(kind: &str, chain_id: u64, elapsed_ms: u128) {
        info!(kind, chain_id, elapsed_ms = elapsed_ms as u64, "Swap request served");
    }

    pub fn swap_failed(kind: &str, chain_id: u64, status: u16, error: &str) {
        if status >= 500 {
            error!(kind, chain_id, status, error, "Swap request failed");
        } else {
            warn!(kind, chain_id, status, error, "Swap request rejected");
        }
    }

    pub fn rate_limit_hit(client: &str) {
        warn!("Rate limit hit for client: {}", client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_default_directive() {
        let config = LogConfig::default().with_level("debug");
        assert_eq!(
            config.default_directive(),
            "swapgate_relay=DEBUG,swapgate_core=DEBUG,actix_web=info"
        );
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LogConfig { enable_console: false, ..Default::default() };
        Logger::init_with(config.clone());
        Logger::init_with(config);
        Logger::rate_limit_hit("127.0.0.1");
    }
}

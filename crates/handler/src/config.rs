use crate::backend::ExecutionProvider;
use std::env;
use std::path::PathBuf;

pub use common::{Environment, LogLevel};

/// Default short-side target for the YOLO-family transform when the request
/// carries no hint.
pub const DEFAULT_SHORT_SIZE: u32 = 416;

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub environment: Environment,
    pub log_level: LogLevel,
    pub execution_provider: ExecutionProvider,
    pub model_dir: Option<PathBuf>,
    pub short_size: u32,
}

impl HandlerConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();
        let log_level = LogLevel::from_env();

        let execution_provider = match env::var("EXECUTION_PROVIDER")
            .unwrap_or_else(|_| "cpu".to_string())
            .to_lowercase()
            .as_str()
        {
            "cuda" | "gpu" => ExecutionProvider::Cuda,
            _ => ExecutionProvider::Cpu,
        };

        let model_dir = env::var("MODEL_DIR").ok().map(PathBuf::from);

        let short_size = env::var("SHORT_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SHORT_SIZE);

        Ok(Self {
            environment,
            log_level,
            execution_provider,
            model_dir,
            short_size,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: LogLevel::Info,
            execution_provider: ExecutionProvider::Cpu,
            model_dir: None,
            short_size: DEFAULT_SHORT_SIZE,
        }
    }
}

//! Configuration for the kgate predicates.
//!
//! The label keys, exclusion names and tracked kinds that drive every
//! reconcile decision live in one [`GateConfig`], built once at startup and
//! shared read-only afterwards.
//!
//! Priority order (lowest to highest):
//! 1. Defaults - the Rook operator conventions
//! 2. File config - `kgate.toml`
//! 3. Environment variables - `KGATE__*` pattern

pub mod loader;
pub mod settings;

pub use loader::{DEFAULT_CONFIG_FILE, ENV_PREFIX, load_config};
pub use settings::{
    DiffConfig, ExclusionConfig, GateConfig, KindConfig, LabelConfig, LoggingConfig,
    PrimaryKindConfig,
};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

use thiserror::Error;

/// Core error types for kgate decisions
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Malformed object snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown object kind: {0}")]
    UnknownKind(String),

    #[error("Invalid apiVersion {api_version:?} on owner reference {owner}")]
    InvalidApiVersion { api_version: String, owner: String },

    #[error("Cannot read {field} from {object}: {reason}")]
    Accessor {
        object: String,
        field: String,
        reason: String,
    },

    #[error("Invalid quantity: {0:?}")]
    InvalidQuantity(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GateError {
    /// Create a new MalformedSnapshot error
    pub fn malformed_snapshot(reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            reason: reason.into(),
        }
    }

    /// Create a new UnknownKind error
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind(kind.into())
    }

    /// Create a new InvalidApiVersion error
    pub fn invalid_api_version(api_version: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::InvalidApiVersion {
            api_version: api_version.into(),
            owner: owner.into(),
        }
    }

    /// Create a new Accessor error
    pub fn accessor(
        object: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Accessor {
            object: object.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidQuantity error
    pub fn invalid_quantity(raw: impl Into<String>) -> Self {
        Self::InvalidQuantity(raw.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedSnapshot { .. } | Self::Serialization(_) | Self::InvalidQuantity(_) => {
                ErrorCategory::Diff
            }
            Self::UnknownKind(_) | Self::InvalidApiVersion { .. } => ErrorCategory::OwnerResolution,
            Self::Accessor { .. } => ErrorCategory::Accessor,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// How a predicate must degrade when it hits this error.
    pub fn policy(&self) -> FailurePolicy {
        self.category().policy()
    }
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Diff,
    OwnerResolution,
    Accessor,
    Configuration,
}

impl ErrorCategory {
    pub fn policy(&self) -> FailurePolicy {
        match self {
            ErrorCategory::Diff => FailurePolicy::FailOpen,
            ErrorCategory::OwnerResolution => FailurePolicy::FailClosed,
            ErrorCategory::Accessor => FailurePolicy::BestEffort,
            ErrorCategory::Configuration => FailurePolicy::RejectSetup,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Diff => "diff",
            ErrorCategory::OwnerResolution => "owner_resolution",
            ErrorCategory::Accessor => "accessor",
            ErrorCategory::Configuration => "configuration",
        };
        write!(f, "{name}")
    }
}

/// Degradation policy attached to an error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Treat the event as a change and reconcile.
    FailOpen,
    /// Treat the event as a non-match and skip it.
    FailClosed,
    /// Log and continue with defaults.
    BestEffort,
    /// Only raised while building predicates; setup reports it to the caller.
    RejectSetup,
}

/// Result type alias for kgate operations
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = GateError::unknown_kind("CephWidget");
        assert!(matches!(error, GateError::UnknownKind(_)));
        assert_eq!(error.to_string(), "Unknown object kind: CephWidget");

        let error = GateError::invalid_api_version("a/b/c", "CephCluster/my-cluster");
        assert!(error.to_string().contains("a/b/c"));
        assert!(error.to_string().contains("CephCluster/my-cluster"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            GateError::malformed_snapshot("root is an array").category(),
            ErrorCategory::Diff
        );
        assert_eq!(
            GateError::unknown_kind("Foo").category(),
            ErrorCategory::OwnerResolution
        );
        assert_eq!(
            GateError::accessor("ConfigMap/x", "metadata.resourceVersion", "missing").category(),
            ErrorCategory::Accessor
        );
        assert_eq!(
            GateError::configuration("duplicate kind").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_failure_policies() {
        assert_eq!(
            GateError::malformed_snapshot("x").policy(),
            FailurePolicy::FailOpen
        );
        assert_eq!(
            GateError::invalid_api_version("", "x").policy(),
            FailurePolicy::FailClosed
        );
        assert_eq!(
            GateError::accessor("x", "y", "z").policy(),
            FailurePolicy::BestEffort
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid").unwrap_err();
        let error: GateError = json_error.into();
        assert!(matches!(error, GateError::Serialization(_)));
        assert_eq!(error.category(), ErrorCategory::Diff);
    }
}

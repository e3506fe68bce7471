//! Error types for Dakiya operations

use crate::{CatalogKind, ConversationId, ConversationStatus};
use thiserror::Error;

/// Entity-extraction errors. All variants are recovered locally by the
/// dialogue engine with a generic re-prompt; none of them abort a
/// conversation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Inference provider {provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Inference call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed inference output from {provider}: {reason}")]
    Malformed { provider: String, reason: String },
}

/// Reference-data lookup errors. The catalog falls back to the built-in
/// default set when the lookup fails at load time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Fetching {kind:?} list failed: {reason}")]
    FetchFailed { kind: CatalogKind, reason: String },

    #[error("Fetching {kind:?} list timed out after {timeout_ms}ms")]
    Timeout { kind: CatalogKind, timeout_ms: u64 },

    #[error("Malformed {kind:?} list: {reason}")]
    Malformed { kind: CatalogKind, reason: String },
}

/// Submission errors, split by retryability: a validation rejection is
/// terminal, a transport failure leaves the conversation in `Ready` for a
/// caller-initiated retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Submission rejected: {reason}")]
    ValidationRejected { reason: String },

    #[error("Submission transport failure: {reason}")]
    Transport { reason: String },

    #[error("Submission timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl SubmitError {
    /// Whether the same submission may be retried without re-collecting
    /// entities.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Conversation lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Conversation not found: {id}")]
    NotFound { id: ConversationId },

    #[error("Submission in progress for conversation {id}; utterance rejected")]
    SubmissionInProgress { id: ConversationId },

    #[error("Conversation {id} is closed with status {status:?}")]
    Closed {
        id: ConversationId,
        status: ConversationStatus,
    },

    #[error("Conversation {id} is not ready for submission (status {status:?})")]
    NotReady {
        id: ConversationId,
        status: ConversationStatus,
    },

    #[error("Utterance must not be empty")]
    EmptyUtterance,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Dakiya operations.
#[derive(Debug, Clone, Error)]
pub enum DakiyaError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Dakiya operations.
pub type DakiyaResult<T> = Result<T, DakiyaError>;

// ============================================================================
// TESTS
// ============================================================================

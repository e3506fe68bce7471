//! Engine configuration

use crate::{ConfigError, DakiyaResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the dialogue engine.
///
/// `call_timeout` bounds every outbound collaborator call (inference,
/// catalog fetch, submission); a timeout surfaces as a typed failure, never
/// as a hang.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on any single collaborator call.
    pub call_timeout: Duration,
    /// Optional cap on clarification rounds before the conversation fails.
    /// Off by default: the engine keeps asking until the caller abandons.
    /// Extraction failures never count toward this cap.
    pub max_clarify_turns: Option<u32>,
    /// Whether a failed catalog fetch falls back to the built-in default
    /// list instead of erroring out.
    pub allow_catalog_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            max_clarify_turns: None,
            allow_catalog_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// Validates:
    /// - call_timeout is non-zero
    /// - max_clarify_turns, when set, is non-zero
    pub fn validate(&self) -> DakiyaResult<()> {
        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "call_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if self.max_clarify_turns == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_clarify_turns".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1 when set".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! Enumerations shared across the Dakiya engine

use serde::{Deserialize, Serialize};

// ============================================================================
// FIELD KEYS
// ============================================================================

/// The closed set of recognized parcel fields.
///
/// The engine never accepts fields outside this enumeration; extracted
/// key/value pairs that do not map to one of these are discarded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Company,
    OriginCity,
    DestinationCity,
    WeightKg,
    Material,
}

impl FieldKey {
    /// All required fields, in the fixed order used for clarifying questions:
    /// company, origin, destination, weight, material. The ordering is part
    /// of the engine contract so prompts are deterministic regardless of the
    /// order in which fields were extracted.
    pub const REQUIRED: [FieldKey; 5] = [
        FieldKey::Company,
        FieldKey::OriginCity,
        FieldKey::DestinationCity,
        FieldKey::WeightKg,
        FieldKey::Material,
    ];

    /// Wire/display name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::OriginCity => "originCity",
            Self::DestinationCity => "destinationCity",
            Self::WeightKg => "weightKg",
            Self::Material => "material",
        }
    }

    /// Parse from the wire name.
    pub fn from_str_name(s: &str) -> Result<Self, FieldKeyParseError> {
        match s {
            "company" => Ok(Self::Company),
            "originCity" => Ok(Self::OriginCity),
            "destinationCity" => Ok(Self::DestinationCity),
            "weightKg" => Ok(Self::WeightKg),
            "material" => Ok(Self::Material),
            _ => Err(FieldKeyParseError(s.to_string())),
        }
    }
}

/// Error parsing a FieldKey from its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKeyParseError(pub String);

impl std::fmt::Display for FieldKeyParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized field: {}", self.0)
    }
}

impl std::error::Error for FieldKeyParseError {}

// ============================================================================
// FIELD ORIGIN / STATUS
// ============================================================================

/// How a stated field value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrigin {
    /// Explicitly given by the user (exact catalog match or literal value).
    Stated,
    /// Derived indirectly, e.g. resolved through a catalog alias.
    Inferred,
}

/// Uniform per-field status view, independent of the field's value type.
/// Used by the completeness validator and surfaced in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "raw")]
pub enum FieldStatus {
    /// Never mentioned; no judgment made about validity.
    Unset,
    /// Given and resolved.
    Stated,
    /// Given but failed resolution or validation; carries the original text.
    Invalid(String),
}

// ============================================================================
// CONVERSATION STATUS
// ============================================================================

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// Accumulating entities across turns (initial state).
    Collecting,
    /// All required fields stated and resolved; submission may proceed.
    Ready,
    /// A submission call is in flight. Further utterances are rejected,
    /// never queued.
    Submitting,
    /// Terminal: submission succeeded, receipt recorded.
    Submitted,
    /// Terminal: submission collaborator rejected the data.
    Failed,
    /// Terminal: caller reset the conversation before completion.
    Abandoned,
}

impl ConversationStatus {
    /// Whether the conversation can never accept another turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Failed | Self::Abandoned)
    }

    /// Display string, stable for logs and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
}

// ============================================================================
// CATALOG KIND
// ============================================================================

/// Which reference list a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    City,
    Material,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Material => "material",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! Core entity structures: the entity set, conversation, and catalog types.

use crate::{
    CatalogEntryId, CatalogKind, ConversationId, ConversationStatus, FieldKey, FieldOrigin,
    FieldStatus, Timestamp, TurnId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// FIELD VALUES
// ============================================================================

/// A city resolved against the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRef {
    pub canonical_id: CatalogEntryId,
    pub display_name: String,
}

/// A material resolved against the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRef {
    pub canonical_id: CatalogEntryId,
    pub display_name: String,
}

/// Parcel weight in kilograms. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Weight(f64);

/// Error constructing or parsing a [`Weight`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidWeight(pub String);

impl std::fmt::Display for InvalidWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid weight: {}", self.0)
    }
}

impl std::error::Error for InvalidWeight {}

impl Weight {
    /// Create a weight from kilograms. Rejects non-finite and non-positive
    /// values.
    pub fn new(kg: f64) -> Result<Self, InvalidWeight> {
        if !kg.is_finite() || kg <= 0.0 {
            return Err(InvalidWeight(format!("{kg}")));
        }
        Ok(Self(kg))
    }

    /// Parse a weight from user-facing text: `50`, `50kg`, `2.5 kg`,
    /// `50 kilograms` are all accepted. Unit is assumed to be kilograms.
    pub fn parse(raw: &str) -> Result<Self, InvalidWeight> {
        let trimmed = raw.trim().to_ascii_lowercase();
        let numeric = trimmed
            .trim_end_matches("kilograms")
            .trim_end_matches("kilogram")
            .trim_end_matches("kgs")
            .trim_end_matches("kg")
            .trim();
        let value: f64 = numeric
            .parse()
            .map_err(|_| InvalidWeight(raw.to_string()))?;
        Self::new(value).map_err(|_| InvalidWeight(raw.to_string()))
    }

    /// Weight in kilograms.
    pub fn kg(&self) -> f64 {
        self.0
    }
}

// ============================================================================
// FIELD STATE
// ============================================================================

/// Per-field tagged state. A field is never silently cleared once stated;
/// a later turn may only overwrite it with a new explicit value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum FieldState<T> {
    /// Never mentioned.
    Unset,
    /// Given and resolved.
    Stated { value: T, origin: FieldOrigin },
    /// Given but failed resolution; the original text is preserved for the
    /// clarifying prompt.
    Invalid { raw: String, reason: String },
}

impl<T> FieldState<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_stated(&self) -> bool {
        matches!(self, Self::Stated { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// The resolved value, if stated.
    pub fn stated_value(&self) -> Option<&T> {
        match self {
            Self::Stated { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The original text of an invalid field, if any.
    pub fn invalid_raw(&self) -> Option<&str> {
        match self {
            Self::Invalid { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Uniform status view independent of the value type.
    pub fn status(&self) -> FieldStatus {
        match self {
            Self::Unset => FieldStatus::Unset,
            Self::Stated { .. } => FieldStatus::Stated,
            Self::Invalid { raw, .. } => FieldStatus::Invalid(raw.clone()),
        }
    }

    /// Merge a per-turn delta into this field. A `Stated` or `Invalid`
    /// incoming value overwrites; an `Unset` incoming value never clears a
    /// previously stated field.
    pub fn merge(&mut self, incoming: FieldState<T>) {
        if !incoming.is_unset() {
            *self = incoming;
        }
    }
}

impl<T> Default for FieldState<T> {
    fn default() -> Self {
        Self::Unset
    }
}

// ============================================================================
// ENTITY SETS
// ============================================================================

/// The merged entity set of a conversation: a closed, explicitly enumerated
/// record with a per-field tagged state, not an open map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySet {
    pub company: FieldState<String>,
    pub origin_city: FieldState<CityRef>,
    pub destination_city: FieldState<CityRef>,
    pub weight_kg: FieldState<Weight>,
    pub material: FieldState<MaterialRef>,
}

impl EntitySet {
    /// An entity set with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a per-turn delta set into this one, field by field. Only
    /// `Stated` or `Invalid` incoming fields overwrite; `Unset` incoming
    /// fields leave the existing state untouched.
    pub fn merge(&mut self, delta: EntitySet) {
        self.company.merge(delta.company);
        self.origin_city.merge(delta.origin_city);
        self.destination_city.merge(delta.destination_city);
        self.weight_kg.merge(delta.weight_kg);
        self.material.merge(delta.material);
    }

    /// Uniform status of a single field.
    pub fn status_of(&self, key: FieldKey) -> FieldStatus {
        match key {
            FieldKey::Company => self.company.status(),
            FieldKey::OriginCity => self.origin_city.status(),
            FieldKey::DestinationCity => self.destination_city.status(),
            FieldKey::WeightKg => self.weight_kg.status(),
            FieldKey::Material => self.material.status(),
        }
    }

    /// Number of stated fields. Used as a cheap monotonicity probe in tests
    /// and logs.
    pub fn stated_count(&self) -> usize {
        FieldKey::REQUIRED
            .iter()
            .filter(|k| self.status_of(**k) == FieldStatus::Stated)
            .count()
    }
}

/// Candidate entities extracted from a single utterance. Covers only fields
/// the inference collaborator found evidence for in that utterance; absent
/// fields are `None`, never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateEntities {
    pub company: Option<String>,
    pub origin_city: Option<String>,
    pub destination_city: Option<String>,
    pub weight: Option<String>,
    pub material: Option<String>,
}

impl CandidateEntities {
    /// True when the utterance yielded no recognizable field at all.
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.origin_city.is_none()
            && self.destination_city.is_none()
            && self.weight.is_none()
            && self.material.is_none()
    }
}

/// A fully stated and resolved entity set, ready for submission. Constructed
/// only by the completeness validator; holds canonical IDs, never raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteEntitySet {
    pub company: String,
    pub origin_city: CityRef,
    pub destination_city: CityRef,
    pub weight_kg: Weight,
    pub material: MaterialRef,
}

// ============================================================================
// CATALOG
// ============================================================================

/// One entry of the reference catalog (a city or a material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical_id: CatalogEntryId,
    pub display_name: String,
    pub aliases: Vec<String>,
}

impl CatalogEntry {
    pub fn new(canonical_id: impl Into<CatalogEntryId>, display_name: impl Into<String>) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            display_name: display_name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Output of a catalog lookup. `NoMatch` is distinct from `NotMentioned`:
/// the former is a user-supplied name the catalog does not know, the latter
/// means the field was absent from the utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Match {
        kind: CatalogKind,
        entry: CatalogEntry,
        confidence: f32,
    },
    NoMatch {
        kind: CatalogKind,
        raw: String,
    },
    NotMentioned,
}

// ============================================================================
// CONVERSATION
// ============================================================================

/// One utterance processed by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: TurnId,
    pub sequence: i32,
    pub utterance: String,
    pub created_at: Timestamp,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub tracking_id: String,
    /// Quoted cost in the carrier's minor currency unit.
    pub cost: i64,
}

/// One end-to-end parcel request attempt: the ordered turns, the merged
/// entity set, and the lifecycle status. Owned exclusively by the dialogue
/// engine for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub turns: Vec<Turn>,
    pub entities: EntitySet,
    pub status: ConversationStatus,
    /// Completed clarification rounds (turns that extracted successfully but
    /// left the set incomplete). Extraction failures do not count.
    pub clarify_rounds: u32,
    pub receipt: Option<SubmissionReceipt>,
    pub failure: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Create a fresh conversation in the `Collecting` state.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            conversation_id: Uuid::now_v7(),
            turns: Vec::new(),
            entities: EntitySet::new(),
            status: ConversationStatus::Collecting,
            clarify_rounds: 0,
            receipt: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, preserving arrival order.
    pub fn record_turn(&mut self, utterance: &str) -> TurnId {
        let turn = Turn {
            turn_id: Uuid::now_v7(),
            sequence: self.turns.len() as i32,
            utterance: utterance.to_string(),
            created_at: Utc::now(),
        };
        let id = turn.turn_id;
        self.turns.push(turn);
        self.touch();
        id
    }

    /// Transition to `Ready` once every required field is stated and valid.
    pub fn mark_ready(&mut self) {
        self.status = ConversationStatus::Ready;
        self.touch();
    }

    /// Transition to `Submitting` while the submission call is in flight.
    pub fn mark_submitting(&mut self) {
        self.status = ConversationStatus::Submitting;
        self.touch();
    }

    /// Terminal success: record the collaborator's receipt verbatim.
    pub fn mark_submitted(&mut self, receipt: SubmissionReceipt) {
        self.status = ConversationStatus::Submitted;
        self.receipt = Some(receipt);
        self.touch();
    }

    /// Terminal failure: the submission collaborator rejected the data.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = ConversationStatus::Failed;
        self.failure = Some(reason.into());
        self.touch();
    }

    /// Terminal reset by the caller.
    pub fn mark_abandoned(&mut self) {
        self.status = ConversationStatus::Abandoned;
        self.touch();
    }

    /// Return to `Ready` after a transport-level submission failure so the
    /// caller can retry without re-collecting entities.
    pub fn mark_retryable(&mut self) {
        self.status = ConversationStatus::Ready;
        self.touch();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

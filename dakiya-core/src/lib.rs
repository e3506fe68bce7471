//! Dakiya Core - Entity Types
//!
//! Pure data structures with no behavior beyond constructors and state
//! helpers. All other crates depend on this. The extraction pipeline,
//! catalog resolution, and dialogue state machine live elsewhere.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use config::EngineConfig;
pub use entities::{
    CandidateEntities, CatalogEntry, CityRef, CompleteEntitySet, Conversation, EntitySet,
    FieldState, InvalidWeight, MaterialRef, ResolutionOutcome, SubmissionReceipt, Turn, Weight,
};
pub use enums::{CatalogKind, ConversationStatus, FieldKey, FieldOrigin, FieldStatus};
pub use error::{
    CatalogError, ConfigError, ConversationError, DakiyaError, DakiyaResult, ExtractError,
    SubmitError,
};
pub use identity::{new_entity_id, CatalogEntryId, ConversationId, EntityId, Timestamp, TurnId};

//! Identity types for Dakiya entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Identifier of a single conversation (one end-to-end parcel request attempt).
pub type ConversationId = Uuid;

/// Identifier of a single turn within a conversation.
pub type TurnId = Uuid;

/// Canonical identifier assigned by the reference-data service to a city or
/// material. Opaque to the engine; the upstream service uses hex object IDs.
pub type CatalogEntryId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

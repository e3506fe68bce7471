//! Dakiya Engine - Dialogue State Machine and Resolution Pipeline
//!
//! Ties the extraction layer to the reference catalog, validates
//! completeness of the merged entity set, drives the per-conversation state
//! machine, and orchestrates submission to the parcel service.

pub mod catalog;
pub mod dialogue;
pub mod resolver;
pub mod submit;
pub mod validator;

pub use catalog::{CatalogSource, MockCatalogSource, ReferenceCatalog};
pub use dialogue::{DialogueEngine, TurnOutcome};
pub use resolver::resolve_turn;
pub use submit::{MockParcelSubmitter, ParcelSubmitter};
pub use validator::{validate, Completeness, FieldIssue, IssueReason};

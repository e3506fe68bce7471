//! Reference catalog
//!
//! Immutable snapshot of the serviced cities and material types, built once
//! from a [`CatalogSource`]. A failed fetch falls back to the built-in
//! default set so the dialogue can keep working offline; `refresh` always
//! builds a new snapshot rather than mutating one in place.

use async_trait::async_trait;
use chrono::Utc;
use dakiya_core::{CatalogEntry, CatalogError, CatalogKind, ResolutionOutcome, Timestamp};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// CATALOG SOURCE TRAIT
// ============================================================================

/// Trait for reference-data sources. Implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full list of serviced cities.
    async fn list_cities(&self) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Fetch the full list of accepted material types.
    async fn list_materials(&self) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Stable identifier of this source, used in logs.
    fn source_id(&self) -> &str;
}

// ============================================================================
// REFERENCE CATALOG
// ============================================================================

/// Immutable catalog snapshot with a normalized lookup index.
///
/// Lookup is two-tier: an exact match on the display name resolves with
/// full confidence, an alias match with reduced confidence. Normalization
/// lowercases and strips surrounding whitespace and punctuation, so
/// "Jaipur", " jaipur " and "jaipur." all resolve to the same entry.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    cities: Vec<CatalogEntry>,
    materials: Vec<CatalogEntry>,
    city_index: HashMap<String, IndexSlot>,
    material_index: HashMap<String, IndexSlot>,
    fallback: bool,
    loaded_at: Timestamp,
}

#[derive(Debug, Clone, Copy)]
struct IndexSlot {
    position: usize,
    exact: bool,
}

const EXACT_CONFIDENCE: f32 = 1.0;
const ALIAS_CONFIDENCE: f32 = 0.9;

impl ReferenceCatalog {
    /// Build a snapshot from already-fetched entry lists.
    pub fn from_entries(cities: Vec<CatalogEntry>, materials: Vec<CatalogEntry>) -> Self {
        Self {
            city_index: build_index(&cities),
            material_index: build_index(&materials),
            cities,
            materials,
            fallback: false,
            loaded_at: Utc::now(),
        }
    }

    /// The built-in default set used when the upstream source is down.
    pub fn builtin_fallback() -> Self {
        let cities = vec![
            CatalogEntry::new("jaipur", "Jaipur"),
            CatalogEntry::new("kolkata", "Kolkata"),
        ];
        let materials = vec![
            CatalogEntry::new("paint", "Paint"),
            CatalogEntry::new("chemicals", "Chemicals"),
        ];
        let mut catalog = Self::from_entries(cities, materials);
        catalog.fallback = true;
        catalog
    }

    /// Fetch both lists from a source and build a snapshot.
    ///
    /// Each fetch is bounded by `timeout`. On any failure the built-in
    /// fallback set is returned when `allow_fallback` is set, otherwise the
    /// error propagates.
    pub async fn load(
        source: &dyn CatalogSource,
        timeout: Duration,
        allow_fallback: bool,
    ) -> Result<Self, CatalogError> {
        let fetched = Self::fetch(source, timeout).await;
        match fetched {
            Ok((cities, materials)) => Ok(Self::from_entries(cities, materials)),
            Err(err) if allow_fallback => {
                tracing::warn!(
                    source = source.source_id(),
                    error = %err,
                    "catalog fetch failed, using built-in fallback set"
                );
                Ok(Self::builtin_fallback())
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch(
        source: &dyn CatalogSource,
        timeout: Duration,
    ) -> Result<(Vec<CatalogEntry>, Vec<CatalogEntry>), CatalogError> {
        let timeout_ms = timeout.as_millis() as u64;
        let cities = tokio::time::timeout(timeout, source.list_cities())
            .await
            .map_err(|_| CatalogError::Timeout {
                kind: CatalogKind::City,
                timeout_ms,
            })??;
        let materials = tokio::time::timeout(timeout, source.list_materials())
            .await
            .map_err(|_| CatalogError::Timeout {
                kind: CatalogKind::Material,
                timeout_ms,
            })??;
        Ok((cities, materials))
    }

    /// Resolve a raw user-supplied name against one catalog kind.
    pub fn resolve(&self, kind: CatalogKind, raw: &str) -> ResolutionOutcome {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return ResolutionOutcome::NoMatch {
                kind,
                raw: raw.to_string(),
            };
        }
        let (index, entries) = match kind {
            CatalogKind::City => (&self.city_index, &self.cities),
            CatalogKind::Material => (&self.material_index, &self.materials),
        };
        match index.get(&normalized) {
            Some(slot) => ResolutionOutcome::Match {
                kind,
                entry: entries[slot.position].clone(),
                confidence: if slot.exact {
                    EXACT_CONFIDENCE
                } else {
                    ALIAS_CONFIDENCE
                },
            },
            None => ResolutionOutcome::NoMatch {
                kind,
                raw: raw.to_string(),
            },
        }
    }

    /// Whether this snapshot is the built-in fallback set.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn cities(&self) -> &[CatalogEntry] {
        &self.cities
    }

    pub fn materials(&self) -> &[CatalogEntry] {
        &self.materials
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_lowercase()
}

fn build_index(entries: &[CatalogEntry]) -> HashMap<String, IndexSlot> {
    let mut index = HashMap::new();
    // Display names first so an alias never shadows an exact name.
    for (position, entry) in entries.iter().enumerate() {
        index.insert(
            normalize(&entry.display_name),
            IndexSlot {
                position,
                exact: true,
            },
        );
    }
    for (position, entry) in entries.iter().enumerate() {
        for alias in &entry.aliases {
            index.entry(normalize(alias)).or_insert(IndexSlot {
                position,
                exact: false,
            });
        }
    }
    index
}

// ============================================================================
// MOCK SOURCE FOR TESTING
// ============================================================================

/// Catalog source with canned responses, for tests.
pub struct MockCatalogSource {
    cities: Result<Vec<CatalogEntry>, CatalogError>,
    materials: Result<Vec<CatalogEntry>, CatalogError>,
}

impl MockCatalogSource {
    pub fn with_entries(cities: Vec<CatalogEntry>, materials: Vec<CatalogEntry>) -> Self {
        Self {
            cities: Ok(cities),
            materials: Ok(materials),
        }
    }

    pub fn failing() -> Self {
        Self {
            cities: Err(CatalogError::FetchFailed {
                kind: CatalogKind::City,
                reason: "mock failure".to_string(),
            }),
            materials: Err(CatalogError::FetchFailed {
                kind: CatalogKind::Material,
                reason: "mock failure".to_string(),
            }),
        }
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn list_cities(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.cities.clone()
    }

    async fn list_materials(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.materials.clone()
    }

    fn source_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// TESTS
// ============================================================================

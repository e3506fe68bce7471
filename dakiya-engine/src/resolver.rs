//! Reference resolver
//!
//! Turns the extractor's raw candidate strings into a per-turn entity delta
//! set: catalog matches become `Stated` references, unknown names become
//! `Invalid` with the original text preserved, absent fields stay `Unset`.

use crate::ReferenceCatalog;
use dakiya_core::{
    CandidateEntities, CatalogKind, CityRef, EntitySet, FieldOrigin, FieldState, MaterialRef,
    ResolutionOutcome, Weight,
};

/// Resolve one turn's candidates into an entity delta set.
///
/// The returned set covers only fields the candidates mention; the caller
/// merges it into the conversation's accumulated set, so a field absent
/// here never clears one stated earlier.
pub fn resolve_turn(candidates: &CandidateEntities, catalog: &ReferenceCatalog) -> EntitySet {
    let mut delta = EntitySet::new();

    if let Some(company) = &candidates.company {
        let trimmed = company.trim();
        if !trimmed.is_empty() {
            delta.company = FieldState::Stated {
                value: trimmed.to_string(),
                origin: FieldOrigin::Stated,
            };
        }
    }

    if let Some(raw) = &candidates.origin_city {
        delta.origin_city = resolve_city(catalog, raw);
    }
    if let Some(raw) = &candidates.destination_city {
        delta.destination_city = resolve_city(catalog, raw);
    }

    if let Some(raw) = &candidates.weight {
        delta.weight_kg = match Weight::parse(raw) {
            Ok(weight) => FieldState::Stated {
                value: weight,
                origin: FieldOrigin::Stated,
            },
            Err(_) => FieldState::Invalid {
                raw: raw.clone(),
                reason: "not a positive weight in kilograms".to_string(),
            },
        };
    }

    if let Some(raw) = &candidates.material {
        delta.material = match catalog.resolve(CatalogKind::Material, raw) {
            ResolutionOutcome::Match {
                entry, confidence, ..
            } => FieldState::Stated {
                value: MaterialRef {
                    canonical_id: entry.canonical_id,
                    display_name: entry.display_name,
                },
                origin: origin_for(confidence),
            },
            _ => FieldState::Invalid {
                raw: raw.clone(),
                reason: "material not in the accepted list".to_string(),
            },
        };
    }

    delta
}

fn resolve_city(catalog: &ReferenceCatalog, raw: &str) -> FieldState<CityRef> {
    match catalog.resolve(CatalogKind::City, raw) {
        ResolutionOutcome::Match {
            entry, confidence, ..
        } => FieldState::Stated {
            value: CityRef {
                canonical_id: entry.canonical_id,
                display_name: entry.display_name,
            },
            origin: origin_for(confidence),
        },
        _ => FieldState::Invalid {
            raw: raw.to_string(),
            reason: "city not serviced".to_string(),
        },
    }
}

fn origin_for(confidence: f32) -> FieldOrigin {
    if confidence >= 1.0 {
        FieldOrigin::Stated
    } else {
        FieldOrigin::Inferred
    }
}

// ============================================================================
// TESTS
// ============================================================================

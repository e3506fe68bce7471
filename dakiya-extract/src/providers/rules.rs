//! Rule-based extraction fallback
//!
//! Deterministic regex parse used when the hosted inference provider is
//! unreachable. It only reports fields the utterance plainly states; it
//! never guesses and never fills a field from context.

use crate::InferenceProvider;
use async_trait::async_trait;
use dakiya_core::{CandidateEntities, EntitySet, ExtractError};
use once_cell::sync::Lazy;
use regex::Regex;

// "for Acme Logistics, from ..." - company runs until a comma, a following
// "from", or end of line.
static COMPANY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfor\s+(.+?)(?:\s+from\s|,|$)").expect("company regex"));

// "from jaipur to kolkata"
static ROUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(\w+)\s+to\s+(\w+)").expect("route regex"));

// "route is jaipur to kolkata"
static ROUTE_IS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\broute\s+is\s+(\w+)\s+to\s+(\w+)").expect("route-is regex"));

// "50kg", "2.5 kg", "75 kilograms"
static WEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:kgs?|kilograms?)\b").expect("weight regex")
});

// "material like paint", "material type chemicals", "material paint"
static MATERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmaterial\s+(?:like\s+|type\s+)?(\w+)").expect("material regex")
});

// "50kg of paint" - the token right after the weight phrase.
static AFTER_WEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:kgs?|kilograms?)\s+(?:of\s+)?(\w+)")
        .expect("after-weight regex")
});

// Connectives that can trail the weight phrase without naming a material.
const MATERIAL_STOPWORDS: [&str; 6] = ["from", "to", "of", "for", "and", "the"];

/// Regex-based inference provider. Stateless and infallible: any utterance
/// it cannot parse simply yields an empty candidate set.
#[derive(Debug, Default)]
pub struct RuleBasedProvider;

impl RuleBasedProvider {
    pub fn new() -> Self {
        Self
    }

    fn parse(utterance: &str) -> CandidateEntities {
        let mut candidates = CandidateEntities::default();

        if let Some(caps) = COMPANY_RE.captures(utterance) {
            let name = caps[1].trim();
            if !name.is_empty() {
                candidates.company = Some(name.to_string());
            }
        }

        if let Some(caps) = ROUTE_RE
            .captures(utterance)
            .or_else(|| ROUTE_IS_RE.captures(utterance))
        {
            candidates.origin_city = Some(caps[1].to_string());
            candidates.destination_city = Some(caps[2].to_string());
        }

        if let Some(caps) = WEIGHT_RE.captures(utterance) {
            candidates.weight = Some(caps[0].trim().to_string());
        }

        if let Some(caps) = MATERIAL_RE.captures(utterance) {
            candidates.material = Some(caps[1].to_string());
        } else if let Some(caps) = AFTER_WEIGHT_RE.captures(utterance) {
            let token = caps[1].to_string();
            if !MATERIAL_STOPWORDS.contains(&token.to_lowercase().as_str()) {
                candidates.material = Some(token);
            }
        }

        candidates
    }
}

#[async_trait]
impl InferenceProvider for RuleBasedProvider {
    async fn infer(
        &self,
        utterance: &str,
        _context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        Ok(Self::parse(utterance))
    }

    fn provider_id(&self) -> &str {
        "rules"
    }
}

// ============================================================================
// TESTS
// ============================================================================

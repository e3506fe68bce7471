//! Dakiya Extract - Entity Extraction Layer
//!
//! Provider-agnostic trait for turning a raw utterance into candidate
//! entities, plus the [`Extractor`] wrapper that bounds every call with a
//! timeout and optionally falls back to a second provider. Concrete
//! providers live in [`providers`]; a scriptable mock for tests lives here.

use async_trait::async_trait;
use dakiya_core::{CandidateEntities, EntitySet, ExtractError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod providers;

pub use providers::{HttpInferenceProvider, RuleBasedProvider};

// ============================================================================
// INFERENCE PROVIDER TRAIT
// ============================================================================

/// Trait for inference providers (the external `infer(text, context)`
/// collaborator). Implementations must be thread-safe (Send + Sync).
///
/// The contract: return candidates only for fields the utterance itself
/// gives evidence for. The prior merged entity set is passed as context for
/// disambiguation (e.g. a bare "ABC Company" answering a clarifying
/// question), never as a source of values to echo back.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Extract candidate entities from a single utterance.
    ///
    /// # Arguments
    /// * `utterance` - The raw user text (non-empty)
    /// * `context` - The conversation's merged entity set so far
    ///
    /// # Returns
    /// * `Ok(CandidateEntities)` - Fields evidenced in this utterance
    /// * `Err(ExtractError)` - Provider unreachable or output malformed
    async fn infer(
        &self,
        utterance: &str,
        context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError>;

    /// Stable identifier of this provider, used in error messages and logs.
    fn provider_id(&self) -> &str;
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Bounds every inference call with a timeout and optionally chains a
/// fallback provider, typically the rule-based parser standing in for an
/// unreachable hosted model. Neither path invents values for fields the
/// utterance does not state.
pub struct Extractor {
    provider: Arc<dyn InferenceProvider>,
    fallback: Option<Arc<dyn InferenceProvider>>,
    call_timeout: Duration,
}

impl Extractor {
    /// Create an extractor over a single provider.
    pub fn new(provider: Arc<dyn InferenceProvider>, call_timeout: Duration) -> Self {
        Self {
            provider,
            fallback: None,
            call_timeout,
        }
    }

    /// Chain a fallback provider consulted only when the primary fails.
    pub fn with_fallback(mut self, fallback: Arc<dyn InferenceProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Extract candidate entities from an utterance.
    ///
    /// A timeout or provider failure on the primary falls through to the
    /// fallback when one is configured; if both fail, the primary's error
    /// is returned. The caller treats any error as "no new information".
    pub async fn extract(
        &self,
        utterance: &str,
        context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        let primary_err = match self.call(self.provider.as_ref(), utterance, context).await {
            Ok(candidates) => return Ok(candidates),
            Err(err) => err,
        };

        if let Some(fallback) = &self.fallback {
            tracing::warn!(
                provider = self.provider.provider_id(),
                fallback = fallback.provider_id(),
                error = %primary_err,
                "primary inference provider failed, trying fallback"
            );
            if let Ok(candidates) = self.call(fallback.as_ref(), utterance, context).await {
                return Ok(candidates);
            }
        }

        Err(primary_err)
    }

    async fn call(
        &self,
        provider: &dyn InferenceProvider,
        utterance: &str,
        context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        match tokio::time::timeout(self.call_timeout, provider.infer(utterance, context)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout {
                timeout_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("provider", &self.provider.provider_id())
            .field(
                "fallback",
                &self.fallback.as_ref().map(|p| p.provider_id().to_string()),
            )
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

// ============================================================================
// MOCK PROVIDER FOR TESTING
// ============================================================================

/// Scriptable mock inference provider.
///
/// Responses are consumed in order; once the script is exhausted the mock
/// returns an empty candidate set. Tracks call count for at-most-once style
/// assertions.
pub struct MockInferenceProvider {
    script: Mutex<VecDeque<Result<CandidateEntities, ExtractError>>>,
    calls: AtomicUsize,
}

impl MockInferenceProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful response.
    pub fn enqueue(&self, candidates: CandidateEntities) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Ok(candidates));
    }

    /// Queue a failure.
    pub fn enqueue_err(&self, err: ExtractError) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Err(err));
    }

    /// Number of infer calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockInferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn infer(
        &self,
        _utterance: &str,
        _context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("mock script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(CandidateEntities::default()))
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates_with_company(name: &str) -> CandidateEntities {
        CandidateEntities {
            company: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_extractor_passes_through_success() {
        let mock = Arc::new(MockInferenceProvider::new());
        mock.enqueue(candidates_with_company("ABC Company"));

        let extractor = Extractor::new(mock.clone(), Duration::from_secs(1));
        let result = extractor
            .extract("parcel for ABC Company", &EntitySet::new())
            .await
            .unwrap();

        assert_eq!(result.company.as_deref(), Some("ABC Company"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extractor_surfaces_primary_error_without_fallback() {
        let mock = Arc::new(MockInferenceProvider::new());
        mock.enqueue_err(ExtractError::Unavailable {
            provider: "mock".to_string(),
            reason: "down".to_string(),
        });

        let extractor = Extractor::new(mock, Duration::from_secs(1));
        let err = extractor
            .extract("anything", &EntitySet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_extractor_falls_back_on_primary_failure() {
        let primary = Arc::new(MockInferenceProvider::new());
        primary.enqueue_err(ExtractError::Unavailable {
            provider: "mock".to_string(),
            reason: "down".to_string(),
        });
        let fallback = Arc::new(MockInferenceProvider::new());
        fallback.enqueue(candidates_with_company("XYZ Ltd"));

        let extractor =
            Extractor::new(primary, Duration::from_secs(1)).with_fallback(fallback.clone());
        let result = extractor
            .extract("parcel for XYZ Ltd", &EntitySet::new())
            .await
            .unwrap();

        assert_eq!(result.company.as_deref(), Some("XYZ Ltd"));
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extractor_reports_primary_error_when_both_fail() {
        let primary = Arc::new(MockInferenceProvider::new());
        primary.enqueue_err(ExtractError::Malformed {
            provider: "mock".to_string(),
            reason: "not json".to_string(),
        });
        let fallback = Arc::new(MockInferenceProvider::new());
        fallback.enqueue_err(ExtractError::Unavailable {
            provider: "mock".to_string(),
            reason: "down".to_string(),
        });

        let extractor = Extractor::new(primary, Duration::from_secs(1)).with_fallback(fallback);
        let err = extractor
            .extract("anything", &EntitySet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_mock_returns_empty_when_script_exhausted() {
        let mock = MockInferenceProvider::new();
        let result = mock.infer("hello", &EntitySet::new()).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(mock.call_count(), 1);
    }

    struct HangingProvider;

    #[async_trait]
    impl InferenceProvider for HangingProvider {
        async fn infer(
            &self,
            _utterance: &str,
            _context: &EntitySet,
        ) -> Result<CandidateEntities, ExtractError> {
            // Longer than any test timeout; the extractor must cut it off.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(CandidateEntities::default())
        }

        fn provider_id(&self) -> &str {
            "hanging"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_extractor_times_out_hanging_provider() {
        let extractor = Extractor::new(Arc::new(HangingProvider), Duration::from_millis(50));
        let err = extractor
            .extract("anything", &EntitySet::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExtractError::Timeout { timeout_ms: 50 });
    }
}

//! End-to-end dialogue scenarios over mocked collaborators.

use async_trait::async_trait;
use dakiya_core::{
    CandidateEntities, CatalogEntry, CompleteEntitySet, ConversationStatus, DakiyaError,
    EngineConfig, SubmissionReceipt, SubmitError,
};
use dakiya_engine::{DialogueEngine, MockParcelSubmitter, ParcelSubmitter, ReferenceCatalog};
use dakiya_extract::{Extractor, MockInferenceProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn catalog() -> ReferenceCatalog {
    ReferenceCatalog::from_entries(
        vec![
            CatalogEntry::new("64a1", "Jaipur"),
            CatalogEntry::new("64a2", "Kolkata"),
        ],
        vec![
            CatalogEntry::new("m01", "Paint"),
            CatalogEntry::new("m02", "Chemicals"),
        ],
    )
}

fn engine(
    provider: Arc<MockInferenceProvider>,
    submitter: Arc<dyn ParcelSubmitter>,
) -> DialogueEngine {
    let extractor = Extractor::new(provider, Duration::from_secs(5));
    DialogueEngine::new(extractor, catalog(), submitter, EngineConfig::default())
        .expect("engine construction")
}

fn full_candidates() -> CandidateEntities {
    CandidateEntities {
        company: Some("ABC Company".to_string()),
        origin_city: Some("Jaipur".to_string()),
        destination_city: Some("Kolkata".to_string()),
        weight: Some("50kg".to_string()),
        material: Some("paint".to_string()),
    }
}

fn receipt() -> SubmissionReceipt {
    SubmissionReceipt {
        tracking_id: "TRK-001".to_string(),
        cost: 4200,
    }
}

// Scenario: a single fully-specified utterance goes straight to Submitted.
#[tokio::test]
async fn single_turn_complete_utterance_submits() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(full_candidates());
    let submitter = Arc::new(MockParcelSubmitter::new());
    submitter.enqueue(receipt());

    let engine = engine(provider, submitter.clone());
    let outcome = engine
        .submit_turn(
            None,
            "Create a parcel for ABC Company from Jaipur to Kolkata, 50kg paint",
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, ConversationStatus::Submitted);
    assert_eq!(outcome.receipt.as_ref().unwrap().tracking_id, "TRK-001");
    assert_eq!(outcome.clarifying_question, None);
    assert_eq!(submitter.call_count(), 1);

    let parcel = submitter.last_parcel().unwrap();
    assert_eq!(parcel.company, "ABC Company");
    assert_eq!(parcel.origin_city.canonical_id, "64a1");
    assert_eq!(parcel.destination_city.canonical_id, "64a2");
    assert_eq!(parcel.weight_kg.kg(), 50.0);
    assert_eq!(parcel.material.canonical_id, "m01");
}

// Scenario: a missing company triggers a clarifying question; the answer
// turn completes the set and submits.
#[tokio::test]
async fn missing_company_is_clarified_then_submitted() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities {
        company: None,
        ..full_candidates()
    });
    provider.enqueue(CandidateEntities {
        company: Some("ABC Company".to_string()),
        ..Default::default()
    });
    let submitter = Arc::new(MockParcelSubmitter::new());
    submitter.enqueue(receipt());

    let engine = engine(provider, submitter.clone());
    let first = engine
        .submit_turn(None, "Create a parcel from Jaipur to Kolkata, 50kg paint")
        .await
        .unwrap();
    assert_eq!(first.status, ConversationStatus::Collecting);
    assert_eq!(
        first.clarifying_question.as_deref(),
        Some("Which company is this parcel for?")
    );

    let second = engine
        .submit_turn(Some(first.conversation_id), "ABC Company")
        .await
        .unwrap();
    assert_eq!(second.conversation_id, first.conversation_id);
    assert_eq!(second.status, ConversationStatus::Submitted);
    assert_eq!(submitter.call_count(), 1);
}

// Scenario: an unmatched city name is held as invalid and quoted verbatim
// in the clarifying question.
#[tokio::test]
async fn unmatched_city_question_quotes_original_text() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities {
        origin_city: Some("Jaypur".to_string()),
        ..full_candidates()
    });

    let engine = engine(provider, Arc::new(MockParcelSubmitter::new()));
    let outcome = engine
        .submit_turn(None, "parcel for ABC Company from Jaypur to Kolkata, 50kg paint")
        .await
        .unwrap();

    assert_eq!(outcome.status, ConversationStatus::Collecting);
    let question = outcome.clarifying_question.unwrap();
    assert!(question.contains("'Jaypur'"), "question was: {question}");
    assert!(question.to_lowercase().contains("city"));
}

// Scenario: a validation rejection is terminal with the collaborator's
// exact reason; a follow-up utterance starts a fresh conversation.
#[tokio::test]
async fn validation_rejection_fails_conversation_and_next_turn_starts_fresh() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(full_candidates());
    provider.enqueue(CandidateEntities::default());
    let submitter = Arc::new(MockParcelSubmitter::new());
    submitter.enqueue_err(SubmitError::ValidationRejected {
        reason: "route not serviced".to_string(),
    });

    let engine = engine(provider, submitter.clone());
    let failed = engine.submit_turn(None, "full parcel request").await.unwrap();
    assert_eq!(failed.status, ConversationStatus::Failed);
    assert_eq!(failed.failure.as_deref(), Some("route not serviced"));

    let next = engine
        .submit_turn(Some(failed.conversation_id), "another parcel")
        .await
        .unwrap();
    assert_ne!(next.conversation_id, failed.conversation_id);
    assert_eq!(next.status, ConversationStatus::Collecting);
    assert_eq!(submitter.call_count(), 1);

    // The failed conversation itself is untouched.
    let snapshot = engine.conversation(failed.conversation_id).await.unwrap();
    assert_eq!(snapshot.status, ConversationStatus::Failed);
}

// A transport failure leaves the conversation Ready; an explicit retry
// re-submits the same parcel without re-collecting anything.
#[tokio::test]
async fn transport_failure_is_retryable() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(full_candidates());
    let submitter = Arc::new(MockParcelSubmitter::new());
    submitter.enqueue_err(SubmitError::Transport {
        reason: "connection reset".to_string(),
    });
    submitter.enqueue(receipt());

    let engine = engine(provider, submitter.clone());
    let first = engine.submit_turn(None, "full parcel request").await.unwrap();
    assert_eq!(first.status, ConversationStatus::Ready);
    assert!(first.failure.unwrap().contains("connection reset"));
    assert_eq!(first.receipt, None);

    let retried = engine.retry_submission(first.conversation_id).await.unwrap();
    assert_eq!(retried.status, ConversationStatus::Submitted);
    assert_eq!(retried.receipt.unwrap().tracking_id, "TRK-001");
    assert_eq!(submitter.call_count(), 2);
}

// A turn on a Ready conversation never resubmits by itself.
#[tokio::test]
async fn ready_conversation_turn_does_not_resubmit() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(full_candidates());
    provider.enqueue(CandidateEntities::default());
    let submitter = Arc::new(MockParcelSubmitter::new());
    submitter.enqueue_err(SubmitError::Transport {
        reason: "connection reset".to_string(),
    });

    let engine = engine(provider, submitter.clone());
    let first = engine.submit_turn(None, "full parcel request").await.unwrap();
    assert_eq!(first.status, ConversationStatus::Ready);

    let second = engine
        .submit_turn(Some(first.conversation_id), "is it done yet?")
        .await
        .unwrap();
    assert_eq!(second.status, ConversationStatus::Ready);
    assert_eq!(submitter.call_count(), 1);
}

// An extraction failure re-prompts without losing anything already stated.
#[tokio::test]
async fn extraction_failure_reprompts_and_preserves_entities() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities {
        company: Some("ABC Company".to_string()),
        ..Default::default()
    });
    provider.enqueue_err(dakiya_core::ExtractError::Unavailable {
        provider: "mock".to_string(),
        reason: "down".to_string(),
    });

    let engine = engine(provider, Arc::new(MockParcelSubmitter::new()));
    let first = engine.submit_turn(None, "parcel for ABC Company").await.unwrap();
    assert_eq!(first.status, ConversationStatus::Collecting);

    let second = engine
        .submit_turn(Some(first.conversation_id), "mumbled noise")
        .await
        .unwrap();
    assert_eq!(second.status, ConversationStatus::Collecting);
    assert!(second
        .clarifying_question
        .unwrap()
        .contains("say it again"));

    let snapshot = engine.conversation(first.conversation_id).await.unwrap();
    assert!(snapshot.entities.company.is_stated());
    // Failed extraction turns never count as clarification rounds.
    assert_eq!(snapshot.clarify_rounds, 1);
}

// The optional clarification cap fails the conversation once exhausted.
#[tokio::test]
async fn clarify_cap_fails_conversation() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities::default());
    provider.enqueue(CandidateEntities::default());
    let extractor = Extractor::new(provider, Duration::from_secs(5));
    let engine = DialogueEngine::new(
        extractor,
        catalog(),
        Arc::new(MockParcelSubmitter::new()),
        EngineConfig {
            max_clarify_turns: Some(2),
            ..Default::default()
        },
    )
    .unwrap();

    let first = engine.submit_turn(None, "hello").await.unwrap();
    assert_eq!(first.status, ConversationStatus::Collecting);

    let second = engine
        .submit_turn(Some(first.conversation_id), "still nothing")
        .await
        .unwrap();
    assert_eq!(second.status, ConversationStatus::Failed);
    assert_eq!(second.failure.as_deref(), Some("clarification limit reached"));
}

#[tokio::test]
async fn empty_utterance_is_rejected() {
    let engine = engine(
        Arc::new(MockInferenceProvider::new()),
        Arc::new(MockParcelSubmitter::new()),
    );
    let err = engine.submit_turn(None, "   ").await.unwrap_err();
    assert!(matches!(
        err,
        DakiyaError::Conversation(dakiya_core::ConversationError::EmptyUtterance)
    ));
}

#[tokio::test]
async fn unknown_conversation_id_is_not_found() {
    let engine = engine(
        Arc::new(MockInferenceProvider::new()),
        Arc::new(MockParcelSubmitter::new()),
    );
    let err = engine
        .submit_turn(Some(uuid::Uuid::now_v7()), "hello")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DakiyaError::Conversation(dakiya_core::ConversationError::NotFound { .. })
    ));
}

#[tokio::test]
async fn abandon_mid_collection() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities::default());
    let engine = engine(provider, Arc::new(MockParcelSubmitter::new()));

    let first = engine.submit_turn(None, "hello").await.unwrap();
    let status = engine.abandon(first.conversation_id).await.unwrap();
    assert_eq!(status, ConversationStatus::Abandoned);

    // Abandoning twice is an error.
    let err = engine.abandon(first.conversation_id).await.unwrap_err();
    assert!(matches!(
        err,
        DakiyaError::Conversation(dakiya_core::ConversationError::Closed { .. })
    ));
}

/// Submitter that parks in flight until released, for concurrency tests.
struct GatedSubmitter {
    entered: AtomicBool,
    gate: Notify,
    result: MockParcelSubmitter,
}

impl GatedSubmitter {
    fn new(result: MockParcelSubmitter) -> Self {
        Self {
            entered: AtomicBool::new(false),
            gate: Notify::new(),
            result,
        }
    }

    async fn wait_until_in_flight(&self) {
        while !self.entered.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ParcelSubmitter for GatedSubmitter {
    async fn create_parcel(
        &self,
        parcel: &CompleteEntitySet,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.entered.store(true, Ordering::SeqCst);
        self.gate.notified().await;
        self.result.create_parcel(parcel).await
    }
}

// While a submission is in flight, a concurrent utterance on the same
// conversation is rejected, never queued; exactly one submission happens.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn utterance_during_in_flight_submission_is_rejected() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities {
        material: None,
        ..full_candidates()
    });
    provider.enqueue(CandidateEntities {
        material: Some("paint".to_string()),
        ..Default::default()
    });

    let inner = MockParcelSubmitter::new();
    inner.enqueue(receipt());
    let submitter = Arc::new(GatedSubmitter::new(inner));

    let engine = Arc::new(engine(provider, submitter.clone()));
    let first = engine.submit_turn(None, "parcel without material").await.unwrap();
    let id = first.conversation_id;

    let engine_clone = engine.clone();
    let in_flight =
        tokio::spawn(async move { engine_clone.submit_turn(Some(id), "paint").await });

    submitter.wait_until_in_flight().await;
    let err = engine.submit_turn(Some(id), "make it 60kg").await.unwrap_err();
    assert!(matches!(
        err,
        DakiyaError::Conversation(dakiya_core::ConversationError::SubmissionInProgress { .. })
    ));

    submitter.release();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome.status, ConversationStatus::Submitted);
    assert_eq!(submitter.result.call_count(), 1);
}

// Abandoning during an in-flight submission discards the result: the
// in-flight call completes but the conversation stays Abandoned with no
// receipt recorded.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandon_during_in_flight_submission_discards_result() {
    let provider = Arc::new(MockInferenceProvider::new());
    provider.enqueue(CandidateEntities {
        material: None,
        ..full_candidates()
    });
    provider.enqueue(CandidateEntities {
        material: Some("paint".to_string()),
        ..Default::default()
    });

    let inner = MockParcelSubmitter::new();
    inner.enqueue(receipt());
    let submitter = Arc::new(GatedSubmitter::new(inner));

    let engine = Arc::new(engine(provider, submitter.clone()));
    let first = engine.submit_turn(None, "parcel without material").await.unwrap();
    let id = first.conversation_id;

    let engine_clone = engine.clone();
    let in_flight =
        tokio::spawn(async move { engine_clone.submit_turn(Some(id), "paint").await });

    submitter.wait_until_in_flight().await;
    let status = engine.abandon(id).await.unwrap();
    assert_eq!(status, ConversationStatus::Abandoned);

    submitter.release();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome.status, ConversationStatus::Abandoned);
    assert_eq!(outcome.receipt, None);

    let snapshot = engine.conversation(id).await.unwrap();
    assert_eq!(snapshot.status, ConversationStatus::Abandoned);
    assert_eq!(snapshot.receipt, None);
    // The collaborator call itself did complete.
    assert_eq!(submitter.result.call_count(), 1);
}

//! Dialogue state manager
//!
//! Owns every live conversation and drives the turn loop: extract, resolve,
//! merge, validate, then either ask the next clarifying question or submit.
//! Each conversation is serialized behind its own mutex; distinct
//! conversations run concurrently. The mutex is released for the duration
//! of the submission call so a concurrent utterance observes `Submitting`
//! and is rejected rather than queued behind the network.

use crate::catalog::ReferenceCatalog;
use crate::resolver::resolve_turn;
use crate::submit::ParcelSubmitter;
use crate::validator::{validate, Completeness, FieldIssue, IssueReason};
use dakiya_core::{
    CompleteEntitySet, Conversation, ConversationError, ConversationId, ConversationStatus,
    DakiyaResult, EngineConfig, FieldKey, SubmissionReceipt, SubmitError,
};
use dakiya_extract::Extractor;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// Generic re-prompt used when extraction itself failed. The turn does not
/// count as a clarification round.
const EXTRACTION_REPROMPT: &str = "Sorry, I didn't catch that. Could you say it again?";

const CLARIFY_LIMIT_REASON: &str = "clarification limit reached";

// ============================================================================
// TURN OUTCOME
// ============================================================================

/// What the engine tells the caller after processing one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub status: ConversationStatus,
    /// Present while the engine still needs information.
    pub clarifying_question: Option<String>,
    /// Present once the parcel was accepted.
    pub receipt: Option<SubmissionReceipt>,
    /// Terminal rejection reason, or a transient delivery failure message
    /// when the status is `Ready` and a retry is possible.
    pub failure: Option<String>,
}

// ============================================================================
// DIALOGUE ENGINE
// ============================================================================

/// The multi-turn dialogue engine.
pub struct DialogueEngine {
    extractor: Extractor,
    catalog: RwLock<Arc<ReferenceCatalog>>,
    submitter: Arc<dyn ParcelSubmitter>,
    config: EngineConfig,
    sessions: DashMap<ConversationId, Arc<Mutex<Conversation>>>,
}

impl DialogueEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        extractor: Extractor,
        catalog: ReferenceCatalog,
        submitter: Arc<dyn ParcelSubmitter>,
        config: EngineConfig,
    ) -> DakiyaResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor,
            catalog: RwLock::new(Arc::new(catalog)),
            submitter,
            config,
            sessions: DashMap::new(),
        })
    }

    /// Process one utterance.
    ///
    /// Without a conversation id a fresh conversation starts; with one, the
    /// turn continues that conversation. An utterance addressed to a
    /// terminal conversation starts a fresh one instead of resuming it; an
    /// utterance addressed to a conversation with a submission in flight is
    /// rejected with `SubmissionInProgress`.
    pub async fn submit_turn(
        &self,
        conversation_id: Option<ConversationId>,
        utterance: &str,
    ) -> DakiyaResult<TurnOutcome> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(ConversationError::EmptyUtterance.into());
        }

        let handle = match conversation_id {
            Some(id) => {
                let existing = self
                    .sessions
                    .get(&id)
                    .map(|entry| entry.value().clone())
                    .ok_or(ConversationError::NotFound { id })?;
                let status = existing.lock().await.status;
                match status {
                    ConversationStatus::Submitting => {
                        return Err(ConversationError::SubmissionInProgress { id }.into());
                    }
                    status if status.is_terminal() => {
                        tracing::debug!(
                            conversation_id = %id,
                            status = status.as_str(),
                            "utterance to a closed conversation starts a fresh one"
                        );
                        self.fresh_session()
                    }
                    _ => existing,
                }
            }
            None => self.fresh_session(),
        };

        self.process_turn(&handle, utterance).await
    }

    /// Abandon a conversation before it reaches a terminal state.
    ///
    /// Allowed while a submission is in flight; the in-flight call runs to
    /// completion and its result is discarded.
    pub async fn abandon(&self, id: ConversationId) -> DakiyaResult<ConversationStatus> {
        let handle = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ConversationError::NotFound { id })?;
        let mut convo = handle.lock().await;
        if convo.is_terminal() {
            return Err(ConversationError::Closed {
                id,
                status: convo.status,
            }
            .into());
        }
        convo.mark_abandoned();
        Ok(convo.status)
    }

    /// Re-run the submission of a `Ready` conversation after a transport
    /// failure. Submission never retries on its own.
    pub async fn retry_submission(&self, id: ConversationId) -> DakiyaResult<TurnOutcome> {
        let handle = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ConversationError::NotFound { id })?;
        let convo = handle.lock().await;
        if convo.status != ConversationStatus::Ready {
            return Err(ConversationError::NotReady {
                id,
                status: convo.status,
            }
            .into());
        }
        match validate(&convo.entities) {
            Completeness::Complete(parcel) => self.run_submission(&handle, convo, parcel).await,
            Completeness::Incomplete(_) => Err(ConversationError::NotReady {
                id,
                status: convo.status,
            }
            .into()),
        }
    }

    /// Snapshot of a conversation's current state.
    pub async fn conversation(&self, id: ConversationId) -> DakiyaResult<Conversation> {
        let handle = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ConversationError::NotFound { id })?;
        let convo = handle.lock().await;
        Ok(convo.clone())
    }

    /// The current catalog snapshot.
    pub fn catalog(&self) -> Arc<ReferenceCatalog> {
        self.catalog.read().expect("catalog lock poisoned").clone()
    }

    /// Swap in a freshly loaded catalog snapshot. In-flight turns keep the
    /// snapshot they started with.
    pub fn swap_catalog(&self, catalog: ReferenceCatalog) {
        *self.catalog.write().expect("catalog lock poisoned") = Arc::new(catalog);
    }

    // ------------------------------------------------------------------------

    fn fresh_session(&self) -> Arc<Mutex<Conversation>> {
        let convo = Conversation::new();
        let id = convo.conversation_id;
        let handle = Arc::new(Mutex::new(convo));
        self.sessions.insert(id, handle.clone());
        handle
    }

    async fn process_turn(
        &self,
        handle: &Arc<Mutex<Conversation>>,
        utterance: &str,
    ) -> DakiyaResult<TurnOutcome> {
        let mut convo = handle.lock().await;
        // Re-check after acquiring: a concurrent turn may have raced this
        // one between session lookup and lock acquisition.
        if convo.status == ConversationStatus::Submitting {
            return Err(ConversationError::SubmissionInProgress {
                id: convo.conversation_id,
            }
            .into());
        }
        if convo.is_terminal() {
            return Err(ConversationError::Closed {
                id: convo.conversation_id,
                status: convo.status,
            }
            .into());
        }

        let was_ready = convo.status == ConversationStatus::Ready;
        convo.record_turn(utterance);

        let context = convo.entities.clone();
        let candidates = match self.extractor.extract(utterance, &context).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(
                    conversation_id = %convo.conversation_id,
                    error = %err,
                    "extraction failed, re-prompting"
                );
                return Ok(TurnOutcome {
                    conversation_id: convo.conversation_id,
                    status: convo.status,
                    clarifying_question: Some(EXTRACTION_REPROMPT.to_string()),
                    receipt: None,
                    failure: None,
                });
            }
        };

        let catalog = self.catalog();
        let delta = resolve_turn(&candidates, &catalog);
        convo.entities.merge(delta);

        match validate(&convo.entities) {
            Completeness::Incomplete(issues) => {
                // A correction can invalidate a field of a Ready set.
                convo.status = ConversationStatus::Collecting;
                convo.clarify_rounds += 1;
                if let Some(cap) = self.config.max_clarify_turns {
                    if convo.clarify_rounds >= cap {
                        convo.mark_failed(CLARIFY_LIMIT_REASON);
                        return Ok(Self::settled_outcome(&convo));
                    }
                }
                Ok(TurnOutcome {
                    conversation_id: convo.conversation_id,
                    status: convo.status,
                    clarifying_question: Some(question_for(&issues[0])),
                    receipt: None,
                    failure: None,
                })
            }
            Completeness::Complete(parcel) => {
                if was_ready {
                    // Already awaiting an explicit retry; a repeated turn on
                    // a Ready conversation never resubmits by itself.
                    return Ok(Self::settled_outcome(&convo));
                }
                convo.mark_ready();
                self.run_submission(handle, convo, parcel).await
            }
        }
    }

    /// Drive one submission attempt. The conversation guard is released
    /// while the call is in flight and re-acquired to apply the result.
    async fn run_submission(
        &self,
        handle: &Arc<Mutex<Conversation>>,
        mut convo: MutexGuard<'_, Conversation>,
        parcel: CompleteEntitySet,
    ) -> DakiyaResult<TurnOutcome> {
        let conversation_id = convo.conversation_id;
        convo.mark_submitting();
        drop(convo);

        let timeout = self.config.call_timeout;
        let result = match tokio::time::timeout(timeout, self.submitter.create_parcel(&parcel))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SubmitError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        let mut convo = handle.lock().await;
        if convo.status == ConversationStatus::Abandoned {
            tracing::info!(
                %conversation_id,
                "conversation abandoned mid-submission, result discarded"
            );
            return Ok(Self::settled_outcome(&convo));
        }

        match result {
            Ok(receipt) => {
                tracing::info!(
                    %conversation_id,
                    tracking_id = %receipt.tracking_id,
                    "parcel submitted"
                );
                convo.mark_submitted(receipt);
                Ok(Self::settled_outcome(&convo))
            }
            Err(SubmitError::ValidationRejected { reason }) => {
                tracing::warn!(%conversation_id, %reason, "submission rejected");
                convo.mark_failed(reason);
                Ok(Self::settled_outcome(&convo))
            }
            Err(err) => {
                tracing::warn!(
                    %conversation_id,
                    error = %err,
                    "submission delivery failed, conversation stays retryable"
                );
                convo.mark_retryable();
                Ok(TurnOutcome {
                    conversation_id,
                    status: convo.status,
                    clarifying_question: None,
                    receipt: None,
                    failure: Some(err.to_string()),
                })
            }
        }
    }

    fn settled_outcome(convo: &Conversation) -> TurnOutcome {
        TurnOutcome {
            conversation_id: convo.conversation_id,
            status: convo.status,
            clarifying_question: None,
            receipt: convo.receipt.clone(),
            failure: convo.failure.clone(),
        }
    }
}

// ============================================================================
// CLARIFYING QUESTIONS
// ============================================================================

/// Render the clarifying question for the first outstanding field. Invalid
/// fields quote the user's original text verbatim.
fn question_for(issue: &FieldIssue) -> String {
    match &issue.reason {
        IssueReason::Missing => missing_question(issue.key).to_string(),
        IssueReason::Invalid(raw) => invalid_question(issue.key, raw),
    }
}

fn missing_question(key: FieldKey) -> &'static str {
    match key {
        FieldKey::Company => "Which company is this parcel for?",
        FieldKey::OriginCity => "Which city does the parcel ship from?",
        FieldKey::DestinationCity => "Which city is it going to?",
        FieldKey::WeightKg => "What is the weight of the parcel (e.g. 50kg or 2.5kg)?",
        FieldKey::Material => "What material is being shipped?",
    }
}

fn invalid_question(key: FieldKey, raw: &str) -> String {
    match key {
        FieldKey::OriginCity | FieldKey::DestinationCity => {
            format!("I don't recognize city '{raw}'. Please give a valid city name.")
        }
        FieldKey::WeightKg => {
            format!("I couldn't read a weight from '{raw}'. Please give it like 50kg or 2.5kg.")
        }
        FieldKey::Material => {
            format!("I don't recognize material '{raw}'. Please give an accepted material type.")
        }
        FieldKey::Company => {
            format!("I couldn't use '{raw}' as a company name. Please restate it.")
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_questions_name_one_field_each() {
        assert_eq!(
            missing_question(FieldKey::Company),
            "Which company is this parcel for?"
        );
        assert_eq!(
            missing_question(FieldKey::OriginCity),
            "Which city does the parcel ship from?"
        );
        assert_eq!(
            missing_question(FieldKey::WeightKg),
            "What is the weight of the parcel (e.g. 50kg or 2.5kg)?"
        );
    }

    #[test]
    fn test_invalid_question_quotes_raw_verbatim() {
        let question = question_for(&FieldIssue {
            key: FieldKey::OriginCity,
            reason: IssueReason::Invalid("Jaypur".to_string()),
        });
        assert!(question.contains("'Jaypur'"));
    }

    #[test]
    fn test_invalid_weight_question_quotes_raw() {
        let question = question_for(&FieldIssue {
            key: FieldKey::WeightKg,
            reason: IssueReason::Invalid("very heavy".to_string()),
        });
        assert!(question.contains("'very heavy'"));
    }
}

//! Submission orchestration
//!
//! The [`ParcelSubmitter`] trait is the seam to the external parcel
//! service. It receives only canonical IDs and validated values; raw user
//! text never crosses this boundary.

use async_trait::async_trait;
use dakiya_core::{CompleteEntitySet, SubmissionReceipt, SubmitError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// PARCEL SUBMITTER TRAIT
// ============================================================================

/// Trait for the parcel-creation collaborator. Implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait ParcelSubmitter: Send + Sync {
    /// Submit a complete, resolved parcel request.
    ///
    /// # Returns
    /// * `Ok(SubmissionReceipt)` - Accepted; tracking id and quoted cost
    /// * `Err(SubmitError::ValidationRejected)` - Terminal rejection
    /// * `Err(SubmitError::Transport)` / `Err(SubmitError::Timeout)` -
    ///   Retryable delivery failure
    async fn create_parcel(
        &self,
        parcel: &CompleteEntitySet,
    ) -> Result<SubmissionReceipt, SubmitError>;
}

// ============================================================================
// MOCK SUBMITTER FOR TESTING
// ============================================================================

/// Scriptable mock submitter. Responses are consumed in order; an exhausted
/// script yields a transport error so a test never silently "succeeds" on
/// an unexpected extra call. Tracks call count for at-most-one-submission
/// assertions.
pub struct MockParcelSubmitter {
    script: Mutex<VecDeque<Result<SubmissionReceipt, SubmitError>>>,
    calls: AtomicUsize,
    last_parcel: Mutex<Option<CompleteEntitySet>>,
}

impl MockParcelSubmitter {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_parcel: Mutex::new(None),
        }
    }

    /// Queue an accepted submission.
    pub fn enqueue(&self, receipt: SubmissionReceipt) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Ok(receipt));
    }

    /// Queue a failure.
    pub fn enqueue_err(&self, err: SubmitError) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Err(err));
    }

    /// Number of create_parcel calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recently submitted parcel, if any.
    pub fn last_parcel(&self) -> Option<CompleteEntitySet> {
        self.last_parcel.lock().expect("mock parcel lock").clone()
    }
}

impl Default for MockParcelSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParcelSubmitter for MockParcelSubmitter {
    async fn create_parcel(
        &self,
        parcel: &CompleteEntitySet,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_parcel.lock().expect("mock parcel lock") = Some(parcel.clone());
        self.script
            .lock()
            .expect("mock script lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(SubmitError::Transport {
                    reason: "mock script exhausted".to_string(),
                })
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================

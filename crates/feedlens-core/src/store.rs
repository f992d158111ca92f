//! The client-side data store: canonical feedback collection, the latest
//! insights snapshot, and per-category loading/error status.
//!
//! State is only touched in short synchronous sections, never across a
//! remote call, so operations interleave only at their `.await` points.
//! Overlapping operations are not sequenced: whichever response lands last
//! decides the final collection. In particular a list fetch that started
//! before a submission but finishes after it replaces the optimistic insert
//! with the server's view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::client::RemoteClient;
use crate::config::SyncConfig;
use crate::error::{FeedlensError, Result};
use crate::model::{Category, FeedbackItem, InsightsSnapshot, OperationStatus, StatusBoard};
use crate::scheduler::{Scheduler, TaskHandle, TokioScheduler};

pub const DEFAULT_RECONCILE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_MIN_MESSAGE_CHARS: usize = 10;

const RECONCILE_LABEL: &str = "reconcile-insights";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Delay between a successful submission and the insights re-fetch that
    /// picks up server-side scoring.
    pub reconcile_delay: Duration,
    pub min_message_chars: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            reconcile_delay: DEFAULT_RECONCILE_DELAY,
            min_message_chars: DEFAULT_MIN_MESSAGE_CHARS,
        }
    }
}

impl From<&SyncConfig> for StoreOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            reconcile_delay: config.reconcile_delay(),
            min_message_chars: config.min_message_chars.max(1),
        }
    }
}

/// Everything a consumer renders, cloned under a single lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub feedback: Vec<FeedbackItem>,
    pub insights: InsightsSnapshot,
    pub status: StatusBoard,
}

#[derive(Default)]
struct StoreState {
    feedback: Vec<FeedbackItem>,
    insights: InsightsSnapshot,
    status: StatusBoard,
    reconciliation: Option<TaskHandle>,
}

struct Inner<C> {
    client: C,
    scheduler: Arc<dyn Scheduler>,
    options: StoreOptions,
    state: RwLock<StoreState>,
    activated: AtomicBool,
    revision: watch::Sender<u64>,
}

/// Shared handle to the store. Cloning is cheap and every clone sees the
/// same state.
pub struct DataStore<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for DataStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for DataStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("DataStore")
            .field("feedback", &state.feedback.len())
            .field("status", &state.status)
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Check a submission locally and return the trimmed text to send.
pub fn validate_message(message: &str, min_chars: usize) -> Result<&str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(FeedlensError::Validation(
            "Please enter your feedback before submitting.".into(),
        ));
    }
    if trimmed.chars().count() < min_chars {
        return Err(FeedlensError::Validation(format!(
            "Please provide more detailed feedback (at least {min_chars} characters)."
        )));
    }
    Ok(trimmed)
}

impl<C> DataStore<C> {
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the state and notify subscribers.
    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let out = {
            let mut state: RwLockWriteGuard<'_, StoreState> =
                self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        self.inner.revision.send_modify(|rev| *rev += 1);
        out
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn feedback(&self) -> Vec<FeedbackItem> {
        self.read().feedback.clone()
    }

    pub fn insights(&self) -> InsightsSnapshot {
        self.read().insights.clone()
    }

    pub fn status(&self, category: Category) -> OperationStatus {
        self.read().status.get(category).clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        StoreSnapshot {
            feedback: state.feedback.clone(),
            insights: state.insights.clone(),
            status: state.status.clone(),
        }
    }

    /// Handle of the most recently scheduled reconciliation fetch, if any.
    pub fn pending_reconciliation(&self) -> Option<TaskHandle> {
        self.read().reconciliation.clone()
    }

    /// Revision counter bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl<C: RemoteClient + 'static> DataStore<C> {
    pub fn new(client: C, scheduler: Arc<dyn Scheduler>, options: StoreOptions) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                client,
                scheduler,
                options,
                state: RwLock::new(StoreState::default()),
                activated: AtomicBool::new(false),
                revision,
            }),
        }
    }

    /// Store whose reconciliation timer runs on the tokio runtime.
    pub fn with_tokio(client: C, options: StoreOptions) -> Self {
        Self::new(client, Arc::new(TokioScheduler::new()), options)
    }

    /// First-activation initialization: loads feedback and insights once.
    /// Returns `false` without doing anything on later calls.
    pub async fn activate(&self) -> bool {
        if self.inner.activated.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::debug!("activating store");
        self.refresh_data().await;
        true
    }

    /// Replace the collection with the service's list. On failure the
    /// previous collection stays and `feedback.error` carries the message.
    pub async fn fetch_feedback(&self) {
        tracing::debug!("fetching feedback");
        self.mutate(|s| s.status.get_mut(Category::Feedback).begin());

        let result = self.inner.client.list_feedback().await;

        self.mutate(|s| match result {
            Ok(items) => {
                tracing::debug!(count = items.len(), "feedback loaded");
                s.feedback = items;
                s.status.feedback.finish(None);
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "feedback fetch failed");
                s.status.feedback.finish(Some(failure.message));
            }
        });
    }

    /// Replace the insights snapshot wholesale. On failure the previous
    /// snapshot stays and `insights.error` carries the message.
    pub async fn fetch_insights(&self) {
        tracing::debug!("fetching insights");
        self.mutate(|s| s.status.get_mut(Category::Insights).begin());

        let result = self.inner.client.get_insights().await;

        self.mutate(|s| match result {
            Ok(snapshot) => {
                s.insights = snapshot;
                s.status.insights.finish(None);
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "insights fetch failed");
                s.status.insights.finish(Some(failure.message));
            }
        });
    }

    /// Submit new feedback.
    ///
    /// Rejected locally when the trimmed message is empty or too short, or
    /// while another submission is still in flight. On success the created
    /// item goes to the front of the collection right away and an insights
    /// re-fetch is scheduled after the reconciliation delay.
    pub async fn submit_feedback(&self, message: &str) -> Result<FeedbackItem> {
        let trimmed = validate_message(message, self.inner.options.min_message_chars)?;

        {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.status.submitting.in_flight {
                return Err(FeedlensError::SubmissionInProgress);
            }
            state.status.submitting.begin();
        }
        self.inner.revision.send_modify(|rev| *rev += 1);

        match self.inner.client.submit_feedback(trimmed).await {
            Ok(item) => {
                let handle = self.schedule_reconciliation();
                tracing::info!(
                    id = %item.id,
                    reconcile_in_ms = handle.delay().as_millis() as u64,
                    "feedback submitted"
                );
                self.mutate(|s| {
                    s.feedback.insert(0, item.clone());
                    s.status.submitting.finish(None);
                    s.reconciliation = Some(handle);
                });
                Ok(item)
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "feedback submission failed");
                self.mutate(|s| s.status.submitting.finish(Some(failure.message.clone())));
                Err(failure.into())
            }
        }
    }

    /// Fetch feedback and insights concurrently. Does not wait for any
    /// pending reconciliation.
    pub async fn refresh_data(&self) {
        tokio::join!(self.fetch_feedback(), self.fetch_insights());
    }

    fn schedule_reconciliation(&self) -> TaskHandle {
        let store = self.clone();
        self.inner.scheduler.schedule(
            RECONCILE_LABEL,
            self.inner.options.reconcile_delay,
            Box::pin(async move {
                store.fetch_insights().await;
            }),
        )
    }
}

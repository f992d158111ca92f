#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use feedlens_core::client::{RemoteClient, RemoteResult};
use feedlens_core::error::RemoteFailure;
use feedlens_core::model::{FeedbackItem, InsightsSnapshot, PriorityLevel, ThemeCount};
use feedlens_core::scheduler::ManualScheduler;
use feedlens_core::store::{DataStore, StoreOptions};

/// Holds a mocked call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.started.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct MockState {
    submit: Mutex<VecDeque<RemoteResult<FeedbackItem>>>,
    list: Mutex<VecDeque<RemoteResult<Vec<FeedbackItem>>>>,
    insights: Mutex<VecDeque<RemoteResult<InsightsSnapshot>>>,
    submitted: Mutex<Vec<String>>,
    submit_gate: Mutex<Option<Arc<Gate>>>,
    list_gate: Mutex<Option<Arc<Gate>>>,
    insights_gate: Mutex<Option<Arc<Gate>>>,
    submit_calls: AtomicUsize,
    list_calls: AtomicUsize,
    insights_calls: AtomicUsize,
}

/// Scripted in-memory [`RemoteClient`]. Responses are consumed in order;
/// once a queue is empty the call succeeds with an empty result (or, for
/// submissions, an unenriched item echoing the message).
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<MockState>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit(&self, response: RemoteResult<FeedbackItem>) -> &Self {
        self.state.submit.lock().unwrap().push_back(response);
        self
    }

    pub fn push_list(&self, response: RemoteResult<Vec<FeedbackItem>>) -> &Self {
        self.state.list.lock().unwrap().push_back(response);
        self
    }

    pub fn push_insights(&self, response: RemoteResult<InsightsSnapshot>) -> &Self {
        self.state.insights.lock().unwrap().push_back(response);
        self
    }

    pub fn gate_submit(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.state.submit_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_list(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.state.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_insights(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.state.insights_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn submit_calls(&self) -> usize {
        self.state.submit_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn insights_calls(&self) -> usize {
        self.state.insights_calls.load(Ordering::SeqCst)
    }

    /// Messages exactly as the store sent them.
    pub fn submitted(&self) -> Vec<String> {
        self.state.submitted.lock().unwrap().clone()
    }
}

impl RemoteClient for MockClient {
    async fn submit_feedback(&self, message: &str) -> RemoteResult<FeedbackItem> {
        let call = self.state.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.state.submitted.lock().unwrap().push(message.to_string());

        let gate = self.state.submit_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let scripted = self.state.submit.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(FeedbackItem::new(1000 + call as i64, message)))
    }

    async fn list_feedback(&self) -> RemoteResult<Vec<FeedbackItem>> {
        self.state.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.state.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let scripted = self.state.list.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_insights(&self) -> RemoteResult<InsightsSnapshot> {
        self.state.insights_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.state.insights_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let scripted = self.state.insights.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(InsightsSnapshot::default()))
    }
}

pub fn failure(message: &str) -> RemoteResult<Vec<FeedbackItem>> {
    Err(RemoteFailure::new(message))
}

pub fn scored_item(id: i64, message: &str, sentiment: f64, level: PriorityLevel) -> FeedbackItem {
    let score = match level {
        PriorityLevel::High => 0.8,
        PriorityLevel::Medium => 0.5,
        PriorityLevel::Low => 0.2,
    };
    FeedbackItem::new(id, message)
        .with_sentiment(sentiment)
        .with_priority(score, level)
}

pub fn snapshot_with_theme(theme: &str, count: u64) -> InsightsSnapshot {
    InsightsSnapshot {
        themes: vec![ThemeCount {
            theme: theme.to_string(),
            count,
        }],
        ..Default::default()
    }
}

/// Store wired to a manual clock with the default 2 s reconciliation delay.
pub fn manual_store(client: &MockClient) -> (DataStore<MockClient>, Arc<ManualScheduler>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let store = DataStore::new(client.clone(), scheduler.clone(), StoreOptions::default());
    (store, scheduler)
}

pub const RECONCILE: Duration = Duration::from_millis(2000);

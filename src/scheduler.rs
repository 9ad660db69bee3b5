// src/scheduler.rs
//! # Refresh Scheduler
//! Owns the current item collection and the `idle → loading → ready|error`
//! state machine. Manual and periodic triggers share [`RefreshScheduler::refresh`];
//! at most one fetch cycle runs at a time and a concurrent trigger is skipped.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use metrics::{counter, gauge};
use serde::Serialize;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::{self, types::SourceProvider};
use crate::kv::KvStore;
use crate::model::TrendItem;

pub const TAGS_KEY: &str = "available-tags";
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5 * 60);

pub const MSG_EMPTY: &str = "Failed to fetch data. Please try again later.";
pub const MSG_UNEXPECTED: &str = "An error occurred while fetching data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Idle,
    Loading,
    Error,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Collection replaced with this many items.
    Ready(usize),
    /// Cycle ran but produced nothing usable.
    Failed,
    /// Another cycle was already in flight.
    Skipped,
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Ready(_) => "ready",
            RefreshOutcome::Failed => "failed",
            RefreshOutcome::Skipped => "skipped",
        }
    }
}

/// What the presentation layer reads.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub status: RefreshStatus,
    pub items: Arc<Vec<TrendItem>>,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

pub struct RefreshScheduler {
    providers: Vec<Arc<dyn SourceProvider>>,
    kv: Arc<dyn KvStore>,
    state: RwLock<Snapshot>,
    in_flight: AtomicBool,
}

/// Held for the duration of one cycle. If the cycle is dropped before it
/// settles, the pre-cycle status comes back and the overlap flag is cleared.
struct InFlight<'a> {
    scheduler: &'a RefreshScheduler,
    prev_status: RefreshStatus,
    prev_error: Option<String>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut st) = self.scheduler.state.write() {
            if st.status == RefreshStatus::Loading {
                tracing::warn!("refresh cycle dropped before completion");
                st.status = self.prev_status;
                st.error = self.prev_error.take();
            }
        }
        self.scheduler.in_flight.store(false, Ordering::Release);
    }
}

impl RefreshScheduler {
    pub fn new(providers: Vec<Arc<dyn SourceProvider>>, kv: Arc<dyn KvStore>) -> Self {
        Self {
            providers,
            kv,
            state: RwLock::new(Snapshot {
                status: RefreshStatus::Idle,
                items: Arc::new(Vec::new()),
                error: None,
                last_refreshed: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.read().expect("scheduler state poisoned").clone()
    }

    pub fn status(&self) -> RefreshStatus {
        self.state.read().expect("scheduler state poisoned").status
    }

    pub fn items(&self) -> Arc<Vec<TrendItem>> {
        self.state
            .read()
            .expect("scheduler state poisoned")
            .items
            .clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one fetch cycle unless one is already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh already in flight, skipping trigger");
            counter!("refresh_runs_total", "outcome" => "skipped").increment(1);
            return RefreshOutcome::Skipped;
        }
        let _guard = {
            let mut st = self.state.write().expect("scheduler state poisoned");
            let guard = InFlight {
                scheduler: self,
                prev_status: st.status,
                prev_error: st.error.take(),
            };
            st.status = RefreshStatus::Loading;
            guard
        };

        let result = AssertUnwindSafe(ingest::aggregate(&self.providers))
            .catch_unwind()
            .await;

        let outcome = match result {
            Err(_) => {
                tracing::error!("aggregation panicked");
                self.fail(MSG_UNEXPECTED);
                RefreshOutcome::Failed
            }
            Ok(items) if items.is_empty() => {
                tracing::warn!("aggregation returned no items from any source");
                self.fail(MSG_EMPTY);
                RefreshOutcome::Failed
            }
            Ok(items) => {
                let n = items.len();
                self.snapshot_tags(&items);
                let now = Utc::now();
                {
                    let mut st = self.state.write().expect("scheduler state poisoned");
                    st.items = Arc::new(items);
                    st.status = RefreshStatus::Ready;
                    st.last_refreshed = Some(now);
                }
                gauge!("refresh_last_success_ts").set(now.timestamp() as f64);
                tracing::info!(items = n, "refresh complete");
                RefreshOutcome::Ready(n)
            }
        };
        counter!("refresh_runs_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }

    /// Previous items stay in place; the presentation layer decides whether to show them.
    fn fail(&self, msg: &str) {
        let mut st = self.state.write().expect("scheduler state poisoned");
        st.status = RefreshStatus::Error;
        st.error = Some(msg.to_string());
    }

    /// Write-only snapshot of every tag in the new collection.
    fn snapshot_tags(&self, items: &[TrendItem]) {
        let tags = unique_tags(items);
        let written = serde_json::to_string(&tags)
            .map_err(anyhow::Error::from)
            .and_then(|body| self.kv.set(TAGS_KEY, &body));
        if let Err(e) = written {
            tracing::warn!(error = ?e, "failed to store tags snapshot");
        }
    }

    /// Start the periodic task. The first tick fires immediately (initial load).
    pub fn spawn(self: &Arc<Self>, period: Duration) -> SchedulerHandle {
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = this.refresh().await;
                tracing::debug!(outcome = outcome.as_str(), "scheduled refresh tick");
            }
        });
        tracing::info!(period_secs = period.as_secs(), "refresh scheduler started");
        SchedulerHandle { task }
    }
}

/// Tags in first-seen order, without duplicates.
pub fn unique_tags(items: &[TrendItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .flat_map(|it| it.tags.iter())
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// Owns the periodic task; stopping or dropping it cancels the timer.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn item(id: &str, tags: &[&str]) -> TrendItem {
        TrendItem {
            id: id.into(),
            source: Source::Github,
            title: id.into(),
            url: "https://example.test".into(),
            author: "a".into(),
            author_url: None,
            description: None,
            score: 1,
            comments_count: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: Utc::now(),
            thumbnail_url: None,
        }
    }

    #[test]
    fn unique_tags_keep_first_seen_order() {
        let items = vec![
            item("a", &["GitHub", "Rust"]),
            item("b", &["GitHub", "Go"]),
            item("c", &["Rust"]),
        ];
        assert_eq!(unique_tags(&items), vec!["GitHub", "Rust", "Go"]);
    }

    #[test]
    fn new_scheduler_is_idle_and_empty() {
        let s = RefreshScheduler::new(Vec::new(), Arc::new(crate::kv::MemoryStore::new()));
        let snap = s.snapshot();
        assert_eq!(snap.status, RefreshStatus::Idle);
        assert!(snap.items.is_empty());
        assert!(snap.error.is_none());
        assert!(!s.is_refreshing());
    }

    #[tokio::test]
    async fn no_providers_means_error_state() {
        let s = RefreshScheduler::new(Vec::new(), Arc::new(crate::kv::MemoryStore::new()));
        assert_eq!(s.refresh().await, RefreshOutcome::Failed);
        assert_eq!(s.status(), RefreshStatus::Error);
        assert_eq!(s.snapshot().error.as_deref(), Some(MSG_EMPTY));
        assert!(!s.is_refreshing());
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::hh_client::{HhClient, RawVacancyItem};
use crate::services::normalizer::normalize;
use crate::store::{CorpusScope, CorpusStore, InsertOutcome};

/// hh.ru area id for Moscow, the only region collected.
pub const SEARCH_AREA: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Fire-and-forget progress channel. Emitting never blocks the
/// collection loop; a closed receiver just drops the event.
#[derive(Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, message: impl Into<String>) {
        let event = ProgressEvent {
            at: Utc::now(),
            message: message.into(),
        };
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub id: Uuid,
    pub query: String,
    pub status: RunStatus,
    pub accepted: i64,
    pub events: Vec<ProgressEvent>,
}

struct RunEntry {
    seq: u64,
    query: String,
    status: RunStatus,
    accepted: i64,
    events: Vec<ProgressEvent>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct RegistryInner {
    runs: HashMap<Uuid, RunEntry>,
    next_seq: u64,
}

/// Finished runs stay pollable, but only the most recent ones; older
/// entries and their event logs are evicted when a new run begins.
const RETAINED_RUNS: usize = 32;

/// In-process run ledger. At most one run may be in `Running` state;
/// finished runs stay readable for later polling up to the retention cap.
#[derive(Default)]
pub struct RunRegistry {
    inner: Mutex<RegistryInner>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new run, or fails with a conflict while another run
    /// is still active.
    pub fn begin(&self, query: &str) -> Result<(Uuid, CancellationToken)> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.runs.values().any(|r| r.status == RunStatus::Running) {
            return Err(Error::Conflict(
                "A collection run is already in progress".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.runs.insert(
            id,
            RunEntry {
                seq,
                query: query.to_string(),
                status: RunStatus::Running,
                accepted: 0,
                events: Vec::new(),
                cancel: cancel.clone(),
            },
        );

        while inner.runs.len() > RETAINED_RUNS {
            let oldest_finished = inner
                .runs
                .iter()
                .filter(|(_, r)| r.status != RunStatus::Running)
                .min_by_key(|(_, r)| r.seq)
                .map(|(id, _)| *id);
            match oldest_finished {
                Some(evict) => {
                    inner.runs.remove(&evict);
                }
                None => break,
            }
        }

        Ok((id, cancel))
    }

    pub fn push_event(&self, id: Uuid, event: ProgressEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(run) = inner.runs.get_mut(&id) {
            run.events.push(event);
        }
    }

    pub fn finish(&self, id: Uuid, status: RunStatus, accepted: i64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(run) = inner.runs.get_mut(&id) {
            run.status = status;
            run.accepted = accepted;
        }
    }

    /// Requests cancellation. Safe on a finished run, where it is a no-op.
    pub fn cancel(&self, id: Uuid) -> Result<()> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let run = inner
            .runs
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Run {} not found", id)))?;
        run.cancel.cancel();
        Ok(())
    }

    pub fn snapshot(&self, id: Uuid) -> Result<RunSnapshot> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let run = inner
            .runs
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Run {} not found", id)))?;
        Ok(RunSnapshot {
            id,
            query: run.query.clone(),
            status: run.status,
            accepted: run.accepted,
            events: run.events.clone(),
        })
    }
}

/// Pulls search pages from hh.ru and lands normalized records in the
/// shared corpus. Page count is re-read from every response, duplicate
/// URLs skip the detail fetch entirely, and cancellation is polled at
/// page and item granularity.
#[derive(Clone)]
pub struct CollectorService {
    store: Arc<dyn CorpusStore>,
    client: HhClient,
    page_delay: Duration,
}

impl CollectorService {
    pub fn new(store: Arc<dyn CorpusStore>, client: HhClient, page_delay: Duration) -> Self {
        Self {
            store,
            client,
            page_delay,
        }
    }

    /// Runs one collection to completion, cancellation or a terminal
    /// failure. Returns the number of newly accepted records; records
    /// committed before an abort stay committed.
    pub async fn collect(
        &self,
        query: &str,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> Result<i64> {
        let scope = CorpusScope::Shared;
        let mut accepted = 0i64;
        let mut page = 0u32;
        let mut pages = 1u32;

        sink.emit(format!("Searching hh.ru for '{}'", query));

        'pages: while page < pages {
            if cancel.is_cancelled() {
                sink.emit("Collection cancelled");
                break;
            }

            let search = match self.client.search(query, SEARCH_AREA, page).await {
                Ok(search) => search,
                Err(e) => {
                    error!(query, page, error = %e, "Search page failed");
                    sink.emit(format!("Page {} failed: {}", page + 1, e));
                    break;
                }
            };
            pages = search.pages;
            sink.emit(format!(
                "Page {} of {}: {} items",
                page + 1,
                pages,
                search.items.len()
            ));

            for item in &search.items {
                if cancel.is_cancelled() {
                    sink.emit("Collection cancelled");
                    break 'pages;
                }
                match self.process_item(scope, item, sink).await {
                    Ok(true) => accepted += 1,
                    Ok(false) => {}
                    Err(Error::NetworkTransient(msg)) => {
                        sink.emit(format!("Network failure, stopping: {}", msg));
                        break 'pages;
                    }
                    Err(e @ Error::Database(_)) => {
                        sink.emit(format!("Storage failure, stopping: {}", e));
                        return Err(e);
                    }
                    Err(e) => {
                        sink.emit(format!("Skipped item: {}", e));
                    }
                }
            }

            page += 1;
            if page < pages {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(query, accepted, "Collection finished");
        sink.emit(format!("Accepted {} new vacancies", accepted));
        Ok(accepted)
    }

    /// One search item: dedup by URL before any detail fetch, then
    /// fetch, normalize and insert. `Ok(true)` means a new record landed.
    async fn process_item(
        &self,
        scope: CorpusScope,
        item: &RawVacancyItem,
        sink: &ProgressSink,
    ) -> Result<bool> {
        let url = item
            .alternate_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::InvalidInput("Search item has no URL".to_string()))?;

        if self.store.contains_url(scope, url).await? {
            return Ok(false);
        }

        let details = self.client.vacancy_details(url).await?;
        let draft = normalize(item, &details)?;

        match self.store.insert_vacancy(scope, &draft).await? {
            InsertOutcome::Inserted => {
                sink.emit(format!("Accepted: {}", draft.title));
                Ok(true)
            }
            InsertOutcome::Duplicate => Ok(false),
        }
    }
}

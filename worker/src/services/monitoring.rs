//! Request monitoring service
//!
//! One instance per worker, shared through `Arc`. Holds a bounded set of
//! recent request logs and per-session metrics, persists through a
//! `MonitorStore`, and publishes every change on a broadcast channel that
//! stream subscribers read from.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use uuid::Uuid;

use crate::core::metrics::fold_completed;
use crate::traits::MonitorStore;
use shared::{
    process_debug, process_warn, MonitorEvent, ProcessId, RequestLog, RequestMeta, RequestStatus, RequestUpdate,
    SessionId, SessionMetrics, StreamFrame, WorkerResponse,
};

/// Request logs kept in memory before archiving
pub const LOG_CAPACITY: usize = 1000;

/// Oldest entries moved to disk each time the capacity is exceeded
pub const ARCHIVE_BATCH: usize = 100;

/// Entries sent in the `initial` frame of a stream
pub const INITIAL_BATCH: usize = 50;

/// Broadcast buffer; slower subscribers skip ahead
pub const EVENT_BUFFER: usize = 256;

/// A stored log plus its arrival order, which breaks timestamp ties
#[derive(Debug, Clone)]
struct TrackedLog {
    seq: u64,
    log: RequestLog,
}

#[derive(Debug, Default)]
struct MonitorState {
    logs: HashMap<String, TrackedLog>,
    metrics: HashMap<SessionId, SessionMetrics>,
    next_seq: u64,
}

impl MonitorState {
    /// Matching logs, oldest first
    fn sorted_logs(&self, filter: Option<&SessionId>) -> Vec<RequestLog> {
        let mut tracked: Vec<&TrackedLog> = self.logs.values().filter(|t| t.log.matches_session(filter)).collect();
        tracked.sort_by_key(|t| (t.log.timestamp, t.seq));
        tracked.into_iter().map(|t| t.log.clone()).collect()
    }

    fn metrics_snapshot(&self, filter: Option<&SessionId>) -> Vec<SessionMetrics> {
        match filter {
            Some(session_id) => self.metrics.get(session_id).cloned().into_iter().collect(),
            None => {
                let mut all: Vec<_> = self.metrics.values().cloned().collect();
                all.sort_by(|a, b| a.session_id.cmp(&b.session_id));
                all
            }
        }
    }

    /// Remove and return the `count` oldest entries
    fn evict_oldest(&mut self, count: usize) -> Vec<RequestLog> {
        let mut order: Vec<(DateTime<Utc>, u64, String)> = self
            .logs
            .iter()
            .map(|(id, t)| (t.log.timestamp, t.seq, id.clone()))
            .collect();
        order.sort();

        order
            .into_iter()
            .take(count)
            .filter_map(|(_, _, id)| self.logs.remove(&id).map(|t| t.log))
            .collect()
    }
}

pub struct MonitoringService {
    state: RwLock<MonitorState>,
    events: broadcast::Sender<MonitorEvent>,
    store: Arc<dyn MonitorStore>,
    /// Serialises every store write so the last metrics save is the newest state
    store_writes: Mutex<()>,
    capacity: usize,
    archive_batch: usize,
}

impl MonitoringService {
    /// Empty service over `store`
    pub fn new(store: Arc<dyn MonitorStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: RwLock::new(MonitorState::default()),
            events,
            store,
            store_writes: Mutex::new(()),
            capacity: LOG_CAPACITY,
            archive_batch: ARCHIVE_BATCH,
        }
    }

    /// Service seeded with the metrics persisted by `store`
    pub async fn load(store: Arc<dyn MonitorStore>) -> Self {
        let service = Self::new(store);
        match service.store.load_metrics().await {
            Ok(metrics) => {
                let mut state = service.state.write().await;
                for entry in metrics {
                    state.metrics.insert(entry.session_id.clone(), entry);
                }
                process_debug!(ProcessId::current(), "📊 Loaded metrics for {} sessions", state.metrics.len());
            }
            Err(e) => {
                process_warn!(ProcessId::current(), "Failed to load metrics: {}", e);
            }
        }
        service
    }

    /// Configure capacity and archive batch (fluent API)
    pub fn with_capacity(mut self, capacity: usize, archive_batch: usize) -> Self {
        self.capacity = capacity.max(1);
        self.archive_batch = archive_batch.max(1);
        self
    }

    /// New receiver of every published event
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Live broadcast receivers
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn publish(&self, event: MonitorEvent) {
        // No receivers is the normal idle case
        let _ = self.events.send(event);
    }

    async fn archive(&self, logs: Vec<RequestLog>) {
        if logs.is_empty() {
            return;
        }
        let _writing = self.store_writes.lock().await;
        if let Err(e) = self.store.append_logs(&logs).await {
            process_warn!(ProcessId::current(), "Failed to append {} request logs: {}", logs.len(), e);
        }
    }

    /// Save the current metrics map
    ///
    /// The snapshot is taken while holding `store_writes`, so saves land in
    /// state order and the file never goes back to an older map.
    async fn persist_metrics(&self) {
        let _writing = self.store_writes.lock().await;
        let snapshot = self.state.read().await.metrics_snapshot(None);
        if let Err(e) = self.store.save_metrics(&snapshot).await {
            process_warn!(ProcessId::current(), "Failed to persist metrics: {}", e);
        }
    }

    /// Record a new pending request and return its id
    pub async fn start_request(&self, meta: RequestMeta) -> String {
        let id = Uuid::new_v4().to_string();
        let log = RequestLog {
            id: id.clone(),
            timestamp: Utc::now(),
            session_id: meta.session_id,
            method: meta.method,
            path: meta.path,
            status: RequestStatus::Pending,
            provider: meta.provider,
            model: meta.model,
            input_tokens: None,
            output_tokens: None,
            duration_ms: None,
            error: None,
        };

        let evicted = {
            let mut state = self.state.write().await;
            let seq = state.next_seq;
            state.next_seq += 1;
            state.logs.insert(id.clone(), TrackedLog { seq, log: log.clone() });

            if state.logs.len() > self.capacity {
                state.evict_oldest(self.archive_batch)
            } else {
                Vec::new()
            }
        };

        self.publish(MonitorEvent::RequestStart(log));
        if !evicted.is_empty() {
            process_debug!(ProcessId::current(), "🗄️ Archiving {} request logs", evicted.len());
            self.archive(evicted).await;
        }
        id
    }

    /// Merge `update` into a stored request
    ///
    /// Returns the merged entry, or `None` when the id is unknown (never
    /// started, or already archived).
    pub async fn update_request(&self, id: &str, update: RequestUpdate) -> Option<RequestLog> {
        let (log, changed, completed) = {
            let mut state = self.state.write().await;
            let tracked = state.logs.get_mut(id)?;
            let was_terminal = tracked.log.status.is_terminal();
            merge(&mut tracked.log, update);
            let log = tracked.log.clone();
            let completed = !was_terminal && log.status.is_terminal();

            let changed = match log.session_id.clone() {
                Some(session_id) => {
                    let entry = state
                        .metrics
                        .entry(session_id.clone())
                        .or_insert_with(|| SessionMetrics::new(session_id));
                    // Fold each request once, on its first terminal transition
                    if completed {
                        fold_completed(entry, &log);
                    }
                    Some(entry.clone())
                }
                None => None,
            };
            (log, changed, completed)
        };

        if changed.is_some() {
            self.persist_metrics().await;
        }
        self.publish(MonitorEvent::RequestUpdate(log.clone()));
        if let Some(changed) = changed {
            self.publish(MonitorEvent::MetricsUpdate(changed));
        }
        if completed {
            self.archive(vec![log.clone()]).await;
        }
        Some(log)
    }

    /// Complete a request now
    pub async fn end_request(
        &self,
        id: &str,
        response: Option<&WorkerResponse>,
        error: Option<String>,
    ) -> Option<RequestLog> {
        self.end_request_at(id, Utc::now(), response, error).await
    }

    /// Complete a request at `finished_at`; duration is measured from its start
    pub async fn end_request_at(
        &self,
        id: &str,
        finished_at: DateTime<Utc>,
        response: Option<&WorkerResponse>,
        error: Option<String>,
    ) -> Option<RequestLog> {
        let started_at = {
            let state = self.state.read().await;
            state.logs.get(id)?.log.timestamp
        };
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        let mut update = RequestUpdate {
            status: Some(if error.is_some() { RequestStatus::Error } else { RequestStatus::Success }),
            duration_ms: Some(duration_ms),
            error,
            ..RequestUpdate::default()
        };
        if let Some(response) = response {
            update.provider = response.provider.clone();
            update.model = response.model.clone();
            if let Some(usage) = &response.usage {
                update.input_tokens = Some(usage.input_tokens);
                update.output_tokens = Some(usage.output_tokens);
            }
        }

        let log = self.update_request(id, update).await?;
        self.publish(MonitorEvent::RequestEnd(log.clone()));
        Some(log)
    }

    /// Up to `limit` most recent matching logs, oldest first
    pub async fn recent_logs(&self, filter: Option<&SessionId>, limit: usize) -> Vec<RequestLog> {
        let state = self.state.read().await;
        let mut logs = state.sorted_logs(filter);
        let skip = logs.len().saturating_sub(limit);
        logs.drain(..skip);
        logs
    }

    /// Metrics for one session, or every session sorted by id
    pub async fn metrics(&self, filter: Option<&SessionId>) -> Vec<SessionMetrics> {
        self.state.read().await.metrics_snapshot(filter)
    }

    /// Drop matching in-memory logs; returns how many were removed
    pub async fn clear_logs(&self, filter: Option<&SessionId>) -> usize {
        let removed = {
            let mut state = self.state.write().await;
            let before = state.logs.len();
            state.logs.retain(|_, t| !t.log.matches_session(filter));
            before - state.logs.len()
        };
        self.publish(MonitorEvent::LogsCleared { session_id: filter.cloned() });
        removed
    }

    /// Drop matching metrics and persist; returns how many were removed
    pub async fn reset_metrics(&self, filter: Option<&SessionId>) -> usize {
        let removed = {
            let mut state = self.state.write().await;
            let before = state.metrics.len();
            match filter {
                Some(session_id) => {
                    state.metrics.remove(session_id);
                }
                None => state.metrics.clear(),
            }
            before - state.metrics.len()
        };
        self.persist_metrics().await;
        self.publish(MonitorEvent::MetricsReset { session_id: filter.cloned() });
        removed
    }

    /// Feed `sink` until `disconnect` fires or the sink closes
    ///
    /// Sends an `initial` frame with the most recent matching logs, then a
    /// `metrics` snapshot, then every matching live event. The broadcast
    /// receiver is released on return.
    pub async fn stream_logs(
        &self,
        sink: mpsc::Sender<StreamFrame>,
        filter: Option<SessionId>,
        mut disconnect: oneshot::Receiver<()>,
    ) {
        // Subscribe before the snapshot so nothing falls between the two
        let mut events = self.subscribe();

        let (initial, metrics) = {
            let state = self.state.read().await;
            let mut logs = state.sorted_logs(filter.as_ref());
            let skip = logs.len().saturating_sub(INITIAL_BATCH);
            logs.drain(..skip);
            (logs, state.metrics_snapshot(filter.as_ref()))
        };

        if sink.send(StreamFrame::Initial(initial)).await.is_err()
            || sink.send(StreamFrame::Metrics(metrics)).await.is_err()
        {
            return;
        }

        loop {
            // Disconnect wins over a ready event: nothing is sent once it fired
            tokio::select! {
                biased;
                _ = &mut disconnect => break,
                _ = sink.closed() => break,
                received = events.recv() => match received {
                    Ok(event) => {
                        if !event.matches_session(filter.as_ref()) {
                            continue;
                        }
                        if sink.send(event.to_frame()).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        process_warn!(ProcessId::current(), "Stream subscriber lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        process_debug!(ProcessId::current(), "Stream subscriber disconnected");
    }
}

fn merge(log: &mut RequestLog, update: RequestUpdate) {
    if let Some(session_id) = update.session_id {
        log.session_id = Some(session_id);
    }
    if let Some(status) = update.status {
        log.status = status;
    }
    if update.provider.is_some() {
        log.provider = update.provider;
    }
    if update.model.is_some() {
        log.model = update.model;
    }
    if update.input_tokens.is_some() {
        log.input_tokens = update.input_tokens;
    }
    if update.output_tokens.is_some() {
        log.output_tokens = update.output_tokens;
    }
    if update.duration_ms.is_some() {
        log.duration_ms = update.duration_ms;
    }
    if update.error.is_some() {
        log.error = update.error;
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use territory_shared::{AggregateReport, Record, aggregate_with_report, registry};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::max_records;

/// The record set currently on display plus everything derived from it.
/// Rebuilt as a whole on every submission and swapped in under the lock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub seq: u64,
    pub timestamp: String,
    pub records: Arc<Vec<Record>>,
    pub report: AggregateReport,
    /// Pre-serialized record array, shared by every `GET /api/records`.
    pub records_json: Arc<Bytes>,
}

impl Snapshot {
    pub fn build(seq: u64, records: Vec<Record>) -> Self {
        let started = Instant::now();
        let report = aggregate_with_report(&records, registry().regions());
        let records_json = serde_json::to_vec(&records)
            .map(Bytes::from)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to serialize record set");
                Bytes::from_static(b"[]")
            });

        info!(
            seq,
            records = records.len(),
            matched = report.matched,
            ignored = report.ignored,
            elapsed_us = started.elapsed().as_micros() as u64,
            "aggregated record set"
        );

        Self {
            seq,
            timestamp: Utc::now().to_rfc3339(),
            records: Arc::new(records),
            report,
            records_json: Arc::new(records_json),
        }
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            seq: self.seq,
            timestamp: self.timestamp.clone(),
            records: self.records.len(),
            matched: self.report.matched,
            ignored: self.report.ignored,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now().to_rfc3339(),
            records: Arc::new(Vec::new()),
            report: aggregate_with_report(&[], registry().regions()),
            records_json: Arc::new(Bytes::from_static(b"[]")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub seq: u64,
    pub timestamp: String,
    pub records: usize,
    pub matched: usize,
    pub ignored: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<RwLock<Snapshot>>,
    pub next_seq: Arc<AtomicU64>,
    pub max_records: usize,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    aggregation_passes_total: AtomicU64,
    ignored_records_total: AtomicU64,
    rejected_submissions_total: AtomicU64,
    stats_requests_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub aggregation_passes_total: u64,
    pub ignored_records_total: u64,
    pub rejected_submissions_total: u64,
    pub stats_requests_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            aggregation_passes_total: self.aggregation_passes_total.load(Ordering::Relaxed),
            ignored_records_total: self.ignored_records_total.load(Ordering::Relaxed),
            rejected_submissions_total: self.rejected_submissions_total.load(Ordering::Relaxed),
            stats_requests_total: self.stats_requests_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_aggregation_pass(&self, ignored: u64) {
        self.aggregation_passes_total
            .fetch_add(1, Ordering::Relaxed);
        self.ignored_records_total
            .fetch_add(ignored, Ordering::Relaxed);
    }

    pub fn record_rejected_submission(&self) {
        self.rejected_submissions_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stats_request(&self) {
        self.stats_requests_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_max_records(max_records())
    }

    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            next_seq: Arc::new(AtomicU64::new(0)),
            max_records,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    /// Replace the record set. Aggregation runs before the write lock is taken,
    /// so readers only ever see complete snapshots.
    pub async fn replace_records(&self, records: Vec<Record>) -> SnapshotSummary {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let next = Snapshot::build(seq, records);
        self.observability
            .record_aggregation_pass(next.report.ignored as u64);
        let summary = next.summary();

        let mut snapshot = self.snapshot.write().await;
        // A slower concurrent submission must not overwrite a newer one.
        if next.seq > snapshot.seq {
            *snapshot = next;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("test record should be an object"))
            .collect()
    }

    #[test]
    fn empty_snapshot_has_zeroed_stats_for_every_region() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.seq, 0);
        assert_eq!(snapshot.records_json.as_ref(), &Bytes::from_static(b"[]"));
        assert_eq!(snapshot.report.stats.len(), registry().len());
        assert!(snapshot.report.stats.values().all(|s| s.volume == 0));
    }

    #[tokio::test]
    async fn replace_records_bumps_seq_and_counts() {
        let state = AppState::with_max_records(10);
        let summary = state
            .replace_records(records(vec![
                json!({"_zip": "33301", "_score": 80}),
                json!({"Zip": "99999"}),
                json!({"name": "no zip"}),
            ]))
            .await;

        assert_eq!(summary.seq, 1);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.ignored, 2);

        let snapshot = state.snapshot.read().await;
        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.report.stats["33301"].volume, 1);

        let observed = state.observability.snapshot();
        assert_eq!(observed.aggregation_passes_total, 1);
        assert_eq!(observed.ignored_records_total, 2);
    }

    #[tokio::test]
    async fn later_submission_replaces_earlier_one() {
        let state = AppState::with_max_records(10);
        state
            .replace_records(records(vec![json!({"_zip": "33301"})]))
            .await;
        state
            .replace_records(records(vec![json!({"_zip": "33027"})]))
            .await;

        let snapshot = state.snapshot.read().await;
        assert_eq!(snapshot.seq, 2);
        assert_eq!(snapshot.report.stats["33301"].volume, 0);
        assert_eq!(snapshot.report.stats["33027"].volume, 1);
    }
}

//! Metrics sink boundary.
//!
//! Executors never touch counters directly; every measurement flows
//! through `MetricsEvent` into the store's `MetricsSink`.

use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Fetch,
    Save,
    Resolve,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        entity: Option<&'a str>,
    },
    ExecFinish {
        kind: ExecKind,
        entity: Option<&'a str>,
        rows_touched: u64,
        elapsed_micros: u64,
    },
    RowsScanned {
        entity: &'a str,
        rows_scanned: u64,
    },
    SchemaBuilt {
        entity: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// NoopSink
///

#[derive(Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _: MetricsEvent<'_>) {}
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EntityCounters {
    pub fetch_calls: u64,
    pub rows_loaded: u64,
    pub rows_scanned: u64,
    pub schemas_built: u64,
}

///
/// StoreMetrics
///
/// Default sink: process-local counters, one instance per store.
///

#[derive(Debug, Default)]
pub struct StoreMetrics {
    fetch_calls: AtomicU64,
    save_calls: AtomicU64,
    resolve_calls: AtomicU64,
    rows_loaded: AtomicU64,
    rows_saved: AtomicU64,
    rows_scanned: AtomicU64,
    schemas_built: AtomicU64,
    fetch_micros_max: AtomicU64,
    save_micros_max: AtomicU64,
    entities: Mutex<BTreeMap<String, EntityCounters>>,
}

impl StoreMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            fetch_calls: self.fetch_calls.load(Ordering::Relaxed),
            save_calls: self.save_calls.load(Ordering::Relaxed),
            resolve_calls: self.resolve_calls.load(Ordering::Relaxed),
            rows_loaded: self.rows_loaded.load(Ordering::Relaxed),
            rows_saved: self.rows_saved.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            schemas_built: self.schemas_built.load(Ordering::Relaxed),
            fetch_micros_max: self.fetch_micros_max.load(Ordering::Relaxed),
            save_micros_max: self.save_micros_max.load(Ordering::Relaxed),
            entities: self.entities.lock().clone(),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.fetch_calls,
            &self.save_calls,
            &self.resolve_calls,
            &self.rows_loaded,
            &self.rows_saved,
            &self.rows_scanned,
            &self.schemas_built,
            &self.fetch_micros_max,
            &self.save_micros_max,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.entities.lock().clear();
    }

    fn with_entity(&self, entity: &str, f: impl FnOnce(&mut EntityCounters)) {
        let mut entities = self.entities.lock();
        f(entities.entry(entity.to_string()).or_default());
    }
}

impl MetricsSink for StoreMetrics {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, entity } => {
                let counter = match kind {
                    ExecKind::Fetch => &self.fetch_calls,
                    ExecKind::Save => &self.save_calls,
                    ExecKind::Resolve => &self.resolve_calls,
                };
                counter.fetch_add(1, Ordering::Relaxed);

                if let (ExecKind::Fetch, Some(entity)) = (kind, entity) {
                    self.with_entity(entity, |e| e.fetch_calls = e.fetch_calls.saturating_add(1));
                }
            }

            MetricsEvent::ExecFinish {
                kind,
                entity,
                rows_touched,
                elapsed_micros,
            } => match kind {
                ExecKind::Fetch => {
                    self.rows_loaded.fetch_add(rows_touched, Ordering::Relaxed);
                    self.fetch_micros_max
                        .fetch_max(elapsed_micros, Ordering::Relaxed);
                    if let Some(entity) = entity {
                        self.with_entity(entity, |e| {
                            e.rows_loaded = e.rows_loaded.saturating_add(rows_touched);
                        });
                    }
                }
                ExecKind::Save => {
                    self.rows_saved.fetch_add(rows_touched, Ordering::Relaxed);
                    self.save_micros_max
                        .fetch_max(elapsed_micros, Ordering::Relaxed);
                }
                ExecKind::Resolve => {}
            },

            MetricsEvent::RowsScanned {
                entity,
                rows_scanned,
            } => {
                self.rows_scanned.fetch_add(rows_scanned, Ordering::Relaxed);
                self.with_entity(entity, |e| {
                    e.rows_scanned = e.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::SchemaBuilt { entity } => {
                self.schemas_built.fetch_add(1, Ordering::Relaxed);
                self.with_entity(entity, |e| e.schemas_built = e.schemas_built.saturating_add(1));
            }
        }
    }
}

///
/// MetricsReport
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub fetch_calls: u64,
    pub save_calls: u64,
    pub resolve_calls: u64,
    pub rows_loaded: u64,
    pub rows_saved: u64,
    pub rows_scanned: u64,
    pub schemas_built: u64,
    pub fetch_micros_max: u64,
    pub save_micros_max: u64,
    pub entities: BTreeMap<String, EntityCounters>,
}

/// Span
/// RAII guard that emits start/finish events for one executor call.
/// Finish accounting happens even when the call fails early.

pub(crate) struct Span<'a> {
    sink: &'a dyn MetricsSink,
    kind: ExecKind,
    entity: Option<&'a str>,
    start: Instant,
    rows: u64,
}

impl<'a> Span<'a> {
    pub(crate) fn new(sink: &'a dyn MetricsSink, kind: ExecKind, entity: Option<&'a str>) -> Self {
        sink.record(MetricsEvent::ExecStart { kind, entity });

        Self {
            sink,
            kind,
            entity,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        let elapsed_micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        self.sink.record(MetricsEvent::ExecFinish {
            kind: self.kind,
            entity: self.entity,
            rows_touched: self.rows,
            elapsed_micros,
        });
    }
}

//! Observability: per-store metrics and the sink abstraction.
//!
//! Logging goes through `tracing` at the call sites; this module only
//! carries counters.

pub(crate) mod sink;

pub(crate) use sink::Span;
pub use sink::{
    EntityCounters, ExecKind, MetricsEvent, MetricsReport, MetricsSink, NoopSink, StoreMetrics,
};

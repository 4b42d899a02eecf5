//! Metrics sink boundary.
//!
//! Core DB logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.

use crate::obs::metrics::{self, EventReport};
use std::cell::Cell;

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    QueryStart {
        entity_path: &'static str,
    },
    RowsScanned {
        entity_path: &'static str,
        rows_scanned: u64,
    },
    LateralGroup {
        candidates: u64,
        selected: u64,
    },
    JoinDrop,
    NullFill,
    QueryFinish {
        entity_path: &'static str,
        rows_emitted: u64,
    },
    Persist {
        entity_path: &'static str,
    },
    Commit {
        rows_written: u64,
    },
    Rollback,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::QueryStart { entity_path } => {
                m.ops.query_calls = m.ops.query_calls.saturating_add(1);
                let entry = m.entities.entry(entity_path.to_string()).or_default();
                entry.query_calls = entry.query_calls.saturating_add(1);
            }

            MetricsEvent::RowsScanned {
                entity_path,
                rows_scanned,
            } => {
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                let entry = m.entities.entry(entity_path.to_string()).or_default();
                entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
            }

            MetricsEvent::LateralGroup {
                candidates,
                selected,
            } => {
                m.ops.lateral_groups = m.ops.lateral_groups.saturating_add(1);
                m.ops.lateral_candidates = m.ops.lateral_candidates.saturating_add(candidates);
                m.ops.lateral_selected = m.ops.lateral_selected.saturating_add(selected);
            }

            MetricsEvent::JoinDrop => {
                m.ops.inner_drops = m.ops.inner_drops.saturating_add(1);
            }

            MetricsEvent::NullFill => {
                m.ops.left_null_fills = m.ops.left_null_fills.saturating_add(1);
            }

            MetricsEvent::QueryFinish {
                entity_path,
                rows_emitted,
            } => {
                m.ops.rows_emitted = m.ops.rows_emitted.saturating_add(rows_emitted);
                let entry = m.entities.entry(entity_path.to_string()).or_default();
                entry.rows_emitted = entry.rows_emitted.saturating_add(rows_emitted);
            }

            MetricsEvent::Persist { entity_path } => {
                m.ops.persist_calls = m.ops.persist_calls.saturating_add(1);
                let entry = m.entities.entry(entity_path.to_string()).or_default();
                entry.persist_calls = entry.persist_calls.saturating_add(1);
            }

            MetricsEvent::Commit { rows_written } => {
                m.ops.commits = m.ops.commits.saturating_add(1);
                m.ops.rows_written = m.ops.rows_written.saturating_add(rows_written);
            }

            MetricsEvent::Rollback => {
                m.ops.rollbacks = m.ops.rollbacks.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Route one event to the scoped override, or the global sink.
pub(crate) fn record(event: MetricsEvent) {
    match SINK_OVERRIDE.with(Cell::get) {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics state on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub(crate) fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<&'static dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.replace(Some(sink)));
    let _guard = Guard(prev);

    f()
}

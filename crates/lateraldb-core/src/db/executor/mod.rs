//! Plan execution: correlation indexes, lateral top-N selection, join
//! fan-out, and projection.

mod correlation;
mod join;
mod lateral;
mod projection;


use crate::{
    db::{query::plan::ExecutablePlan, response::JoinResult, store::RowSource},
    error::InternalError,
    obs::sink::{MetricsEvent, record},
    value::natural_cmp,
};
use correlation::CorrelationIndex;
use join::{PreparedJoin, join_base_row};
use projection::project;

// re-exports
pub use correlation::key_of;
pub use lateral::Comparator;

///
/// JoinExecutor
///
/// Runs an [`ExecutablePlan`] against a borrowed row source.
/// Single pass; any failure aborts the query with no partial result.
///

pub struct JoinExecutor<'s, S: RowSource + ?Sized> {
    source: &'s S,
    debug: bool,
    comparator: Comparator,
}

impl<'s, S: RowSource + ?Sized> JoinExecutor<'s, S> {
    #[must_use]
    pub const fn new(source: &'s S, debug: bool) -> Self {
        Self {
            source,
            debug,
            comparator: natural_cmp,
        }
    }

    /// Replace the order-key comparator; nulls still sort last.
    #[must_use]
    pub const fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            tracing::debug!(target: "lateraldb::executor", "{}", s.as_ref());
        }
    }

    pub fn execute(&self, plan: &ExecutablePlan) -> Result<JoinResult, InternalError> {
        let root = plan.root();
        let entity_path = root.model.path;
        record(MetricsEvent::QueryStart { entity_path });

        if self.debug {
            self.debug_log(format!(
                "query {} on '{}' ({} joins)",
                plan.fingerprint(),
                root.model.entity_name,
                plan.joins.len()
            ));
        }

        let base_rows = self.source.rows_for(root.model.entity_name)?;
        record(MetricsEvent::RowsScanned {
            entity_path,
            rows_scanned: base_rows.len() as u64,
        });

        let joins = plan
            .joins
            .iter()
            .map(|step| {
                let rows = self.source.rows_for(step.subplan.entity.entity_name)?;
                record(MetricsEvent::RowsScanned {
                    entity_path: step.subplan.entity.path,
                    rows_scanned: rows.len() as u64,
                });

                let index = CorrelationIndex::build(rows, step.subplan.correlation_index)?;
                self.debug_log(format!(
                    "join '{}' indexed {} rows in {} groups",
                    step.alias,
                    rows.len(),
                    index.group_count()
                ));

                Ok(PreparedJoin { step, index })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        let mut rows = Vec::new();
        for base in base_rows {
            for binding in join_base_row(base, plan.slots.len(), &joins, self.comparator)? {
                rows.push(project(&binding, &plan.projection)?);
            }
        }

        self.debug_log(format!(
            "query on '{}' emitted {} rows from {} base rows",
            root.model.entity_name,
            rows.len(),
            base_rows.len()
        ));
        record(MetricsEvent::QueryFinish {
            entity_path,
            rows_emitted: rows.len() as u64,
        });

        Ok(JoinResult {
            columns: plan.columns(),
            rows,
        })
    }
}

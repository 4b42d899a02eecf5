use crate::{
    db::{
        executor::correlation::key_at,
        query::{
            expr::SlotColumn,
            plan::{OrderKey, SubplanSpec},
        },
        store::Row,
    },
    error::{InternalError, ProjectionError},
    value::{Value, nulls_last, strict_order_cmp},
};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// Value comparator applied to non-null order keys.
pub type Comparator = fn(&Value, &Value) -> Ordering;

///
/// LateralSubplan
///
/// Per-outer-row child selection: correlate, filter, stable sort, take N.
/// Pure over its inputs; the same parent key and candidates always select
/// the same rows in the same order.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct LateralSubplan<'p> {
    spec: &'p SubplanSpec,
}

impl<'p> LateralSubplan<'p> {
    pub(crate) const fn new(spec: &'p SubplanSpec) -> Self {
        Self { spec }
    }

    /// Select the top-N children of `parent_key` under `cmp`.
    ///
    /// A NULL parent key selects nothing; fewer than N matches selects them
    /// all; a limit of zero selects nothing.
    pub(crate) fn evaluate<'r>(
        &self,
        parent_key: &Value,
        child_rows: &[&'r Row],
        cmp: Comparator,
    ) -> Result<Vec<&'r Row>, InternalError> {
        if parent_key.is_null() || self.spec.limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut selected = Vec::new();
        for &row in child_rows {
            let key = key_at(row, self.spec.correlation_index)?;
            if strict_order_cmp(key, parent_key) != Some(Ordering::Equal) {
                continue;
            }
            if self.passes_filter(row)? {
                selected.push(row);
            }
        }

        if !self.spec.order.is_empty() {
            // sort_by is stable: equal keys keep input order
            selected.sort_by(|a, b| compare_rows(a, b, &self.spec.order, cmp));
        }
        if let Some(limit) = self.spec.limit {
            selected.truncate(limit);
        }

        Ok(selected)
    }

    fn passes_filter(&self, row: &Row) -> Result<bool, InternalError> {
        let Some(filter) = &self.spec.filter else {
            return Ok(true);
        };

        filter.passes(&|column: SlotColumn| {
            row.get(column.index).map(Some).ok_or_else(|| {
                InternalError::executor_projection(ProjectionError::MissingValue {
                    slot: column.slot,
                    index: column.index,
                })
            })
        })
    }
}

fn compare_rows(left: &Row, right: &Row, order: &[OrderKey], cmp: Comparator) -> Ordering {
    for key in order {
        let a = left.get(key.index).unwrap_or(&NULL);
        let b = right.get(key.index).unwrap_or(&NULL);
        let ord = nulls_last(a, b, key.direction.is_descending(), cmp);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

use crate::{
    db::{
        executor::{
            correlation::{CorrelationIndex, key_at},
            lateral::{Comparator, LateralSubplan},
            projection::Binding,
        },
        query::plan::{JoinKind, JoinStep},
        store::Row,
    },
    error::InternalError,
    obs::sink::{MetricsEvent, record},
    value::Value,
};

///
/// PreparedJoin
///
/// A join step paired with its child collection's correlation index.
///

pub(crate) struct PreparedJoin<'p, 'r> {
    pub(crate) step: &'p JoinStep,
    pub(crate) index: CorrelationIndex<'r>,
}

/// Expand one base row through every join in declaration order.
///
/// Each join maps every partial binding to one binding per selected child.
/// An empty selection drops the binding under INNER and keeps it with the
/// slot unbound under LEFT. Bindings come out in base-then-child order.
pub(crate) fn join_base_row<'r>(
    base: &'r Row,
    slot_count: usize,
    joins: &[PreparedJoin<'_, 'r>],
    cmp: Comparator,
) -> Result<Vec<Binding<'r>>, InternalError> {
    let mut root: Binding<'r> = vec![None; slot_count];
    root[0] = Some(base);
    let mut bindings = vec![root];

    for join in joins {
        let subplan = LateralSubplan::new(&join.step.subplan);
        let mut next = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let parent_key = parent_key(&binding, join.step)?;
            let candidates = join.index.candidates(&parent_key);
            if let Some((owner, relation)) = join.step.relation {
                relation.check_targets(owner.entity_name, &parent_key, candidates.len())?;
            }
            let selected = subplan.evaluate(&parent_key, candidates, cmp)?;

            record(MetricsEvent::LateralGroup {
                candidates: candidates.len() as u64,
                selected: selected.len() as u64,
            });

            if selected.is_empty() {
                match join.step.kind {
                    JoinKind::Inner => record(MetricsEvent::JoinDrop),
                    JoinKind::Left => {
                        record(MetricsEvent::NullFill);
                        next.push(binding);
                    }
                }
                continue;
            }

            for child in selected {
                let mut expanded = binding.clone();
                expanded[join.step.slot] = Some(child);
                next.push(expanded);
            }
        }

        bindings = next;
        if bindings.is_empty() {
            break;
        }
    }

    Ok(bindings)
}

// An unbound outer slot correlates as NULL and selects nothing.
fn parent_key(binding: &[Option<&Row>], step: &JoinStep) -> Result<Value, InternalError> {
    match binding.get(step.outer.slot).copied().flatten() {
        Some(row) => key_at(row, step.outer.index).cloned(),
        None => Ok(Value::Null),
    }
}

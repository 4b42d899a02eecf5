//! Deterministic SQL-like rendering of executable plans, and the plan
//! fingerprint derived from it.

use crate::db::query::plan::{ExecutablePlan, JoinStep, SlotLayout};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

///
/// PlanFingerprint
///
/// Stable, deterministic fingerprint for resolved plans: a SHA-256 digest
/// of the explain text, so plans that explain identically always match
/// and distinct plans match only on a hash collision.
/// The executor's comparator is not part of the plan and does not
/// contribute; runs with different comparators share a fingerprint.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PlanFingerprint([u8; 32]);

impl PlanFingerprint {
    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

impl ExecutablePlan {
    /// Render the resolved plan, one clause per line.
    #[must_use]
    pub fn explain(&self) -> String {
        let mut out = String::new();

        let select = self
            .projection
            .iter()
            .map(|step| format!("{} AS {}", step.expr, step.label))
            .collect::<Vec<_>>()
            .join(", ");
        let root = self.root();
        let _ = writeln!(out, "SELECT {select}");
        let _ = write!(out, "FROM {} AS {}", root.model.entity_name, root.alias);

        for join in &self.joins {
            out.push('\n');
            out.push_str(&explain_join(join, &self.slots[join.slot]));
        }

        out
    }

    /// Compute a stable fingerprint for this plan.
    #[must_use]
    pub fn fingerprint(&self) -> PlanFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(b"planfp:v1");
        hasher.update(self.explain().as_bytes());
        let digest = hasher.finalize();

        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        PlanFingerprint(out)
    }
}

fn explain_join(join: &JoinStep, slot: &SlotLayout) -> String {
    let subplan = &join.subplan;
    let entity = subplan.entity.entity_name;
    let inner_field = subplan.entity.fields[subplan.correlation_index].name;

    if !join.lateral {
        let mut out = format!(
            "{} JOIN {entity} AS {} ON {}.{inner_field} = {}",
            join.kind, join.alias, join.alias, join.outer_label
        );
        if let Some(filter) = &subplan.filter {
            let _ = write!(out, " AND {filter}");
        }
        return out;
    }

    let columns = slot.columns.as_ref().map_or_else(
        || "*".to_string(),
        |columns| {
            columns
                .iter()
                .map(|(name, index)| format!("{} AS {name}", subplan.entity.fields[*index].name))
                .collect::<Vec<_>>()
                .join(", ")
        },
    );

    let mut inner = format!(
        "SELECT {columns} FROM {entity} AS {} WHERE {}.{inner_field} = {}",
        join.alias, join.alias, join.outer_label
    );
    if let Some(filter) = &subplan.filter {
        let _ = write!(inner, " AND {filter}");
    }
    if !subplan.order.is_empty() {
        let order = subplan
            .order
            .iter()
            .map(|key| format!("{} {} NULLS LAST", key.field, key.direction))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(inner, " ORDER BY {order}");
    }
    if let Some(limit) = subplan.limit {
        let _ = write!(inner, " LIMIT {limit}");
    }

    format!("{} JOIN LATERAL ({inner}) AS {} ON TRUE", join.kind, join.alias)
}

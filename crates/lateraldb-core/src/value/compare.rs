use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used by key indexes and plan rendering.
///
/// Ordering rules:
/// 1. Canonical variant rank (numerics share one rank, `Null` ranks last)
/// 2. Variant-specific comparison for same-ranked values
///
/// Mixed-variant comparisons are rank-only and must remain deterministic.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.canonical_rank().cmp(&right.canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    strict_order_cmp(left, right).unwrap_or(Ordering::Equal)
}

/// Strict comparator for orderable values of one family.
///
/// Numerics widen to `Decimal` so `Int`, `Uint` and `Decimal` compare by
/// magnitude. Returns `None` for `Null` or mismatched families.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            let a = a.to_decimal()?;
            let b = b.to_decimal()?;
            Some(a.cmp(&b))
        }
        _ => None,
    }
}

/// Natural ordering for non-null values, the default lateral comparator.
///
/// Mismatched families fall back to canonical rank so the result stays total.
#[must_use]
pub fn natural_cmp(left: &Value, right: &Value) -> Ordering {
    strict_order_cmp(left, right).unwrap_or_else(|| canonical_cmp(left, right))
}

/// Apply one order key: nulls sort after every non-null value in both
/// directions; `descending` reverses only the non-null comparison.
#[must_use]
pub fn nulls_last(
    left: &Value,
    right: &Value,
    descending: bool,
    cmp: fn(&Value, &Value) -> Ordering,
) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = cmp(left, right);
            if descending { ord.reverse() } else { ord }
        }
    }
}

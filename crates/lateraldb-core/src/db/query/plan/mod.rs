//! Logical query plans and their resolution into executable form.

mod executable;
mod explain;


use crate::db::query::expr::{ColumnRef, Expr};
use std::fmt;

// re-exports
pub use executable::ExecutablePlan;
pub(crate) use executable::{JoinStep, OrderKey, ProjectionStep, SlotLayout, SubplanSpec};
pub use explain::PlanFingerprint;

///
/// JoinKind
///
/// `Inner` drops base rows with no selected child;
/// `Left` keeps them with the child slot unbound.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
        };
        write!(f, "{label}")
    }
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        };
        write!(f, "{label}")
    }
}

///
/// OrderSpec
///
/// Lexicographic sort keys; the first differing key decides.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderSpec {
    pub fields: Vec<(String, OrderDirection)>,
}

impl OrderSpec {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

///
/// CollectionSelector
///
/// How a join finds the child collection for one outer row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollectionSelector {
    /// Follow a declared relation from an earlier alias.
    Relation { outer: String, relation: String },

    /// Correlate an entity on `inner_field = outer`.
    Correlated {
        entity: String,
        outer: ColumnRef,
        inner_field: String,
    },
}

impl CollectionSelector {
    #[must_use]
    pub fn outer_alias(&self) -> &str {
        match self {
            Self::Relation { outer, .. } => outer,
            Self::Correlated { outer, .. } => &outer.alias,
        }
    }
}

///
/// LateralColumn
/// One projected field of a lateral subquery, renamed to `alias`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LateralColumn {
    pub field: String,
    pub alias: String,
}

///
/// LateralSpec
///
/// Correlated top-N subquery: select the child collection, keep rows that
/// pass `filter`, stable-sort by `order`, then take `limit` rows.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LateralSpec {
    pub selector: CollectionSelector,
    pub filter: Option<Expr>,
    pub order: OrderSpec,
    pub limit: Option<u32>,
    pub columns: Vec<LateralColumn>,
}

///
/// JoinSource
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinSource {
    /// Plain relation join with an optional ON filter.
    Relation {
        selector: CollectionSelector,
        on: Option<Expr>,
    },

    /// Lateral top-N subquery.
    Lateral(LateralSpec),
}

///
/// JoinSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinSpec {
    pub alias: String,
    pub kind: JoinKind,
    pub source: JoinSource,
}

impl JoinSpec {
    #[must_use]
    pub const fn is_lateral(&self) -> bool {
        matches!(self.source, JoinSource::Lateral(_))
    }
}

///
/// ProjectionItem
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectionItem {
    pub label: String,
    pub expr: Expr,
}

///
/// QueryPlan
///
/// Logical plan: root collection, joins in evaluation order, and the
/// output projection. Immutable once built; compile it against a schema
/// to obtain an [`ExecutablePlan`].
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryPlan {
    pub entity: String,
    pub alias: String,
    pub joins: Vec<JoinSpec>,
    pub projection: Vec<ProjectionItem>,
}

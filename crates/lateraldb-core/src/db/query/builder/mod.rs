//! Fluent construction of [`QueryPlan`]s.


use crate::db::query::{
    expr::{ColumnRef, Expr},
    plan::{
        CollectionSelector, JoinKind, JoinSource, JoinSpec, LateralColumn, LateralSpec,
        OrderDirection, OrderSpec, ProjectionItem, QueryPlan,
    },
};

///
/// Query
///
/// Builder for a root collection, its joins, and the output projection.
/// Nothing is validated until the built plan is compiled.
///

#[derive(Clone, Debug)]
pub struct Query {
    plan: QueryPlan,
}

impl Query {
    /// Start from an entity collection, aliased by its own name.
    #[must_use]
    pub fn from(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::from_as(entity.clone(), entity)
    }

    /// Start from an entity collection under an explicit alias.
    #[must_use]
    pub fn from_as(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            plan: QueryPlan {
                entity: entity.into(),
                alias: alias.into(),
                joins: Vec::new(),
                projection: Vec::new(),
            },
        }
    }

    /// Append a join; joins are evaluated in the order they are added.
    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.plan.joins.push(join);
        self
    }

    /// Project an expression; columns are labelled `alias.field`,
    /// other expressions `col<position>`.
    #[must_use]
    pub fn select(self, expr: Expr) -> Self {
        let label = match &expr {
            Expr::Column(column) => column.to_string(),
            _ => format!("col{}", self.plan.projection.len()),
        };
        self.select_as(label, expr)
    }

    /// Project an expression under an explicit label.
    #[must_use]
    pub fn select_as(mut self, label: impl Into<String>, expr: Expr) -> Self {
        self.plan.projection.push(ProjectionItem {
            label: label.into(),
            expr,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> QueryPlan {
        self.plan
    }
}

impl JoinSpec {
    /// INNER join following `relation` from `outer`, aliased by the
    /// relation name.
    #[must_use]
    pub fn relation(outer: impl Into<String>, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        Self {
            alias: relation.clone(),
            kind: JoinKind::Inner,
            source: JoinSource::Relation {
                selector: CollectionSelector::Relation {
                    outer: outer.into(),
                    relation,
                },
                on: None,
            },
        }
    }

    /// INNER lateral join binding `spec`'s selected rows to `alias`.
    #[must_use]
    pub fn lateral(alias: impl Into<String>, spec: LateralSpec) -> Self {
        Self {
            alias: alias.into(),
            kind: JoinKind::Inner,
            source: JoinSource::Lateral(spec),
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub fn left(mut self) -> Self {
        self.kind = JoinKind::Left;
        self
    }

    #[must_use]
    pub fn inner(mut self) -> Self {
        self.kind = JoinKind::Inner;
        self
    }

    /// Add a filter over the joined rows; repeated calls are ANDed.
    ///
    /// For lateral joins the filter applies before ordering and limiting.
    #[must_use]
    pub fn on(mut self, expr: Expr) -> Self {
        let slot = match &mut self.source {
            JoinSource::Relation { on, .. } => on,
            JoinSource::Lateral(spec) => &mut spec.filter,
        };
        *slot = Some(match slot.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }
}

impl LateralSpec {
    /// Child rows reached through `relation` on `outer`.
    #[must_use]
    pub fn correlate(outer: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::with_selector(CollectionSelector::Relation {
            outer: outer.into(),
            relation: relation.into(),
        })
    }

    /// Rows of `entity` whose `inner_field` equals `outer`.
    #[must_use]
    pub fn correlate_on(
        entity: impl Into<String>,
        outer: ColumnRef,
        inner_field: impl Into<String>,
    ) -> Self {
        Self::with_selector(CollectionSelector::Correlated {
            entity: entity.into(),
            outer,
            inner_field: inner_field.into(),
        })
    }

    fn with_selector(selector: CollectionSelector) -> Self {
        Self {
            selector,
            filter: None,
            order: OrderSpec { fields: Vec::new() },
            limit: None,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.fields.push((field.into(), OrderDirection::Asc));
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order.fields.push((field.into(), OrderDirection::Desc));
        self
    }

    /// Keep at most `n` rows per outer row.
    #[must_use]
    pub fn fetch(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Expose `field` of the selected rows as `alias`.
    #[must_use]
    pub fn select(mut self, field: impl Into<String>, alias: impl Into<String>) -> Self {
        self.columns.push(LateralColumn {
            field: field.into(),
            alias: alias.into(),
        });
        self
    }

    /// Filter candidate rows; repeated calls are ANDed.
    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }
}

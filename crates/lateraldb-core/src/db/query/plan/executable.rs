use crate::{
    db::query::{
        expr::{ColumnRef, Expr, ResolvedExpr, SlotColumn, resolve},
        plan::{
            CollectionSelector, JoinKind, JoinSource, JoinSpec, LateralColumn, OrderDirection,
            QueryPlan,
        },
    },
    error::{InternalError, JoinSpecError, NotFoundError, ProjectionError},
    model::{
        entity::EntityModel, field::FieldKind, relation::RelationModel, schema::Schema,
    },
};

///
/// SlotLayout
///
/// One bound alias. Slot 0 is the root; each join appends one slot.
///

#[derive(Clone, Debug)]
pub(crate) struct SlotLayout {
    pub(crate) alias: String,
    pub(crate) model: &'static EntityModel,
    pub(crate) lateral: bool,

    /// Visible `(column, row index)` pairs; `None` exposes every field.
    pub(crate) columns: Option<Vec<(String, usize)>>,
}

///
/// OrderKey
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct OrderKey {
    pub(crate) index: usize,
    pub(crate) field: &'static str,
    pub(crate) direction: OrderDirection,
}

///
/// SubplanSpec
///
/// Resolved per-outer-row child selection. Filter columns address the
/// candidate row as slot 0.
///

#[derive(Clone, Debug)]
pub(crate) struct SubplanSpec {
    pub(crate) entity: &'static EntityModel,
    pub(crate) correlation_index: usize,
    pub(crate) filter: Option<ResolvedExpr>,
    pub(crate) order: Vec<OrderKey>,
    pub(crate) limit: Option<usize>,
}

///
/// JoinStep
///

#[derive(Clone, Debug)]
pub(crate) struct JoinStep {
    pub(crate) alias: String,
    pub(crate) slot: usize,
    pub(crate) kind: JoinKind,
    pub(crate) lateral: bool,
    pub(crate) outer: SlotColumn,
    pub(crate) outer_label: String,

    /// Owner entity and declared relation, when the join follows one.
    pub(crate) relation: Option<(&'static EntityModel, &'static RelationModel)>,
    pub(crate) subplan: SubplanSpec,
}

///
/// ProjectionStep
///

#[derive(Clone, Debug)]
pub(crate) struct ProjectionStep {
    pub(crate) label: String,
    pub(crate) expr: ResolvedExpr,
}

///
/// ExecutablePlan
///
/// A [`QueryPlan`] with every alias, field, relation and order key
/// resolved against a schema. Holds no rows; one plan may be executed
/// against any row source carrying the same schema.
///

#[derive(Clone, Debug)]
pub struct ExecutablePlan {
    pub(crate) slots: Vec<SlotLayout>,
    pub(crate) joins: Vec<JoinStep>,
    pub(crate) projection: Vec<ProjectionStep>,
}

impl ExecutablePlan {
    /// Root entity name.
    #[must_use]
    pub fn root_entity(&self) -> &'static str {
        self.slots[0].model.entity_name
    }

    /// Output column labels in projection order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.projection.iter().map(|step| step.label.clone()).collect()
    }

    /// Bound aliases in evaluation order, root first.
    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.alias.as_str()).collect()
    }

    pub(crate) fn root(&self) -> &SlotLayout {
        &self.slots[0]
    }
}

impl QueryPlan {
    /// Resolve this plan against `schema`.
    ///
    /// Rejects unknown entities and relations, duplicate or unknown
    /// aliases, correlations on lateral aliases, incompatible correlation
    /// fields, unknown order keys, filters that reach outside their join,
    /// and projections of columns a lateral subquery does not expose.
    pub fn compile(&self, schema: &Schema) -> Result<ExecutablePlan, InternalError> {
        let mut resolver = Resolver {
            schema,
            slots: vec![SlotLayout {
                alias: self.alias.clone(),
                model: entity(schema, &self.entity)?,
                lateral: false,
                columns: None,
            }],
        };

        let joins = self
            .joins
            .iter()
            .map(|join| resolver.join(join))
            .collect::<Result<Vec<_>, _>>()?;

        if self.projection.is_empty() {
            return Err(InternalError::projection(ProjectionError::Empty));
        }

        let projection = self
            .projection
            .iter()
            .map(|item| {
                Ok(ProjectionStep {
                    label: item.label.clone(),
                    expr: resolver.projection(&item.label, &item.expr)?,
                })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok(ExecutablePlan {
            slots: resolver.slots,
            joins,
            projection,
        })
    }
}

///
/// Resolver
///

struct Resolver<'a> {
    schema: &'a Schema,
    slots: Vec<SlotLayout>,
}

impl Resolver<'_> {
    fn slot(&self, alias: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.alias == alias)
    }

    fn join(&mut self, join: &JoinSpec) -> Result<JoinStep, InternalError> {
        if self.slot(&join.alias).is_some() {
            return Err(InternalError::join_spec(JoinSpecError::DuplicateAlias {
                alias: join.alias.clone(),
            }));
        }

        let (selector, lateral) = match &join.source {
            JoinSource::Relation { selector, .. } => (selector, false),
            JoinSource::Lateral(spec) => (&spec.selector, true),
        };
        let correlation = self.correlation(selector)?;
        let target = correlation.target;

        let (filter, order, limit, columns) = match &join.source {
            JoinSource::Relation { on, .. } => (on.as_ref(), Vec::new(), None, None),
            JoinSource::Lateral(spec) => {
                let order = spec
                    .order
                    .fields
                    .iter()
                    .map(|(field, direction)| order_key(target, field, *direction))
                    .collect::<Result<Vec<_>, _>>()?;
                let limit = spec
                    .limit
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
                let columns = lateral_columns(&join.alias, target, spec.columns.as_slice())?;

                (spec.filter.as_ref(), order, limit, columns)
            }
        };

        let filter = filter
            .map(|expr| resolve_filter(&join.alias, target, expr))
            .transpose()?;

        let slot = self.slots.len();
        self.slots.push(SlotLayout {
            alias: join.alias.clone(),
            model: target,
            lateral,
            columns,
        });

        Ok(JoinStep {
            alias: join.alias.clone(),
            slot,
            kind: join.kind,
            lateral,
            outer: correlation.outer,
            outer_label: correlation.outer_label,
            relation: correlation.relation,
            subplan: SubplanSpec {
                entity: target,
                correlation_index: correlation.inner_index,
                filter,
                order,
                limit,
            },
        })
    }

    fn correlation(&self, selector: &CollectionSelector) -> Result<Correlation, InternalError> {
        let outer_alias = selector.outer_alias();
        let outer_slot = self.slot(outer_alias).ok_or_else(|| {
            InternalError::join_spec(JoinSpecError::UnknownAlias {
                alias: outer_alias.to_string(),
            })
        })?;
        let outer = &self.slots[outer_slot];
        let owner: &'static EntityModel = outer.model;
        if outer.lateral {
            return Err(InternalError::join_spec(
                JoinSpecError::LateralCorrelation {
                    alias: outer_alias.to_string(),
                },
            ));
        }

        let (target, outer_field, inner_field, relation) = match selector {
            CollectionSelector::Relation { relation, .. } => {
                let model = owner.relation(relation).ok_or_else(|| {
                    InternalError::plan_not_found(NotFoundError::Relation {
                        entity: outer.model.entity_name.to_string(),
                        relation: relation.clone(),
                    })
                })?;

                (
                    entity(self.schema, model.target)?,
                    model.local_field,
                    model.remote_field,
                    Some((owner, model)),
                )
            }
            CollectionSelector::Correlated {
                entity: name,
                outer: ColumnRef { field, .. },
                inner_field,
            } => (
                entity(self.schema, name)?,
                field.as_str(),
                inner_field.as_str(),
                None,
            ),
        };

        let outer_index = correlation_field(outer.model, outer_field)?;
        let inner_index = correlation_field(target, inner_field)?;

        let outer_kind = outer.model.fields[outer_index].kind;
        let inner_kind = target.fields[inner_index].kind;
        if !outer_kind.is_comparable_with(inner_kind) {
            return Err(InternalError::join_spec(
                JoinSpecError::IncompatibleCorrelation {
                    outer_entity: outer.model.entity_name.to_string(),
                    outer_field: outer_field.to_string(),
                    inner_entity: target.entity_name.to_string(),
                    inner_field: inner_field.to_string(),
                },
            ));
        }

        Ok(Correlation {
            outer: SlotColumn {
                slot: outer_slot,
                index: outer_index,
            },
            outer_label: format!("{}.{outer_field}", outer.alias),
            target,
            inner_index,
            relation,
        })
    }

    fn projection(&self, label: &str, expr: &Expr) -> Result<ResolvedExpr, InternalError> {
        let column = |reference: &ColumnRef| -> Result<(SlotColumn, FieldKind), InternalError> {
            let slot = self.slot(&reference.alias).ok_or_else(|| {
                InternalError::projection(ProjectionError::UnknownAlias {
                    alias: reference.alias.clone(),
                })
            })?;
            let layout = &self.slots[slot];
            let index = visible_column(layout, &reference.field)?;

            Ok((SlotColumn { slot, index }, layout.model.fields[index].kind))
        };
        let incomparable = |detail: String| {
            InternalError::projection(ProjectionError::IncomparableOperands {
                label: label.to_string(),
                detail,
            })
        };

        resolve(expr, &column, &incomparable).map(|(resolved, _)| resolved)
    }
}

struct Correlation {
    outer: SlotColumn,
    outer_label: String,
    target: &'static EntityModel,
    inner_index: usize,
    relation: Option<(&'static EntityModel, &'static RelationModel)>,
}

fn entity(schema: &Schema, name: &str) -> Result<&'static EntityModel, InternalError> {
    schema.entity(name).ok_or_else(|| {
        InternalError::plan_not_found(NotFoundError::Entity {
            entity: name.to_string(),
        })
    })
}

fn correlation_field(model: &EntityModel, field: &str) -> Result<usize, InternalError> {
    model.field_index(field).ok_or_else(|| {
        InternalError::join_spec(JoinSpecError::UnknownCorrelationField {
            entity: model.entity_name.to_string(),
            field: field.to_string(),
        })
    })
}

fn order_key(
    model: &'static EntityModel,
    field: &str,
    direction: OrderDirection,
) -> Result<OrderKey, InternalError> {
    let index = model.field_index(field).ok_or_else(|| {
        InternalError::join_spec(JoinSpecError::UnknownOrderKey {
            entity: model.entity_name.to_string(),
            field: field.to_string(),
        })
    })?;

    Ok(OrderKey {
        index,
        field: model.fields[index].name,
        direction,
    })
}

// Resolve a lateral's projected columns; an empty list exposes every field.
fn lateral_columns(
    alias: &str,
    model: &EntityModel,
    columns: &[LateralColumn],
) -> Result<Option<Vec<(String, usize)>>, InternalError> {
    if columns.is_empty() {
        return Ok(None);
    }

    let mut resolved: Vec<(String, usize)> = Vec::with_capacity(columns.len());
    for column in columns {
        let index = model.field_index(&column.field).ok_or_else(|| {
            InternalError::join_spec(JoinSpecError::UnknownLateralField {
                alias: alias.to_string(),
                entity: model.entity_name.to_string(),
                field: column.field.clone(),
            })
        })?;
        if resolved.iter().any(|(name, _)| *name == column.alias) {
            return Err(InternalError::join_spec(
                JoinSpecError::DuplicateLateralColumn {
                    alias: alias.to_string(),
                    column: column.alias.clone(),
                },
            ));
        }
        resolved.push((column.alias.clone(), index));
    }

    Ok(Some(resolved))
}

fn visible_column(layout: &SlotLayout, field: &str) -> Result<usize, InternalError> {
    let unknown = || {
        InternalError::projection(ProjectionError::UnknownField {
            alias: layout.alias.clone(),
            field: field.to_string(),
        })
    };

    match &layout.columns {
        None => layout.model.field_index(field).ok_or_else(unknown),
        Some(columns) => columns
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, index)| *index)
            .ok_or_else(|| {
                if layout.model.field_index(field).is_some() {
                    InternalError::projection(ProjectionError::NotProjected {
                        alias: layout.alias.clone(),
                        field: field.to_string(),
                    })
                } else {
                    unknown()
                }
            }),
    }
}

// Filters see only the joined row itself, addressed as slot 0.
fn resolve_filter(
    alias: &str,
    model: &EntityModel,
    expr: &Expr,
) -> Result<ResolvedExpr, InternalError> {
    let column = |reference: &ColumnRef| -> Result<(SlotColumn, FieldKind), InternalError> {
        if reference.alias != alias {
            return Err(InternalError::join_spec(JoinSpecError::FilterOutOfScope {
                alias: alias.to_string(),
                referenced: reference.to_string(),
            }));
        }
        let index = model.field_index(&reference.field).ok_or_else(|| {
            InternalError::join_spec(JoinSpecError::UnknownFilterField {
                alias: alias.to_string(),
                field: reference.field.clone(),
            })
        })?;

        Ok((SlotColumn { slot: 0, index }, model.fields[index].kind))
    };
    let incomparable = |detail: String| {
        InternalError::join_spec(JoinSpecError::IncomparableOperands {
            alias: alias.to_string(),
            detail,
        })
    };

    let (resolved, ty) = resolve(expr, &column, &incomparable)?;
    if !ty.is_boolean() {
        return Err(InternalError::join_spec(JoinSpecError::NonBooleanFilter {
            alias: alias.to_string(),
        }));
    }

    Ok(resolved)
}

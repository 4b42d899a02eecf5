use crate::{
    db::store::Row,
    error::{InternalError, JoinSpecError},
    model::entity::EntityModel,
    value::{Value, ValueKey},
};
use std::collections::BTreeMap;

/// Read the correlation key of `row` from the declared field `field`.
pub fn key_of(row: &Row, model: &EntityModel, field: &str) -> Result<Value, InternalError> {
    let index = model.field_index(field).ok_or_else(|| {
        InternalError::join_spec(JoinSpecError::UnknownCorrelationField {
            entity: model.entity_name.to_string(),
            field: field.to_string(),
        })
    })?;

    key_at(row, index).cloned()
}

pub(crate) fn key_at(row: &Row, index: usize) -> Result<&Value, InternalError> {
    row.get(index).ok_or_else(|| {
        InternalError::executor_invariant(format!(
            "row has {} values, correlation index {index} is out of range",
            row.values().len()
        ))
    })
}

///
/// CorrelationIndex
///
/// Child rows grouped by correlation key, built once per join per query.
/// Groups keep input order. Null keys never correlate and are not indexed.
///

#[derive(Debug, Default)]
pub(crate) struct CorrelationIndex<'a> {
    groups: BTreeMap<ValueKey, Vec<&'a Row>>,
}

impl<'a> CorrelationIndex<'a> {
    pub(crate) fn build(rows: &'a [Row], index: usize) -> Result<Self, InternalError> {
        let mut groups: BTreeMap<ValueKey, Vec<&'a Row>> = BTreeMap::new();
        for row in rows {
            let key = key_at(row, index)?;
            if key.is_null() {
                continue;
            }
            groups.entry(ValueKey(key.clone())).or_default().push(row);
        }

        Ok(Self { groups })
    }

    /// Candidate child rows for one parent key; empty for NULL.
    pub(crate) fn candidates(&self, key: &Value) -> &[&'a Row] {
        if key.is_null() {
            return &[];
        }

        self.groups
            .get(&ValueKey(key.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn group_count(&self) -> usize {
        self.groups.len()
    }
}

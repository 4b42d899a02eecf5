mod source;

#[cfg(test)]
mod tests;

use crate::{
    error::{InternalError, NotFoundError, StoreError},
    model::{entity::EntityModel, field::FieldKind, schema::Schema},
    types::Decimal,
    value::{Value, ValueKey},
};
use serde::Serialize;
use std::collections::BTreeMap;

// re-exports
pub use source::RowSource;

///
/// Row
///
/// Positional record; values line up with the owning model's field list.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

///
/// EntityTable
///
/// Rows of one entity in insertion order plus a primary-key index.
///

#[derive(Clone, Debug)]
struct EntityTable {
    model: &'static EntityModel,
    rows: Vec<Row>,
    keys: BTreeMap<ValueKey, usize>,
}

impl EntityTable {
    const fn new(model: &'static EntityModel) -> Self {
        Self {
            model,
            rows: Vec::new(),
            keys: BTreeMap::new(),
        }
    }
}

///
/// DataStore
///
/// In-memory entity collections keyed by entity name.
/// Cloning a store is how sessions take a snapshot.
///

#[derive(Clone, Debug, Default)]
pub struct DataStore {
    tables: BTreeMap<&'static str, EntityTable>,
}

impl DataStore {
    /// Create empty tables for every entity in the schema.
    #[must_use]
    pub fn new(schema: &Schema) -> Self {
        let tables = schema
            .entities()
            .map(|model| (model.entity_name, EntityTable::new(model)))
            .collect();

        Self { tables }
    }

    /// Validate and append one row; returns the stored row.
    pub fn insert(&mut self, entity: &str, values: Vec<Value>) -> Result<&Row, InternalError> {
        let table = self.table_mut(entity)?;
        let row = Row::new(check_row(table.model, values)?);

        let pk_index = table.model.primary_key_index().ok_or_else(|| {
            InternalError::executor_invariant(format!(
                "entity '{}' has no primary key field",
                table.model.entity_name
            ))
        })?;
        let key = ValueKey(row.values[pk_index].clone());

        if table.keys.contains_key(&key) {
            return Err(InternalError::store(StoreError::DuplicateKey {
                entity: table.model.entity_name.to_string(),
                key: key.0.to_string(),
            }));
        }

        let position = table.rows.len();
        table.keys.insert(key, position);
        table.rows.push(row);

        Ok(&table.rows[position])
    }

    /// Primary-key lookup.
    pub fn get(&self, entity: &str, key: &Value) -> Result<Option<&Row>, InternalError> {
        let table = self.table(entity)?;

        Ok(table
            .keys
            .get(&ValueKey(key.clone()))
            .map(|&position| &table.rows[position]))
    }

    /// Total number of stored rows across all entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.rows.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, entity: &str) -> Result<&EntityTable, InternalError> {
        self.tables.get(entity).ok_or_else(|| unknown_entity(entity))
    }

    fn table_mut(&mut self, entity: &str) -> Result<&mut EntityTable, InternalError> {
        self.tables
            .get_mut(entity)
            .ok_or_else(|| unknown_entity(entity))
    }
}

impl RowSource for DataStore {
    fn model(&self, entity: &str) -> Result<&'static EntityModel, InternalError> {
        self.table(entity).map(|table| table.model)
    }

    fn rows_for(&self, entity: &str) -> Result<&[Row], InternalError> {
        self.table(entity).map(|table| table.rows.as_slice())
    }
}

fn unknown_entity(entity: &str) -> InternalError {
    InternalError::not_found(NotFoundError::Entity {
        entity: entity.to_string(),
    })
}

// Check arity, nullability and kinds; integer values widen into Decimal
// fields and non-negative Int values narrow into Uint fields.
fn check_row(model: &EntityModel, values: Vec<Value>) -> Result<Vec<Value>, InternalError> {
    if values.len() != model.fields.len() {
        return Err(InternalError::store(StoreError::ArityMismatch {
            entity: model.entity_name.to_string(),
            expected: model.fields.len(),
            found: values.len(),
        }));
    }

    model
        .fields
        .iter()
        .zip(values)
        .map(|(field, value)| {
            if value.is_null() {
                return if field.nullable {
                    Ok(Value::Null)
                } else {
                    Err(InternalError::store(StoreError::NullViolation {
                        entity: model.entity_name.to_string(),
                        field: field.name.to_string(),
                    }))
                };
            }

            let found = value
                .kind()
                .map_or_else(|| "null".to_string(), |kind| kind.to_string());

            coerce(field.kind, value).ok_or_else(|| {
                InternalError::store(StoreError::TypeMismatch {
                    entity: model.entity_name.to_string(),
                    field: field.name.to_string(),
                    expected: field.kind.to_string(),
                    found,
                })
            })
        })
        .collect()
}

fn coerce(kind: FieldKind, value: Value) -> Option<Value> {
    match (kind, value) {
        (FieldKind::Bool, v @ Value::Bool(_))
        | (FieldKind::Int, v @ Value::Int(_))
        | (FieldKind::Uint, v @ Value::Uint(_))
        | (FieldKind::Decimal, v @ Value::Decimal(_))
        | (FieldKind::Date, v @ Value::Date(_))
        | (FieldKind::Text, v @ Value::Text(_)) => Some(v),
        (FieldKind::Int, Value::Uint(n)) => i64::try_from(n).ok().map(Value::Int),
        (FieldKind::Uint, Value::Int(n)) => u64::try_from(n).ok().map(Value::Uint),
        (FieldKind::Decimal, Value::Int(n)) => Some(Value::Decimal(Decimal::from_i64(n))),
        (FieldKind::Decimal, Value::Uint(n)) => Some(Value::Decimal(Decimal::from_u64(n))),
        _ => None,
    }
}

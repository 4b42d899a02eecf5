use crate::{traits::FieldValue, value::Value};
use serde::Serialize;

///
/// Tuple
///
/// One output row: projected values in column order.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
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

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

///
/// JoinResult
///
/// Materialized query output. Row order is base-row input order, then
/// child selection order within each base row.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct JoinResult {
    pub columns: Vec<String>,
    pub rows: Vec<Tuple>,
}

impl JoinResult {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == label)
    }

    /// Value of column `label` in output row `row`.
    #[must_use]
    pub fn get(&self, row: usize, label: &str) -> Option<&Value> {
        let index = self.column_index(label)?;
        self.rows.get(row)?.get(index)
    }

    /// Value of column `label` in output row `row`, decoded as `T`.
    ///
    /// `None` when the column or row is missing, or the value does not
    /// convert; decode nullable columns as `Option<T>`.
    #[must_use]
    pub fn get_as<T: FieldValue>(&self, row: usize, label: &str) -> Option<T> {
        T::from_value(self.get(row, label)?)
    }

    /// Values of column `label` across all rows.
    #[must_use]
    pub fn column(&self, label: &str) -> Vec<Value> {
        self.column_index(label).map_or_else(Vec::new, |index| {
            self.rows
                .iter()
                .filter_map(|row| row.get(index).cloned())
                .collect()
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tuple> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a JoinResult {
    type Item = &'a Tuple;
    type IntoIter = std::slice::Iter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

use crate::model::{field::EntityFieldModel, relation::RelationModel};

///
/// EntityModel
/// Explicit runtime mapping for one entity collection.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for diagnostics).
    pub path: &'static str,
    /// Stable external name used by the store and in plans.
    pub entity_name: &'static str,
    /// Primary key field name (must name an entry in `fields`).
    pub primary_key: &'static str,
    /// Ordered field list; rows are positional against it.
    pub fields: &'static [EntityFieldModel],
    /// Outgoing relations usable as join sources.
    pub relations: &'static [RelationModel],
}

impl EntityModel {
    /// Position of a field in the row layout.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&EntityFieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationModel> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Position of the primary key; `None` only for unvalidated models.
    #[must_use]
    pub fn primary_key_index(&self) -> Option<usize> {
        self.field_index(self.primary_key)
    }
}

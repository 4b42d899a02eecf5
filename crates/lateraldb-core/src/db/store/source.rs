use crate::{db::store::Row, error::InternalError, model::entity::EntityModel};

///
/// RowSource
///
/// Read-only view over materialized entity collections.
/// Implementations must be side-effect free and return rows in a stable
/// order; that order is the input order used for tie-breaking.
///

pub trait RowSource {
    /// Declared mapping for an entity collection.
    fn model(&self, entity: &str) -> Result<&'static EntityModel, InternalError>;

    /// All rows of an entity collection.
    fn rows_for(&self, entity: &str) -> Result<&[Row], InternalError>;
}

//! Core runtime for LateralDB: entity models, values, the in-memory store,
//! correlated top-N lateral join planning and execution, and the
//! ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary and the query builder surface.
/// No errors, executors, stores, or metrics are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{JoinSpec, LateralSpec, Query, col, lit},
        model::{
            entity::EntityModel,
            field::{EntityFieldModel, FieldKind},
            relation::RelationModel,
        },
        traits::{EntityKind, EntityValue, FieldValue, Path},
        types::{Date, Decimal},
        value::Value,
    };
}

//! ## Crate layout
//! - `core`: entity models, values, the in-memory store, and the correlated
//!   top-N lateral join planner and executor.
//!
//! The `prelude` module mirrors the surface used to declare entities and
//! build queries; sessions and results live under `db`.

pub use lateraldb_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Re-exports
//

pub use core::{
    db,
    db::{Db, DbSession, JoinResult, Transaction, Tuple},
    error::InternalError as Error,
};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        db::{Db, JoinSpec, LateralSpec, Query, col, lit},
        model::{
            entity::EntityModel,
            field::{EntityFieldModel, FieldKind},
            relation::RelationModel,
            schema::Schema,
        },
        traits::{EntityKind as _, EntityValue as _, FieldValue as _, Path as _},
        types::{Date, Decimal},
        value::Value,
    };
    pub use serde::Serialize;
}

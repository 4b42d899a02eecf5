//! Runtime data model definitions.
//!
//! Types in `model` are the explicit, declarative mapping of entities onto
//! positional rows: field layouts, primary keys, and the relations a query
//! may correlate through. They are plain `static` data, validated once by
//! [`schema::Schema`] and then shared by the store, planner, and executor.

pub mod entity;
pub mod field;
pub mod relation;
pub mod schema;

//! Query intent: expressions, the fluent builder, and logical plans.

pub mod builder;
pub mod expr;
pub mod plan;

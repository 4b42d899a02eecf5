use crate::{
    error::{InternalError, RelationError},
    value::Value,
};

///
/// RelationModel
///
/// Declarative link from one entity to a target entity collection.
/// A target row belongs to an owner row when
/// `owner.local_field == target.remote_field`.
///
/// One mapping shape covers every association the store understands:
/// - one-to-many by foreign key: `local = "id"`, `remote = "<owner fk>"`
/// - one-to-one sharing the owner's key: same as above, `Cardinality::One`
/// - many-to-one: `local = "<fk on owner>"`, `remote = "id"`
/// - element collections: owned target table keyed by an owner column
///

#[derive(Debug)]
pub struct RelationModel {
    pub name: &'static str,
    pub target: &'static str,
    pub local_field: &'static str,
    pub remote_field: &'static str,
    pub cardinality: Cardinality,
    /// Whether an owner may have no target row.
    pub optional: bool,
}

impl RelationModel {
    /// One-to-many relation correlated by a foreign key on the target.
    #[must_use]
    pub const fn one_to_many(
        name: &'static str,
        target: &'static str,
        local_field: &'static str,
        remote_field: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            local_field,
            remote_field,
            cardinality: Cardinality::Many,
            optional: true,
        }
    }

    /// Single-valued relation (one-to-one or many-to-one).
    #[must_use]
    pub const fn to_one(
        name: &'static str,
        target: &'static str,
        local_field: &'static str,
        remote_field: &'static str,
        optional: bool,
    ) -> Self {
        Self {
            name,
            target,
            local_field,
            remote_field,
            cardinality: Cardinality::One,
            optional,
        }
    }
}

impl RelationModel {
    /// Check the number of target rows correlated to one owner key.
    ///
    /// A NULL key references nothing and always passes. Otherwise a
    /// required relation needs at least one target, and a to-one relation
    /// at most one.
    pub(crate) fn check_targets(
        &self,
        owner: &str,
        key: &Value,
        found: usize,
    ) -> Result<(), InternalError> {
        if key.is_null() {
            return Ok(());
        }

        if found == 0 && !self.optional {
            return Err(InternalError::relation(RelationError::MissingTarget {
                entity: owner.to_string(),
                relation: self.name.to_string(),
                key: key.to_string(),
            }));
        }
        if found > 1 && self.cardinality == Cardinality::One {
            return Err(InternalError::relation(RelationError::MultipleTargets {
                entity: owner.to_string(),
                relation: self.name.to_string(),
                key: key.to_string(),
                found,
            }));
        }

        Ok(())
    }
}

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    One,
    Many,
}

use crate::{
    error::{InternalError, SchemaError},
    model::entity::EntityModel,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// Schema
///
/// Validated registry of entity mappings handed to the store at
/// construction. Replaces annotation scanning: every entity, field and
/// relation the planner may touch is declared here up front.
///

#[derive(Debug, Default)]
pub struct Schema {
    entities: BTreeMap<&'static str, &'static EntityModel>,
}

impl Schema {
    /// Register and validate a set of entity models.
    pub fn new(models: &[&'static EntityModel]) -> Result<Self, InternalError> {
        let mut entities = BTreeMap::new();

        for model in models {
            validate_fields(model)?;

            if entities.insert(model.entity_name, *model).is_some() {
                return Err(InternalError::schema(SchemaError::DuplicateEntity {
                    entity: model.entity_name.to_string(),
                }));
            }
        }

        let schema = Self { entities };
        for model in schema.entities.values() {
            schema.validate_relations(model)?;
        }

        Ok(schema)
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&'static EntityModel> {
        self.entities.get(name).copied()
    }

    /// Registered models in entity-name order.
    pub fn entities(&self) -> impl Iterator<Item = &'static EntityModel> + '_ {
        self.entities.values().copied()
    }

    fn validate_relations(&self, model: &EntityModel) -> Result<(), InternalError> {
        for relation in model.relations {
            let Some(target) = self.entity(relation.target) else {
                return Err(InternalError::schema(SchemaError::UnknownRelationTarget {
                    entity: model.entity_name.to_string(),
                    relation: relation.name.to_string(),
                    target: relation.target.to_string(),
                }));
            };

            for (owner, field) in [
                (model, relation.local_field),
                (target, relation.remote_field),
            ] {
                if owner.field(field).is_none() {
                    return Err(InternalError::schema(SchemaError::UnknownRelationField {
                        entity: model.entity_name.to_string(),
                        relation: relation.name.to_string(),
                        field: format!("{}.{field}", owner.entity_name),
                    }));
                }
            }
        }

        Ok(())
    }
}

// Field names must be unique and the primary key must be a non-null field.
fn validate_fields(model: &EntityModel) -> Result<(), InternalError> {
    let mut seen = BTreeSet::new();
    for field in model.fields {
        if !seen.insert(field.name) {
            return Err(InternalError::schema(SchemaError::DuplicateField {
                entity: model.entity_name.to_string(),
                field: field.name.to_string(),
            }));
        }
    }

    match model.field(model.primary_key) {
        Some(pk) if !pk.nullable => Ok(()),
        _ => Err(InternalError::schema(SchemaError::InvalidPrimaryKey {
            entity: model.entity_name.to_string(),
            field: model.primary_key.to_string(),
        })),
    }
}

use crate::{model::entity::EntityModel, value::Value};

// ============================================================================
// ENTITY IDENTITY & SCHEMA
// ============================================================================
//
// These traits describe *what an entity is*; the store only ever sees the
// positional values an entity produces.
//

///
/// Path
/// Fully-qualified schema path.
///

pub trait Path {
    const PATH: &'static str;
}

///
/// EntityKind
///
/// Binds a Rust type to its declared entity mapping.
///

pub trait EntityKind: Path {
    const MODEL: &'static EntityModel;
}

///
/// EntityValue
///
/// Flattens an entity into values ordered like `MODEL.fields`.
/// Associations are written as the key of the referenced row, never as
/// nested entities.
///

pub trait EntityValue: EntityKind {
    fn field_values(&self) -> Vec<Value>;
}

///
/// FieldValue
///
/// Conversion between Rust field types and runtime `Value`s.
///

pub trait FieldValue {
    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }

    fn from_value(_value: &Value) -> Option<Self> {
        None
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

// Signed integers widen to `Value::Int`, unsigned to `Value::Uint`.
macro_rules! impl_field_value_int {
    ( $( $type:ty => $variant:ident as $wide:ty ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn to_value(&self) -> Value {
                    Value::$variant(<$wide>::from(*self))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => Self::try_from(*v).ok(),
                        Value::Uint(v) => Self::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value_int!(
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Uint as u64,
    u16 => Uint as u64,
    u32 => Uint as u64,
    u64 => Uint as u64,
);

use crate::{traits::FieldValue, value::Value};
use derive_more::{Add, AddAssign, Display, FromStr, Sub, SubAssign, Sum};
use rust_decimal::Decimal as WrappedDecimal;
use serde::{Deserialize, Serialize};

///
/// Decimal
///
/// Exact fixed-point number used for monetary amounts.
/// Equality and ordering are numeric, so `5` and `5.00` compare equal.
///

#[derive(
    Add,
    AddAssign,
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    FromStr,
    PartialEq,
    Sum,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Sub,
    SubAssign,
)]
#[serde(transparent)]
pub struct Decimal(WrappedDecimal);

impl Decimal {
    pub const ZERO: Self = Self(WrappedDecimal::ZERO);

    #[must_use]
    /// Construct a decimal from mantissa and scale.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(WrappedDecimal::new(num, scale))
    }

    #[must_use]
    pub fn from_i64(n: i64) -> Self {
        Self(WrappedDecimal::from(n))
    }

    #[must_use]
    pub fn from_u64(n: u64) -> Self {
        Self(WrappedDecimal::from(n))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<WrappedDecimal> for Decimal {
    fn from(d: WrappedDecimal) -> Self {
        Self(d)
    }
}

impl FieldValue for Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(*v),
            Value::Int(v) => Some(Self::from_i64(*v)),
            Value::Uint(v) => Some(Self::from_u64(*v)),
            _ => None,
        }
    }
}

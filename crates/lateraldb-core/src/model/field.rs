use std::fmt;

///
/// EntityFieldModel
/// Runtime field metadata used by planning and validation.
///

#[derive(Debug)]
pub struct EntityFieldModel {
    /// Field name as used in join specs and projections.
    pub name: &'static str,
    /// Runtime type shape.
    pub kind: FieldKind,
    /// Whether the field may hold `Value::Null`.
    pub nullable: bool,
}

impl EntityFieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

///
/// FieldKind
///
/// Scalar type surface understood by the planner; aligned with `Value`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Decimal,
    Date,
    Text,
}

impl FieldKind {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Decimal)
    }

    /// Whether values of the two kinds have a natural ordering between them.
    #[must_use]
    pub fn is_comparable_with(self, other: Self) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Text => "text",
        };
        write!(f, "{label}")
    }
}

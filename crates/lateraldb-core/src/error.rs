use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every fallible surface in the crate returns this type; the typed
/// `detail` carries the component-specific failure when one applies.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without a typed detail payload.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    // Shared constructor for detail-carrying errors; the message is the
    // detail's display form so both views stay in sync.
    fn with_detail(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(detail),
        }
    }

    /// Construct a not-found error raised by the row source.
    pub(crate) fn not_found(err: NotFoundError) -> Self {
        Self::with_detail(
            ErrorClass::NotFound,
            ErrorOrigin::Store,
            ErrorDetail::NotFound(err),
        )
    }

    /// Construct a not-found error raised while resolving a plan.
    pub(crate) fn plan_not_found(err: NotFoundError) -> Self {
        Self::with_detail(
            ErrorClass::NotFound,
            ErrorOrigin::Plan,
            ErrorDetail::NotFound(err),
        )
    }

    /// Construct a join specification error.
    pub(crate) fn join_spec(err: JoinSpecError) -> Self {
        Self::with_detail(
            ErrorClass::Invalid,
            ErrorOrigin::Plan,
            ErrorDetail::JoinSpec(err),
        )
    }

    /// Construct a projection error detected at plan time.
    pub(crate) fn projection(err: ProjectionError) -> Self {
        Self::with_detail(
            ErrorClass::Invalid,
            ErrorOrigin::Plan,
            ErrorDetail::Projection(err),
        )
    }

    /// Construct a projection error detected while assembling tuples.
    pub(crate) fn executor_projection(err: ProjectionError) -> Self {
        Self::with_detail(
            ErrorClass::Invalid,
            ErrorOrigin::Executor,
            ErrorDetail::Projection(err),
        )
    }

    /// Construct a store error; the class follows the store failure kind.
    pub(crate) fn store(err: StoreError) -> Self {
        let class = err.class();
        Self::with_detail(class, ErrorOrigin::Store, ErrorDetail::Store(err))
    }

    /// Construct a schema error.
    pub(crate) fn schema(err: SchemaError) -> Self {
        Self::with_detail(
            ErrorClass::Invalid,
            ErrorOrigin::Schema,
            ErrorDetail::Schema(err),
        )
    }

    /// Construct a relation integrity error found while joining.
    pub(crate) fn relation(err: RelationError) -> Self {
        Self::with_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Executor,
            ErrorDetail::Relation(err),
        )
    }

    /// Construct an executor-origin invariant violation.
    pub(crate) fn executor_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Executor,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::NotFound(_)))
    }

    /// Borrow the join-spec detail, if this error carries one.
    #[must_use]
    pub const fn join_spec_detail(&self) -> Option<&JoinSpecError> {
        match &self.detail {
            Some(ErrorDetail::JoinSpec(err)) => Some(err),
            _ => None,
        }
    }

    /// Borrow the projection detail, if this error carries one.
    #[must_use]
    pub const fn projection_detail(&self) -> Option<&ProjectionError> {
        match &self.detail {
            Some(ErrorDetail::Projection(err)) => Some(err),
            _ => None,
        }
    }

    /// Borrow the relation detail, if this error carries one.
    #[must_use]
    pub const fn relation_detail(&self) -> Option<&RelationError> {
        match &self.detail {
            Some(ErrorDetail::Relation(err)) => Some(err),
            _ => None,
        }
    }

    /// Borrow the store detail, if this error carries one.
    #[must_use]
    pub const fn store_detail(&self) -> Option<&StoreError> {
        match &self.detail {
            Some(ErrorDetail::Store(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    NotFound(NotFoundError),
    #[error("{0}")]
    JoinSpec(JoinSpecError),
    #[error("{0}")]
    Projection(ProjectionError),
    #[error("{0}")]
    Relation(RelationError),
    #[error("{0}")]
    Store(StoreError),
    #[error("{0}")]
    Schema(SchemaError),
}

///
/// NotFoundError
///
/// Unknown entity, relation, or key reference.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NotFoundError {
    #[error("unknown entity collection: '{entity}'")]
    Entity { entity: String },

    #[error("unknown relation '{relation}' on entity '{entity}'")]
    Relation { entity: String, relation: String },

    #[error("no row with key {key} in entity '{entity}'")]
    Key { entity: String, key: String },
}

///
/// JoinSpecError
///
/// Malformed or unresolvable join specification.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum JoinSpecError {
    #[error("join alias '{alias}' is already bound")]
    DuplicateAlias { alias: String },

    #[error("join references unknown alias '{alias}'")]
    UnknownAlias { alias: String },

    #[error("lateral alias '{alias}' cannot be used as a correlation source")]
    LateralCorrelation { alias: String },

    #[error("unknown correlation field '{field}' on entity '{entity}'")]
    UnknownCorrelationField { entity: String, field: String },

    #[error(
        "correlation fields are not comparable: {outer_entity}.{outer_field} vs {inner_entity}.{inner_field}"
    )]
    IncompatibleCorrelation {
        outer_entity: String,
        outer_field: String,
        inner_entity: String,
        inner_field: String,
    },

    #[error("unknown order key '{field}' on entity '{entity}'")]
    UnknownOrderKey { entity: String, field: String },

    #[error("unknown filter field '{field}' on alias '{alias}'")]
    UnknownFilterField { alias: String, field: String },

    #[error("filter on '{alias}' may only reference its own rows, found '{referenced}'")]
    FilterOutOfScope { alias: String, referenced: String },

    #[error("filter on '{alias}' is not a boolean expression")]
    NonBooleanFilter { alias: String },

    #[error("operands are not comparable in filter on '{alias}': {detail}")]
    IncomparableOperands { alias: String, detail: String },

    #[error("lateral '{alias}' projects field '{field}' which does not exist on '{entity}'")]
    UnknownLateralField {
        alias: String,
        entity: String,
        field: String,
    },

    #[error("lateral '{alias}' projects column '{column}' more than once")]
    DuplicateLateralColumn { alias: String, column: String },
}

///
/// ProjectionError
///
/// A requested output field does not exist on the contributing row.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ProjectionError {
    #[error("query projects no columns")]
    Empty,

    #[error("projection references unknown alias '{alias}'")]
    UnknownAlias { alias: String },

    #[error("field '{field}' does not exist on '{alias}'")]
    UnknownField { alias: String, field: String },

    #[error("field '{field}' is not projected by lateral subquery '{alias}'")]
    NotProjected { alias: String, field: String },

    #[error("operands are not comparable in projection '{label}': {detail}")]
    IncomparableOperands { label: String, detail: String },

    #[error("row bound to slot {slot} has no value at position {index}")]
    MissingValue { slot: usize, index: usize },
}

///
/// RelationError
///
/// Stored rows disagree with a relation's declared cardinality or
/// optionality.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RelationError {
    #[error("required relation '{entity}.{relation}' has no target row for key {key}")]
    MissingTarget {
        entity: String,
        relation: String,
        key: String,
    },

    #[error("to-one relation '{entity}.{relation}' has {found} target rows for key {key}")]
    MultipleTargets {
        entity: String,
        relation: String,
        key: String,
        found: usize,
    },
}

///
/// StoreError
///
/// Persistence collaborator failures.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("duplicate primary key {key} in entity '{entity}'")]
    DuplicateKey { entity: String, key: String },

    #[error("entity '{entity}' expects {expected} values, found {found}")]
    ArityMismatch {
        entity: String,
        expected: usize,
        found: usize,
    },

    #[error("field '{entity}.{field}' expects {expected}, found {found}")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{entity}.{field}' is not nullable")]
    NullViolation { entity: String, field: String },

    #[error("commit conflict: store advanced from version {expected} to {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKey { .. } | Self::Conflict { .. } => ErrorClass::Conflict,
            Self::ArityMismatch { .. } | Self::TypeMismatch { .. } | Self::NullViolation { .. } => {
                ErrorClass::Invalid
            }
            Self::Poisoned => ErrorClass::Internal,
        }
    }
}

///
/// SchemaError
///
/// Invalid declarative entity mappings.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("entity '{entity}' is registered more than once")]
    DuplicateEntity { entity: String },

    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("primary key '{field}' of entity '{entity}' must be a declared non-null field")]
    InvalidPrimaryKey { entity: String, field: String },

    #[error("relation '{entity}.{relation}' targets unknown entity '{target}'")]
    UnknownRelationTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("relation '{entity}.{relation}' references unknown field '{field}'")]
    UnknownRelationField {
        entity: String,
        relation: String,
        field: String,
    },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Invalid,
    Conflict,
    Internal,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Schema,
    Store,
    Plan,
    Executor,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Schema => "schema",
            Self::Store => "store",
            Self::Plan => "plan",
            Self::Executor => "executor",
        };
        write!(f, "{label}")
    }
}

use crate::{
    error::InternalError,
    model::field::FieldKind,
    value::{Value, strict_order_cmp},
};
use std::{cmp::Ordering, fmt, ops::Not};

///
/// ColumnRef
///
/// `alias.field` reference into a bound row. Inside a lateral subquery
/// filter the lateral's own alias names its source entity row; outside,
/// it names the lateral's projected columns.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnRef {
    pub alias: String,
    pub field: String,
}

impl ColumnRef {
    #[must_use]
    pub fn new(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.field)
    }
}

///
/// CompareOp
///
/// Binary comparison under natural ordering. A NULL operand makes the
/// comparison NULL (unknown); equal operands satisfy `Eq`, `Lte`, `Gte`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn test(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ord, Ordering::Equal),
            Self::Ne => !matches!(ord, Ordering::Equal),
            Self::Lt => matches!(ord, Ordering::Less),
            Self::Lte => !matches!(ord, Ordering::Greater),
            Self::Gt => matches!(ord, Ordering::Greater),
            Self::Gte => !matches!(ord, Ordering::Less),
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

///
/// Expr
///
/// Scalar/boolean expression used for ON filters, lateral filters, and
/// projected columns. Evaluated with SQL three-valued logic:
/// `NULL OR TRUE = TRUE`, `NULL OR FALSE = NULL`, `NULL AND FALSE = FALSE`,
/// `NOT NULL = NULL`. `IS TRUE` and `IS NULL` never yield NULL.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
    Not(Box<Self>),
    IsTrue(Box<Self>),
    IsNull(Box<Self>),
}

/// Column reference expression.
#[must_use]
pub fn col(alias: impl Into<String>, field: impl Into<String>) -> Expr {
    Expr::Column(ColumnRef::new(alias, field))
}

/// Literal expression.
#[must_use]
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn compare(self, op: CompareOp, rhs: impl Into<Self>) -> Self {
        Self::Compare {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    #[must_use]
    pub fn eq(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Eq, rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Ne, rhs)
    }

    #[must_use]
    pub fn lt(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Lt, rhs)
    }

    #[must_use]
    pub fn lte(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Lte, rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Gt, rhs)
    }

    #[must_use]
    pub fn gte(self, rhs: impl Into<Self>) -> Self {
        self.compare(CompareOp::Gte, rhs)
    }

    #[must_use]
    pub fn and(self, rhs: impl Into<Self>) -> Self {
        Self::And(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    pub fn or(self, rhs: impl Into<Self>) -> Self {
        Self::Or(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    pub fn is_true(self) -> Self {
        Self::IsTrue(Box::new(self))
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull(Box::new(self))
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
            Self::IsTrue(inner) => write!(f, "{inner} IS TRUE"),
            Self::IsNull(inner) => write!(f, "{inner} IS NULL"),
        }
    }
}

///
/// SlotColumn
///
/// Resolved column position: which bound row, and which value in it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SlotColumn {
    pub(crate) slot: usize,
    pub(crate) index: usize,
}

///
/// ExprType
/// Static type of a resolved expression; `Null` is the untyped NULL literal.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ExprType {
    Null,
    Scalar(FieldKind),
}

impl ExprType {
    pub(crate) const fn is_boolean(self) -> bool {
        matches!(self, Self::Null | Self::Scalar(FieldKind::Bool))
    }
}

///
/// ResolvedExpr
///
/// Expression with column references bound to slot positions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ResolvedExpr {
    Column { column: SlotColumn, label: String },
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
    Not(Box<Self>),
    IsTrue(Box<Self>),
    IsNull(Box<Self>),
}

/// Resolve an expression and infer its type.
///
/// `column` binds one `alias.field` reference; `incomparable` builds the
/// caller's error for operands that have no natural ordering between them.
pub(crate) fn resolve(
    expr: &Expr,
    column: &dyn Fn(&ColumnRef) -> Result<(SlotColumn, FieldKind), InternalError>,
    incomparable: &dyn Fn(String) -> InternalError,
) -> Result<(ResolvedExpr, ExprType), InternalError> {
    let boolean = |inner: &Expr| -> Result<ResolvedExpr, InternalError> {
        let (resolved, ty) = resolve(inner, column, incomparable)?;
        if ty.is_boolean() {
            Ok(resolved)
        } else {
            Err(incomparable(format!("{inner} is not boolean")))
        }
    };
    let bool_ty = ExprType::Scalar(FieldKind::Bool);

    Ok(match expr {
        Expr::Column(reference) => {
            let (slot_column, kind) = column(reference)?;
            (
                ResolvedExpr::Column {
                    column: slot_column,
                    label: reference.to_string(),
                },
                ExprType::Scalar(kind),
            )
        }
        Expr::Literal(value) => {
            let ty = value.kind().map_or(ExprType::Null, ExprType::Scalar);
            (ResolvedExpr::Literal(value.clone()), ty)
        }
        Expr::Compare { op, left, right } => {
            let (l, lt) = resolve(left, column, incomparable)?;
            let (r, rt) = resolve(right, column, incomparable)?;
            if let (ExprType::Scalar(a), ExprType::Scalar(b)) = (lt, rt)
                && !a.is_comparable_with(b)
            {
                return Err(incomparable(format!("{left} ({a}) vs {right} ({b})")));
            }
            (
                ResolvedExpr::Compare {
                    op: *op,
                    left: Box::new(l),
                    right: Box::new(r),
                },
                bool_ty,
            )
        }
        Expr::And(left, right) => (
            ResolvedExpr::And(Box::new(boolean(left)?), Box::new(boolean(right)?)),
            bool_ty,
        ),
        Expr::Or(left, right) => (
            ResolvedExpr::Or(Box::new(boolean(left)?), Box::new(boolean(right)?)),
            bool_ty,
        ),
        Expr::Not(inner) => (ResolvedExpr::Not(Box::new(boolean(inner)?)), bool_ty),
        Expr::IsTrue(inner) => (ResolvedExpr::IsTrue(Box::new(boolean(inner)?)), bool_ty),
        Expr::IsNull(inner) => {
            let (resolved, _) = resolve(inner, column, incomparable)?;
            (ResolvedExpr::IsNull(Box::new(resolved)), bool_ty)
        }
    })
}

impl ResolvedExpr {
    /// Evaluate against bound rows.
    ///
    /// `lookup` returns `Ok(None)` for a slot with no bound row (a LEFT join
    /// miss), which evaluates to NULL.
    pub(crate) fn eval<'r>(
        &self,
        lookup: &dyn Fn(SlotColumn) -> Result<Option<&'r Value>, InternalError>,
    ) -> Result<Value, InternalError> {
        Ok(match self {
            Self::Column { column, .. } => lookup(*column)?.cloned().unwrap_or(Value::Null),
            Self::Literal(value) => value.clone(),
            Self::Compare { op, left, right } => {
                let left = left.eval(lookup)?;
                let right = right.eval(lookup)?;
                strict_order_cmp(&left, &right)
                    .map_or(Value::Null, |ord| Value::Bool(op.test(ord)))
            }
            Self::And(left, right) => {
                match (truth(&left.eval(lookup)?), truth(&right.eval(lookup)?)) {
                    (Some(false), _) | (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                }
            }
            Self::Or(left, right) => {
                match (truth(&left.eval(lookup)?), truth(&right.eval(lookup)?)) {
                    (Some(true), _) | (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                }
            }
            Self::Not(inner) => truth(&inner.eval(lookup)?).map_or(Value::Null, |b| Value::Bool(!b)),
            Self::IsTrue(inner) => Value::Bool(truth(&inner.eval(lookup)?) == Some(true)),
            Self::IsNull(inner) => Value::Bool(inner.eval(lookup)?.is_null()),
        })
    }

    /// Evaluate as a filter: only TRUE passes.
    pub(crate) fn passes<'r>(
        &self,
        lookup: &dyn Fn(SlotColumn) -> Result<Option<&'r Value>, InternalError>,
    ) -> Result<bool, InternalError> {
        Ok(truth(&self.eval(lookup)?) == Some(true))
    }
}

impl fmt::Display for ResolvedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { label, .. } => write!(f, "{label}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
            Self::IsTrue(inner) => write!(f, "{inner} IS TRUE"),
            Self::IsNull(inner) => write!(f, "{inner} IS NULL"),
        }
    }
}

const fn truth(value: &Value) -> Option<bool> {
    value.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Decimal;

    fn no_columns(column: SlotColumn) -> Result<Option<&'static Value>, InternalError> {
        Err(InternalError::executor_invariant(format!(
            "unexpected column {column:?}"
        )))
    }

    fn literal(value: impl Into<Value>) -> ResolvedExpr {
        ResolvedExpr::Literal(value.into())
    }

    fn cmp(op: CompareOp, left: ResolvedExpr, right: ResolvedExpr) -> ResolvedExpr {
        ResolvedExpr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn comparison_with_null_is_unknown() {
        let expr = cmp(CompareOp::Gte, literal(Value::Null), literal(5i64));
        assert_eq!(expr.eval(&no_columns).expect("eval"), Value::Null);
        assert!(!expr.passes(&no_columns).expect("eval"));
    }

    #[test]
    fn ties_satisfy_inclusive_comparisons() {
        let five = Decimal::from(5);
        for (op, expected) in [
            (CompareOp::Eq, true),
            (CompareOp::Gte, true),
            (CompareOp::Lte, true),
            (CompareOp::Gt, false),
            (CompareOp::Ne, false),
        ] {
            let expr = cmp(op, literal(five), literal(5i64));
            assert_eq!(
                expr.eval(&no_columns).expect("eval"),
                Value::Bool(expected),
                "{op:?}"
            );
        }
    }

    #[test]
    fn or_and_follow_three_valued_logic() {
        let unknown = || cmp(CompareOp::Eq, literal(Value::Null), literal(1i64));
        let t = || literal(true);
        let f = || literal(false);

        let or = |a, b| ResolvedExpr::Or(Box::new(a), Box::new(b));
        let and = |a, b| ResolvedExpr::And(Box::new(a), Box::new(b));

        assert_eq!(or(unknown(), t()).eval(&no_columns).expect("eval"), Value::Bool(true));
        assert_eq!(or(unknown(), f()).eval(&no_columns).expect("eval"), Value::Null);
        assert_eq!(and(unknown(), f()).eval(&no_columns).expect("eval"), Value::Bool(false));
        assert_eq!(and(unknown(), t()).eval(&no_columns).expect("eval"), Value::Null);

        let not_unknown = ResolvedExpr::Not(Box::new(unknown()));
        assert_eq!(not_unknown.eval(&no_columns).expect("eval"), Value::Null);

        let is_true = ResolvedExpr::IsTrue(Box::new(unknown()));
        assert_eq!(is_true.eval(&no_columns).expect("eval"), Value::Bool(false));
    }

    #[test]
    fn unbound_slot_reads_as_null() {
        let expr = ResolvedExpr::IsNull(Box::new(ResolvedExpr::Column {
            column: SlotColumn { slot: 2, index: 0 },
            label: "last_payment.amount".to_string(),
        }));

        let unbound = |_column: SlotColumn| -> Result<Option<&'static Value>, InternalError> {
            Ok(None)
        };
        assert_eq!(expr.eval(&unbound).expect("eval"), Value::Bool(true));
    }

    #[test]
    fn resolve_rejects_incomparable_operands() {
        let column = |_: &ColumnRef| -> Result<(SlotColumn, FieldKind), InternalError> {
            Ok((SlotColumn { slot: 0, index: 0 }, FieldKind::Text))
        };
        let incomparable = |detail: String| InternalError::executor_invariant(detail);

        let expr = col("case", "reference").gt(lit(3i64));
        let err = resolve(&expr, &column, &incomparable).expect_err("text vs int");
        assert!(err.message.contains("case.reference (text) vs 3 (int)"));

        let expr = col("case", "reference").eq(lit(Value::Null));
        assert!(resolve(&expr, &column, &incomparable).is_ok());
    }

    #[test]
    fn builder_renders_readably() {
        let expr = col("claim", "open_amount")
            .eq(lit(Decimal::ZERO))
            .or(col("last", "amount").gte(col("plan", "amount")));

        assert_eq!(
            expr.to_string(),
            "(claim.open_amount = 0 OR last.amount >= plan.amount)"
        );
        assert_eq!((!lit(true)).to_string(), "NOT (true)");
    }
}

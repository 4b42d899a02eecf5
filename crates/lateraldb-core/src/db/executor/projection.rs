use crate::{
    db::{
        query::{expr::SlotColumn, plan::ProjectionStep},
        response::Tuple,
        store::Row,
    },
    error::{InternalError, ProjectionError},
};

/// One bound row per plan slot; `None` marks a LEFT join miss.
pub(crate) type Binding<'r> = Vec<Option<&'r Row>>;

/// Map a binding to an output tuple.
///
/// Columns of an unbound slot project as NULL; a bound row without the
/// resolved position is a [`ProjectionError::MissingValue`].
pub(crate) fn project(
    binding: &[Option<&Row>],
    steps: &[ProjectionStep],
) -> Result<Tuple, InternalError> {
    let lookup = |column: SlotColumn| {
        let missing = || {
            InternalError::executor_projection(ProjectionError::MissingValue {
                slot: column.slot,
                index: column.index,
            })
        };

        match binding.get(column.slot) {
            Some(Some(row)) => row.get(column.index).map(Some).ok_or_else(missing),
            Some(None) => Ok(None),
            None => Err(missing()),
        }
    };

    let values = steps
        .iter()
        .map(|step| step.expr.eval(&lookup))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Tuple::new(values))
}

//! Shared entity mappings for unit tests: collection cases with payments,
//! a single claim, and a status history.

use crate::{
    db::{Db, store::Row},
    model::{
        entity::EntityModel,
        field::{EntityFieldModel, FieldKind},
        relation::RelationModel,
        schema::Schema,
    },
    types::{Date, Decimal},
    value::Value,
};

pub(crate) static CASE: EntityModel = EntityModel {
    path: "test_fixtures::Case",
    entity_name: "case",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("reference", FieldKind::Text),
    ],
    relations: &[
        RelationModel::one_to_many("payments", "payment", "id", "case_id"),
        RelationModel::one_to_many("statuses", "case_status", "id", "case_id"),
        RelationModel::to_one("claim", "claim", "id", "case_id", false),
    ],
};

pub(crate) static PAYMENT: EntityModel = EntityModel {
    path: "test_fixtures::Payment",
    entity_name: "payment",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::nullable("paid_on", FieldKind::Date),
        EntityFieldModel::nullable("amount", FieldKind::Decimal),
    ],
    relations: &[],
};

pub(crate) static CLAIM: EntityModel = EntityModel {
    path: "test_fixtures::Claim",
    entity_name: "claim",
    primary_key: "case_id",
    fields: &[
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::new("open_amount", FieldKind::Decimal),
    ],
    relations: &[],
};

pub(crate) static CASE_STATUS: EntityModel = EntityModel {
    path: "test_fixtures::CaseStatus",
    entity_name: "case_status",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::nullable("active", FieldKind::Bool),
        EntityFieldModel::new("reason", FieldKind::Text),
    ],
    relations: &[],
};

pub(crate) fn schema() -> Schema {
    Schema::new(&[&CASE, &PAYMENT, &CLAIM, &CASE_STATUS]).expect("fixture schema is valid")
}

pub(crate) fn today() -> Date {
    Date::new_checked(2026, 10, 18).expect("valid date")
}

pub(crate) fn case(id: u64) -> Vec<Value> {
    vec![Value::Uint(id), Value::Text(format!("case-{id}"))]
}

pub(crate) fn payment(id: u64, case_id: u64, days_ago: i32, amount: i64) -> Vec<Value> {
    vec![
        Value::Uint(id),
        Value::Uint(case_id),
        Value::Date(today().add_days(-days_ago)),
        Value::Decimal(Decimal::from(amount)),
    ]
}

pub(crate) fn claim(case_id: u64, open_amount: i64) -> Vec<Value> {
    vec![Value::Uint(case_id), Value::Decimal(Decimal::from(open_amount))]
}

pub(crate) fn status(id: u64, case_id: u64, active: Option<bool>, reason: &str) -> Vec<Value> {
    vec![
        Value::Uint(id),
        Value::Uint(case_id),
        Value::from(active),
        Value::Text(reason.to_string()),
    ]
}

/// Db seeded with two cases:
/// - case 1: payments today (5) and yesterday (10), claim open 0, statuses active + inactive
/// - case 2: no payments, claim open 7, one inactive status
pub(crate) fn seeded_db() -> Db {
    let db = Db::new(schema());
    let session = db.session();
    session
        .in_transaction(|tx| {
            tx.persist_row("case", case(1))?;
            tx.persist_row("case", case(2))?;
            tx.persist_row("payment", payment(1, 1, 0, 5))?;
            tx.persist_row("payment", payment(2, 1, 1, 10))?;
            tx.persist_row("claim", claim(1, 0))?;
            tx.persist_row("claim", claim(2, 7))?;
            tx.persist_row("case_status", status(1, 1, Some(true), "opened"))?;
            tx.persist_row("case_status", status(2, 1, Some(false), "reviewed"))?;
            tx.persist_row("case_status", status(3, 2, None, "pending"))?;
            Ok(())
        })
        .expect("seed fixture rows");

    db
}

pub(crate) fn row(values: Vec<Value>) -> Row {
    Row::new(values)
}

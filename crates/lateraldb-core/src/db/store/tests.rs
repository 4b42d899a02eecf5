use super::*;
use crate::{
    error::ErrorClass,
    test_fixtures::{self, case, payment},
    types::Decimal,
};

fn store() -> DataStore {
    DataStore::new(&test_fixtures::schema())
}

#[test]
fn rows_for_preserves_insertion_order() {
    let mut store = store();
    store.insert("payment", payment(9, 1, 0, 5)).expect("insert");
    store.insert("payment", payment(3, 1, 1, 10)).expect("insert");
    store.insert("payment", payment(5, 2, 2, 1)).expect("insert");

    let ids: Vec<_> = store
        .rows_for("payment")
        .expect("payments")
        .iter()
        .map(|row| row.values()[0].clone())
        .collect();

    assert_eq!(ids, vec![Value::Uint(9), Value::Uint(3), Value::Uint(5)]);
    assert_eq!(store.len(), 3);
}

#[test]
fn unknown_entity_is_not_found() {
    let store = store();
    let err = store.rows_for("invoice").expect_err("unknown entity");

    assert!(err.is_not_found());
    assert_eq!(
        err.message,
        "unknown entity collection: 'invoice'".to_string()
    );
    assert!(store.model("invoice").is_err());
}

#[test]
fn duplicate_primary_key_conflicts() {
    let mut store = store();
    store.insert("case", case(1)).expect("insert");
    let err = store.insert("case", case(1)).expect_err("duplicate");

    assert_eq!(err.class, ErrorClass::Conflict);
    assert!(matches!(
        err.store_detail(),
        Some(StoreError::DuplicateKey { key, .. }) if key == "1"
    ));
}

#[test]
fn arity_and_null_violations_are_rejected() {
    let mut store = store();

    let err = store
        .insert("case", vec![Value::Uint(1)])
        .expect_err("short row");
    assert!(matches!(
        err.store_detail(),
        Some(StoreError::ArityMismatch {
            expected: 2,
            found: 1,
            ..
        })
    ));

    let err = store
        .insert("case", vec![Value::Null, Value::Text("x".to_string())])
        .expect_err("null pk");
    assert!(matches!(
        err.store_detail(),
        Some(StoreError::NullViolation { field, .. }) if field == "id"
    ));
}

#[test]
fn values_are_coerced_into_declared_kinds() {
    let mut store = store();
    let row = store
        .insert(
            "payment",
            vec![Value::Int(1), Value::Int(4), Value::Null, Value::Int(12)],
        )
        .expect("coercible row")
        .clone();

    assert_eq!(row.values()[0], Value::Uint(1));
    assert_eq!(row.values()[2], Value::Null);
    assert_eq!(row.values()[3], Value::Decimal(Decimal::from(12)));

    let err = store
        .insert(
            "payment",
            vec![
                Value::Uint(2),
                Value::Uint(4),
                Value::Text("today".to_string()),
                Value::Null,
            ],
        )
        .expect_err("text into date");
    assert!(matches!(
        err.store_detail(),
        Some(StoreError::TypeMismatch { expected, found, .. })
            if expected == "date" && found == "text"
    ));
}

#[test]
fn primary_key_lookup_matches_numerically() {
    let mut store = store();
    store.insert("case", case(4)).expect("insert");

    let found = store.get("case", &Value::Int(4)).expect("lookup");
    assert!(found.is_some());
    assert!(store.get("case", &Value::Uint(5)).expect("lookup").is_none());
}

//! End-to-end lateral join scenario: collection cases with a claim total,
//! a status history, payments, and an optional payment arrangement whose
//! installments form an element collection.

use lateraldb::{
    JoinResult,
    core::traits::{EntityKind, EntityValue, FieldValue, Path},
    prelude::*,
};

static CASE: EntityModel = EntityModel {
    path: "lateral_joins::CollectionCase",
    entity_name: "collection_case",
    primary_key: "id",
    fields: &[EntityFieldModel::new("id", FieldKind::Uint)],
    relations: &[
        RelationModel::to_one("total_claim", "total_claim", "id", "case_id", false),
        RelationModel::one_to_many("status_history", "case_status", "id", "case_id"),
        RelationModel::one_to_many("payments", "payment", "id", "case_id"),
        RelationModel::to_one(
            "payment_arrangement",
            "payment_arrangement",
            "id",
            "case_id",
            true,
        ),
    ],
};

static TOTAL_CLAIM: EntityModel = EntityModel {
    path: "lateral_joins::TotalClaim",
    entity_name: "total_claim",
    primary_key: "case_id",
    fields: &[
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::new("amount", FieldKind::Decimal),
        EntityFieldModel::new("amount_paid", FieldKind::Decimal),
        EntityFieldModel::new("open_amount", FieldKind::Decimal),
    ],
    relations: &[],
};

static STATUS: EntityModel = EntityModel {
    path: "lateral_joins::Status",
    entity_name: "status",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("name", FieldKind::Text),
    ],
    relations: &[],
};

static CASE_STATUS: EntityModel = EntityModel {
    path: "lateral_joins::CaseStatus",
    entity_name: "case_status",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::nullable("active", FieldKind::Bool),
        EntityFieldModel::new("reason", FieldKind::Text),
        EntityFieldModel::new("status_id", FieldKind::Uint),
    ],
    relations: &[RelationModel::to_one(
        "status",
        "status",
        "status_id",
        "id",
        false,
    )],
};

static PAYMENT: EntityModel = EntityModel {
    path: "lateral_joins::Payment",
    entity_name: "payment",
    primary_key: "id",
    fields: &[
        EntityFieldModel::new("id", FieldKind::Uint),
        EntityFieldModel::new("case_id", FieldKind::Uint),
        EntityFieldModel::nullable("paid_on", FieldKind::Date),
        EntityFieldModel::new("amount", FieldKind::Decimal),
    ],
    relations: &[],
};

static ARRANGEMENT: EntityModel = EntityModel {
    path: "lateral_joins::PaymentArrangement",
    entity_name: "payment_arrangement",
    primary_key: "case_id",
    fields: &[EntityFieldModel::new("case_id", FieldKind::Uint)],
    relations: &[RelationModel::one_to_many(
        "installments",
        "installment",
        "case_id",
        "arrangement_id",
    )],
};

static INSTALLMENT: EntityModel = EntityModel {
    path: "lateral_joins::Installment",
    entity_name: "installment",
    primary_key: "number",
    fields: &[
        EntityFieldModel::new("number", FieldKind::Uint),
        EntityFieldModel::new("arrangement_id", FieldKind::Uint),
        EntityFieldModel::new("starts_on", FieldKind::Date),
        EntityFieldModel::new("amount", FieldKind::Decimal),
    ],
    relations: &[],
};

///
/// Payment
///

struct Payment {
    id: u64,
    case_id: u64,
    paid_on: Option<Date>,
    amount: Decimal,
}

impl Path for Payment {
    const PATH: &'static str = "lateral_joins::Payment";
}

impl EntityKind for Payment {
    const MODEL: &'static EntityModel = &PAYMENT;
}

impl EntityValue for Payment {
    fn field_values(&self) -> Vec<Value> {
        vec![
            self.id.to_value(),
            self.case_id.to_value(),
            self.paid_on.to_value(),
            self.amount.to_value(),
        ]
    }
}

///
/// Installment
///

struct Installment {
    number: u64,
    arrangement_id: u64,
    starts_on: Date,
    amount: Decimal,
}

impl Path for Installment {
    const PATH: &'static str = "lateral_joins::Installment";
}

impl EntityKind for Installment {
    const MODEL: &'static EntityModel = &INSTALLMENT;
}

impl EntityValue for Installment {
    fn field_values(&self) -> Vec<Value> {
        vec![
            self.number.to_value(),
            self.arrangement_id.to_value(),
            self.starts_on.to_value(),
            self.amount.to_value(),
        ]
    }
}

fn today() -> Date {
    Date::new_checked(2026, 10, 18).expect("valid date")
}

fn money(amount: i64) -> Value {
    Value::Decimal(Decimal::from(amount))
}

fn claim(case_id: u64, open_amount: i64) -> Vec<Value> {
    vec![
        Value::Uint(case_id),
        money(0),
        money(0),
        money(open_amount),
    ]
}

fn case_status(id: u64, case_id: u64, active: bool, reason: &str, status_id: u64) -> Vec<Value> {
    vec![
        Value::Uint(id),
        Value::Uint(case_id),
        Value::Bool(active),
        Value::from(reason),
        Value::Uint(status_id),
    ]
}

fn payment(id: u64, case_id: u64, paid_on: Date, amount: i64) -> Payment {
    Payment {
        id,
        case_id,
        paid_on: Some(paid_on),
        amount: Decimal::from(amount),
    }
}

fn installment(number: u64, arrangement_id: u64, starts_on: Date, amount: i64) -> Installment {
    Installment {
        number,
        arrangement_id,
        starts_on,
        amount: Decimal::from(amount),
    }
}

fn empty_db() -> Db {
    let schema = Schema::new(&[
        &CASE,
        &TOTAL_CLAIM,
        &STATUS,
        &CASE_STATUS,
        &PAYMENT,
        &ARRANGEMENT,
        &INSTALLMENT,
    ])
    .expect("schema");

    Db::new(schema)
}

/// Two cases, both fully settled, each with an active status, two
/// payments, and an arrangement with two installments.
fn seeded_db() -> Db {
    let db = empty_db();
    let today = today();
    let yesterday = today.add_days(-1);

    db.session()
        .in_transaction(|tx| {
            for id in [1u64, 2] {
                tx.persist_row("collection_case", vec![Value::Uint(id)])?;
                tx.persist_row("total_claim", claim(id, 0))?;
                tx.persist_row("payment_arrangement", vec![Value::Uint(id)])?;
            }
            tx.persist_row("status", vec![Value::Uint(1), Value::from("opened")])?;
            tx.persist_row("status", vec![Value::Uint(2), Value::from("arranged")])?;

            tx.persist_row("case_status", case_status(1, 1, true, "Reason 1", 1))?;
            tx.persist_row("case_status", case_status(2, 1, false, "Reason 2", 2))?;
            tx.persist_row("case_status", case_status(3, 2, false, "Reason 3", 1))?;
            tx.persist_row("case_status", case_status(4, 2, true, "Reason 4", 2))?;

            tx.persist(&payment(1, 1, today, 5))?;
            tx.persist(&payment(2, 1, yesterday, 10))?;
            tx.persist(&payment(3, 2, today, 20))?;
            tx.persist(&payment(4, 2, yesterday, 3))?;

            tx.persist(&installment(123, 1, today, 5))?;
            tx.persist(&installment(456, 1, today.add_months(1), 10))?;
            tx.persist(&installment(789, 2, today, 4))?;
            tx.persist(&installment(156, 2, today.add_months(2), 10))?;

            Ok(())
        })
        .expect("seed rows");

    db
}

/// Case overview: active status, claim totals, the most recent payment,
/// the first installment, and whether the case is on track.
fn overview() -> Query {
    Query::from_as("collection_case", "case")
        .join(JoinSpec::relation("case", "total_claim").alias("claim"))
        .join(
            JoinSpec::relation("case", "status_history")
                .alias("history")
                .on(col("history", "active").is_true()),
        )
        .join(JoinSpec::relation("history", "status"))
        .join(
            JoinSpec::lateral(
                "last_payment",
                LateralSpec::correlate("case", "payments")
                    .order_by_desc("paid_on")
                    .fetch(1)
                    .select("amount", "amount")
                    .select("paid_on", "paid_on"),
            )
            .left(),
        )
        .join(
            JoinSpec::relation("case", "payment_arrangement")
                .alias("arrangement")
                .left(),
        )
        .join(
            JoinSpec::lateral(
                "first_installment",
                LateralSpec::correlate("arrangement", "installments")
                    .order_by("starts_on")
                    .fetch(1)
                    .select("amount", "amount")
                    .select("starts_on", "starts_on"),
            )
            .left(),
        )
        .select_as("case_id", col("case", "id"))
        .select_as("status", col("status", "name"))
        .select_as("reason", col("history", "reason"))
        .select_as("claim_amount", col("claim", "amount"))
        .select_as("amount_paid", col("claim", "amount_paid"))
        .select_as("open_amount", col("claim", "open_amount"))
        .select_as("last_payment_amount", col("last_payment", "amount"))
        .select_as("last_payment_date", col("last_payment", "paid_on"))
        .select_as("installment_amount", col("first_installment", "amount"))
        .select_as("installment_start", col("first_installment", "starts_on"))
        .select_as(
            "on_track",
            col("claim", "open_amount")
                .eq(lit(Decimal::ZERO))
                .or(col("last_payment", "amount").gte(col("first_installment", "amount"))),
        )
}

fn run(db: &Db) -> JoinResult {
    db.session()
        .execute_query(&overview().build())
        .expect("overview query")
}

#[test]
fn overview_picks_latest_payment_and_first_installment() {
    let result = run(&seeded_db());
    let today = Value::Date(today());

    assert_eq!(result.len(), 2);
    assert_eq!(result.column("case_id"), vec![Value::Uint(1), Value::Uint(2)]);
    assert_eq!(
        result.column("status"),
        vec![Value::from("opened"), Value::from("arranged")]
    );
    assert_eq!(
        result.column("reason"),
        vec![Value::from("Reason 1"), Value::from("Reason 4")]
    );
    assert_eq!(result.column("open_amount"), vec![money(0), money(0)]);

    assert_eq!(result.column("last_payment_amount"), vec![money(5), money(20)]);
    assert_eq!(
        result.column("last_payment_date"),
        vec![today.clone(), today.clone()]
    );
    assert_eq!(result.column("installment_amount"), vec![money(5), money(4)]);
    assert_eq!(result.column("installment_start"), vec![today.clone(), today]);
    assert_eq!(
        result.column("on_track"),
        vec![Value::Bool(true), Value::Bool(true)]
    );
}

#[test]
fn on_track_compares_payment_to_installment_when_balance_is_open() {
    let db = empty_db();
    let today = today();

    db.session()
        .in_transaction(|tx| {
            tx.persist_row("status", vec![Value::Uint(1), Value::from("opened")])?;
            for id in [1u64, 2, 3] {
                tx.persist_row("collection_case", vec![Value::Uint(id)])?;
                tx.persist_row("total_claim", claim(id, 100))?;
                tx.persist_row("case_status", case_status(id, id, true, "open", 1))?;
                tx.persist_row("payment_arrangement", vec![Value::Uint(id)])?;
                tx.persist(&installment(id, id, today, 10))?;
            }
            // case 1 pays exactly the installment, case 2 pays short, case 3 never pays
            tx.persist(&payment(1, 1, today, 10))?;
            tx.persist(&payment(2, 2, today, 7))?;

            Ok(())
        })
        .expect("seed rows");

    let result = run(&db);

    assert_eq!(
        result.column("on_track"),
        vec![Value::Bool(true), Value::Bool(false), Value::Null]
    );
    assert_eq!(
        result.column("last_payment_amount"),
        vec![money(10), money(7), Value::Null]
    );
}

#[test]
fn case_without_arrangement_keeps_its_row() {
    let db = seeded_db();

    db.session()
        .in_transaction(|tx| {
            tx.persist_row("collection_case", vec![Value::Uint(3)])?;
            tx.persist_row("total_claim", claim(3, 0))?;
            tx.persist_row("case_status", case_status(5, 3, true, "Reason 5", 1))?;
            tx.persist(&payment(5, 3, today().add_days(-30), 1))
        })
        .expect("seed case 3");

    let result = run(&db);

    assert_eq!(result.len(), 3);
    assert_eq!(result.get(2, "case_id"), Some(&Value::Uint(3)));
    assert_eq!(result.get(2, "last_payment_amount"), Some(&money(1)));
    assert_eq!(result.get(2, "installment_amount"), Some(&Value::Null));
    assert_eq!(result.get(2, "installment_start"), Some(&Value::Null));
    assert_eq!(result.get(2, "on_track"), Some(&Value::Bool(true)));
    assert_eq!(
        result.get_as::<Decimal>(2, "last_payment_amount"),
        Some(Decimal::from(1))
    );
    assert_eq!(
        result.get_as::<Option<Decimal>>(2, "installment_amount"),
        Some(None)
    );
}

#[test]
fn inner_lateral_drops_cases_without_payments() {
    let db = seeded_db();
    db.session()
        .in_transaction(|tx| {
            tx.persist_row("collection_case", vec![Value::Uint(3)])?;
            tx.persist_row("total_claim", claim(3, 0))?;
            tx.persist_row("case_status", case_status(5, 3, true, "Reason 5", 1))
        })
        .expect("seed case 3");

    let plan = Query::from_as("collection_case", "case")
        .join(JoinSpec::lateral(
            "last_payment",
            LateralSpec::correlate("case", "payments")
                .order_by_desc("paid_on")
                .fetch(1)
                .select("amount", "amount"),
        ))
        .select_as("case_id", col("case", "id"))
        .build();
    let result = db.session().execute_query(&plan).expect("query");

    assert_eq!(result.column("case_id"), vec![Value::Uint(1), Value::Uint(2)]);
}

#[test]
fn explain_describes_every_join() {
    let db = seeded_db();
    let executable = db.session().compile(&overview().build()).expect("compile");
    let explain = executable.explain();

    assert!(explain.contains("JOIN total_claim AS claim ON claim.case_id = case.id"));
    assert!(explain.contains("history.active IS TRUE"));
    assert!(explain.contains(
        "LEFT JOIN LATERAL (SELECT amount AS amount, starts_on AS starts_on \
         FROM installment AS first_installment \
         WHERE first_installment.arrangement_id = arrangement.case_id \
         ORDER BY starts_on ASC NULLS LAST LIMIT 1) AS first_installment ON TRUE"
    ));
    assert_eq!(
        executable.fingerprint(),
        db.session()
            .compile(&overview().build())
            .expect("compile")
            .fingerprint()
    );
}

#[test]
fn results_serialize_with_column_labels() {
    let result = run(&seeded_db());
    let json = serde_json::to_value(&result).expect("serialize");

    assert_eq!(json["columns"][0], "case_id");
    assert_eq!(json["columns"][10], "on_track");
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
}

#[test]
fn version_is_exported() {
    assert_eq!(lateraldb::VERSION, env!("CARGO_PKG_VERSION"));
}

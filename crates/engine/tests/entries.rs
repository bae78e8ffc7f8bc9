use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{Map, Value, json};

use engine::{
    ENTRY_LIST_LIMIT, Engine, EngineError, EntryKind, ExpenseClaim, Identity, Rejection,
    validate_create, validate_update,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn register(engine: &Engine, username: &str) -> Identity {
    let id = engine
        .register_user("Test User", username, "password")
        .await
        .unwrap();
    Identity {
        user_id: id.to_string(),
    }
}

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

fn fuel_payload() -> Map<String, Value> {
    payload(json!({
        "tipo": "fuel",
        "claimantName": "Ana López",
        "expenseDate": "2025-03-14",
        "reason": "Site survey",
        "costCenter": "0412",
        "branch": "Monterrey",
        "folio": "F-0001",
        "origin": "Monterrey",
        "destination": "Saltillo",
        "startKm": 100,
        "endKm": 150,
        "mensaje": "do not store me"
    }))
}

fn expense_payload() -> Map<String, Value> {
    payload(json!({
        "tipo": "expense",
        "claimantName": "Ana López",
        "expenseDate": "2025-03-15",
        "reason": "Hotel",
        "costCenter": "0412",
        "branch": "Monterrey",
        "folio": "F-0002",
        "amountToJustify": 800
    }))
}

async fn stored_entries(db: &DatabaseConnection) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM entries",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn create_then_get_fuel_entry() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let new = validate_create(&alice, fuel_payload()).unwrap();
    let created = engine.create_entry(new).await.unwrap();

    let fetched = engine
        .entry(&alice.user_id, &created.id.to_string())
        .await
        .unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.created_by, alice.user_id);
    match fetched.kind {
        EntryKind::Fuel(trip) => assert_eq!(trip.km, 50.0),
        other => panic!("expected fuel entry, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_payload_persists_nothing() {
    let (engine, db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let mut body = fuel_payload();
    body.insert("endKm".to_string(), json!(90));
    assert_eq!(
        validate_create(&alice, body).map_err(EngineError::from),
        Err(EngineError::Rejected(Rejection::InvalidKm))
    );

    let mut body = expense_payload();
    body.remove("folio");
    assert!(validate_create(&alice, body).is_err());

    assert_eq!(stored_entries(&db).await, 0);
}

#[tokio::test]
async fn other_owner_sees_not_found() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    let created = engine
        .create_entry(validate_create(&alice, expense_payload()).unwrap())
        .await
        .unwrap();
    let id = created.id.to_string();
    let not_found = EngineError::KeyNotFound("entry".to_string());

    assert_eq!(engine.entry(&bob.user_id, &id).await, Err(not_found));
    assert_eq!(
        engine.entry(&bob.user_id, "no-such-id").await,
        Err(EngineError::KeyNotFound("entry".to_string()))
    );

    let hijack = validate_update(&created, fuel_payload()).unwrap();
    assert_eq!(
        engine.update_entry(&bob.user_id, &hijack).await,
        Err(EngineError::KeyNotFound("entry".to_string()))
    );
    assert!(!engine.delete_entry(&bob.user_id, &id).await.unwrap());

    // Untouched for the real owner.
    assert_eq!(engine.entry(&alice.user_id, &id).await.unwrap(), created);
    assert!(
        engine
            .list_entries(&bob.user_id, ENTRY_LIST_LIMIT)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn update_fuel_to_expense_clears_fuel_columns() {
    let (engine, db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let created = engine
        .create_entry(validate_create(&alice, fuel_payload()).unwrap())
        .await
        .unwrap();
    let updated = validate_update(&created, expense_payload()).unwrap();
    let stored = engine.update_entry(&alice.user_id, &updated).await.unwrap();

    assert_eq!(
        stored.kind,
        EntryKind::Expense(ExpenseClaim {
            amount_to_justify: 800.0
        })
    );
    assert_eq!(stored.created_at, created.created_at);
    assert!(stored.updated_at >= created.updated_at);

    let backend = db.get_database_backend();
    let raw = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT origin, destination, start_km, end_km, km, amount_to_justify \
             FROM entries WHERE id = ?",
            vec![created.id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    for column in ["origin", "destination"] {
        assert_eq!(raw.try_get::<Option<String>>("", column).unwrap(), None);
    }
    for column in ["start_km", "end_km", "km"] {
        assert_eq!(raw.try_get::<Option<f64>>("", column).unwrap(), None);
    }
    assert_eq!(
        raw.try_get::<Option<f64>>("", "amount_to_justify").unwrap(),
        Some(800.0)
    );
}

#[tokio::test]
async fn delete_is_terminal() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let created = engine
        .create_entry(validate_create(&alice, expense_payload()).unwrap())
        .await
        .unwrap();
    let id = created.id.to_string();

    assert!(engine.delete_entry(&alice.user_id, &id).await.unwrap());
    assert!(!engine.delete_entry(&alice.user_id, &id).await.unwrap());
    assert_eq!(
        engine.entry(&alice.user_id, &id).await,
        Err(EngineError::KeyNotFound("entry".to_string()))
    );
    let again = validate_update(&created, expense_payload()).unwrap();
    assert!(engine.update_entry(&alice.user_id, &again).await.is_err());
}

#[tokio::test]
async fn list_is_capped_and_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    for _ in 0..(ENTRY_LIST_LIMIT + 5) {
        engine
            .create_entry(validate_create(&alice, expense_payload()).unwrap())
            .await
            .unwrap();
    }
    engine
        .create_entry(validate_create(&bob, expense_payload()).unwrap())
        .await
        .unwrap();

    let listed = engine
        .list_entries(&alice.user_id, ENTRY_LIST_LIMIT)
        .await
        .unwrap();
    assert_eq!(listed.len() as u64, ENTRY_LIST_LIMIT);
    assert!(listed.iter().all(|e| e.created_by == alice.user_id));
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );

    let over = engine.list_entries(&alice.user_id, 10_000).await.unwrap();
    assert_eq!(over.len() as u64, ENTRY_LIST_LIMIT);
}

#[tokio::test]
async fn concurrent_updates_last_write_wins() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let alice = register(&engine, "alice").await;

    let created = engine
        .create_entry(validate_create(&alice, expense_payload()).unwrap())
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for folio in ["F-A", "F-B"] {
        let engine = Arc::clone(&engine);
        let owner = alice.user_id.clone();
        let mut body = expense_payload();
        body.insert("folio".to_string(), json!(folio));
        let updated = validate_update(&created, body).unwrap();
        tasks.spawn(async move { engine.update_entry(&owner, &updated).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let stored = engine
        .entry(&alice.user_id, &created.id.to_string())
        .await
        .unwrap();
    assert!(["F-A", "F-B"].contains(&stored.details.folio.as_str()));
    assert_eq!(stored.details.reason, "Hotel");
    assert_eq!(stored.details.cost_center, "0412");
    assert_eq!(stored.created_by, alice.user_id);
}

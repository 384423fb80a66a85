//! End-to-end engine tests against an in-memory SQLite database.
//!
//! Covers the full count lifecycle (create → generate → count → complete →
//! validate), the generator's idempotency properties, the status guards,
//! and the ledger commit semantics.

use chrono::Utc;
use uuid::Uuid;

use tally_core::{
    CountStatus, GenerateOptions, Product, Warehouse, DEFAULT_TENANT_ID,
};
use tally_db::{Database, DbConfig};
use tally_engine::{CountEngine, CreateCount, ErrorCode, NewCountItem};

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    engine: CountEngine,
    db: Database,
    warehouse_id: String,
    beverages: String,
    grocery: String,
    /// 5 on hand, $1.00/unit, beverages
    prod_a: String,
    /// 0 on hand, $0.50/unit, beverages
    prod_b: String,
    /// 12 on hand, $2.50/unit, grocery
    prod_c: String,
}

fn product(sku: &str, name: &str, category_id: &str, unit_value_cents: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        category_id: Some(category_id.to_string()),
        unit_value_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();

    let now = Utc::now();
    let warehouse = Warehouse {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        code: "WH-MAIN".to_string(),
        name: "Main Warehouse".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    ledger.insert_warehouse(&warehouse).await.unwrap();

    let beverages = Uuid::new_v4().to_string();
    let grocery = Uuid::new_v4().to_string();

    let a = product("BEV-001", "Cola 330ml", &beverages, 100);
    let b = product("BEV-002", "Lemonade 500ml", &beverages, 50);
    let c = product("GRO-001", "Rice 1kg", &grocery, 250);

    ledger.insert_product(&a).await.unwrap();
    ledger.insert_product(&b).await.unwrap();
    ledger.insert_product(&c).await.unwrap();

    ledger.set_on_hand(&warehouse.id, &a.id, 5).await.unwrap();
    ledger.set_on_hand(&warehouse.id, &b.id, 0).await.unwrap();
    ledger.set_on_hand(&warehouse.id, &c.id, 12).await.unwrap();

    Fixture {
        engine: CountEngine::new(db.clone()),
        db,
        warehouse_id: warehouse.id,
        beverages,
        grocery,
        prod_a: a.id,
        prod_b: b.id,
        prod_c: c.id,
    }
}

async fn new_session(fx: &Fixture) -> String {
    fx.engine
        .create_session(CreateCount {
            warehouse_id: fx.warehouse_id.clone(),
            count_date: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
}

// =============================================================================
// Session CRUD
// =============================================================================

#[tokio::test]
async fn create_session_starts_planned() {
    let fx = fixture().await;

    let count = fx
        .engine
        .create_session(CreateCount {
            warehouse_id: fx.warehouse_id.clone(),
            count_date: None,
            notes: Some("monthly count".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(count.status, CountStatus::Planned);
    assert!(count.count_number.starts_with("SC-"));
    assert_eq!(count.warehouse_id, fx.warehouse_id);
    assert!(count.validated_at.is_none());

    let loaded = fx.engine.get_session(&count.id).await.unwrap();
    assert_eq!(loaded.count.id, count.id);
    assert!(loaded.items.is_empty());
}

#[tokio::test]
async fn create_session_requires_warehouse() {
    let fx = fixture().await;

    // Missing warehouse_id is invalid input
    let err = fx
        .engine
        .create_session(CreateCount {
            warehouse_id: String::new(),
            count_date: None,
            notes: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    // A well-formed but unknown warehouse is not found
    let err = fx
        .engine
        .create_session(CreateCount {
            warehouse_id: Uuid::new_v4().to_string(),
            count_date: None,
            notes: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn get_session_unknown_id_is_not_found() {
    let fx = fixture().await;

    let err = fx
        .engine
        .get_session(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn list_sessions_filters_by_status() {
    let fx = fixture().await;

    let first = new_session(&fx).await;
    let second = new_session(&fx).await;
    fx.engine.start(&second).await.unwrap();

    let planned = fx
        .engine
        .list_sessions(Some(CountStatus::Planned), 50)
        .await
        .unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].id, first);

    let all = fx.engine.list_sessions(None, 50).await.unwrap();
    assert_eq!(all.len(), 2);
}

// =============================================================================
// Manual item lines
// =============================================================================

#[tokio::test]
async fn add_item_snapshots_product_identity() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let item = fx
        .engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_a.clone(),
                expected_quantity: 5,
                counted_quantity: 0,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(item.sku_snapshot, "BEV-001");
    assert_eq!(item.name_snapshot, "Cola 330ml");
    assert_eq!(item.expected_quantity, 5);
    assert_eq!(item.difference(), -5);
}

#[tokio::test]
async fn add_item_twice_is_a_conflict() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let req = NewCountItem {
        product_id: fx.prod_a.clone(),
        expected_quantity: 5,
        counted_quantity: 0,
        notes: None,
    };

    fx.engine.add_item(&count_id, req.clone()).await.unwrap();
    let err = fx.engine.add_item(&count_id, req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    // The losing call wrote nothing
    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert_eq!(session.items.len(), 1);
}

#[tokio::test]
async fn add_item_rejects_bad_input() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let err = fx
        .engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_a.clone(),
                expected_quantity: -1,
                counted_quantity: 0,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    let err = fx
        .engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: Uuid::new_v4().to_string(),
                expected_quantity: 1,
                counted_quantity: 0,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn update_and_delete_item() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let item = fx
        .engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_a.clone(),
                expected_quantity: 5,
                counted_quantity: 0,
                notes: None,
            },
        )
        .await
        .unwrap();

    let updated = fx
        .engine
        .update_item_count(&count_id, &item.id, 7)
        .await
        .unwrap();
    assert_eq!(updated.counted_quantity, 7);
    assert_eq!(updated.difference(), 2);

    let err = fx
        .engine
        .update_item_count(&count_id, &item.id, -3)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    fx.engine.delete_item(&count_id, &item.id).await.unwrap();
    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert!(session.items.is_empty());

    let err = fx
        .engine
        .delete_item(&count_id, &item.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

// =============================================================================
// Item Generator
// =============================================================================

#[tokio::test]
async fn generate_skips_zero_stock_by_default() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let report = fx
        .engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();

    // prod_a (5) and prod_c (12); prod_b has zero on hand
    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 0);

    let session = fx.engine.get_session(&count_id).await.unwrap();
    let product_ids: Vec<&str> = session.items.iter().map(|i| i.product_id.as_str()).collect();
    assert!(product_ids.contains(&fx.prod_a.as_str()));
    assert!(product_ids.contains(&fx.prod_c.as_str()));
    assert!(!product_ids.contains(&fx.prod_b.as_str()));

    // expected frozen from the ledger, counted starts at zero
    let line_a = session
        .items
        .iter()
        .find(|i| i.product_id == fx.prod_a)
        .unwrap();
    assert_eq!(line_a.expected_quantity, 5);
    assert_eq!(line_a.counted_quantity, 0);
}

#[tokio::test]
async fn generate_can_include_zero_stock_and_filter_by_category() {
    let fx = fixture().await;

    let count_id = new_session(&fx).await;
    let report = fx
        .engine
        .generate_items(
            &count_id,
            GenerateOptions {
                include_zero_stock: true,
                overwrite: false,
                category_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(report.created, 3);

    let count_id = new_session(&fx).await;
    let report = fx
        .engine
        .generate_items(
            &count_id,
            GenerateOptions {
                include_zero_stock: true,
                overwrite: false,
                category_id: Some(fx.beverages.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.created, 2); // prod_a and prod_b only

    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert!(session.items.iter().all(|i| i.product_id != fx.prod_c));

    let count_id = new_session(&fx).await;
    let report = fx
        .engine
        .generate_items(
            &count_id,
            GenerateOptions {
                include_zero_stock: false,
                overwrite: false,
                category_id: Some(fx.grocery.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.created, 1); // prod_c only

    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert_eq!(session.items[0].product_id, fx.prod_c);
}

#[tokio::test]
async fn generate_without_overwrite_never_duplicates() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let first = fx
        .engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(first.created, 2);

    // Operator has entered some counts since
    let session = fx.engine.get_session(&count_id).await.unwrap();
    let line_a = session.items.iter().find(|i| i.product_id == fx.prod_a).unwrap();
    fx.engine
        .update_item_count(&count_id, &line_a.id, 4)
        .await
        .unwrap();

    // Re-run: everything already present is skipped, counts survive
    let second = fx
        .engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);

    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert_eq!(session.items.len(), 2);
    let line_a = session.items.iter().find(|i| i.product_id == fx.prod_a).unwrap();
    assert_eq!(line_a.counted_quantity, 4);
}

#[tokio::test]
async fn generate_with_overwrite_is_idempotent() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    let options = GenerateOptions {
        include_zero_stock: false,
        overwrite: true,
        category_id: None,
    };

    let first = fx.engine.generate_items(&count_id, options.clone()).await.unwrap();
    let after_first = fx.engine.get_session(&count_id).await.unwrap();

    let second = fx.engine.generate_items(&count_id, options).await.unwrap();
    let after_second = fx.engine.get_session(&count_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first.items.len(), after_second.items.len());

    let key = |s: &tally_core::StockCountWithItems| -> Vec<(String, i64, i64)> {
        s.items
            .iter()
            .map(|i| (i.product_id.clone(), i.expected_quantity, i.counted_quantity))
            .collect()
    };
    assert_eq!(key(&after_first), key(&after_second));
}

#[tokio::test]
async fn auto_fill_sets_counted_to_expected() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    fx.engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();

    let updated = fx.engine.auto_fill_counts(&count_id).await.unwrap();
    assert_eq!(updated, 2);

    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert!(session.items.iter().all(|i| i.is_match()));

    let summary = fx.engine.summary(&count_id).await.unwrap();
    assert!((summary.statistics.match_rate - 100.0).abs() < f64::EPSILON);
}

// =============================================================================
// Reconciliation queries
// =============================================================================

#[tokio::test]
async fn summary_reports_quantities_and_values() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    // a: expected 10 counted 10 ($1.00/unit), c: expected 5 counted 3 ($2.50/unit)
    fx.engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_a.clone(),
                expected_quantity: 10,
                counted_quantity: 10,
                notes: None,
            },
        )
        .await
        .unwrap();
    fx.engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_c.clone(),
                expected_quantity: 5,
                counted_quantity: 3,
                notes: None,
            },
        )
        .await
        .unwrap();

    let summary = fx.engine.summary(&count_id).await.unwrap();

    assert_eq!(summary.statistics.items_matched, 1);
    assert_eq!(summary.statistics.items_deficit, 1);
    assert_eq!(summary.statistics.items_surplus, 0);
    assert_eq!(summary.quantities.net_difference, -2);
    assert_eq!(
        summary.quantities.net_difference,
        summary.quantities.total_counted - summary.quantities.total_expected
    );

    // 10×100 + 5×250 = 2250 expected; 10×100 + 3×250 = 1750 counted
    assert_eq!(summary.values.total_expected_value.cents(), 2250);
    assert_eq!(summary.values.total_counted_value.cents(), 1750);
    assert_eq!(summary.values.value_difference.cents(), -500);

    let discrepant = fx.engine.discrepancies(&count_id).await.unwrap();
    assert_eq!(discrepant.len(), 1);
    assert_eq!(discrepant[0].product_id, fx.prod_c);
    assert_eq!(discrepant[0].difference(), -2);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn full_lifecycle_commits_discrepancies_to_ledger() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    fx.engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();

    let started = fx.engine.start(&count_id).await.unwrap();
    assert_eq!(started.status, CountStatus::InProgress);

    // Count: a matches (5), c found short (12 expected, 9 counted)
    let session = fx.engine.get_session(&count_id).await.unwrap();
    for item in &session.items {
        let counted = if item.product_id == fx.prod_a { 5 } else { 9 };
        fx.engine
            .update_item_count(&count_id, &item.id, counted)
            .await
            .unwrap();
    }

    let completed = fx.engine.complete(&count_id).await.unwrap();
    assert_eq!(completed.status, CountStatus::Completed);

    let validated = fx.engine.validate(&count_id).await.unwrap();
    assert_eq!(validated.status, CountStatus::Validated);
    assert!(validated.validated_at.is_some());

    // Ledger corrected to the counted quantities
    let ledger = fx.db.ledger();
    assert_eq!(ledger.on_hand(&fx.warehouse_id, &fx.prod_a).await.unwrap(), 5);
    assert_eq!(ledger.on_hand(&fx.warehouse_id, &fx.prod_c).await.unwrap(), 9);

    // One movement per discrepant line, none for the match
    let movements = ledger.movements_for_reference(&count_id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].product_id, fx.prod_c);
    assert_eq!(movements[0].quantity, -3);
    assert_eq!(movements[0].reason, "stock_count");
}

#[tokio::test]
async fn transitions_out_of_order_are_invalid_state() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    // validate straight from planned
    let err = fx.engine.validate(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    // complete before start
    let err = fx.engine.complete(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    fx.engine.start(&count_id).await.unwrap();

    // validate from in_progress (Scenario D): fails, no ledger writes
    let err = fx.engine.validate(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
    let movements = fx.db.ledger().movements_for_reference(&count_id).await.unwrap();
    assert!(movements.is_empty());

    // start again from in_progress
    let err = fx.engine.start(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    // unknown id is NotFound, not InvalidState
    let err = fx.engine.start(&Uuid::new_v4().to_string()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn completed_counts_are_read_only_for_items() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    fx.engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();
    fx.engine.start(&count_id).await.unwrap();
    fx.engine.complete(&count_id).await.unwrap();

    let session = fx.engine.get_session(&count_id).await.unwrap();
    let item_id = session.items[0].id.clone();

    let err = fx
        .engine
        .update_item_count(&count_id, &item_id, 99)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let err = fx.engine.delete_item(&count_id, &item_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let err = fx
        .engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let err = fx.engine.auto_fill_counts(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    // Nothing changed
    let after = fx.engine.get_session(&count_id).await.unwrap();
    assert_eq!(after.items[0].counted_quantity, session.items[0].counted_quantity);
}

#[tokio::test]
async fn terminal_counts_reject_every_mutation() {
    let fx = fixture().await;

    // cancelled
    let count_id = new_session(&fx).await;
    let cancelled = fx.engine.cancel(&count_id).await.unwrap();
    assert_eq!(cancelled.status, CountStatus::Cancelled);

    let err = fx
        .engine
        .add_item(
            &count_id,
            NewCountItem {
                product_id: fx.prod_a.clone(),
                expected_quantity: 1,
                counted_quantity: 0,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let err = fx.engine.start(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
    let err = fx.engine.cancel(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    // cancel never touches the ledger
    assert_eq!(fx.db.ledger().on_hand(&fx.warehouse_id, &fx.prod_a).await.unwrap(), 5);

    // validated
    let count_id = new_session(&fx).await;
    fx.engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();
    fx.engine.start(&count_id).await.unwrap();
    fx.engine.auto_fill_counts(&count_id).await.unwrap();
    fx.engine.complete(&count_id).await.unwrap();
    fx.engine.validate(&count_id).await.unwrap();

    let err = fx.engine.validate(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
    let err = fx.engine.cancel(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
    let err = fx.engine.auto_fill_counts(&count_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[tokio::test]
async fn concurrent_validate_has_exactly_one_winner() {
    let fx = fixture().await;
    let count_id = new_session(&fx).await;

    fx.engine
        .generate_items(&count_id, GenerateOptions::default())
        .await
        .unwrap();
    fx.engine.start(&count_id).await.unwrap();
    fx.engine.auto_fill_counts(&count_id).await.unwrap();
    fx.engine.complete(&count_id).await.unwrap();

    let e1 = fx.engine.clone();
    let e2 = fx.engine.clone();
    let id1 = count_id.clone();
    let id2 = count_id.clone();

    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { e1.validate(&id1).await }),
        tokio::spawn(async move { e2.validate(&id2).await }),
    );
    let r1 = r1.unwrap();
    let r2 = r2.unwrap();

    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let loser = if r1.is_err() { r1.unwrap_err() } else { r2.unwrap_err() };
    assert_eq!(loser.code(), ErrorCode::InvalidState);

    let session = fx.engine.get_session(&count_id).await.unwrap();
    assert_eq!(session.count.status, CountStatus::Validated);
}

use super::*;

use chanrec_core::{
    AppConfig, CanonicalProduct, Environment, IdentifierMapping, OrderLineItem, Platform,
    SourceType,
};
use chrono::TimeZone;
use rust_decimal::Decimal;
use std::path::PathBuf;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        env: Environment::Test,
        log_level: "warn".to_string(),
        mappings_path: PathBuf::from("./config/mappings.yaml"),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
        max_concurrent_resolves: 4,
        stock_floor: 0,
    }
}

async fn seed_product(pool: &sqlx::PgPool, code: &str, stock: i64) {
    chanrec_db::upsert_product(
        pool,
        &CanonicalProduct {
            canonical_code: code.to_string(),
            display_name: format!("Product {code}"),
            current_stock: stock,
            minimum_stock: 0,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("seed_product failed for '{code}': {e}"));
}

async fn seed_mapping(pool: &sqlx::PgPool, source_type: SourceType, value: &str, code: &str) {
    chanrec_db::upsert_mapping(
        pool,
        &IdentifierMapping {
            source_type,
            source_value: value.to_string(),
            canonical_code: code.to_string(),
            display_name: None,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("seed_mapping failed for '{value}': {e}"));
}

async fn seed_line_item(pool: &sqlx::PgPool, order_id: &str, raw_sku: &str, quantity: i32) {
    let item = OrderLineItem {
        platform: Platform::SmartStore,
        external_order_id: order_id.to_string(),
        line_item_id: "1".to_string(),
        raw_sku: raw_sku.to_string(),
        raw_option_text: None,
        quantity,
        unit_price: Decimal::new(12900, 2),
        observed_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    };
    chanrec_db::upsert_line_item(pool, &item)
        .await
        .unwrap_or_else(|e| panic!("seed_line_item failed for '{order_id}': {e}"));
}

fn march() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_decrements_stock_and_writes_aggregates(pool: sqlx::PgPool) {
    seed_product(&pool, "R05", 10).await;
    seed_mapping(&pool, SourceType::PlatformSku, "83017382950", "R05").await;
    seed_line_item(&pool, "ORD-1", "83017382950", 2).await;

    let (from, to) = march();
    run_reconcile(&pool, &test_config(), from, to, false)
        .await
        .expect("run_reconcile failed");

    let stocks = chanrec_db::fetch_stock_levels(&pool).await.expect("stocks");
    assert_eq!(stocks, vec![("R05".to_string(), 8)]);

    let rows = chanrec_db::fetch_daily_aggregates(&pool, from, to)
        .await
        .expect("aggregates");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].units, 2);
    assert_eq!(rows[0].gross_amount, Decimal::new(25800, 2));

    let runs = chanrec_db::list_reconcile_runs(&pool, 1).await.expect("runs");
    assert_eq!(runs[0].status, "succeeded");
    assert_eq!(runs[0].items_processed, 1);
    assert_eq!(runs[0].items_resolved, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rerunning_the_same_window_changes_nothing(pool: sqlx::PgPool) {
    seed_product(&pool, "R05", 10).await;
    seed_mapping(&pool, SourceType::PlatformSku, "83017382950", "R05").await;
    seed_line_item(&pool, "ORD-1", "83017382950", 2).await;

    let (from, to) = march();
    let config = test_config();
    run_reconcile(&pool, &config, from, to, false)
        .await
        .expect("first run failed");
    run_reconcile(&pool, &config, from, to, false)
        .await
        .expect("second run failed");

    let stocks = chanrec_db::fetch_stock_levels(&pool).await.expect("stocks");
    assert_eq!(stocks, vec![("R05".to_string(), 8)], "stock decremented twice");

    let rows = chanrec_db::fetch_daily_aggregates(&pool, from, to)
        .await
        .expect("aggregates");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].units, 2, "aggregates accumulated instead of replacing");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dry_run_writes_nothing(pool: sqlx::PgPool) {
    seed_product(&pool, "R05", 10).await;
    seed_mapping(&pool, SourceType::PlatformSku, "83017382950", "R05").await;
    seed_line_item(&pool, "ORD-1", "83017382950", 2).await;

    let (from, to) = march();
    run_reconcile(&pool, &test_config(), from, to, true)
        .await
        .expect("dry run failed");

    let stocks = chanrec_db::fetch_stock_levels(&pool).await.expect("stocks");
    assert_eq!(stocks, vec![("R05".to_string(), 10)]);

    let rows = chanrec_db::fetch_daily_aggregates(&pool, from, to)
        .await
        .expect("aggregates");
    assert!(rows.is_empty());

    let runs = chanrec_db::list_reconcile_runs(&pool, 1).await.expect("runs");
    assert!(runs.is_empty(), "dry run should not create a run row");
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_window_skips_run_creation(pool: sqlx::PgPool) {
    let (from, to) = march();
    run_reconcile(&pool, &test_config(), from, to, false)
        .await
        .expect("run_reconcile failed");

    let runs = chanrec_db::list_reconcile_runs(&pool, 1).await.expect("runs");
    assert!(runs.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unresolved_items_leave_stock_alone_and_are_counted(pool: sqlx::PgPool) {
    seed_product(&pool, "R05", 10).await;
    seed_line_item(&pool, "ORD-1", "99999", 1).await;

    let (from, to) = march();
    run_reconcile(&pool, &test_config(), from, to, false)
        .await
        .expect("run_reconcile failed");

    let stocks = chanrec_db::fetch_stock_levels(&pool).await.expect("stocks");
    assert_eq!(stocks, vec![("R05".to_string(), 10)]);

    let runs = chanrec_db::list_reconcile_runs(&pool, 1).await.expect("runs");
    assert_eq!(runs[0].items_processed, 1);
    assert_eq!(runs[0].items_resolved, 0);
}

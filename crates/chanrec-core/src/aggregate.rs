//! Daily sales aggregate recomputation.
//!
//! Aggregates are fully derived: the functions here recompute per-bucket
//! totals from scratch on every call, and the storage layer replaces prior
//! rows for the affected `(date, platform)` buckets instead of incrementing
//! them. Re-running after a correction therefore matches a clean run.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{DailyAggregate, Platform, ResolutionResult};

/// Totals for line items no tier could resolve, reported separately so
/// operators can see mapping coverage degrade.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnresolvedTotals {
    pub units: i64,
    pub gross_amount: Decimal,
}

/// Recomputes daily aggregates from the full result set.
///
/// Buckets by the UTC date of `observed_at`, platform, and attributed
/// canonical code; `units` sums attributed quantities and `gross_amount`
/// sums `unit_price × quantity` per attribution. Unresolved items contribute
/// nothing here (see [`unresolved_totals`]). Output is sorted by
/// `(date, platform, code)` so replace writes are deterministic.
#[must_use]
pub fn aggregate_daily(results: &[ResolutionResult]) -> Vec<DailyAggregate> {
    let mut buckets: BTreeMap<(NaiveDate, Platform, String), (i64, Decimal)> = BTreeMap::new();

    for result in results {
        let date = result.item.observed_at.date_naive();
        for attribution in &result.attributions {
            let entry = buckets
                .entry((date, result.item.platform, attribution.canonical_code.clone()))
                .or_insert((0, Decimal::ZERO));
            entry.0 += i64::from(attribution.quantity);
            entry.1 += result.item.unit_price * Decimal::from(attribution.quantity);
        }
    }

    buckets
        .into_iter()
        .map(|((date, platform, canonical_code), (units, gross_amount))| DailyAggregate {
            date,
            platform,
            canonical_code,
            units,
            gross_amount,
        })
        .collect()
}

/// Sums units and gross amount over unresolved line items.
#[must_use]
pub fn unresolved_totals(results: &[ResolutionResult]) -> UnresolvedTotals {
    let mut totals = UnresolvedTotals::default();
    for result in results.iter().filter(|r| !r.is_resolved()) {
        totals.units += i64::from(result.item.quantity);
        totals.gross_amount += result.item.unit_price * Decimal::from(result.item.quantity);
    }
    totals
}

/// The `(date, platform)` buckets touched by any item in the result set,
/// resolved or not. Every touched bucket must be replaced, including buckets
/// whose items all became unresolved (their aggregate rows are deleted).
#[must_use]
pub fn touched_buckets(results: &[ResolutionResult]) -> Vec<(NaiveDate, Platform)> {
    let set: BTreeSet<(NaiveDate, Platform)> = results
        .iter()
        .map(|r| (r.item.observed_at.date_naive(), r.item.platform))
        .collect();
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribution, OrderLineItem, ResolutionMethod};
    use chrono::{TimeZone, Utc};

    fn item_on(day: u32, platform: Platform, quantity: i32, price: Decimal) -> OrderLineItem {
        OrderLineItem {
            platform,
            external_order_id: format!("O-{day}-{quantity}"),
            line_item_id: "1".to_string(),
            raw_sku: "sku".to_string(),
            raw_option_text: None,
            quantity,
            unit_price: price,
            observed_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        }
    }

    fn resolved(item: OrderLineItem, codes: &[&str]) -> ResolutionResult {
        let quantity = item.quantity;
        ResolutionResult {
            item,
            method: ResolutionMethod::DirectSku,
            attributions: codes
                .iter()
                .map(|c| Attribution {
                    canonical_code: (*c).to_string(),
                    quantity,
                })
                .collect(),
            conflict_keys: vec![],
        }
    }

    fn unresolved(item: OrderLineItem) -> ResolutionResult {
        ResolutionResult {
            item,
            method: ResolutionMethod::Unresolved,
            attributions: vec![],
            conflict_keys: vec![],
        }
    }

    #[test]
    fn sums_units_and_gross_per_bucket() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 2, Decimal::new(1000, 2)), &["P1"]),
            resolved(item_on(1, Platform::SmartStore, 3, Decimal::new(500, 2)), &["P1"]),
        ];
        let rows = aggregate_daily(&results);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].units, 5);
        // 2 × 10.00 + 3 × 5.00
        assert_eq!(rows[0].gross_amount, Decimal::new(3500, 2));
    }

    #[test]
    fn separates_platforms_in_same_day() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 1, Decimal::ONE), &["P1"]),
            resolved(item_on(1, Platform::Coupang, 1, Decimal::ONE), &["P1"]),
        ];
        let rows = aggregate_daily(&results);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn separates_days() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 1, Decimal::ONE), &["P1"]),
            resolved(item_on(2, Platform::SmartStore, 1, Decimal::ONE), &["P1"]),
        ];
        let rows = aggregate_daily(&results);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date < rows[1].date);
    }

    #[test]
    fn bundle_contributes_to_each_code() {
        let results = vec![resolved(
            item_on(1, Platform::SmartStore, 2, Decimal::new(700, 2)),
            &["P1", "P2"],
        )];
        let rows = aggregate_daily(&results);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.units, 2);
            assert_eq!(row.gross_amount, Decimal::new(1400, 2));
        }
    }

    #[test]
    fn unresolved_items_are_excluded_from_rows() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 1, Decimal::ONE), &["P1"]),
            unresolved(item_on(1, Platform::SmartStore, 4, Decimal::new(250, 2))),
        ];
        let rows = aggregate_daily(&results);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].units, 1);
    }

    #[test]
    fn unresolved_totals_counted_separately() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 1, Decimal::ONE), &["P1"]),
            unresolved(item_on(1, Platform::SmartStore, 4, Decimal::new(250, 2))),
        ];
        let totals = unresolved_totals(&results);
        assert_eq!(totals.units, 4);
        assert_eq!(totals.gross_amount, Decimal::new(1000, 2));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let results = vec![
            resolved(item_on(1, Platform::SmartStore, 2, Decimal::new(1000, 2)), &["P1"]),
            resolved(item_on(2, Platform::Coupang, 1, Decimal::new(300, 2)), &["P2"]),
        ];
        assert_eq!(aggregate_daily(&results), aggregate_daily(&results));
    }

    #[test]
    fn touched_buckets_include_unresolved_only_buckets() {
        let results = vec![unresolved(item_on(3, Platform::Esm, 1, Decimal::ONE))];
        let buckets = touched_buckets(&results);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].1, Platform::Esm);
        assert!(aggregate_daily(&results).is_empty());
    }

    #[test]
    fn empty_results_yield_no_rows() {
        assert!(aggregate_daily(&[]).is_empty());
        assert_eq!(unresolved_totals(&[]), UnresolvedTotals::default());
        assert!(touched_buckets(&[]).is_empty());
    }
}

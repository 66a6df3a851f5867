//! `reconcile` command: resolve a window of line items, apply stock deltas
//! exactly once, and replace the daily aggregates for the touched buckets.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::stream::{self, StreamExt};

use chanrec_core::ledger::{plan_deltas, ApplyOutcome, InventoryLedger};
use chanrec_core::{resolve_batch, MappingSnapshot, ResolutionReport, StockDelta};
use chanrec_db::{DbError, RunTotals};

use crate::fail_run_best_effort;

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub(crate) async fn run_reconcile(
    pool: &sqlx::PgPool,
    config: &chanrec_core::AppConfig,
    from: NaiveDate,
    to: NaiveDate,
    dry_run: bool,
) -> anyhow::Result<()> {
    if from >= to {
        anyhow::bail!("--from must be earlier than --to");
    }

    let mappings = chanrec_db::fetch_all_mappings(pool).await?;
    let snapshot = MappingSnapshot::build(mappings);
    if snapshot.conflict_count() > 0 {
        tracing::warn!(
            conflicts = snapshot.conflict_count(),
            "mapping snapshot has conflicted keys; affected lookups fail closed"
        );
    }

    let items = chanrec_db::fetch_line_items_between(pool, day_start(from), day_start(to)).await?;
    if items.is_empty() {
        println!("no line items observed in [{from}, {to}); skipping run creation");
        return Ok(());
    }

    let total_input = items.len();
    let batch = resolve_batch(&snapshot, items);
    let deltas = plan_deltas(&batch.results);

    if dry_run {
        let stocks = chanrec_db::fetch_stock_levels(pool).await?;
        let ledger = InventoryLedger::new(stocks, config.stock_floor);
        ledger.apply_all(&deltas);

        let mut report = ResolutionReport::from_results(&batch.results, &batch.rejected, &snapshot);
        report.clamp_events = ledger.clamp_events();

        println!("dry-run: no changes were written");
        print!("{}", report.render());
        return Ok(());
    }

    let run = chanrec_db::create_reconcile_run(pool, "cli").await?;
    if let Err(e) = chanrec_db::start_reconcile_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let max_concurrent = config.max_concurrent_resolves.max(1);
    let outcomes: Vec<(&StockDelta, Result<ApplyOutcome, DbError>)> = stream::iter(&deltas)
        .map(|delta| async move {
            (
                delta,
                chanrec_db::apply_stock_delta(pool, delta, config.stock_floor).await,
            )
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut clamp_events: u64 = 0;
    let mut apply_errors: usize = 0;
    for (delta, outcome) in &outcomes {
        match outcome {
            Ok(ApplyOutcome::Applied { clamped, .. }) => {
                if *clamped {
                    clamp_events += 1;
                    tracing::warn!(
                        canonical_code = %delta.canonical_code,
                        "stock decrement clamped at floor"
                    );
                }
            }
            Ok(ApplyOutcome::AlreadyApplied) => {
                tracing::debug!(
                    key = %delta.idempotency_key,
                    "delta already applied; skipped"
                );
            }
            Ok(ApplyOutcome::UnknownCode) => {
                tracing::warn!(
                    canonical_code = %delta.canonical_code,
                    "resolved code has no product row; delta not applied"
                );
            }
            Err(e) => {
                tracing::error!(
                    key = %delta.idempotency_key,
                    error = %e,
                    "failed to apply stock delta"
                );
                apply_errors += 1;
            }
        }
    }

    if apply_errors > 0 {
        let message = format!("{apply_errors} of {} stock deltas failed to apply", deltas.len());
        fail_run_best_effort(pool, run.id, message.clone()).await;
        anyhow::bail!("{message}");
    }

    let rows = chanrec_core::aggregate::aggregate_daily(&batch.results);
    let buckets = chanrec_core::aggregate::touched_buckets(&batch.results);
    if let Err(e) = chanrec_db::replace_daily_aggregates(pool, &buckets, &rows).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut report = ResolutionReport::from_results(&batch.results, &batch.rejected, &snapshot);
    report.clamp_events = clamp_events;

    let totals = RunTotals {
        items_processed: i32::try_from(total_input).unwrap_or(i32::MAX),
        items_resolved: i32::try_from(batch.results.iter().filter(|r| r.is_resolved()).count())
            .unwrap_or(i32::MAX),
        clamp_events: i32::try_from(clamp_events).unwrap_or(i32::MAX),
    };
    if let Err(e) = chanrec_db::complete_reconcile_run(pool, run.id, totals).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    println!(
        "run {} reconciled [{from}, {to}): {} items, {} aggregate rows across {} buckets",
        run.id,
        total_input,
        rows.len(),
        buckets.len()
    );
    print!("{}", report.render());
    Ok(())
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;

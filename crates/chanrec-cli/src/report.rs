//! `report` command: read-only view over daily aggregates and recent runs.

use chrono::NaiveDate;

pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<()> {
    if from >= to {
        anyhow::bail!("--from must be earlier than --to");
    }

    let rows = chanrec_db::fetch_daily_aggregates(pool, from, to).await?;
    if rows.is_empty() {
        println!("no aggregates in [{from}, {to})");
    } else {
        println!("daily aggregates [{from}, {to})");
        for row in &rows {
            println!(
                "  {} {:<12} {:<8} {:>6} units  {:>10} gross",
                row.date,
                row.platform.as_str(),
                row.canonical_code,
                row.units,
                row.gross_amount
            );
        }
    }

    let runs = chanrec_db::list_reconcile_runs(pool, 10).await?;
    if !runs.is_empty() {
        println!("recent runs");
        for run in &runs {
            println!(
                "  #{} {:<10} processed={} resolved={} clamps={}{}",
                run.id,
                run.status,
                run.items_processed,
                run.items_resolved,
                run.clamp_events,
                run.error_message
                    .as_deref()
                    .map(|m| format!("  error: {m}"))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

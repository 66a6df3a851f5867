//! `ingest` command: load raw order line items from a JSON-lines file.
//!
//! Each input line is one JSON-encoded order line item. Malformed lines are
//! logged and skipped, never fatal; re-ingesting a file upserts the same
//! rows in place.

use std::path::Path;

use chanrec_core::OrderLineItem;

pub(crate) async fn run_ingest(pool: &sqlx::PgPool, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;

    let mut items: Vec<OrderLineItem> = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<OrderLineItem>(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping malformed input line");
                skipped += 1;
            }
        }
    }

    if items.is_empty() {
        println!("no parseable line items in {}; nothing ingested", file.display());
        return Ok(());
    }

    let written = chanrec_db::upsert_line_items(pool, &items).await?;
    println!(
        "ingested {written} line items from {} ({skipped} lines skipped)",
        file.display()
    );
    Ok(())
}

//! Operator-facing diagnostics for a reconciliation run.

use std::collections::HashMap;

use crate::aggregate::{unresolved_totals, UnresolvedTotals};
use crate::model::{RejectReason, RejectedItem, ResolutionMethod, ResolutionResult};
use crate::snapshot::{MappingConflict, MappingSnapshot};

/// Resolution-rate and conflict summary for one run.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    pub total_items: usize,
    pub direct_sku: usize,
    pub derived_sku: usize,
    pub option_code: usize,
    pub unresolved: usize,
    /// Unresolved `raw_sku` values with how often each occurred, sorted by
    /// frequency descending then identifier.
    pub unresolved_identifiers: Vec<(String, usize)>,
    pub unresolved_totals: UnresolvedTotals,
    /// Conflicted mapping keys from the snapshot.
    pub conflicts: Vec<MappingConflict>,
    /// Rejected (malformed) items per reason.
    pub rejected: Vec<(RejectReason, usize)>,
    /// Clamp events observed while applying stock deltas; filled in by the
    /// caller that performed the apply step.
    pub clamp_events: u64,
}

impl ResolutionReport {
    /// Builds the report from a run's results, rejected bucket, and snapshot.
    #[must_use]
    pub fn from_results(
        results: &[ResolutionResult],
        rejected: &[RejectedItem],
        snapshot: &MappingSnapshot,
    ) -> Self {
        let mut report = Self {
            total_items: results.len(),
            conflicts: snapshot.conflicts(),
            unresolved_totals: unresolved_totals(results),
            ..Self::default()
        };

        let mut unresolved_freq: HashMap<&str, usize> = HashMap::new();
        for result in results {
            match result.method {
                ResolutionMethod::DirectSku => report.direct_sku += 1,
                ResolutionMethod::DerivedSku => report.derived_sku += 1,
                ResolutionMethod::OptionCode => report.option_code += 1,
                ResolutionMethod::Unresolved => {
                    report.unresolved += 1;
                    *unresolved_freq.entry(result.item.raw_sku.as_str()).or_default() += 1;
                }
            }
        }

        let mut identifiers: Vec<(String, usize)> = unresolved_freq
            .into_iter()
            .map(|(sku, count)| (sku.to_string(), count))
            .collect();
        identifiers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        report.unresolved_identifiers = identifiers;

        let mut reject_counts: HashMap<RejectReason, usize> = HashMap::new();
        for rejected_item in rejected {
            *reject_counts.entry(rejected_item.reason).or_default() += 1;
        }
        let mut rejected_rows: Vec<(RejectReason, usize)> = reject_counts.into_iter().collect();
        rejected_rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        report.rejected = rejected_rows;

        report
    }

    /// Fraction of items resolved by any tier, in `[0, 1]`. Zero items counts
    /// as fully resolved.
    #[must_use]
    pub fn resolution_rate(&self) -> f64 {
        if self.total_items == 0 {
            return 1.0;
        }
        let resolved = self.total_items - self.unresolved;
        #[allow(clippy::cast_precision_loss)]
        {
            resolved as f64 / self.total_items as f64
        }
    }

    /// Renders the plain-text report printed by the CLI.
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "resolution summary");
        let _ = writeln!(out, "  total items:   {}", self.total_items);
        let _ = writeln!(out, "  direct_sku:    {}", self.direct_sku);
        let _ = writeln!(out, "  derived_sku:   {}", self.derived_sku);
        let _ = writeln!(out, "  option_code:   {}", self.option_code);
        let _ = writeln!(out, "  unresolved:    {}", self.unresolved);
        let _ = writeln!(out, "  rate:          {:.1}%", self.resolution_rate() * 100.0);
        let _ = writeln!(out, "  clamp events:  {}", self.clamp_events);

        if !self.rejected.is_empty() {
            let _ = writeln!(out, "rejected items");
            for (reason, count) in &self.rejected {
                let _ = writeln!(out, "  {reason}: {count}");
            }
        }

        if !self.unresolved_identifiers.is_empty() {
            let _ = writeln!(
                out,
                "unresolved identifiers ({} units, {} gross)",
                self.unresolved_totals.units, self.unresolved_totals.gross_amount
            );
            for (sku, count) in &self.unresolved_identifiers {
                let _ = writeln!(out, "  {sku} x{count}");
            }
        }

        if !self.conflicts.is_empty() {
            let _ = writeln!(out, "mapping conflicts");
            for conflict in &self.conflicts {
                let _ = writeln!(
                    out,
                    "  ({}, {}) -> [{}]",
                    conflict.source_type,
                    conflict.source_value,
                    conflict.canonical_codes.join(", ")
                );
            }
        }

        out
    }
}

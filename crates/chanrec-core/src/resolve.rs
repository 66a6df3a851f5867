//! Tiered identifier resolution.
//!
//! Each line item walks the tiers in order and stops at the first hit:
//! direct platform SKU, derived short SKU, then candidate codes extracted
//! from the option text. A line no tier can place ends up `unresolved` —
//! recorded and reported, never dropped.

use crate::extract::extract_candidates;
use crate::model::{
    Attribution, OrderLineItem, RejectedItem, ResolutionMethod, ResolutionResult, SourceType,
};
use crate::normalize::normalize_option_text;
use crate::snapshot::{LookupOutcome, MappingSnapshot};

/// Prefix of the long-form channel item code. The same physical product is
/// addressed both by a short numeric SKU and by this longer code depending on
/// which channel surface emitted the order.
const LONG_FORM_PREFIX: &str = "1000";

/// Total length of the long-form code: the prefix plus a zero-padded suffix.
const LONG_FORM_LEN: usize = 8;

/// Derives the short numeric SKU from a long-form channel code.
///
/// `"10000059"` → `"59"`: strip the fixed prefix, parse the zero-padded
/// suffix as an integer, render it back without leading zeros. Returns `None`
/// when `raw_sku` does not have the long-form shape or the suffix is zero.
#[must_use]
pub fn derive_short_sku(raw_sku: &str) -> Option<String> {
    if raw_sku.len() != LONG_FORM_LEN || !raw_sku.starts_with(LONG_FORM_PREFIX) {
        return None;
    }
    let suffix = &raw_sku[LONG_FORM_PREFIX.len()..];
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = suffix.parse().ok()?;
    if value == 0 {
        return None;
    }
    Some(value.to_string())
}

/// Resolves one line item against the mapping snapshot.
///
/// Pure and side-effect free; results for different items are independent, so
/// callers may fan this out across workers without ordering concerns.
#[must_use]
pub fn resolve_line_item(snapshot: &MappingSnapshot, item: OrderLineItem) -> ResolutionResult {
    let mut conflict_keys: Vec<(SourceType, String)> = Vec::new();

    // Tier 1: direct platform SKU.
    match snapshot.lookup(SourceType::PlatformSku, &item.raw_sku) {
        LookupOutcome::Found(code) => {
            return resolved_single(item, ResolutionMethod::DirectSku, code, conflict_keys);
        }
        LookupOutcome::Conflict => {
            conflict_keys.push((SourceType::PlatformSku, item.raw_sku.clone()));
        }
        LookupOutcome::Missing => {}
    }

    // Tier 2: derived short SKU from the long-form code shape.
    if let Some(derived) = derive_short_sku(&item.raw_sku) {
        match snapshot.lookup(SourceType::DerivedSku, &derived) {
            LookupOutcome::Found(code) => {
                return resolved_single(item, ResolutionMethod::DerivedSku, code, conflict_keys);
            }
            LookupOutcome::Conflict => {
                conflict_keys.push((SourceType::DerivedSku, derived));
            }
            LookupOutcome::Missing => {}
        }
    }

    // Tier 3: candidate codes extracted from the option text.
    if let Some(raw_text) = item.raw_option_text.as_deref() {
        let cleaned = normalize_option_text(raw_text);
        let mut attributions: Vec<Attribution> = Vec::new();

        for candidate in extract_candidates(&cleaned) {
            match snapshot.lookup(SourceType::OptionCode, &candidate) {
                LookupOutcome::Found(code) => {
                    // Candidates resolving to the same code collapse to one
                    // attribution; distinct codes make the line a bundle and
                    // each receives the full line quantity.
                    if !attributions.iter().any(|a| a.canonical_code == code) {
                        attributions.push(Attribution {
                            canonical_code: code.to_string(),
                            quantity: item.quantity,
                        });
                    }
                }
                LookupOutcome::Conflict => {
                    conflict_keys.push((SourceType::OptionCode, candidate));
                }
                LookupOutcome::Missing => {}
            }
        }

        if !attributions.is_empty() {
            return ResolutionResult {
                item,
                method: ResolutionMethod::OptionCode,
                attributions,
                conflict_keys,
            };
        }
    }

    ResolutionResult {
        item,
        method: ResolutionMethod::Unresolved,
        attributions: vec![],
        conflict_keys,
    }
}

fn resolved_single(
    item: OrderLineItem,
    method: ResolutionMethod,
    code: &str,
    conflict_keys: Vec<(SourceType, String)>,
) -> ResolutionResult {
    let quantity = item.quantity;
    ResolutionResult {
        item,
        method,
        attributions: vec![Attribution {
            canonical_code: code.to_string(),
            quantity,
        }],
        conflict_keys,
    }
}

/// Outcome of resolving a whole batch: per-item results plus the malformed
/// items excluded from all downstream effects.
#[derive(Debug, Clone, Default)]
pub struct BatchResolution {
    pub results: Vec<ResolutionResult>,
    pub rejected: Vec<RejectedItem>,
}

/// Validates and resolves every item in the batch. Malformed items land in
/// the rejected bucket; they never abort the remaining items.
#[must_use]
pub fn resolve_batch(
    snapshot: &MappingSnapshot,
    items: impl IntoIterator<Item = OrderLineItem>,
) -> BatchResolution {
    let mut batch = BatchResolution::default();
    for item in items {
        match item.validate() {
            Ok(()) => batch.results.push(resolve_line_item(snapshot, item)),
            Err(reason) => batch.rejected.push(RejectedItem { item, reason }),
        }
    }
    batch
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;

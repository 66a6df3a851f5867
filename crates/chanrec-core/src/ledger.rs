//! In-memory inventory ledger with exactly-once apply semantics.
//!
//! This is the executable model of the durable apply path: the CLI uses it
//! for dry-run planning, and its semantics (atomic check-and-apply per
//! idempotency key, per-code serialization, clamp floor) are the contract the
//! SQL implementation in `chanrec-db` mirrors.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::model::{ResolutionResult, StockDelta};

/// Outcome of applying one stock delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The delta was applied; `clamped` is set when the decrement hit the
    /// stock floor.
    Applied { new_stock: i64, clamped: bool },
    /// The idempotency key was already applied; re-delivery is a no-op
    /// success, not an error.
    AlreadyApplied,
    /// No product exists for the canonical code. Nothing was recorded.
    UnknownCode,
}

struct CodeState {
    stock: i64,
    applied: HashSet<String>,
}

/// Per-canonical-code stock state guarded by per-code locks.
///
/// The code set is fixed at construction; different codes apply in parallel,
/// while the idempotency check and the decrement for one code happen under
/// the same lock so two concurrent re-deliveries of the same line cannot both
/// pass the "not yet applied" check.
pub struct InventoryLedger {
    codes: HashMap<String, Mutex<CodeState>>,
    floor: i64,
    clamp_events: AtomicU64,
}

impl InventoryLedger {
    /// Builds a ledger from `(canonical_code, current_stock)` pairs with the
    /// given clamp floor (0 in the default configuration).
    #[must_use]
    pub fn new(stocks: impl IntoIterator<Item = (String, i64)>, floor: i64) -> Self {
        let codes = stocks
            .into_iter()
            .map(|(code, stock)| {
                (
                    code,
                    Mutex::new(CodeState {
                        stock,
                        applied: HashSet::new(),
                    }),
                )
            })
            .collect();
        Self {
            codes,
            floor,
            clamp_events: AtomicU64::new(0),
        }
    }

    /// Applies one delta exactly once. See [`ApplyOutcome`].
    pub fn apply(&self, delta: &StockDelta) -> ApplyOutcome {
        let Some(slot) = self.codes.get(&delta.canonical_code) else {
            return ApplyOutcome::UnknownCode;
        };

        let mut state = slot.lock().expect("ledger lock poisoned");
        if state.applied.contains(&delta.idempotency_key) {
            return ApplyOutcome::AlreadyApplied;
        }

        let target = state.stock - delta.delta;
        let clamped = target < self.floor;
        state.stock = target.max(self.floor);
        state.applied.insert(delta.idempotency_key.clone());

        if clamped {
            self.clamp_events.fetch_add(1, Ordering::Relaxed);
        }

        ApplyOutcome::Applied {
            new_stock: state.stock,
            clamped,
        }
    }

    /// Applies every delta in order, returning the per-delta outcomes.
    pub fn apply_all(&self, deltas: &[StockDelta]) -> Vec<ApplyOutcome> {
        deltas.iter().map(|d| self.apply(d)).collect()
    }

    /// Number of clamp events observed so far. A clamp signals upstream
    /// resolution error or stock drift, so the count is surfaced in the
    /// diagnostics report rather than ignored.
    #[must_use]
    pub fn clamp_events(&self) -> u64 {
        self.clamp_events.load(Ordering::Relaxed)
    }

    /// Current stock for one code.
    #[must_use]
    pub fn stock(&self, canonical_code: &str) -> Option<i64> {
        self.codes
            .get(canonical_code)
            .map(|slot| slot.lock().expect("ledger lock poisoned").stock)
    }

    /// Snapshot of all stock levels, sorted by code.
    #[must_use]
    pub fn stocks(&self) -> Vec<(String, i64)> {
        let mut out: Vec<(String, i64)> = self
            .codes
            .iter()
            .map(|(code, slot)| {
                (
                    code.clone(),
                    slot.lock().expect("ledger lock poisoned").stock,
                )
            })
            .collect();
        out.sort();
        out
    }
}

/// Expands resolution results into stock delta commands. Unresolved results
/// contribute nothing; bundle results produce one delta per attributed code.
#[must_use]
pub fn plan_deltas(results: &[ResolutionResult]) -> Vec<StockDelta> {
    results.iter().flat_map(ResolutionResult::stock_deltas).collect()
}

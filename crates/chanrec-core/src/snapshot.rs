//! Immutable mapping index used by the resolver.
//!
//! A [`MappingSnapshot`] is built once per run from the curated mapping
//! records and passed by reference into every resolution call. Reloading
//! mappings produces a new snapshot; nothing here is mutated after build, so
//! concurrent resolution workers share it freely.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::model::{IdentifierMapping, SourceType};

/// Result of a typed mapping lookup. A conflicted key is distinguishable from
/// a missing one so diagnostics can report the two separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome<'a> {
    Found(&'a str),
    Conflict,
    Missing,
}

/// A `(source_type, source_value)` key that multiple mapping rows assert
/// different canonical codes for. Resolution fails closed on these keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConflict {
    pub source_type: SourceType,
    pub source_value: String,
    /// Every canonical code asserted for the key, in first-seen order.
    pub canonical_codes: Vec<String>,
}

enum IndexEntry {
    Unique(String),
    Conflicted(Vec<String>),
}

/// Read-only index over curated identifier mappings, keyed per namespace.
pub struct MappingSnapshot {
    namespaces: HashMap<SourceType, HashMap<String, IndexEntry>>,
    conflict_count: usize,
}

impl MappingSnapshot {
    /// Builds the index from a mapping record snapshot.
    ///
    /// Exact-duplicate rows (same key, same canonical code) collapse silently.
    /// Rows asserting different codes for the same key mark that key as
    /// conflicted: it is removed from successful lookup and surfaced via
    /// [`MappingSnapshot::conflicts`].
    #[must_use]
    pub fn build(records: impl IntoIterator<Item = IdentifierMapping>) -> Self {
        let mut namespaces: HashMap<SourceType, HashMap<String, IndexEntry>> = HashMap::new();
        let mut conflict_count = 0;

        for record in records {
            match namespaces
                .entry(record.source_type)
                .or_default()
                .entry(record.source_value)
            {
                Entry::Vacant(slot) => {
                    slot.insert(IndexEntry::Unique(record.canonical_code));
                }
                Entry::Occupied(mut slot) => {
                    let newly_conflicted = match slot.get_mut() {
                        IndexEntry::Unique(existing) => {
                            if *existing == record.canonical_code {
                                None
                            } else {
                                Some(vec![existing.clone(), record.canonical_code])
                            }
                        }
                        IndexEntry::Conflicted(codes) => {
                            if !codes.contains(&record.canonical_code) {
                                codes.push(record.canonical_code);
                            }
                            None
                        }
                    };
                    if let Some(codes) = newly_conflicted {
                        slot.insert(IndexEntry::Conflicted(codes));
                        conflict_count += 1;
                    }
                }
            }
        }

        Self {
            namespaces,
            conflict_count,
        }
    }

    /// Looks up a source identifier in one namespace. Never searches across
    /// namespaces; coincidental collisions between identifier shapes stay
    /// contained in their own source type.
    #[must_use]
    pub fn lookup(&self, source_type: SourceType, value: &str) -> LookupOutcome<'_> {
        match self
            .namespaces
            .get(&source_type)
            .and_then(|ns| ns.get(value))
        {
            Some(IndexEntry::Unique(code)) => LookupOutcome::Found(code),
            Some(IndexEntry::Conflicted(_)) => LookupOutcome::Conflict,
            None => LookupOutcome::Missing,
        }
    }

    /// All conflicted keys with every code asserted for them, sorted by
    /// namespace then value for stable reporting.
    #[must_use]
    pub fn conflicts(&self) -> Vec<MappingConflict> {
        let mut out: Vec<MappingConflict> = self
            .namespaces
            .iter()
            .flat_map(|(source_type, ns)| {
                ns.iter().filter_map(|(source_value, entry)| match entry {
                    IndexEntry::Conflicted(codes) => Some(MappingConflict {
                        source_type: *source_type,
                        source_value: source_value.clone(),
                        canonical_codes: codes.clone(),
                    }),
                    IndexEntry::Unique(_) => None,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            (a.source_type.as_str(), &a.source_value).cmp(&(b.source_type.as_str(), &b.source_value))
        });
        out
    }

    /// Number of conflicted keys in the snapshot.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.conflict_count
    }

    /// Number of indexed keys, conflicted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

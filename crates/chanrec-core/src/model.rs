//! Domain types shared across the reconciliation pipeline.
//!
//! Raw channel data ([`OrderLineItem`]) is read-only to the engine; everything
//! derived from it ([`ResolutionResult`], [`StockDelta`], [`DailyAggregate`])
//! is recomputable from the line items plus the mapping snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A sales channel that produces order line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    SmartStore,
    Coupang,
    Esm,
}

impl Platform {
    /// Stable string form used for DB storage and report labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::SmartStore => "smart_store",
            Platform::Coupang => "coupang",
            Platform::Esm => "esm",
        }
    }

    /// Parses the stable string form produced by [`Platform::as_str`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPlatform`] for any other string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "smart_store" => Ok(Platform::SmartStore),
            "coupang" => Ok(Platform::Coupang),
            "esm" => Ok(Platform::Esm),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sold unit-group from a channel. Never mutated by the engine; the same
/// `(external_order_id, line_item_id)` pair may be re-delivered at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub platform: Platform,
    pub external_order_id: String,
    pub line_item_id: String,
    /// Channel-assigned SKU (namespace A). Numeric for most channels but
    /// stored as a string; leading zeros and non-numeric codes occur.
    pub raw_sku: String,
    /// Free-text option/variant field (namespace B). May be absent, empty,
    /// or mojibake; candidate codes are extracted from it.
    pub raw_option_text: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Timestamp used for daily bucketing.
    pub observed_at: DateTime<Utc>,
}

impl OrderLineItem {
    /// Source-of-truth identity for idempotency, `(external_order_id, line_item_id)`.
    #[must_use]
    pub fn line_ref(&self) -> (&str, &str) {
        (&self.external_order_id, &self.line_item_id)
    }

    /// Checks item-level validity. Malformed items are rejected individually
    /// and never abort the surrounding batch.
    pub fn validate(&self) -> Result<(), RejectReason> {
        if self.external_order_id.trim().is_empty() {
            return Err(RejectReason::MissingOrderId);
        }
        if self.line_item_id.trim().is_empty() {
            return Err(RejectReason::MissingLineItemId);
        }
        if self.quantity <= 0 {
            return Err(RejectReason::NonPositiveQuantity);
        }
        if self.unit_price.is_sign_negative() {
            return Err(RejectReason::NegativeUnitPrice);
        }
        Ok(())
    }
}

/// Why a line item was excluded from inventory and aggregate effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingOrderId,
    MissingLineItemId,
    NonPositiveQuantity,
    NegativeUnitPrice,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::MissingOrderId => "missing external_order_id",
            RejectReason::MissingLineItemId => "missing line_item_id",
            RejectReason::NonPositiveQuantity => "non-positive quantity",
            RejectReason::NegativeUnitPrice => "negative unit_price",
        };
        f.write_str(s)
    }
}

/// A malformed line item together with the reason it was rejected.
#[derive(Debug, Clone)]
pub struct RejectedItem {
    pub item: OrderLineItem,
    pub reason: RejectReason,
}

/// Identifier namespace a mapping row belongs to. Lookups are always tagged
/// with a source type; there is no untyped cross-namespace search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    PlatformSku,
    DerivedSku,
    OptionCode,
    CatalogCode,
    MarketplaceAsin,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::PlatformSku => "platform_sku",
            SourceType::DerivedSku => "derived_sku",
            SourceType::OptionCode => "option_code",
            SourceType::CatalogCode => "catalog_code",
            SourceType::MarketplaceAsin => "marketplace_asin",
        }
    }

    /// Parses the stable string form produced by [`SourceType::as_str`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSourceType`] for any other string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "platform_sku" => Ok(SourceType::PlatformSku),
            "derived_sku" => Ok(SourceType::DerivedSku),
            "option_code" => Ok(SourceType::OptionCode),
            "catalog_code" => Ok(SourceType::CatalogCode),
            "marketplace_asin" => Ok(SourceType::MarketplaceAsin),
            other => Err(CoreError::UnknownSourceType(other.to_string())),
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A curated association from a source identifier to a canonical product code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierMapping {
    pub source_type: SourceType,
    pub source_value: String,
    pub canonical_code: String,
    /// Human label; not authoritative for resolution.
    pub display_name: Option<String>,
}

/// The unit of inventory and reporting truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub canonical_code: String,
    pub display_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
}

/// Which tier of the resolver produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    DirectSku,
    DerivedSku,
    OptionCode,
    Unresolved,
}

impl ResolutionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionMethod::DirectSku => "direct_sku",
            ResolutionMethod::DerivedSku => "derived_sku",
            ResolutionMethod::OptionCode => "option_code",
            ResolutionMethod::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity attributed to one canonical code by a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub canonical_code: String,
    pub quantity: i32,
}

/// Outcome of resolving one line item. Derived data: recomputable at any time
/// from the line item and a mapping snapshot.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub item: OrderLineItem,
    pub method: ResolutionMethod,
    /// Zero, one, or more attributions in first-resolved order. Empty means
    /// unresolved; more than one means the line is a bundle and each code
    /// receives the full line quantity.
    pub attributions: Vec<Attribution>,
    /// Mapping keys that were hit during resolution but are conflicted in the
    /// snapshot. A conflicted key behaves as a miss but is reported distinctly.
    pub conflict_keys: Vec<(SourceType, String)>,
}

impl ResolutionResult {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.attributions.is_empty()
    }

    /// Expands this result into stock delta commands, one per attribution.
    /// Unresolved results produce none.
    #[must_use]
    pub fn stock_deltas(&self) -> Vec<StockDelta> {
        self.attributions
            .iter()
            .map(|a| StockDelta {
                canonical_code: a.canonical_code.clone(),
                delta: i64::from(a.quantity),
                idempotency_key: idempotency_key(&self.item, &a.canonical_code),
            })
            .collect()
    }
}

/// A stock decrement command handed to the inventory collaborator. Applying
/// the same `idempotency_key` twice must be a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub canonical_code: String,
    pub delta: i64,
    pub idempotency_key: String,
}

/// Builds the durable idempotency key for one `(line item, canonical code)`
/// application. Stable across resync runs by construction.
///
/// Order and line ids are free-form channel strings, so each variable
/// component is escaped before joining; two distinct `(order, line, code)`
/// triples can never flatten to the same key.
#[must_use]
pub fn idempotency_key(item: &OrderLineItem, canonical_code: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        item.platform,
        escape_key_part(&item.external_order_id),
        escape_key_part(&item.line_item_id),
        escape_key_part(canonical_code)
    )
}

fn escape_key_part(part: &str) -> String {
    part.replace('\\', "\\\\").replace(':', "\\:")
}

/// One fully-derived daily sales row for `(date, platform, canonical_code)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub platform: Platform,
    pub canonical_code: String,
    pub units: i64,
    pub gross_amount: Decimal,
}

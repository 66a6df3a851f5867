//! Curated mapping file (YAML) loading and validation.
//!
//! The file is the operator-maintained source for identifier mappings and
//! canonical products. Contradictory mapping rows are NOT a load error; they
//! surface as conflicts when the snapshot is built, so the pipeline can run
//! and report them instead of refusing to start.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{CanonicalProduct, IdentifierMapping};
use crate::ConfigError;

/// On-disk shape of one mapping row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRow {
    pub source_type: String,
    pub source_value: String,
    pub canonical_code: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// On-disk shape of one canonical product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub canonical_code: String,
    pub display_name: String,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub minimum_stock: i64,
}

/// Parsed mappings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingsFile {
    #[serde(default)]
    pub products: Vec<ProductRow>,
    #[serde(default)]
    pub mappings: Vec<MappingRow>,
}

impl MappingsFile {
    /// Reads and parses the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MappingsFileIo` if the file cannot be read and
    /// `ConfigError::MappingsFileParse` if it is not valid YAML, then
    /// `ConfigError::Validation` for structurally invalid rows.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::MappingsFileIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file: Self =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::MappingsFileParse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        file.validate()?;
        Ok(file)
    }

    /// Structural validation: known source types, non-blank keys and codes,
    /// products referenced by mappings must exist. Contradictory rows (same
    /// key, different code) pass validation by design of the conflict path.
    fn validate(&self) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        let mut codes: HashSet<&str> = HashSet::new();
        for product in &self.products {
            if product.canonical_code.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "product with blank canonical_code".to_string(),
                ));
            }
            if !codes.insert(product.canonical_code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate product canonical_code: {}",
                    product.canonical_code
                )));
            }
        }

        for row in &self.mappings {
            crate::model::SourceType::parse(&row.source_type).map_err(|_| {
                ConfigError::Validation(format!(
                    "mapping ({}, {}): unknown source_type",
                    row.source_type, row.source_value
                ))
            })?;
            if row.source_value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "mapping with blank source_value for {}",
                    row.canonical_code
                )));
            }
            if !codes.contains(row.canonical_code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "mapping ({}, {}) references unknown product {}",
                    row.source_type, row.source_value, row.canonical_code
                )));
            }
        }

        Ok(())
    }

    /// Converts parsed rows into domain mappings. Call after [`MappingsFile::load`],
    /// which has already checked that every `source_type` parses.
    #[must_use]
    pub fn identifier_mappings(&self) -> Vec<IdentifierMapping> {
        self.mappings
            .iter()
            .filter_map(|row| {
                let source_type = crate::model::SourceType::parse(&row.source_type).ok()?;
                Some(IdentifierMapping {
                    source_type,
                    source_value: row.source_value.clone(),
                    canonical_code: row.canonical_code.clone(),
                    display_name: row.display_name.clone(),
                })
            })
            .collect()
    }

    /// Converts parsed rows into canonical products.
    #[must_use]
    pub fn canonical_products(&self) -> Vec<CanonicalProduct> {
        self.products
            .iter()
            .map(|row| CanonicalProduct {
                canonical_code: row.canonical_code.clone(),
                display_name: row.display_name.clone(),
                current_stock: row.current_stock,
                minimum_stock: row.minimum_stock,
            })
            .collect()
    }
}

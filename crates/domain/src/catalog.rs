//! Static product catalog, loaded once from a bundled JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One catalog entry. Enrichment from the wholesaler overlays fields onto a
/// copy at render time; the catalog itself never changes after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "kategorie", default)]
    pub category: String,
    #[serde(rename = "preis", default)]
    pub price: f64,
    #[serde(default)]
    pub ean: Option<String>,
}

/// Errors loading the catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog from already-parsed entries.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Loads the catalog from a JSON file containing an array of entries.
    ///
    /// A missing file yields an empty catalog rather than an error, matching
    /// the storefront's behavior of rendering an empty shop.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)?;
        Ok(Self { entries })
    }

    /// Looks up an entry by its catalog id.
    pub fn get(&self, id: i64) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns all entries.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Returns all entries in the given category, preserving file order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CatalogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }
}

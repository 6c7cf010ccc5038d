//! TAC registry - maps allocation codes to known device models
//!
//! The registry is a read-only TOML table loaded once at startup. Exact
//! 8-digit TAC matches are served from a prebuilt index; when no exact
//! entry exists, a relaxed 6-digit prefix scan is tried as a fallback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::descriptor::DeviceDescriptor;
use crate::imei::{Imei, TAC_LENGTH};

/// TAC table shipped with the crate; the single authoritative copy
const BUILTIN_TABLE: &str = include_str!("../data/tac.toml");

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read TAC table: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse TAC table: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid TAC {0:?}: must be {TAC_LENGTH} decimal digits")]
    InvalidTac(String),
    #[error("duplicate TAC {0:?} in table")]
    DuplicateTac(String),
}

/// One allocation-code entry in the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacEntry {
    /// 8-digit type allocation code
    pub tac: String,
    pub brand: String,
    pub model: String,
    /// Storage variants sold under this TAC
    #[serde(default)]
    pub storage: Vec<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub chipset: Option<String>,
    /// Screen diagonal in inches
    #[serde(default)]
    pub screen: Option<f32>,
}

impl TacEntry {
    /// Materialize a device descriptor from this entry
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            manufacturer: self.brand.clone(),
            model: self.model.clone(),
            storage: self.storage.clone(),
            color: None,
            os_family: self.os.clone(),
            release_year: self.year,
            screen_inches: self.screen,
            chipset: self.chipset.clone(),
            sim_lock: None,
            warranty: None,
            blacklist: None,
            activation_lock: None,
        }
    }
}

/// On-disk table shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TacTable {
    #[serde(default, rename = "entry")]
    entries: Vec<TacEntry>,
}

/// The in-memory allocation-code registry
///
/// Built once, then read-only; lookups take `&self` and are safe from any
/// number of concurrent tasks.
#[derive(Debug, Clone)]
pub struct TacRegistry {
    entries: Vec<TacEntry>,
    /// Exact 8-digit TAC -> entry position
    exact: HashMap<String, usize>,
}

impl TacRegistry {
    /// Build the registry from the table shipped with the crate
    pub fn builtin() -> Self {
        // The embedded table is validated by tests; a parse failure here
        // is a build defect, not a runtime condition.
        Self::from_toml(BUILTIN_TABLE).expect("embedded TAC table is valid")
    }

    /// Load a registry from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        let table: TacTable = toml::from_str(content)?;
        Self::from_entries(table.entries)
    }

    /// Load a registry from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build a registry from entries, validating TAC format and uniqueness
    pub fn from_entries(entries: Vec<TacEntry>) -> Result<Self, RegistryError> {
        let mut exact = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.tac.len() != TAC_LENGTH || !entry.tac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RegistryError::InvalidTac(entry.tac.clone()));
            }
            if exact.insert(entry.tac.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateTac(entry.tac.clone()));
            }
        }
        debug!(entries = entries.len(), "TAC registry loaded");
        Ok(Self { entries, exact })
    }

    /// Look up the entry for an identifier
    ///
    /// The exact 8-digit TAC always takes precedence. The 6-digit fallback
    /// is best effort and intentionally coarse: multiple models can share
    /// a 6-digit prefix, and the first entry in table order wins.
    pub fn lookup(&self, imei: &Imei) -> Option<&TacEntry> {
        if let Some(&pos) = self.exact.get(imei.tac()) {
            return Some(&self.entries[pos]);
        }

        let prefix = imei.short_prefix();
        self.entries.iter().find(|e| e.tac.starts_with(prefix))
    }

    /// Number of entries in the registry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imei::with_check_digit;

    fn imei_for_tac(tac: &str) -> Imei {
        Imei::parse(&with_check_digit(&format!("{tac}123456"))).unwrap()
    }

    #[test]
    fn test_builtin_table_loads() {
        let registry = TacRegistry::builtin();
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_builtin_contains_expected_entry() {
        let registry = TacRegistry::builtin();
        let entry = registry.lookup(&imei_for_tac("01194800")).unwrap();
        assert_eq!(entry.brand, "Apple");
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let toml = r#"
[[entry]]
tac = "35209401"
brand = "BrandPrefix"
model = "Prefix Model"

[[entry]]
tac = "35209406"
brand = "BrandExact"
model = "Exact Model"
"#;
        let registry = TacRegistry::from_toml(toml).unwrap();

        // Exact TAC present: the prefix entry earlier in the table must not win
        let entry = registry.lookup(&imei_for_tac("35209406")).unwrap();
        assert_eq!(entry.brand, "BrandExact");
    }

    #[test]
    fn test_prefix_fallback_first_inserted_wins() {
        let toml = r#"
[[entry]]
tac = "35209401"
brand = "First"
model = "Model A"

[[entry]]
tac = "35209402"
brand = "Second"
model = "Model B"
"#;
        let registry = TacRegistry::from_toml(toml).unwrap();

        // No exact entry for 35209499; both entries share the 352094 prefix
        let entry = registry.lookup(&imei_for_tac("35209499")).unwrap();
        assert_eq!(entry.brand, "First");
    }

    #[test]
    fn test_no_match() {
        let registry = TacRegistry::builtin();
        assert!(registry.lookup(&imei_for_tac("99999998")).is_none());
    }

    #[test]
    fn test_duplicate_tac_rejected() {
        let toml = r#"
[[entry]]
tac = "35209406"
brand = "A"
model = "M"

[[entry]]
tac = "35209406"
brand = "B"
model = "N"
"#;
        assert!(matches!(
            TacRegistry::from_toml(toml).unwrap_err(),
            RegistryError::DuplicateTac(_)
        ));
    }

    #[test]
    fn test_invalid_tac_rejected() {
        let toml = r#"
[[entry]]
tac = "3520940"
brand = "A"
model = "M"
"#;
        assert!(matches!(
            TacRegistry::from_toml(toml).unwrap_err(),
            RegistryError::InvalidTac(_)
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tac.toml");
        std::fs::write(
            &path,
            r#"
[[entry]]
tac = "86071705"
brand = "Huawei"
model = "P30 Pro"
storage = ["128 GB", "256 GB"]
os = "Android"
year = 2019
"#,
        )
        .unwrap();

        let registry = TacRegistry::from_file(&path).unwrap();
        let entry = registry.lookup(&imei_for_tac("86071705")).unwrap();
        assert_eq!(entry.model, "P30 Pro");
        assert_eq!(entry.storage.len(), 2);

        let descriptor = entry.descriptor();
        assert_eq!(descriptor.manufacturer, "Huawei");
        assert_eq!(descriptor.release_year, Some(2019));
        assert!(descriptor.sim_lock.is_none());
    }
}

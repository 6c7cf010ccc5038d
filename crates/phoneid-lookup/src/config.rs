//! Lookup configuration loading
//!
//! Provider endpoints, credentials, timeouts, and ordering come from a
//! TOML file; credentials can also be supplied through the environment
//! (`PHONEID_<NAME>_API_KEY`), which overrides the file. Nothing here is
//! hard-coded into the adapters: a provider with no usable credential is
//! simply skipped during resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::http::HttpProvider;
use crate::provider::ProviderAdapter;
use crate::schema::schema_by_name;

/// Top-level lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Overall wall-clock budget for the whole provider phase, in
    /// milliseconds; absent means no global bound beyond the per-provider
    /// timeouts
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Providers in priority order
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderSettings>,
}

/// One provider's configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Schema name: `ifree`, `imeidata`, or `dhru`
    pub name: String,
    pub base_url: String,
    /// Credential; overridden by `PHONEID_<NAME>_API_KEY` when set
    #[serde(default)]
    pub api_key: String,
    /// Provider-specific service code
    #[serde(default)]
    pub service: Option<String>,
    /// Provider-specific response format selector
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_timeout_ms() -> u64 {
    8000
}

fn default_true() -> bool {
    true
}

impl ProviderSettings {
    /// Effective credential: environment override first, then the file
    pub fn credential(&self) -> String {
        let var = format!("PHONEID_{}_API_KEY", self.name.to_uppercase());
        match std::env::var(&var) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => self.api_key.clone(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            deadline_ms: None,
            providers: Vec::new(),
        }
    }
}

impl LookupConfig {
    /// Load configuration from a TOML file, or defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(path = %path.display(), providers = config.providers.len(), "Loaded lookup configuration");
            Ok(config)
        } else {
            info!(path = %path.display(), "Lookup configuration not found, no providers configured");
            Ok(Self::default())
        }
    }

    /// Build the prioritized adapter list
    ///
    /// Disabled entries and entries naming an unknown schema are dropped
    /// (the latter with a warning); order otherwise follows the file.
    /// Adapters without a credential are still built - the resolver skips
    /// them per call, so a credential appearing in the environment later
    /// does not require a reload.
    pub fn adapters(&self) -> Vec<Box<dyn ProviderAdapter>> {
        let mut adapters: Vec<Box<dyn ProviderAdapter>> = Vec::new();
        for settings in &self.providers {
            if !settings.enabled {
                continue;
            }
            let Some(schema) = schema_by_name(&settings.name) else {
                warn!(provider = %settings.name, "Unknown provider schema, skipping");
                continue;
            };
            match HttpProvider::new(
                schema,
                settings.base_url.clone(),
                settings.credential(),
                settings.service.clone(),
                settings.format.clone(),
            ) {
                Ok(adapter) => adapters.push(Box::new(adapter)),
                Err(e) => warn!(provider = %settings.name, error = %e, "Failed to build adapter"),
            }
        }
        adapters
    }

    /// Per-provider timeouts in adapter order, for the resolver
    pub fn timeouts_ms(&self) -> Vec<u64> {
        self.providers
            .iter()
            .filter(|p| p.enabled && schema_by_name(&p.name).is_some())
            .map(|p| p.timeout_ms)
            .collect()
    }
}

/// Write a commented starter configuration
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = LookupConfig {
        deadline_ms: Some(20_000),
        providers: vec![
            ProviderSettings {
                name: "ifree".to_string(),
                base_url: "https://api.ifreecheck.example/v1/check".to_string(),
                api_key: String::new(),
                service: None,
                format: None,
                timeout_ms: 8000,
                enabled: true,
            },
            ProviderSettings {
                name: "imeidata".to_string(),
                base_url: "https://imeidata.example/api/lookup".to_string(),
                api_key: String::new(),
                service: None,
                format: None,
                timeout_ms: 8000,
                enabled: true,
            },
            ProviderSettings {
                name: "dhru".to_string(),
                base_url: "https://fusion.dhru.example/api/index.php".to_string(),
                api_key: String::new(),
                service: None,
                format: None,
                timeout_ms: 10_000,
                enabled: true,
            },
        ],
    };
    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
deadline_ms = 15000

[[provider]]
name = "ifree"
base_url = "https://a.example/check"
api_key = "abc"
timeout_ms = 5000

[[provider]]
name = "dhru"
base_url = "https://c.example/api"
enabled = false
"#;
        let config: LookupConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.deadline_ms, Some(15000));
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].timeout_ms, 5000);
        assert!(config.providers[0].enabled);
        assert!(!config.providers[1].enabled);

        // Disabled providers never become adapters
        let adapters = config.adapters();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].name(), "ifree");
        assert_eq!(config.timeouts_ms(), vec![5000]);
    }

    #[test]
    fn test_unknown_schema_skipped() {
        let toml = r#"
[[provider]]
name = "mystery"
base_url = "https://x.example"
api_key = "k"
"#;
        let config: LookupConfig = toml::from_str(toml).unwrap();
        assert!(config.adapters().is_empty());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LookupConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.providers.is_empty());
        assert!(config.deadline_ms.is_none());
    }

    #[test]
    fn test_save_and_reload_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phoneid.toml");
        save_default_config(&path).unwrap();

        let config = LookupConfig::load(&path).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0].name, "ifree");
        assert_eq!(config.providers[2].name, "dhru");
    }

    #[test]
    fn test_env_credential_override() {
        let settings = ProviderSettings {
            name: "ifree".to_string(),
            base_url: "https://a.example".to_string(),
            api_key: "from-file".to_string(),
            service: None,
            format: None,
            timeout_ms: 8000,
            enabled: true,
        };
        // No env var set: file value wins
        std::env::remove_var("PHONEID_IFREE_API_KEY");
        assert_eq!(settings.credential(), "from-file");

        std::env::set_var("PHONEID_IFREE_API_KEY", "from-env");
        assert_eq!(settings.credential(), "from-env");
        std::env::remove_var("PHONEID_IFREE_API_KEY");
    }
}

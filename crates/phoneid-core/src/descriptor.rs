//! Device profile and resolution result types

use serde::{Deserialize, Serialize};

/// A normalized device profile
///
/// Built from exactly one of: the TAC registry, a lookup provider, or the
/// synthesizer. Fields a source does not know stay `None`/empty; they are
/// never filled with guessed values by the source that produced the
/// descriptor (the synthesizer is the one deliberate exception, and its
/// output is always tagged as synthetic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Manufacturer name, or "Unknown" when no source could identify it
    pub manufacturer: String,
    /// Marketing model name
    pub model: String,
    /// Storage variants; a single entry when the actual unit is known
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// OS family, e.g. "iOS" or "Android"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    /// Screen diagonal in inches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_inches: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chipset: Option<String>,
    /// Carrier SIM-lock status, e.g. "unlocked" / "locked"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_lock: Option<String>,
    /// Warranty status, e.g. "active" / "expired"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
    /// Blacklist status, e.g. "clean" / "blacklisted"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<String>,
    /// Activation-lock status as reported by a provider, e.g. "on" / "off"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_lock: Option<String>,
}

impl DeviceDescriptor {
    /// Minimal descriptor carrying only identity fields
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            storage: Vec::new(),
            color: None,
            os_family: None,
            release_year: None,
            screen_inches: None,
            chipset: None,
            sim_lock: None,
            warranty: None,
            blacklist: None,
            activation_lock: None,
        }
    }
}

/// Where a resolution answer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Local TAC registry hit
    Registry,
    /// External lookup provider, by adapter name
    Provider(String),
    /// Deterministic synthesis; plausible but unverified
    Synthetic,
    /// Validation failure; no descriptor
    Rejected,
}

impl ResolutionSource {
    /// The wire tag: `registry` | `provider:<name>` | `synthetic` | `rejected`
    pub fn tag(&self) -> String {
        match self {
            Self::Registry => "registry".to_string(),
            Self::Provider(name) => format!("provider:{name}"),
            Self::Synthetic => "synthetic".to_string(),
            Self::Rejected => "rejected".to_string(),
        }
    }
}

impl Serialize for ResolutionSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for ResolutionSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "registry" => Self::Registry,
            "synthetic" => Self::Synthetic,
            "rejected" => Self::Rejected,
            other => match other.strip_prefix("provider:") {
                Some(name) => Self::Provider(name.to_string()),
                None => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown resolution source {other:?}"
                    )))
                }
            },
        })
    }
}

/// Outcome of one resolution request
///
/// `descriptor` is absent exactly when the ID was rejected; `error_reason`
/// is present exactly then. A synthetic answer is a success at this level;
/// downstream consumers distinguish it by the source tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub success: bool,
    pub source: ResolutionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<DeviceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl ResolutionResult {
    pub fn resolved(source: ResolutionSource, descriptor: DeviceDescriptor) -> Self {
        Self {
            success: true,
            source,
            descriptor: Some(descriptor),
            error_reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            source: ResolutionSource::Rejected,
            descriptor: None,
            error_reason: Some(reason.into()),
        }
    }
}

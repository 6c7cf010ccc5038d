//! Per-provider response schemas and normalization
//!
//! Providers answer the same question in incompatible JSON dialects:
//! `brand`/`device_model`/`model`, `icloud`/`icloud_status`/
//! `find_my_iphone`, status values `"success"` vs `"ok"`, or a single
//! free-text `result` blob. Each dialect is described by a
//! [`ProviderSchema`] value - adding a provider means adding a schema,
//! not new branching in the query path.

use serde_json::Value;
use tracing::trace;

use crate::provider::{ProviderError, ProviderResponse};

/// Declarative description of one provider's response dialect
#[derive(Debug, Clone, Copy)]
pub struct ProviderSchema {
    pub name: &'static str,
    /// Default query parameter value for `service=`
    pub default_service: &'static str,
    /// Default query parameter value for `format=`
    pub default_format: &'static str,
    /// Key holding the success/failure status
    pub status_key: &'static str,
    /// Status values that count as success
    pub success_values: &'static [&'static str],
    /// Keys that may carry an error message on failure
    pub error_keys: &'static [&'static str],
    pub brand_keys: &'static [&'static str],
    pub model_keys: &'static [&'static str],
    pub storage_keys: &'static [&'static str],
    pub lock_keys: &'static [&'static str],
    pub warranty_keys: &'static [&'static str],
    pub activation_keys: &'static [&'static str],
    /// When set, device fields live in `Key: Value` lines inside this
    /// free-text field instead of dedicated JSON keys
    pub free_text_key: Option<&'static str>,
}

/// Provider A dialect: flat JSON fields, `status == "success"`
pub const IFREE: ProviderSchema = ProviderSchema {
    name: "ifree",
    default_service: "0",
    default_format: "json",
    status_key: "status",
    success_values: &["success"],
    error_keys: &["error", "message"],
    brand_keys: &["brand"],
    model_keys: &["model", "device_model"],
    storage_keys: &["storage", "memory"],
    lock_keys: &["icloud_status", "icloud"],
    warranty_keys: &["warranty", "warranty_status"],
    activation_keys: &["activation_status", "activated"],
    free_text_key: None,
};

/// Provider B dialect: flat JSON fields, `status` may be `"success"` or
/// `"ok"`, lock status under `icloud`/`find_my_iphone`
pub const IMEIDATA: ProviderSchema = ProviderSchema {
    name: "imeidata",
    default_service: "basic",
    default_format: "json",
    status_key: "status",
    success_values: &["success", "ok"],
    error_keys: &["message", "error"],
    brand_keys: &["brand"],
    model_keys: &["model", "device_model"],
    storage_keys: &["capacity", "storage"],
    lock_keys: &["icloud", "find_my_iphone"],
    warranty_keys: &["warranty"],
    activation_keys: &["activation", "activation_status"],
    free_text_key: None,
};

/// Provider C dialect: everything in a free-text `result` blob of
/// `Key: Value` lines separated by `<br>` or newlines
pub const DHRU: ProviderSchema = ProviderSchema {
    name: "dhru",
    default_service: "1",
    default_format: "beta",
    status_key: "status",
    success_values: &["success"],
    error_keys: &["result", "message"],
    brand_keys: &[],
    model_keys: &[],
    storage_keys: &[],
    lock_keys: &[],
    warranty_keys: &[],
    activation_keys: &[],
    free_text_key: Some("result"),
};

/// All shipped schemas, by adapter name
pub const SCHEMAS: &[&ProviderSchema] = &[&IFREE, &IMEIDATA, &DHRU];

/// Look up a shipped schema by name
pub fn schema_by_name(name: &str) -> Option<&'static ProviderSchema> {
    SCHEMAS.iter().find(|s| s.name == name).copied()
}

/// Normalize a raw provider payload against its schema
///
/// Classification rules, in order:
/// - payload is not a JSON object (HTML error pages parsed into a bare
///   string, arrays, null) => `Malformed`
/// - status key missing or not a success value => `Logical` with the
///   provider's own error message where one exists
/// - success status but no identifying field after extraction =>
///   `Malformed` (an auth wall or empty stub, not a device answer)
pub fn normalize(
    schema: &ProviderSchema,
    payload: Value,
) -> Result<ProviderResponse, ProviderError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ProviderError::Malformed("payload is not a JSON object".to_string()))?;

    let status = obj.get(schema.status_key).and_then(value_as_string);
    let ok = status
        .as_deref()
        .map(|s| {
            schema
                .success_values
                .iter()
                .any(|v| s.eq_ignore_ascii_case(v))
        })
        .unwrap_or(false);
    if !ok {
        let message = first_string(obj, schema.error_keys)
            .or(status)
            .unwrap_or_else(|| format!("no {} field in response", schema.status_key));
        return Err(ProviderError::Logical(message));
    }

    let mut response = match schema.free_text_key {
        Some(key) => {
            let text = obj.get(key).and_then(value_as_string).ok_or_else(|| {
                ProviderError::Malformed(format!("missing free-text {key} field"))
            })?;
            parse_free_text(&text)
        }
        None => ProviderResponse {
            brand: first_string(obj, schema.brand_keys),
            model: first_string(obj, schema.model_keys),
            storage: first_string(obj, schema.storage_keys),
            lock_status: first_string(obj, schema.lock_keys).map(|s| s.to_lowercase()),
            warranty: first_string(obj, schema.warranty_keys).map(|s| s.to_lowercase()),
            activation_status: first_string(obj, schema.activation_keys)
                .map(|s| s.to_lowercase()),
            raw: None,
        },
    };

    if !response.has_identity() {
        return Err(ProviderError::Malformed(
            "success status but no identifying field".to_string(),
        ));
    }

    trace!(provider = schema.name, model = ?response.model, "Normalized provider response");
    response.raw = Some(payload);
    Ok(response)
}

/// Extract fields from a `Key: Value` free-text blob
///
/// Lines are separated by `<br>` tags or newlines; unrecognized lines are
/// ignored rather than failing the whole response.
fn parse_free_text(text: &str) -> ProviderResponse {
    let mut response = ProviderResponse::default();

    let cleaned = text
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");

    for line in cleaned.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if key.contains("brand") || key.contains("manufacturer") {
            response.brand.get_or_insert_with(|| value.to_string());
        } else if key.contains("model") || key == "device" || key.contains("description") {
            response.model.get_or_insert_with(|| value.to_string());
        } else if key.contains("storage") || key.contains("capacity") || key.contains("memory") {
            response.storage.get_or_insert_with(|| value.to_string());
        } else if key.contains("find my") || key.contains("fmi") || key.contains("icloud") {
            response
                .lock_status
                .get_or_insert_with(|| value.to_lowercase());
        } else if key.contains("warranty") {
            response
                .warranty
                .get_or_insert_with(|| value.to_lowercase());
        } else if key.contains("activation") || key.contains("activated") {
            response
                .activation_status
                .get_or_insert_with(|| value.to_lowercase());
        }
    }

    response
}

/// First non-empty string-ish value among candidate keys, in order
fn first_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(value_as_string))
        .find(|s| !s.is_empty())
}

/// Render scalars as strings; objects/arrays/null are not field values
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(if *b { "on" } else { "off" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

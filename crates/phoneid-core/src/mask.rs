//! Identifier redaction for logs and diagnostics
//!
//! Every component masks an IMEI before writing it anywhere a human or a
//! log shipper might see it. The TAC stays visible (it identifies a model
//! family, not a device); the serial middle is redacted.

/// Returned for input that is not a well-formed 15-digit identifier
pub const MASK_SENTINEL: &str = "<invalid-id>";

/// First masked digit position (0-indexed)
const MASK_START: usize = 7;

/// One past the last masked digit position
const MASK_END: usize = 12;

/// Redact digits 7-11 of a 15-digit identifier
///
/// Anything that is not exactly 15 decimal digits yields
/// [`MASK_SENTINEL`] rather than a partially masked fragment.
pub fn mask(raw: &str) -> String {
    if raw.len() != crate::imei::IMEI_LENGTH || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return MASK_SENTINEL.to_string();
    }
    format!("{}*****{}", &raw[..MASK_START], &raw[MASK_END..])
}

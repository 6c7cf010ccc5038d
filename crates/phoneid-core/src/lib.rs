//! phoneid Core - IMEI validation, TAC registry, and profile synthesis
//!
//! This crate provides the pure, no-I/O building blocks of the phoneid
//! engine:
//! - IMEI parsing with Luhn check-digit validation
//! - Identifier masking for logs and diagnostics
//! - Device descriptor and resolution result types
//! - The read-only TAC registry mapping allocation codes to known models
//! - Deterministic profile synthesis for identifiers no source can verify

pub mod descriptor;
pub mod imei;
pub mod mask;
pub mod registry;
pub mod synth;

pub use descriptor::{DeviceDescriptor, ResolutionResult, ResolutionSource};
pub use imei::{Imei, ImeiError};
pub use mask::mask;
pub use registry::{RegistryError, TacEntry, TacRegistry};
pub use synth::synthesize;

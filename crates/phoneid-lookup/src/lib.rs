//! phoneid Lookup - provider adapters and the resolution orchestrator
//!
//! This crate carries the I/O half of the phoneid engine:
//! - The [`ProviderAdapter`] seam and its failure taxonomy
//! - Schema-driven normalization of heterogeneous provider responses
//! - A generic HTTP adapter parameterized by provider schema
//! - Lookup configuration (TOML + environment credential overrides)
//! - The [`Resolver`] cascade: validate, registry, providers, synthesize

pub mod config;
pub mod http;
pub mod provider;
pub mod resolver;
pub mod schema;

pub use config::{save_default_config, LookupConfig, ProviderSettings};
pub use http::HttpProvider;
pub use provider::{ProviderAdapter, ProviderError, ProviderResponse};
pub use resolver::Resolver;
pub use schema::{ProviderSchema, DHRU, IFREE, IMEIDATA};

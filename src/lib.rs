//! # Access Info Library
//!
//! Normalises identity service authentication responses, in either the V2
//! (`access` envelope) or V3 (`token` envelope) format, into one access info
//! contract that callers query the same way regardless of the format.
//!
//! Modules:
//! - `access` — the contract, raw payload wrapper, V2/V3 adapters and factory
//! - `catalog` — service catalog built from the token payload
//! - `config` — settings and their YAML loader
//! - `helpers` — time source and timestamp parsing
//! - `utils` — logging setup

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod helpers;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::access::factory::{create, from_response, AuthResponse, SUBJECT_TOKEN_HEADER};
pub use crate::access::v2::AccessInfoV2;
pub use crate::access::v3::AccessInfoV3;
pub use crate::access::{AccessInfo, RawToken, STALE_TOKEN_DURATION_SECONDS};
pub use crate::catalog::{EndpointData, EndpointFilter, ServiceCatalog};
pub use crate::error::{AccessError, Result};

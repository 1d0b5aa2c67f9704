//! lansniff-core: Shared types, configuration loading, and error handling for lansniff.
//!
//! This crate provides the foundational pieces used by the discovery pipeline:
//! - Address types (`MacAddress`, `AddressRange`)
//! - Device records for each phase of a scan (`DiscoveredDevice`, `ResolvedDevice`)
//! - Hostname resolution outcomes
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{
    AddressRange, DiscoveredDevice, MacAddress, ResolutionOutcome, ResolutionStrategy,
    ResolvedDevice, UNKNOWN,
};

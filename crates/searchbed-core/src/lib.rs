//! Core types and collaborator seams for the searchbed harness
//!
//! This crate provides:
//! - The error taxonomy and retry classification (`HarnessError`, `FailureClass`)
//! - The fixture document model (`Document`, `FixtureSet`)
//! - Version comparison and declarative skip rules (`Comparator`, `VersionRule`)
//! - The backend collaborator traits (`ManagerHandle`, `ManagerResolver`)
//! - Environment-driven configuration (`HarnessConfig`)

#![forbid(unsafe_code)]

pub mod config;
pub mod document;
pub mod error;
pub mod manager;
pub mod version;

// Re-export key types for convenience
pub use config::HarnessConfig;
pub use document::{Document, DocumentsByType, FixtureSet, ID_FIELD, document_count};
pub use error::{FailureClass, HarnessError, HarnessResult};
pub use manager::{
    MANAGER_SERVICE_PREFIX, ManagerHandle, ManagerResolver, MapResolver, service_name,
};
pub use version::{Comparator, VersionRule, compare, parse_version};

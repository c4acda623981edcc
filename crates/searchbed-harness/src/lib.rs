//! Test orchestration for integration tests against live search backends
//!
//! Before each test the harness provisions named backend connections
//! ("managers"), each bound to a fresh index populated with declared fixture
//! data; after each test it tears the indexes down. Backend-classified
//! failures retry the whole body with a clean re-provision between attempts;
//! every other failure propagates immediately. A declarative version gate
//! skips tests on unsupported backend versions.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use searchbed_core::{Document, FixtureSet, MapResolver};
//! use searchbed_harness::{TestBed, TestSpec};
//!
//! let resolver = MapResolver::new().with("default", my_backend_handle);
//! let spec = TestSpec::new("finds_indexed_pages")
//!     .with_manager("default")
//!     .with_fixtures(FixtureSet::new().with(
//!         "default",
//!         "pages",
//!         Document::new().with_field("id", 1).with_field("title", "hello"),
//!     ))
//!     .with_retry_budget(3);
//! let outcome = TestBed::new(Arc::new(resolver), spec).run(|registry| {
//!     let handle = registry.handle("default").expect("provisioned");
//!     // query the backend, assert on results …
//!     Ok(())
//! })?;
//! ```

#![forbid(unsafe_code)]

pub mod executor;
pub mod fixtures;
pub mod gate;
pub mod registry;
pub mod runner;

// Re-export key types for convenience
pub use executor::run_with_retry;
pub use fixtures::populate;
pub use gate::should_skip;
pub use registry::{DisposalFailure, ManagerRegistry, Resolution};
pub use runner::{TestBed, TestOutcome, TestSpec};

use searchbed_core::config::HarnessConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing output for harness runs, honoring `SEARCHBED_LOG`.
///
/// Safe to call repeatedly; only the first call installs a subscriber.
pub fn init_logging() {
    let config = HarnessConfig::from_env();
    let filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

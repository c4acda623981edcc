//! Backend collaborator seams
//!
//! The harness never talks to a search backend directly. It drives an opaque
//! [`ManagerHandle`] obtained from a [`ManagerResolver`] that is injected at
//! registry construction. Handles are capabilities handed in by the caller,
//! not looked up from ambient global state.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::HarnessResult;

/// Prefix prepended to a manager name to form its resolver service name.
pub const MANAGER_SERVICE_PREFIX: &str = "searchbed.manager.";

/// Derive the resolver service name for a manager name.
#[must_use]
pub fn service_name(manager: &str) -> String {
    format!("{MANAGER_SERVICE_PREFIX}{manager}")
}

/// A named connection to one backend index set.
///
/// All calls are synchronous and blocking; implementations own whatever wire
/// protocol and timeouts the backend client uses internally. Bulk submissions
/// are deferred-commit: nothing is visible to reads until `commit` plus
/// `refresh` have both completed.
pub trait ManagerHandle: Send + Sync {
    /// The backend's reported version string (e.g. `"8.11.3"`).
    fn version_number(&self) -> HarnessResult<String>;

    /// Queue one document of the given type for indexing.
    fn bulk_index(&self, doc_type: &str, document: &Document) -> HarnessResult<()>;

    /// Flush pending bulk writes.
    fn commit(&self) -> HarnessResult<()>;

    /// Make committed writes visible to subsequent reads.
    fn refresh(&self) -> HarnessResult<()>;

    /// Drop the index if it exists and recreate it empty.
    fn drop_and_create_index(&self) -> HarnessResult<()>;

    /// Drop the index.
    fn drop_index(&self) -> HarnessResult<()>;
}

/// Hands back manager handles by service name.
///
/// The registry derives service names via [`service_name`] and treats a
/// missing name as a configuration error, never as a transient condition.
pub trait ManagerResolver: Send + Sync {
    /// Whether a handle is registered under `service`.
    fn has(&self, service: &str) -> bool;

    /// The handle registered under `service`, if any.
    fn get(&self, service: &str) -> Option<Arc<dyn ManagerHandle>>;
}

/// Map-backed [`ManagerResolver`] for wiring handles explicitly.
#[derive(Default)]
pub struct MapResolver {
    handles: IndexMap<String, Arc<dyn ManagerHandle>>,
}

impl MapResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under the manager name `manager` (the service name
    /// is derived automatically).
    pub fn register(&mut self, manager: &str, handle: Arc<dyn ManagerHandle>) {
        self.handles.insert(service_name(manager), handle);
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, manager: &str, handle: Arc<dyn ManagerHandle>) -> Self {
        self.register(manager, handle);
        self
    }
}

impl ManagerResolver for MapResolver {
    fn has(&self, service: &str) -> bool {
        self.handles.contains_key(service)
    }

    fn get(&self, service: &str) -> Option<Arc<dyn ManagerHandle>> {
        self.handles.get(service).cloned()
    }
}

//! Per-test-run manager cache and index lifecycle
//!
//! One registry lives for one test instance. It resolves manager names to
//! handles through an injected [`ManagerResolver`], provisions each index
//! exactly once per resolution cycle (drop-and-create, then fixture
//! population), and owns disposal at teardown.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use searchbed_core::document::FixtureSet;
use searchbed_core::error::{HarnessError, HarnessResult};
use searchbed_core::manager::{ManagerHandle, ManagerResolver, service_name};
use searchbed_core::version::VersionRule;

use crate::fixtures::populate;
use crate::gate::should_skip;

/// Outcome of resolving a manager name.
pub enum Resolution {
    /// The manager is provisioned and ready.
    Ready(Arc<dyn ManagerHandle>),
    /// The version gate vetoed this test on this backend.
    Skipped {
        /// Human-readable skip reason embedding the backend version.
        reason: String,
    },
}

// Handles are trait objects, so the Ready payload renders opaquely.
impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::Skipped { reason } => {
                f.debug_struct("Skipped").field("reason", reason).finish()
            }
        }
    }
}

/// A disposal failure recorded (not raised) during [`ManagerRegistry::release_all`].
#[derive(Debug)]
pub struct DisposalFailure {
    /// Manager whose index drop failed.
    pub manager: String,
    /// The swallowed error.
    pub error: HarnessError,
}

/// Per-test-run cache mapping manager name → provisioned handle.
pub struct ManagerRegistry {
    resolver: Arc<dyn ManagerResolver>,
    rules: Vec<VersionRule>,
    fixtures: FixtureSet,
    test_name: String,
    cache: IndexMap<String, Arc<dyn ManagerHandle>>,
}

impl ManagerRegistry {
    /// Create a registry for one test instance.
    ///
    /// The resolver is the only way handles enter the registry; it is
    /// injected here rather than looked up from ambient state.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn ManagerResolver>,
        rules: Vec<VersionRule>,
        fixtures: FixtureSet,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            rules,
            fixtures,
            test_name: test_name.into(),
            cache: IndexMap::new(),
        }
    }

    /// Resolve a manager name to a provisioned handle.
    ///
    /// The version gate is re-evaluated on every resolution, including for
    /// cached handles inside a retry loop. First resolution provisions the
    /// index: drop-and-create, then fixture population for this name (when
    /// declared). A cached name is returned as-is, never re-provisioned.
    ///
    /// # Errors
    /// `HarnessError::UnknownManager` when the resolver has no handle under
    /// the derived service name; backend errors from provisioning.
    pub fn resolve(&mut self, name: &str) -> HarnessResult<Resolution> {
        if let Some(handle) = self.cache.get(name) {
            let version = handle.version_number()?;
            if let Some(reason) = should_skip(&version, &self.rules, &self.test_name)? {
                return Ok(Resolution::Skipped { reason });
            }
            return Ok(Resolution::Ready(Arc::clone(handle)));
        }

        let service = service_name(name);
        if !self.resolver.has(&service) {
            return Err(HarnessError::UnknownManager(name.to_owned()));
        }
        let handle = self
            .resolver
            .get(&service)
            .ok_or_else(|| HarnessError::UnknownManager(name.to_owned()))?;

        let version = handle.version_number()?;
        if let Some(reason) = should_skip(&version, &self.rules, &self.test_name)? {
            return Ok(Resolution::Skipped { reason });
        }

        tracing::debug!(manager = name, %version, "provisioning index");
        handle.drop_and_create_index()?;
        if let Some(documents_by_type) = self.fixtures.for_manager(name) {
            populate(handle.as_ref(), documents_by_type)?;
        }

        self.cache.insert(name.to_owned(), Arc::clone(&handle));
        Ok(Resolution::Ready(handle))
    }

    /// Cached-handle accessor for test bodies. `None` when the name has not
    /// been resolved in the current cycle.
    #[must_use]
    pub fn handle(&self, name: &str) -> Option<Arc<dyn ManagerHandle>> {
        self.cache.get(name).cloned()
    }

    /// Drop one manager's index and evict it from the cache. No-op when the
    /// name is not cached.
    pub fn release(&mut self, name: &str) -> HarnessResult<()> {
        if let Some(handle) = self.cache.shift_remove(name) {
            handle.drop_index()?;
        }
        Ok(())
    }

    /// Best-effort teardown of every cached manager.
    ///
    /// Attempts `drop_index` on each handle; a failure never aborts cleanup
    /// of the remaining managers and never propagates. Each failure is
    /// logged at `warn` and returned for inspection.
    pub fn release_all(&mut self) -> Vec<DisposalFailure> {
        let mut failures = Vec::new();
        for (manager, handle) in self.cache.drain(..) {
            if let Err(error) = handle.drop_index() {
                tracing::warn!(%manager, %error, "index drop failed during teardown");
                failures.push(DisposalFailure { manager, error });
            }
        }
        failures
    }

    /// Names of currently cached managers, in resolution order.
    pub fn managers(&self) -> impl Iterator<Item = &String> {
        self.cache.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchbed_core::document::Document;
    use searchbed_core::manager::MapResolver;
    use searchbed_core::version::Comparator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandle {
        version: String,
        provisions: AtomicUsize,
        bulks: AtomicUsize,
        commits: AtomicUsize,
        refreshes: AtomicUsize,
        drops: AtomicUsize,
        fail_drop: bool,
    }

    impl CountingHandle {
        fn at_version(version: &str) -> Self {
            Self {
                version: version.to_owned(),
                provisions: AtomicUsize::new(0),
                bulks: AtomicUsize::new(0),
                commits: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                drops: AtomicUsize::new(0),
                fail_drop: false,
            }
        }

        fn with_failing_drop(mut self) -> Self {
            self.fail_drop = true;
            self
        }
    }

    impl ManagerHandle for CountingHandle {
        fn version_number(&self) -> HarnessResult<String> {
            Ok(self.version.clone())
        }

        fn bulk_index(&self, _doc_type: &str, _document: &Document) -> HarnessResult<()> {
            self.bulks.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn commit(&self) -> HarnessResult<()> {
            self.commits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn refresh(&self) -> HarnessResult<()> {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn drop_and_create_index(&self) -> HarnessResult<()> {
            self.provisions.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn drop_index(&self) -> HarnessResult<()> {
            if self.fail_drop {
                return Err(HarnessError::BackendUnavailable(
                    "simulated drop failure".to_owned(),
                ));
            }
            self.drops.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn registry_with(
        handle: &Arc<CountingHandle>,
        rules: Vec<VersionRule>,
        fixtures: FixtureSet,
    ) -> ManagerRegistry {
        let resolver = MapResolver::new().with(
            "default",
            Arc::clone(handle) as Arc<dyn ManagerHandle>,
        );
        ManagerRegistry::new(Arc::new(resolver), rules, fixtures, "testFoo")
    }

    #[test]
    fn resolve_provisions_and_populates() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let fixtures = FixtureSet::new()
            .with("default", "pages", Document::new().with_field("id", 1))
            .with("default", "pages", Document::new().with_field("id", 2));
        let mut registry = registry_with(&handle, Vec::new(), fixtures);

        let resolution = registry.resolve("default").unwrap();
        assert!(matches!(resolution, Resolution::Ready(_)));
        assert_eq!(handle.provisions.load(Ordering::Relaxed), 1);
        assert_eq!(handle.bulks.load(Ordering::Relaxed), 2);
        assert_eq!(handle.commits.load(Ordering::Relaxed), 1);
        assert_eq!(handle.refreshes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn resolve_without_fixtures_skips_population() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());

        registry.resolve("default").unwrap();
        assert_eq!(handle.provisions.load(Ordering::Relaxed), 1);
        assert_eq!(handle.bulks.load(Ordering::Relaxed), 0);
        assert_eq!(handle.commits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn second_resolve_reuses_cached_handle() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());

        let first = match registry.resolve("default").unwrap() {
            Resolution::Ready(h) => h,
            Resolution::Skipped { .. } => panic!("unexpected skip"),
        };
        let second = match registry.resolve("default").unwrap() {
            Resolution::Ready(h) => h,
            Resolution::Skipped { .. } => panic!("unexpected skip"),
        };
        assert!(Arc::ptr_eq(&first, &second), "same handle object");
        assert_eq!(
            handle.provisions.load(Ordering::Relaxed),
            1,
            "provisioned only once"
        );
    }

    #[test]
    fn unknown_manager_is_a_configuration_error() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());

        let err = registry.resolve("ghost").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_MANAGER");
        assert!(err.to_string().contains("ghost"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn gate_skip_prevents_provisioning() {
        let handle = Arc::new(CountingHandle::at_version("5.0.0"));
        let rules = vec![VersionRule::generic("6.0.0", Comparator::Le)];
        let mut registry = registry_with(&handle, rules, FixtureSet::new());

        match registry.resolve("default").unwrap() {
            Resolution::Skipped { reason } => assert!(reason.contains("5.0.0")),
            Resolution::Ready(_) => panic!("expected skip"),
        }
        assert_eq!(handle.provisions.load(Ordering::Relaxed), 0);
        assert!(registry.handle("default").is_none(), "skip is not cached");
    }

    #[test]
    fn gate_reevaluated_for_cached_handles() {
        let handle = Arc::new(CountingHandle::at_version("7.0.0"));
        let rules = vec![VersionRule::generic("6.0.0", Comparator::Ge)];
        // Rule matches 7.0.0 only for testBar via explicit un-skip of testFoo.
        let rules_with_unskip = {
            let mut r = rules;
            r.push(VersionRule::for_test("0.0.0", Comparator::Eq, "testFoo"));
            r
        };
        let mut registry = registry_with(&handle, rules_with_unskip, FixtureSet::new());

        // testFoo is explicitly allowed; resolution succeeds and caches.
        assert!(matches!(
            registry.resolve("default").unwrap(),
            Resolution::Ready(_)
        ));
        // Cached path still consults the gate.
        assert!(matches!(
            registry.resolve("default").unwrap(),
            Resolution::Ready(_)
        ));
        assert_eq!(handle.provisions.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn release_drops_and_evicts() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());

        registry.resolve("default").unwrap();
        registry.release("default").unwrap();
        assert_eq!(handle.drops.load(Ordering::Relaxed), 1);
        assert!(registry.handle("default").is_none());

        // Releasing again is a no-op.
        registry.release("default").unwrap();
        assert_eq!(handle.drops.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn release_all_swallows_failures_and_continues() {
        let failing = Arc::new(CountingHandle::at_version("9.0.0").with_failing_drop());
        let healthy = Arc::new(CountingHandle::at_version("9.0.0"));
        let resolver = MapResolver::new()
            .with("broken", Arc::clone(&failing) as Arc<dyn ManagerHandle>)
            .with("healthy", Arc::clone(&healthy) as Arc<dyn ManagerHandle>);
        let mut registry =
            ManagerRegistry::new(Arc::new(resolver), Vec::new(), FixtureSet::new(), "t");

        registry.resolve("broken").unwrap();
        registry.resolve("healthy").unwrap();

        let failures = registry.release_all();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].manager, "broken");
        assert_eq!(
            healthy.drops.load(Ordering::Relaxed),
            1,
            "failure must not abort cleanup of the remaining managers"
        );
        assert_eq!(registry.managers().count(), 0);
    }

    #[test]
    fn managers_iterate_in_resolution_order() {
        let zeta = Arc::new(CountingHandle::at_version("9.0.0"));
        let alpha = Arc::new(CountingHandle::at_version("9.0.0"));
        let resolver = MapResolver::new()
            .with("alpha", Arc::clone(&alpha) as Arc<dyn ManagerHandle>)
            .with("zeta", Arc::clone(&zeta) as Arc<dyn ManagerHandle>);
        let mut registry =
            ManagerRegistry::new(Arc::new(resolver), Vec::new(), FixtureSet::new(), "t");

        registry.resolve("zeta").unwrap();
        registry.resolve("alpha").unwrap();
        let names: Vec<_> = registry.managers().cloned().collect();
        assert_eq!(names, ["zeta", "alpha"], "cache keeps resolution order");
    }

    #[test]
    fn resolution_debug_rendering() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());
        let ready = registry.resolve("default").unwrap();
        assert_eq!(format!("{ready:?}"), "Ready(..)");

        let gated = Arc::new(CountingHandle::at_version("5.0.0"));
        let rules = vec![VersionRule::generic("6.0.0", Comparator::Le)];
        let mut registry = registry_with(&gated, rules, FixtureSet::new());
        let skipped = registry.resolve("default").unwrap();
        let rendered = format!("{skipped:?}");
        assert!(rendered.contains("Skipped"));
        assert!(rendered.contains("5.0.0"), "reason is visible in debug output");
    }

    #[test]
    fn release_all_after_release_all_is_empty() {
        let handle = Arc::new(CountingHandle::at_version("9.0.0"));
        let mut registry = registry_with(&handle, Vec::new(), FixtureSet::new());
        registry.resolve("default").unwrap();

        assert!(registry.release_all().is_empty());
        assert!(registry.release_all().is_empty());
        assert_eq!(handle.drops.load(Ordering::Relaxed), 1);
    }
}

//! Test-run orchestration
//!
//! [`TestBed`] binds a declarative [`TestSpec`] to one [`ManagerRegistry`]
//! and drives the full cycle: provision every declared manager, run the
//! retry-wrapped body, and tear everything down unconditionally on pass,
//! fail, and skip alike.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use searchbed_core::config::HarnessConfig;
use searchbed_core::document::FixtureSet;
use searchbed_core::error::HarnessResult;
use searchbed_core::manager::ManagerResolver;
use searchbed_core::version::VersionRule;

use crate::executor::run_with_retry;
use crate::registry::{ManagerRegistry, Resolution};

/// Declarative description of one harnessed test.
#[derive(Debug, Clone, Default)]
pub struct TestSpec {
    /// Test name; scoped version rules match against it.
    pub name: String,
    /// Manager names to provision before the body runs.
    pub managers: Vec<String>,
    /// Fixture documents, keyed by manager name.
    pub fixtures: FixtureSet,
    /// Version-based skip rules, in declaration order.
    pub skip_rules: Vec<VersionRule>,
    /// Attempts allowed for the body; `0`/`1` disables retry.
    pub retry_budget: u32,
}

impl TestSpec {
    /// Start a spec for the named test. The retry budget defaults from
    /// [`HarnessConfig`] and can be overridden per suite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            retry_budget: HarnessConfig::from_env().retry_budget,
            ..Default::default()
        }
    }

    /// Declare a manager to provision.
    #[must_use]
    pub fn with_manager(mut self, name: impl Into<String>) -> Self {
        self.managers.push(name.into());
        self
    }

    /// Attach fixture documents.
    #[must_use]
    pub fn with_fixtures(mut self, fixtures: FixtureSet) -> Self {
        self.fixtures = fixtures;
        self
    }

    /// Attach version-based skip rules.
    #[must_use]
    pub fn with_skip_rules(mut self, rules: Vec<VersionRule>) -> Self {
        self.skip_rules = rules;
        self
    }

    /// Override the retry budget.
    #[must_use]
    pub const fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }
}

/// How a harnessed test run ended, assertion failures and fatal errors aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The body completed without error.
    Passed {
        /// Number of body invocations it took.
        attempts: u32,
    },
    /// The version gate vetoed the test on this backend.
    Skipped {
        /// Human-readable reason embedding the backend version.
        reason: String,
    },
}

impl TestOutcome {
    /// Whether the run passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Whether the run was skipped by the version gate.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// One test instance's orchestration state.
pub struct TestBed {
    registry: RefCell<ManagerRegistry>,
    managers: Vec<String>,
    retry_budget: u32,
}

enum BodyRun {
    Completed,
    Skipped(String),
}

impl TestBed {
    /// Wire a spec to a resolver. The registry is created here and lives for
    /// exactly this test instance.
    #[must_use]
    pub fn new(resolver: Arc<dyn ManagerResolver>, spec: TestSpec) -> Self {
        let TestSpec {
            name,
            managers,
            fixtures,
            skip_rules,
            retry_budget,
        } = spec;
        Self {
            registry: RefCell::new(ManagerRegistry::new(resolver, skip_rules, fixtures, name)),
            managers,
            retry_budget,
        }
    }

    /// Provision, run the retry-wrapped body, tear down.
    ///
    /// The body receives the registry and reads handles via
    /// [`ManagerRegistry::handle`]. Backend failures inside the body are
    /// retried up to the budget with a full re-provision between attempts;
    /// all other failures propagate immediately. Teardown always runs.
    pub fn run<F>(&self, mut body: F) -> HarnessResult<TestOutcome>
    where
        F: FnMut(&ManagerRegistry) -> HarnessResult<()>,
    {
        match self.provision() {
            Ok(None) => {}
            Ok(Some(reason)) => {
                self.dispose();
                return Ok(TestOutcome::Skipped { reason });
            }
            Err(err) => {
                self.dispose();
                return Err(err);
            }
        }

        let attempts = Cell::new(0u32);
        let pending_skip: RefCell<Option<String>> = RefCell::new(None);

        let result = run_with_retry(
            self.retry_budget,
            || {
                if let Some(reason) = pending_skip.borrow_mut().take() {
                    return Ok(BodyRun::Skipped(reason));
                }
                attempts.set(attempts.get() + 1);
                body(&*self.registry.borrow())?;
                Ok(BodyRun::Completed)
            },
            || {
                if let Some(reason) = self.provision()? {
                    *pending_skip.borrow_mut() = Some(reason);
                }
                Ok(())
            },
            || self.dispose(),
        );

        // Teardown is unconditional: pass, fail, and skip paths all land here.
        self.dispose();

        match result? {
            BodyRun::Completed => Ok(TestOutcome::Passed {
                attempts: attempts.get(),
            }),
            BodyRun::Skipped(reason) => Ok(TestOutcome::Skipped { reason }),
        }
    }

    /// Resolve every declared manager. Returns a skip reason when the gate
    /// vetoes any of them.
    fn provision(&self) -> HarnessResult<Option<String>> {
        let mut registry = self.registry.borrow_mut();
        for name in &self.managers {
            match registry.resolve(name)? {
                Resolution::Ready(_) => {}
                Resolution::Skipped { reason } => return Ok(Some(reason)),
            }
        }
        Ok(None)
    }

    fn dispose(&self) {
        self.registry.borrow_mut().release_all();
    }
}

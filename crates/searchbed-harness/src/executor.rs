//! Retry-wrapped test execution
//!
//! A mid-test backend error (cluster busy, timeout) may leave the index in a
//! state the test's expectations no longer hold for, so a retry is never a
//! bare re-invocation: the interposed `teardown` + `setup` drops, recreates,
//! and repopulates every manager before the next attempt.

use searchbed_core::error::{HarnessError, HarnessResult};

/// Run `body` up to `budget` times, resetting state between attempts.
///
/// - `budget <= 1`: invoke `body` exactly once and propagate its outcome
///   unchanged; `setup`/`teardown` are never interposed.
/// - Otherwise: on a backend-classified error with attempts remaining,
///   invoke `teardown()` then `setup()` and try again. Non-backend errors
///   re-raise immediately, and the final attempt's error propagates.
///
/// `teardown` is infallible by contract: disposal is best-effort and its
/// failures are swallowed by the registry, never surfaced here. A `setup`
/// failure during a reset propagates as the run's outcome.
pub fn run_with_retry<T, B, S, D>(
    budget: u32,
    mut body: B,
    mut setup: S,
    mut teardown: D,
) -> HarnessResult<T>
where
    B: FnMut() -> HarnessResult<T>,
    S: FnMut() -> HarnessResult<()>,
    D: FnMut(),
{
    let attempts = budget.max(1);

    for attempt in 1..=attempts {
        match body() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() || attempt == attempts => return Err(err),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    budget = attempts,
                    error = %err,
                    "backend error, re-provisioning and retrying"
                );
                teardown();
                setup()?;
            }
        }
    }

    Err(HarnessError::Internal("retry loop exhausted".to_owned()))
}

//! Version-based test-skip policy
//!
//! Rules are partitioned into generic (unscoped) rules and rules scoped to
//! the current test. A test skips iff it matches a scoped rule naming it, or
//! it matches some generic rule and no non-matching scoped rule naming it
//! explicitly allows it to run. Scoped rules naming a *different* test never
//! influence the decision.

use searchbed_core::error::HarnessResult;
use searchbed_core::version::VersionRule;

/// Decide whether the current test must be skipped on this backend version.
///
/// Returns `Some(reason)` when the test should be skipped, with the reason
/// embedding the offending version. Rules within each partition are
/// evaluated in declaration order.
pub fn should_skip(
    current_version: &str,
    rules: &[VersionRule],
    test_name: &str,
) -> HarnessResult<Option<String>> {
    let mut generic_match: Option<&VersionRule> = None;
    let mut explicitly_allowed = false;

    for rule in rules {
        match rule.test_name.as_deref() {
            Some(scoped) if scoped == test_name => {
                if rule.matches(current_version)? {
                    // A scoped match is definitive.
                    return Ok(Some(skip_reason(current_version, rule)));
                }
                explicitly_allowed = true;
            }
            Some(_) => {} // scoped to another test; no effect here
            None => {
                if generic_match.is_none() && rule.matches(current_version)? {
                    generic_match = Some(rule);
                }
            }
        }
    }

    if explicitly_allowed {
        return Ok(None);
    }
    Ok(generic_match.map(|rule| skip_reason(current_version, rule)))
}

fn skip_reason(current_version: &str, rule: &VersionRule) -> String {
    format!(
        "backend version {current_version} is not supported by this test (rule: {} {})",
        rule.comparator, rule.version
    )
}

//! Backend version comparison and declarative skip rules
//!
//! Backends report versions like `"8.11.3"` or `"9.1"`; rules compare the
//! reported version against a target with one comparator from a fixed set.
//! Parsing is deliberately lenient: the dotted numeric prefix is padded to
//! `major.minor.patch` and compared via [`semver::Version`]. Anything past
//! the numeric prefix (pre-release tags, build metadata) is ignored: skip
//! rules target release lines, not individual builds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

// ── Comparator ───────────────────────────────────────────────────────────────

/// Comparison operator for version rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `=` (also accepted as `==`)
    #[serde(rename = "=", alias = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
}

impl Comparator {
    /// Apply this comparator to an ordering of `current` relative to `target`.
    #[must_use]
    pub const fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => matches!(ordering, Equal),
            Self::Ne => !matches!(ordering, Equal),
            Self::Lt => matches!(ordering, Less),
            Self::Le => matches!(ordering, Less | Equal),
            Self::Gt => matches!(ordering, Greater),
            Self::Ge => matches!(ordering, Greater | Equal),
        }
    }

    /// The canonical symbol for this comparator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            other => Err(HarnessError::InvalidRule(format!(
                "unknown comparator '{other}' (expected one of = != < <= > >=)"
            ))),
        }
    }
}

// ── Version parsing & comparison ─────────────────────────────────────────────

/// Parse a backend version string leniently into a [`semver::Version`].
///
/// Missing minor/patch components are padded with zero, so `"9"` parses as
/// `9.0.0` and `"9.1"` as `9.1.0`. The major component must be numeric.
pub fn parse_version(version: &str) -> HarnessResult<semver::Version> {
    let numeric_prefix: &str = version
        .trim()
        .trim_start_matches('v')
        .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
        .next()
        .unwrap_or("");

    let mut parts = numeric_prefix.split('.');
    let mut component = |name: &str, required: bool| -> HarnessResult<u64> {
        match parts.next() {
            Some(raw) if !raw.is_empty() => raw.parse().map_err(|_| {
                HarnessError::InvalidRule(format!(
                    "version '{version}' has a non-numeric {name} component"
                ))
            }),
            _ if required => Err(HarnessError::InvalidRule(format!(
                "version '{version}' has no numeric major component"
            ))),
            _ => Ok(0),
        }
    };

    let major = component("major", true)?;
    let minor = component("minor", false)?;
    let patch = component("patch", false)?;
    Ok(semver::Version::new(major, minor, patch))
}

/// Evaluate `current <comparator> target` over leniently parsed versions.
pub fn compare(current: &str, target: &str, comparator: Comparator) -> HarnessResult<bool> {
    let current = parse_version(current)?;
    let target = parse_version(target)?;
    Ok(comparator.holds(current.cmp(&target)))
}

// ── Version rules ────────────────────────────────────────────────────────────

/// One declarative skip rule: compare the backend's reported version against
/// `version` with `comparator`, optionally scoped to a single test name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRule {
    /// Target version string the backend version is compared against.
    pub version: String,
    /// Comparator applied as `current <comparator> version`.
    pub comparator: Comparator,
    /// When set, the rule applies only to the test with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
}

impl VersionRule {
    /// Rule that applies to every test.
    #[must_use]
    pub fn generic(version: impl Into<String>, comparator: Comparator) -> Self {
        Self {
            version: version.into(),
            comparator,
            test_name: None,
        }
    }

    /// Rule scoped to one test name.
    #[must_use]
    pub fn for_test(
        version: impl Into<String>,
        comparator: Comparator,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            comparator,
            test_name: Some(test_name.into()),
        }
    }

    /// Whether this rule matches the given backend version.
    pub fn matches(&self, current_version: &str) -> HarnessResult<bool> {
        compare(current_version, &self.version, self.comparator)
    }

    /// Whether this rule is scoped to the given test.
    #[must_use]
    pub fn is_scoped_to(&self, test_name: &str) -> bool {
        self.test_name.as_deref() == Some(test_name)
    }
}

//! # API versions
//!
//! Parsing and gating of the `vMAJOR.MINOR` API version strings.

use crate::constants::{
    KNOWN_API_VERSIONS, RESOURCE_PREFIX, VERSION_WALLIX_API_312, VERSION_WALLIX_API_33,
    VERSION_WALLIX_API_36, VERSION_WALLIX_API_38,
};
use crate::error::{BastionError, Result};
use std::fmt;
use std::str::FromStr;

/// Every version the adapters support by default
pub fn default_versions_valid() -> &'static [&'static str] {
    &KNOWN_API_VERSIONS
}

/// Versions that carry the `/authdomains` API
pub fn versions_38_plus() -> &'static [&'static str] {
    &[VERSION_WALLIX_API_38, VERSION_WALLIX_API_312]
}

/// Versions that still carry the legacy `/ldapdomains` and `/ldapmappings` APIs
pub fn versions_legacy_ldap() -> &'static [&'static str] {
    &[VERSION_WALLIX_API_33, VERSION_WALLIX_API_36]
}

/// A parsed API version, ordered numerically (`v3.12 > v3.8`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const V3_3: Self = Self::new(3, 3);
    pub const V3_6: Self = Self::new(3, 6);
    pub const V3_8: Self = Self::new(3, 8);
    pub const V3_12: Self = Self::new(3, 12);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for ApiVersion {
    type Err = BastionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            BastionError::InvalidConfig(format!("api_version {s} is not of the form vMAJOR.MINOR"))
        };
        let rest = s.strip_prefix('v').ok_or_else(invalid)?;
        let (major, minor) = rest.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().ok().ok_or_else(invalid)?,
            minor: minor.parse().ok().ok_or_else(invalid)?,
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Reject `name` when `version` is not in `allowed`.
///
/// `kind` is `"resource"` or `"data source"`; `name` is the short adapter
/// name without the `wallix-bastion_` prefix.
pub fn check_version(kind: &'static str, name: &str, version: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&version) {
        return Ok(());
    }
    Err(BastionError::UnsupportedVersion {
        kind,
        name: format!("{RESOURCE_PREFIX}{name}"),
        version: version.to_string(),
        hint: String::new(),
    })
}

/// Whether `version` is at least `min`. Unparseable versions compare as older.
pub fn at_least(version: &str, min: ApiVersion) -> bool {
    version.parse::<ApiVersion>().is_ok_and(|v| v >= min)
}

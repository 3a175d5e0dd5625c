//! API version tokens, constraints and resolution.
//!
//! A route either carries no version constraint, pins an exact version
//! (`1.5`), or declares a baseline (`1.2+`) that serves every version from
//! its floor upward until a more specific registered constraint supersedes
//! it. Resolution follows closest-match-from-below: among all constraint
//! versions not exceeding the request, the highest wins.

use std::fmt;

/// A parsed `MAJOR.MINOR` version token. `"1"` is shorthand for `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error raised when a version token cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    token: String,
}

impl VersionParseError {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid API version token '{}'", self.token)
    }
}

impl std::error::Error for VersionParseError {}

impl std::str::FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let err = || VersionParseError {
            token: s.to_string(),
        };
        let (major, minor) = match token.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (token, "0"),
        };
        if major.is_empty() || minor.is_empty() {
            return Err(err());
        }
        let major = major.parse::<u32>().map_err(|_| err())?;
        let minor = minor.parse::<u32>().map_err(|_| err())?;
        Ok(ApiVersion { major, minor })
    }
}

/// The version requirement a route declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionConstraint {
    /// No constraint. Serves unversioned requests, and versioned ones only
    /// as a fallback when no versioned candidate applies below the request.
    Unversioned,
    /// Serves exactly this version. Never floats upward.
    Exact(ApiVersion),
    /// Serves this version and everything above it, until superseded by a
    /// higher registered constraint still at or below the request.
    Baseline(ApiVersion),
}

impl VersionConstraint {
    pub fn version(&self) -> Option<ApiVersion> {
        match self {
            VersionConstraint::Unversioned => None,
            VersionConstraint::Exact(v) | VersionConstraint::Baseline(v) => Some(*v),
        }
    }

    pub fn is_unversioned(&self) -> bool {
        matches!(self, VersionConstraint::Unversioned)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Unversioned => f.write_str("none"),
            VersionConstraint::Exact(v) => write!(f, "{}", v),
            VersionConstraint::Baseline(v) => write!(f, "{}+", v),
        }
    }
}

impl std::str::FromStr for VersionConstraint {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(VersionParseError {
                token: s.to_string(),
            });
        }
        match token.strip_suffix('+') {
            Some(base) => Ok(VersionConstraint::Baseline(base.parse()?)),
            None => Ok(VersionConstraint::Exact(token.parse()?)),
        }
    }
}

/// Deprecation metadata surfaced alongside a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprecationInfo {
    /// Documentation URL for the deprecation.
    pub link: Option<String>,
    /// Planned removal date, verbatim as configured.
    pub sunset: Option<String>,
}

impl DeprecationInfo {
    /// Response headers the outer layer should attach: `Deprecation`, plus
    /// `Link` and `Sunset` when configured.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Deprecation", "true".to_string())];
        if let Some(link) = &self.link {
            headers.push(("Link", format!("<{}>; rel=\"deprecation\"", link)));
        }
        if let Some(sunset) = &self.sunset {
            headers.push(("Sunset", sunset.clone()));
        }
        headers
    }
}

/// Marks one API version as deprecated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationRule {
    pub version: ApiVersion,
    pub info: DeprecationInfo,
}

/// Result of version resolution over a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDecision {
    /// Indices (into the candidate slice) that survive resolution.
    Matched(Vec<usize>),
    /// No candidate can serve the requested version.
    Unsupported,
}

/// Resolve a request version against candidate constraints.
///
/// With no request version, only unversioned candidates match. With a
/// version, exact constraints require equality and baselines apply from
/// their floor upward, each baseline excluded once another registered
/// version sits between it and the request. When nothing versioned applies:
/// a request above the highest registered version is unsupported (an exact
/// ceiling does not float), while a request below the floor falls back to
/// the unversioned candidates.
pub fn resolve_version(
    requested: Option<ApiVersion>,
    candidates: &[VersionConstraint],
) -> VersionDecision {
    let unversioned = || -> Vec<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_unversioned())
            .map(|(i, _)| i)
            .collect()
    };

    let Some(requested) = requested else {
        let matched = unversioned();
        return if matched.is_empty() {
            VersionDecision::Unsupported
        } else {
            VersionDecision::Matched(matched)
        };
    };

    let versions: Vec<ApiVersion> = candidates.iter().filter_map(|c| c.version()).collect();

    // (index, constraint version, is_exact) for every eligible candidate
    let mut eligible: Vec<(usize, ApiVersion, bool)> = Vec::new();
    for (i, constraint) in candidates.iter().enumerate() {
        match constraint {
            VersionConstraint::Unversioned => {}
            VersionConstraint::Exact(v) => {
                if *v == requested {
                    eligible.push((i, *v, true));
                }
            }
            VersionConstraint::Baseline(floor) => {
                if *floor <= requested {
                    let superseded = versions
                        .iter()
                        .any(|w| *w > *floor && *w <= requested);
                    if !superseded {
                        eligible.push((i, *floor, false));
                    }
                }
            }
        }
    }

    if let Some((best_version, best_exact)) =
        eligible.iter().map(|&(_, v, exact)| (v, exact)).max()
    {
        let winners = eligible
            .iter()
            .filter(|&&(_, v, exact)| v == best_version && exact == best_exact)
            .map(|&(i, _, _)| i)
            .collect();
        return VersionDecision::Matched(winners);
    }

    // Nothing versioned applies. Above the ceiling is an error; below the
    // floor falls back to unversioned candidates.
    if let Some(ceiling) = versions.iter().max() {
        if requested > *ceiling {
            return VersionDecision::Unsupported;
        }
    }
    let matched = unversioned();
    if matched.is_empty() {
        VersionDecision::Unsupported
    } else {
        VersionDecision::Matched(matched)
    }
}

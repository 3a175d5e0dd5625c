//! Core route-description types shared by the registry and matcher.

use crate::router::media::{MediaRange, MediaTypeError};
use crate::router::path::{PathPattern, PatternError};
use crate::router::version::{VersionConstraint, VersionParseError};
use http::Method;
use std::fmt;

/// A declarative condition on one request query parameter or header.
///
/// Predicates are written in a compact expression form:
///
/// | expression    | meaning                          |
/// |---------------|----------------------------------|
/// | `name`        | parameter must be present        |
/// | `!name`       | parameter must be absent         |
/// | `name=value`  | present with exactly this value  |
/// | `name!=value` | absent, or present with any other value |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Present { name: String },
    Absent { name: String },
    Equals { name: String, value: String },
    NotEquals { name: String, value: String },
}

impl Predicate {
    pub fn present(name: impl Into<String>) -> Self {
        Predicate::Present { name: name.into() }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Predicate::Absent { name: name.into() }
    }

    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Equals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn not_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::NotEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Predicate::Present { name }
            | Predicate::Absent { name }
            | Predicate::Equals { name, .. }
            | Predicate::NotEquals { name, .. } => name,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Present { name } => f.write_str(name),
            Predicate::Absent { name } => write!(f, "!{}", name),
            Predicate::Equals { name, value } => write!(f, "{}={}", name, value),
            Predicate::NotEquals { name, value } => write!(f, "{}!={}", name, value),
        }
    }
}

/// Error raised when a predicate expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateParseError {
    expr: String,
}

impl PredicateParseError {
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl fmt::Display for PredicateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid predicate expression '{}'", self.expr)
    }
}

impl std::error::Error for PredicateParseError {}

impl std::str::FromStr for Predicate {
    type Err = PredicateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let err = || PredicateParseError {
            expr: s.to_string(),
        };
        if let Some(name) = expr.strip_prefix('!') {
            let name = name.trim();
            if name.is_empty() || name.contains('=') {
                return Err(err());
            }
            return Ok(Predicate::absent(name));
        }
        if let Some((name, value)) = expr.split_once("!=") {
            let name = name.trim();
            if name.is_empty() {
                return Err(err());
            }
            return Ok(Predicate::not_equals(name, value.trim()));
        }
        if let Some((name, value)) = expr.split_once('=') {
            let name = name.trim();
            if name.is_empty() {
                return Err(err());
            }
            return Ok(Predicate::equals(name, value.trim()));
        }
        if expr.is_empty() {
            return Err(err());
        }
        Ok(Predicate::present(expr))
    }
}

/// Declarative description of one handler's matching criteria.
///
/// A spec is plain data: how it was produced (builder, config file, code
/// generation) is invisible to the registry and matcher. Empty collections
/// mean "unconstrained": no methods accepts every method, no `consumes`
/// accepts every content type, no `produces` leaves the response type to
/// the configured default.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// Name of the handler this spec routes to.
    pub handler_name: String,
    /// Path patterns, any of which may match. Never empty.
    pub patterns: Vec<PathPattern>,
    /// Accepted HTTP methods. Empty accepts any method.
    pub methods: Vec<Method>,
    /// Conditions on query parameters.
    pub param_predicates: Vec<Predicate>,
    /// Conditions on request headers.
    pub header_predicates: Vec<Predicate>,
    /// Content types the handler can read. Empty accepts any.
    pub consumes: Vec<MediaRange>,
    /// Media types the handler can produce. Empty satisfies any `Accept`.
    pub produces: Vec<MediaRange>,
    /// API version requirement.
    pub version: VersionConstraint,
}

impl RouteSpec {
    /// Start building a spec for the named handler.
    pub fn builder(handler_name: impl Into<String>) -> crate::spec::build::RouteSpecBuilder {
        crate::spec::build::RouteSpecBuilder::new(handler_name)
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    /// Total number of declared predicates, used as the final specificity
    /// tie-break between otherwise equal candidates.
    pub fn predicate_count(&self) -> usize {
        self.param_predicates.len() + self.header_predicates.len()
    }
}

impl fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.methods.is_empty() {
            f.write_str("ANY")?;
        } else {
            for (i, method) in self.methods.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", method)?;
            }
        }
        f.write_str(" ")?;
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", pattern)?;
        }
        if !self.version.is_unversioned() {
            write!(f, " v{}", self.version)?;
        }
        write!(f, " -> {}", self.handler_name)
    }
}

/// Error raised while building a [`RouteSpec`] or registering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The spec declares no path patterns at all.
    EmptyPathPatterns { handler: String },
    /// A path pattern failed to parse.
    InvalidPattern {
        handler: String,
        source: PatternError,
    },
    /// A `consumes`/`produces` entry failed to parse.
    InvalidMediaRange {
        handler: String,
        source: MediaTypeError,
    },
    /// The version constraint failed to parse.
    InvalidVersion {
        handler: String,
        source: VersionParseError,
    },
    /// A predicate expression failed to parse.
    InvalidPredicate {
        handler: String,
        source: PredicateParseError,
    },
    /// The spec's matching signature collides with an already registered
    /// spec; no request could ever be routed deterministically between them.
    AmbiguousMapping {
        existing: String,
        incoming: String,
        detail: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::EmptyPathPatterns { handler } => {
                write!(f, "route '{}' declares no path patterns", handler)
            }
            RegistrationError::InvalidPattern { handler, source } => {
                write!(f, "route '{}': {}", handler, source)
            }
            RegistrationError::InvalidMediaRange { handler, source } => {
                write!(f, "route '{}': {}", handler, source)
            }
            RegistrationError::InvalidVersion { handler, source } => {
                write!(f, "route '{}': {}", handler, source)
            }
            RegistrationError::InvalidPredicate { handler, source } => {
                write!(f, "route '{}': {}", handler, source)
            }
            RegistrationError::AmbiguousMapping {
                existing,
                incoming,
                detail,
            } => {
                write!(
                    f,
                    "ambiguous mapping: '{}' cannot be registered alongside '{}' ({})",
                    incoming, existing, detail
                )
            }
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::InvalidPattern { source, .. } => Some(source),
            RegistrationError::InvalidMediaRange { source, .. } => Some(source),
            RegistrationError::InvalidVersion { source, .. } => Some(source),
            RegistrationError::InvalidPredicate { source, .. } => Some(source),
            _ => None,
        }
    }
}

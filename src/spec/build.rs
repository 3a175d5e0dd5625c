//! Fluent construction of [`RouteSpec`] values.
//!
//! The builder accepts patterns, media ranges, versions and predicates in
//! their string forms and defers all parsing to [`RouteSpecBuilder::build`],
//! so one `Result` covers the whole declaration.

use super::types::{Predicate, RegistrationError, RouteSpec};
use crate::router::media::MediaRange;
use crate::router::path::PathPattern;
use crate::router::version::VersionConstraint;
use http::Method;

/// Builder returned by [`RouteSpec::builder`].
#[derive(Debug, Clone, Default)]
pub struct RouteSpecBuilder {
    handler_name: String,
    patterns: Vec<String>,
    methods: Vec<Method>,
    param_predicates: Vec<Predicate>,
    header_predicates: Vec<Predicate>,
    consumes: Vec<String>,
    produces: Vec<String>,
    version: Option<String>,
}

impl RouteSpecBuilder {
    pub fn new(handler_name: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            ..Self::default()
        }
    }

    /// Add one path pattern. At least one is required.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add one accepted HTTP method. Declaring none accepts all methods.
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        for method in methods {
            self = self.method(method);
        }
        self
    }

    /// Add a query-parameter predicate.
    pub fn param(mut self, predicate: Predicate) -> Self {
        self.param_predicates.push(predicate);
        self
    }

    /// Add a header predicate.
    pub fn header(mut self, predicate: Predicate) -> Self {
        self.header_predicates.push(predicate);
        self
    }

    /// Add a content type the handler can read.
    pub fn consumes(mut self, media: impl Into<String>) -> Self {
        self.consumes.push(media.into());
        self
    }

    /// Add a media type the handler can produce.
    pub fn produces(mut self, media: impl Into<String>) -> Self {
        self.produces.push(media.into());
        self
    }

    /// Require an API version: `"1.5"` for an exact pin, `"1.2+"` for a
    /// baseline. Not calling this leaves the route unversioned.
    pub fn version(mut self, constraint: impl Into<String>) -> Self {
        self.version = Some(constraint.into());
        self
    }

    /// Parse and validate everything collected so far.
    ///
    /// # Returns
    ///
    /// The finished spec, or the first [`RegistrationError`] encountered in
    /// declaration order.
    pub fn build(self) -> Result<RouteSpec, RegistrationError> {
        let handler = self.handler_name;
        if self.patterns.is_empty() {
            return Err(RegistrationError::EmptyPathPatterns { handler });
        }

        let mut patterns = Vec::with_capacity(self.patterns.len());
        for raw in &self.patterns {
            let pattern =
                PathPattern::parse(raw).map_err(|source| RegistrationError::InvalidPattern {
                    handler: handler.clone(),
                    source,
                })?;
            patterns.push(pattern);
        }

        let parse_ranges = |raw: &[String], handler: &str| {
            raw.iter()
                .map(|value| {
                    MediaRange::parse(value).map_err(|source| {
                        RegistrationError::InvalidMediaRange {
                            handler: handler.to_string(),
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let consumes = parse_ranges(&self.consumes, &handler)?;
        let produces = parse_ranges(&self.produces, &handler)?;

        let version = match self.version {
            Some(raw) => raw
                .parse::<VersionConstraint>()
                .map_err(|source| RegistrationError::InvalidVersion {
                    handler: handler.clone(),
                    source,
                })?,
            None => VersionConstraint::Unversioned,
        };

        Ok(RouteSpec {
            handler_name: handler,
            patterns,
            methods: self.methods,
            param_predicates: self.param_predicates,
            header_predicates: self.header_predicates,
            consumes,
            produces,
            version,
        })
    }
}

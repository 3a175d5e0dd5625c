//! Staged request resolution over an immutable route table.
//!
//! A request passes through six stages, each filtering the candidate set
//! left by the previous one: path, method, predicates, consumes, version,
//! produces. The first stage to empty the set determines the reported
//! failure, so the precedence 404 > 405 > 415 > 400 > 406 holds for every
//! combination of defects; a request that fails both the method and
//! consumes stages reports `MethodNotAllowed`, never `UnsupportedMediaType`.
//!
//! Matching is a pure function of (table, request). The matcher holds no
//! per-request state and is safe to share across threads.

use crate::router::media::{self, AcceptEntry, MediaRange};
use crate::router::path::{PathVars, PatternScore};
use crate::router::version::{
    resolve_version, ApiVersion, DeprecationInfo, DeprecationRule, VersionConstraint,
    VersionDecision,
};
use crate::router::predicate;
use crate::runtime_config::{MatcherConfig, TieBreak};
use crate::server::request::MatchRequest;
use crate::spec::RouteSpec;
use http::{Method, StatusCode};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// A fully resolved match: the winning route, the variables its pattern
/// extracted, and the media type negotiation settled on.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub route: Arc<RouteSpec>,
    /// Percent-decoded path variable bindings, in pattern order.
    pub path_variables: PathVars,
    /// Score of the pattern that matched, for diagnostics.
    pub specificity: PatternScore,
    /// The negotiated response media type.
    pub produced: MediaRange,
}

impl MatchCandidate {
    pub fn handler_name(&self) -> &str {
        &self.route.handler_name
    }

    /// Value of a path variable. When a name is bound more than once the
    /// last binding wins.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.path_variables
            .iter()
            .rfind(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert the path variables to a HashMap.
    /// Note: This allocates - use variable() in hot paths instead
    #[must_use]
    pub fn variables_map(&self) -> HashMap<String, String> {
        self.path_variables
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }
}

/// Everything `Matcher::resolve` can decide about a request.
#[derive(Debug, Clone)]
pub enum NegotiationOutcome {
    /// Exactly one route won.
    Matched(MatchCandidate),
    /// A route won, but the version it serves is marked deprecated.
    DeprecatedVersion(MatchCandidate, DeprecationInfo),
    /// No pattern matched the path, or predicates eliminated every
    /// candidate. Maps to 404.
    NoPathMatch,
    /// The path is served, but not with this method. Carries the union of
    /// allowed methods, de-duplicated in registration order. Maps to 405.
    MethodNotAllowed(Vec<Method>),
    /// No surviving route can read the request's content type. Carries the
    /// union of supported types. Maps to 415.
    UnsupportedMediaType(Vec<MediaRange>),
    /// The requested API version is malformed or served by no candidate.
    /// Maps to 400.
    UnsupportedVersion,
    /// No surviving route can produce anything the `Accept` header allows.
    /// Maps to 406.
    NotAcceptable,
    /// Two routes survived every stage with equal specificity. A table
    /// invariant escaped startup validation; maps to 500.
    AmbiguousMapping(Arc<RouteSpec>, Arc<RouteSpec>),
}

impl NegotiationOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NegotiationOutcome::Matched(_) | NegotiationOutcome::DeprecatedVersion(..) => {
                StatusCode::OK
            }
            NegotiationOutcome::NoPathMatch => StatusCode::NOT_FOUND,
            NegotiationOutcome::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            NegotiationOutcome::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            NegotiationOutcome::UnsupportedVersion => StatusCode::BAD_REQUEST,
            NegotiationOutcome::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            NegotiationOutcome::AmbiguousMapping(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The winning candidate, for both plain and deprecated matches.
    pub fn candidate(&self) -> Option<&MatchCandidate> {
        match self {
            NegotiationOutcome::Matched(c) | NegotiationOutcome::DeprecatedVersion(c, _) => {
                Some(c)
            }
            _ => None,
        }
    }

    /// `Allow` header value for a `MethodNotAllowed` outcome.
    pub fn allow_header(&self) -> Option<String> {
        match self {
            NegotiationOutcome::MethodNotAllowed(methods) => Some(
                methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }

    /// `Accept`/`Accept-Patch` header value for an `UnsupportedMediaType`
    /// outcome, listing what the surviving routes could have read.
    pub fn accept_header(&self) -> Option<String> {
        match self {
            NegotiationOutcome::UnsupportedMediaType(supported) => Some(
                supported
                    .iter()
                    .map(MediaRange::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }
}

/// One route that survived the path stage.
struct PathHit {
    route: Arc<RouteSpec>,
    vars: PathVars,
    score: PatternScore,
}

/// A path hit with its negotiated media type, entering the final ladder.
struct Scored {
    hit: PathHit,
    produced: MediaRange,
    produce_rank: u8,
}

/// The immutable matching engine, sealed from a
/// [`RouteRegistry`](crate::router::registry::RouteRegistry).
#[derive(Debug)]
pub struct Matcher {
    routes: Vec<Arc<RouteSpec>>,
    deprecations: Vec<DeprecationRule>,
    config: MatcherConfig,
}

impl Matcher {
    pub(crate) fn new(
        routes: Vec<Arc<RouteSpec>>,
        deprecations: Vec<DeprecationRule>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            routes,
            deprecations,
            config,
        }
    }

    pub fn routes(&self) -> &[Arc<RouteSpec>] {
        &self.routes
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Resolve a request to a [`NegotiationOutcome`].
    pub fn resolve(&self, request: &MatchRequest) -> NegotiationOutcome {
        let start = Instant::now();
        let outcome = self.resolve_stages(request);
        let duration_us = start.elapsed().as_micros() as u64;
        match outcome.candidate() {
            Some(candidate) => debug!(
                method = %request.method(),
                path = request.path(),
                handler_name = candidate.handler_name(),
                produced = %candidate.produced,
                duration_us,
                "route matched"
            ),
            None => debug!(
                method = %request.method(),
                path = request.path(),
                status = outcome.status_code().as_u16(),
                duration_us,
                "no route matched"
            ),
        }
        outcome
    }

    fn resolve_stages(&self, request: &MatchRequest) -> NegotiationOutcome {
        // 1: path
        let mut hits: Vec<PathHit> = Vec::new();
        for route in &self.routes {
            let mut best: Option<(PathVars, PatternScore)> = None;
            for pattern in &route.patterns {
                if let Some(vars) = pattern.matches(request.path(), self.config.trailing_slash) {
                    let score = pattern.score();
                    if best.as_ref().map_or(true, |(_, s)| score < *s) {
                        best = Some((vars, score));
                    }
                }
            }
            if let Some((vars, score)) = best {
                hits.push(PathHit {
                    route: Arc::clone(route),
                    vars,
                    score,
                });
            }
        }
        if hits.is_empty() {
            return NegotiationOutcome::NoPathMatch;
        }

        // 2: method
        let (hits, rejected): (Vec<_>, Vec<_>) = hits
            .into_iter()
            .partition(|hit| hit.route.allows_method(request.method()));
        if hits.is_empty() {
            let mut allow: Vec<Method> = Vec::new();
            for hit in &rejected {
                for method in &hit.route.methods {
                    if !allow.contains(method) {
                        allow.push(method.clone());
                    }
                }
            }
            debug!(method = %request.method(), path = request.path(), "method not allowed");
            return NegotiationOutcome::MethodNotAllowed(allow);
        }

        // 3: predicates; a miss is "no such route", not a negotiation failure
        let hits: Vec<PathHit> = hits
            .into_iter()
            .filter(|hit| {
                predicate::params_match(&hit.route.param_predicates, request)
                    && predicate::headers_match(&hit.route.header_predicates, request)
            })
            .collect();
        if hits.is_empty() {
            debug!(path = request.path(), "predicates eliminated all candidates");
            return NegotiationOutcome::NoPathMatch;
        }

        // 4: consumes. An absent content type counts as octet-stream; a
        // declared but unparseable one satisfies only unconstrained routes.
        let content_type: Option<MediaRange> = match request.content_type() {
            Some(raw) => MediaRange::parse(raw).ok(),
            None => Some(MediaRange::octet_stream()),
        };
        let (hits, rejected): (Vec<_>, Vec<_>) = hits.into_iter().partition(|hit| {
            media::consumes_match(&hit.route.consumes, content_type.as_ref())
        });
        if hits.is_empty() {
            let mut supported: Vec<MediaRange> = Vec::new();
            for hit in &rejected {
                for range in &hit.route.consumes {
                    if !supported.contains(range) {
                        supported.push(range.clone());
                    }
                }
            }
            debug!(
                path = request.path(),
                content_type = ?request.content_type(),
                "no candidate consumes the request content type"
            );
            return NegotiationOutcome::UnsupportedMediaType(supported);
        }

        // 5: version
        let requested: Option<ApiVersion> = match request.version() {
            Some(token) => match token.parse::<ApiVersion>() {
                Ok(version) => Some(version),
                Err(_) => {
                    warn!(token, path = request.path(), "malformed API version token");
                    return NegotiationOutcome::UnsupportedVersion;
                }
            },
            None => None,
        };
        let constraints: Vec<VersionConstraint> =
            hits.iter().map(|hit| hit.route.version).collect();
        let hits: Vec<PathHit> = match resolve_version(requested, &constraints) {
            VersionDecision::Unsupported => {
                debug!(
                    path = request.path(),
                    version = ?request.version(),
                    "no candidate serves the requested version"
                );
                return NegotiationOutcome::UnsupportedVersion;
            }
            VersionDecision::Matched(indices) => hits
                .into_iter()
                .enumerate()
                .filter(|(i, _)| indices.contains(i))
                .map(|(_, hit)| hit)
                .collect(),
        };

        // 6: produces and the tie-break ladder
        let mut entries = media::parse_accept(request.accept_values());
        if entries.is_empty() {
            // absent (or entirely unparseable) Accept means anything goes
            entries.push(AcceptEntry {
                range: MediaRange::any(),
                quality: 1.0,
                position: 0,
            });
        }
        media::rank_accept(&mut entries);

        let mut scored: Vec<Scored> = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some((produced, produce_rank)) = media::negotiate_produces(
                &hit.route.produces,
                &entries,
                &self.config.default_produces,
            ) {
                scored.push(Scored {
                    hit,
                    produced,
                    produce_rank,
                });
            }
        }
        if scored.is_empty() {
            debug!(path = request.path(), "no candidate satisfies the Accept header");
            return NegotiationOutcome::NotAcceptable;
        }

        let mut best = 0;
        let mut tied_with: Option<usize> = None;
        for i in 1..scored.len() {
            match preference(&scored[i], &scored[best], self.config.tie_break) {
                Ordering::Less => {
                    best = i;
                    tied_with = None;
                }
                Ordering::Equal => {
                    if tied_with.is_none() {
                        tied_with = Some(i);
                    }
                }
                Ordering::Greater => {}
            }
        }
        if let Some(other) = tied_with {
            let first = Arc::clone(&scored[best].hit.route);
            let second = Arc::clone(&scored[other].hit.route);
            error!(
                path = request.path(),
                first = %first,
                second = %second,
                "ambiguous mapping escaped registration validation"
            );
            return NegotiationOutcome::AmbiguousMapping(first, second);
        }

        let winner = scored.swap_remove(best);
        let candidate = MatchCandidate {
            route: winner.hit.route,
            path_variables: winner.hit.vars,
            specificity: winner.hit.score,
            produced: winner.produced,
        };

        let resolved = candidate.route.version.version();
        let deprecation = self.deprecations.iter().find(|rule| {
            Some(rule.version) == resolved || Some(rule.version) == requested
        });
        match deprecation {
            Some(rule) => {
                warn!(
                    handler_name = candidate.handler_name(),
                    version = %rule.version,
                    "matched a deprecated API version"
                );
                NegotiationOutcome::DeprecatedVersion(candidate, rule.info.clone())
            }
            None => NegotiationOutcome::Matched(candidate),
        }
    }
}

/// `Less` means `a` is preferred. The first two rungs are configurable;
/// predicate count is always last, and `Equal` after all rungs means the
/// pair is genuinely ambiguous.
fn preference(a: &Scored, b: &Scored, tie_break: TieBreak) -> Ordering {
    let produces = b.produce_rank.cmp(&a.produce_rank);
    let path = a.hit.score.cmp(&b.hit.score);
    let first_two = match tie_break {
        TieBreak::ProducesFirst => produces.then(path),
        TieBreak::PathFirst => path.then(produces),
    };
    first_two.then_with(|| {
        b.hit
            .route
            .predicate_count()
            .cmp(&a.hit.route.predicate_count())
    })
}

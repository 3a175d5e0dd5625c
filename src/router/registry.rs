//! Route registration and startup validation.
//!
//! A [`RouteRegistry`] is the mutable build phase of the routing table:
//! specs are registered one by one, each checked against everything already
//! accepted, and the table is then sealed into an immutable
//! [`Matcher`](crate::router::matcher::Matcher). Nothing can be added after
//! sealing; a changed table means building a new registry.

use crate::router::matcher::Matcher;
use crate::router::media::MediaRange;
use crate::router::path::PathPattern;
use crate::router::version::DeprecationRule;
use crate::runtime_config::MatcherConfig;
use crate::spec::{RegistrationError, RouteSpec};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Collects route specs and deprecation rules, rejecting ambiguous pairs.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Arc<RouteSpec>>,
    deprecations: Vec<DeprecationRule>,
    config: MatcherConfig,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register one spec.
    ///
    /// Fails with [`RegistrationError::AmbiguousMapping`] when some request
    /// could match both this spec and an already registered one with equal
    /// specificity: identical path shapes (variable names ignored),
    /// identical method and predicate sets, the same version constraint,
    /// and overlapping `consumes` and `produces`.
    pub fn register(&mut self, spec: RouteSpec) -> Result<(), RegistrationError> {
        for existing in &self.routes {
            if let Some(detail) = conflict(existing, &spec) {
                error!(
                    existing = %existing,
                    incoming = %spec,
                    detail,
                    "rejected ambiguous route registration"
                );
                return Err(RegistrationError::AmbiguousMapping {
                    existing: existing.to_string(),
                    incoming: spec.to_string(),
                    detail,
                });
            }
        }
        debug!(handler_name = %spec.handler_name, route = %spec, "route registered");
        self.routes.push(Arc::new(spec));
        Ok(())
    }

    /// Mark one API version as deprecated. Matches resolving to it still
    /// succeed; they carry the deprecation metadata.
    pub fn deprecate(&mut self, rule: DeprecationRule) {
        debug!(version = %rule.version, "version marked deprecated");
        self.deprecations.push(rule);
    }

    pub fn routes(&self) -> &[Arc<RouteSpec>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Human-readable table of everything registered, one route per line.
    pub fn dump_routes(&self) -> String {
        let mut out = String::new();
        for route in &self.routes {
            out.push_str(&format!("{}\n", route));
        }
        for rule in &self.deprecations {
            out.push_str(&format!("deprecated: {}", rule.version));
            if let Some(sunset) = &rule.info.sunset {
                out.push_str(&format!(" (sunset {})", sunset));
            }
            out.push('\n');
        }
        out
    }

    /// Seal the table into an immutable matcher.
    pub fn into_matcher(self) -> Matcher {
        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|route| route.to_string())
            .collect();
        info!(
            route_count = self.routes.len(),
            deprecation_count = self.deprecations.len(),
            routes_summary = ?routes_summary,
            "routing table sealed"
        );
        Matcher::new(self.routes, self.deprecations, self.config)
    }
}

/// The reason two specs are ambiguous, or `None` when they can coexist.
fn conflict(a: &RouteSpec, b: &RouteSpec) -> Option<String> {
    if !patterns_equivalent(&a.patterns, &b.patterns) {
        return None;
    }
    if !set_equal(&a.methods, &b.methods) {
        return None;
    }
    if !set_equal(&a.param_predicates, &b.param_predicates)
        || !set_equal(&a.header_predicates, &b.header_predicates)
    {
        return None;
    }
    // exact(v) and baseline(v) may share a version: the exact pin always
    // supersedes the baseline at resolution time
    if a.version != b.version {
        return None;
    }
    if !ranges_overlap(&a.consumes, &b.consumes) || !ranges_overlap(&a.produces, &b.produces) {
        return None;
    }
    Some(
        "identical path shape, methods, predicates and version with overlapping media types"
            .to_string(),
    )
}

fn patterns_equivalent(a: &[PathPattern], b: &[PathPattern]) -> bool {
    a.iter().all(|p| b.iter().any(|q| p.same_shape(q)))
        && b.iter().all(|p| a.iter().any(|q| p.same_shape(q)))
}

fn set_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

/// Empty sets are unconstrained and overlap everything.
fn ranges_overlap(a: &[MediaRange], b: &[MediaRange]) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.iter().any(|x| b.iter().any(|y| x.compatible_with(y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Predicate;
    use http::Method;

    fn get_pets(handler: &str) -> RouteSpec {
        RouteSpec::builder(handler)
            .pattern("/pets/{id}")
            .method(Method::GET)
            .produces("application/json")
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_seal() {
        let mut registry = RouteRegistry::new();
        registry.register(get_pets("get_pet")).unwrap();
        assert_eq!(registry.len(), 1);
        let matcher = registry.into_matcher();
        assert_eq!(matcher.routes().len(), 1);
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let mut registry = RouteRegistry::new();
        registry.register(get_pets("get_pet")).unwrap();
        let err = registry.register(get_pets("get_pet_again")).unwrap_err();
        match err {
            RegistrationError::AmbiguousMapping { existing, incoming, .. } => {
                assert!(existing.contains("get_pet"));
                assert!(incoming.contains("get_pet_again"));
            }
            other => panic!("expected AmbiguousMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_name_does_not_disambiguate() {
        let mut registry = RouteRegistry::new();
        registry.register(get_pets("a")).unwrap();
        let clash = RouteSpec::builder("b")
            .pattern("/pets/{petId}")
            .method(Method::GET)
            .produces("application/json")
            .build()
            .unwrap();
        assert!(registry.register(clash).is_err());
    }

    #[test]
    fn test_disjoint_predicates_coexist() {
        let mut registry = RouteRegistry::new();
        let dogs = RouteSpec::builder("dogs")
            .pattern("/pets")
            .method(Method::GET)
            .param(Predicate::equals("kind", "dog"))
            .build()
            .unwrap();
        let cats = RouteSpec::builder("cats")
            .pattern("/pets")
            .method(Method::GET)
            .param(Predicate::equals("kind", "cat"))
            .build()
            .unwrap();
        registry.register(dogs).unwrap();
        registry.register(cats).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_different_methods_coexist() {
        let mut registry = RouteRegistry::new();
        let get = RouteSpec::builder("get").pattern("/pets").method(Method::GET);
        let post = RouteSpec::builder("post").pattern("/pets").method(Method::POST);
        registry.register(get.build().unwrap()).unwrap();
        registry.register(post.build().unwrap()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_exact_and_baseline_at_same_version_coexist() {
        let mut registry = RouteRegistry::new();
        let pinned = RouteSpec::builder("pinned")
            .pattern("/pets")
            .method(Method::GET)
            .version("1.2")
            .build()
            .unwrap();
        let floating = RouteSpec::builder("floating")
            .pattern("/pets")
            .method(Method::GET)
            .version("1.2+")
            .build()
            .unwrap();
        registry.register(pinned).unwrap();
        registry.register(floating).unwrap();
    }

    #[test]
    fn test_disjoint_media_types_coexist() {
        let mut registry = RouteRegistry::new();
        let json = RouteSpec::builder("json")
            .pattern("/import")
            .method(Method::POST)
            .consumes("application/json")
            .build()
            .unwrap();
        let csv = RouteSpec::builder("csv")
            .pattern("/import")
            .method(Method::POST)
            .consumes("text/csv")
            .build()
            .unwrap();
        registry.register(json).unwrap();
        registry.register(csv).unwrap();
    }

    #[test]
    fn test_wildcard_consumes_overlaps() {
        let mut registry = RouteRegistry::new();
        let any = RouteSpec::builder("any")
            .pattern("/import")
            .method(Method::POST)
            .consumes("*/*")
            .build()
            .unwrap();
        let json = RouteSpec::builder("json")
            .pattern("/import")
            .method(Method::POST)
            .consumes("application/json")
            .build()
            .unwrap();
        registry.register(any).unwrap();
        assert!(registry.register(json).is_err());
    }

    #[test]
    fn test_dump_routes() {
        let mut registry = RouteRegistry::new();
        registry.register(get_pets("get_pet")).unwrap();
        registry.deprecate(DeprecationRule {
            version: "1.0".parse().unwrap(),
            info: crate::router::version::DeprecationInfo {
                link: None,
                sunset: Some("2026-12-31".to_string()),
            },
        });
        let dump = registry.dump_routes();
        assert!(dump.contains("GET /pets/{id} -> get_pet"));
        assert!(dump.contains("deprecated: 1.0 (sunset 2026-12-31)"));
    }
}

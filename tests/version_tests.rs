#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use wayfinder::router::version::{ApiVersion, DeprecationInfo, DeprecationRule};
use wayfinder::router::{Matcher, NegotiationOutcome, RouteRegistry};
use wayfinder::server::{MatchRequest, VersionSource};
use wayfinder::spec::RouteSpec;

/// One path served by an unversioned handler, a baseline and an exact pin.
fn versioned_table() -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    registry
        .register(
            RouteSpec::builder("legacy")
                .pattern("/api/items")
                .method(Method::GET)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            RouteSpec::builder("baseline_1_2")
                .pattern("/api/items")
                .method(Method::GET)
                .version("1.2+")
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            RouteSpec::builder("pinned_1_5")
                .pattern("/api/items")
                .method(Method::GET)
                .version("1.5")
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

fn resolve_version_token(matcher: &Matcher, token: Option<&str>) -> NegotiationOutcome {
    let mut request = MatchRequest::new(Method::GET, "/api/items");
    if let Some(token) = token {
        request = request.with_version(token);
    }
    matcher.resolve(&request)
}

fn handler_of(outcome: &NegotiationOutcome) -> &str {
    outcome
        .candidate()
        .unwrap_or_else(|| panic!("expected a match, got {:?}", outcome))
        .handler_name()
}

#[test]
fn test_unversioned_request_takes_unversioned_route() {
    let matcher = versioned_table().into_matcher();
    let outcome = resolve_version_token(&matcher, None);
    assert_eq!(handler_of(&outcome), "legacy");
}

#[test]
fn test_request_below_floor_falls_back_to_unversioned() {
    let matcher = versioned_table().into_matcher();
    let outcome = resolve_version_token(&matcher, Some("1.0"));
    assert_eq!(handler_of(&outcome), "legacy");
}

#[test]
fn test_baseline_serves_floor_and_above() {
    let matcher = versioned_table().into_matcher();
    for token in ["1.2", "1.3", "1.4"] {
        let outcome = resolve_version_token(&matcher, Some(token));
        assert_eq!(handler_of(&outcome), "baseline_1_2", "for version {}", token);
    }
}

#[test]
fn test_exact_pin_supersedes_baseline_at_its_version() {
    let matcher = versioned_table().into_matcher();
    let outcome = resolve_version_token(&matcher, Some("1.5"));
    assert_eq!(handler_of(&outcome), "pinned_1_5");
}

#[test]
fn test_request_above_exact_ceiling_is_unsupported() {
    let matcher = versioned_table().into_matcher();
    let outcome = resolve_version_token(&matcher, Some("1.6"));
    assert!(matches!(outcome, NegotiationOutcome::UnsupportedVersion));
    assert_eq!(outcome.status_code().as_u16(), 400);
}

#[test]
fn test_malformed_version_token_is_unsupported() {
    let matcher = versioned_table().into_matcher();
    for token in ["abc", "1.2.3", "v1", ""] {
        let outcome = resolve_version_token(&matcher, Some(token));
        assert!(
            matches!(outcome, NegotiationOutcome::UnsupportedVersion),
            "token '{}' should be rejected, got {:?}",
            token,
            outcome
        );
    }
}

#[test]
fn test_method_failure_reported_before_version_failure() {
    let matcher = versioned_table().into_matcher();
    let request = MatchRequest::new(Method::POST, "/api/items").with_version("garbage");
    let outcome = matcher.resolve(&request);
    assert!(matches!(outcome, NegotiationOutcome::MethodNotAllowed(_)));
}

#[test]
fn test_versioned_request_against_unversioned_table() {
    let mut registry = RouteRegistry::new();
    registry
        .register(
            RouteSpec::builder("only")
                .pattern("/plain")
                .method(Method::GET)
                .build()
                .unwrap(),
        )
        .unwrap();
    let matcher = registry.into_matcher();

    // no versioned routes registered at all: any well-formed version is
    // served by the unversioned handler
    let outcome = matcher.resolve(&MatchRequest::new(Method::GET, "/plain").with_version("7.0"));
    assert_eq!(handler_of(&outcome), "only");
}

#[test]
fn test_deprecated_resolved_version_carries_metadata() {
    let mut registry = versioned_table();
    registry.deprecate(DeprecationRule {
        version: ApiVersion::new(1, 2),
        info: DeprecationInfo {
            link: Some("https://api.example.com/deprecations/1.2".to_string()),
            sunset: Some("Tue, 01 Dec 2026 00:00:00 GMT".to_string()),
        },
    });
    let matcher = registry.into_matcher();

    // 1.3 resolves to the 1.2 baseline, which is the deprecated version
    let outcome = resolve_version_token(&matcher, Some("1.3"));
    match &outcome {
        NegotiationOutcome::DeprecatedVersion(candidate, info) => {
            assert_eq!(candidate.handler_name(), "baseline_1_2");
            let headers = info.headers();
            assert_eq!(headers[0], ("Deprecation", "true".to_string()));
            assert!(headers.iter().any(|(name, _)| *name == "Sunset"));
        }
        other => panic!("expected DeprecatedVersion, got {:?}", other),
    }
    assert_eq!(outcome.status_code().as_u16(), 200);
}

#[test]
fn test_deprecated_requested_version_carries_metadata() {
    let mut registry = versioned_table();
    registry.deprecate(DeprecationRule {
        version: ApiVersion::new(1, 3),
        info: DeprecationInfo::default(),
    });
    let matcher = registry.into_matcher();

    // the route resolves through the 1.2 baseline, but the requested
    // version itself is the deprecated one
    let outcome = resolve_version_token(&matcher, Some("1.3"));
    assert!(matches!(
        outcome,
        NegotiationOutcome::DeprecatedVersion(..)
    ));
    // deprecation never changes which route wins
    assert_eq!(handler_of(&outcome), "baseline_1_2");

    // a neighboring version resolving through the same baseline is clean
    let outcome = resolve_version_token(&matcher, Some("1.4"));
    assert!(matches!(outcome, NegotiationOutcome::Matched(_)));
}

#[test]
fn test_version_extracted_from_configured_sources() {
    let matcher = versioned_table().into_matcher();

    let from_header = MatchRequest::new(Method::GET, "/api/items")
        .with_header("X-API-Version", "1.5")
        .extract_version(&VersionSource::default());
    assert_eq!(handler_of(&matcher.resolve(&from_header)), "pinned_1_5");

    let from_query = MatchRequest::from_target(Method::GET, "/api/items?api-version=1.2")
        .extract_version(&VersionSource::Query("api-version".to_string()));
    assert_eq!(handler_of(&matcher.resolve(&from_query)), "baseline_1_2");

    let from_media_param = MatchRequest::new(Method::GET, "/api/items")
        .with_header("content-type", "application/json;version=1.5")
        .extract_version(&VersionSource::MediaTypeParam("version".to_string()));
    assert_eq!(handler_of(&matcher.resolve(&from_media_param)), "pinned_1_5");
}

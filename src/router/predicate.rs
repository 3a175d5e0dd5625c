//! Predicate evaluation against a request.
//!
//! A route's predicates are a conjunction: every one must hold. Query
//! parameters compare plainly and case-sensitively against their first
//! value. Headers do too, except the media-typed ones (`Content-Type`,
//! `Accept`) whose equality compares the parsed primary token, ignoring
//! parameters unless the predicate itself supplies some.

use crate::router::media::MediaRange;
use crate::server::request::MatchRequest;
use crate::spec::Predicate;

/// Evaluate query-parameter predicates.
pub fn params_match(predicates: &[Predicate], request: &MatchRequest) -> bool {
    predicates
        .iter()
        .all(|p| eval(p, request.query_first(p.name()), false))
}

/// Evaluate header predicates.
pub fn headers_match(predicates: &[Predicate], request: &MatchRequest) -> bool {
    predicates.iter().all(|p| {
        let structured = is_media_typed(p.name());
        eval(p, request.header_first(p.name()), structured)
    })
}

fn is_media_typed(header: &str) -> bool {
    header.eq_ignore_ascii_case("content-type") || header.eq_ignore_ascii_case("accept")
}

fn eval(predicate: &Predicate, first: Option<&str>, structured: bool) -> bool {
    match predicate {
        Predicate::Present { .. } => first.is_some(),
        Predicate::Absent { .. } => first.is_none(),
        Predicate::Equals { value, .. } => match first {
            Some(actual) => values_equal(actual, value, structured),
            None => false,
        },
        // absent counts as "not equal"
        Predicate::NotEquals { value, .. } => match first {
            Some(actual) => !values_equal(actual, value, structured),
            None => true,
        },
    }
}

fn values_equal(actual: &str, expected: &str, structured: bool) -> bool {
    if structured {
        let token = actual.split(',').next().unwrap_or(actual);
        if let (Ok(actual), Ok(expected)) = (MediaRange::parse(token), MediaRange::parse(expected))
        {
            return expected.token_equals(&actual);
        }
    }
    actual == expected
}

//! Transport-neutral request view consumed by the matcher.
//!
//! The matching core never sees a socket or an HTTP framework type. An
//! adapter builds a [`MatchRequest`] from whatever transport it fronts,
//! optionally pulls the API version token out of the request with
//! [`MatchRequest::extract_version`], and hands it to the matcher.

use crate::router::media::MediaRange;
use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// Where the API version token travels in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// A request header, e.g. `X-API-Version`.
    Header(String),
    /// A query parameter, e.g. `api-version`.
    Query(String),
    /// A parameter of the `Content-Type` header, e.g.
    /// `application/json;version=1.2`.
    MediaTypeParam(String),
}

impl Default for VersionSource {
    fn default() -> Self {
        VersionSource::Header("x-api-version".to_string())
    }
}

/// The facts about one request that matching looks at.
///
/// Header names are stored lowercase; lookups are case-insensitive. Query
/// parameters and headers are multimaps, preserving repeated values in
/// arrival order. The version token stays an uninterpreted string here;
/// parsing it is the matcher's job so that a malformed token surfaces as a
/// negotiation outcome rather than an adapter error.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    method: Method,
    path: String,
    query: HashMap<String, Vec<String>>,
    headers: HashMap<String, Vec<String>>,
    version: Option<String>,
}

impl MatchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            version: None,
        }
    }

    /// Build a request from a raw target such as `/pets/42?limit=10&tag=a`,
    /// splitting off and decoding the query string.
    pub fn from_target(method: Method, target: &str) -> Self {
        let (path, query_str) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let mut request = Self::new(method, path);
        if let Some(query_str) = query_str {
            for (name, value) in url::form_urlencoded::parse(query_str.as_bytes()) {
                request
                    .query
                    .entry(name.to_string())
                    .or_default()
                    .push(value.to_string());
            }
            debug!(
                path = %request.path,
                param_count = request.query.len(),
                "query string parsed"
            );
        }
        request
    }

    /// Add one query parameter value. Repeats accumulate.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Add one header value. Names are lowercased; repeats accumulate.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into().to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// Set the API version token directly.
    pub fn with_version(mut self, token: impl Into<String>) -> Self {
        self.version = Some(token.into());
        self
    }

    /// Pull the version token from the configured source. A token already
    /// set explicitly is kept when the source yields nothing.
    pub fn extract_version(mut self, source: &VersionSource) -> Self {
        let found = match source {
            VersionSource::Header(name) => self.header_first(name).map(str::to_string),
            VersionSource::Query(name) => self.query_first(name).map(str::to_string),
            VersionSource::MediaTypeParam(name) => self
                .content_type()
                .and_then(|ct| MediaRange::parse(ct).ok())
                .and_then(|ct| ct.param(name).map(str::to_string)),
        };
        if found.is_some() {
            self.version = found;
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn query_values(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn query_first(&self, name: &str) -> Option<&str> {
        self.query_values(name).first().map(String::as_str)
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.query.contains_key(name)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn header_first(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// First `Content-Type` value, verbatim.
    pub fn content_type(&self) -> Option<&str> {
        self.header_first("content-type")
    }

    /// All `Accept` header occurrences, in arrival order.
    pub fn accept_values(&self) -> impl Iterator<Item = &str> {
        self.header_values("accept").iter().map(String::as_str)
    }
}

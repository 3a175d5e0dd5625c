//! Media-type patterns and content negotiation.
//!
//! This module implements both halves of media negotiation for the matcher:
//!
//! - **consumes**: is the request's declared content type acceptable to a
//!   route? (`consumes_match`)
//! - **produces**: which of a route's producible types best satisfies the
//!   request's `Accept` header, honoring quality weights, wildcards and
//!   specificity ordering? (`negotiate_produces`)
//!
//! A [`MediaRange`] is the parsed form of a media-type pattern such as
//! `application/json`, `text/*` or `*/*`, optionally carrying parameters
//! (`text/plain;charset=utf-8`). The `q` weight is not a parameter of the
//! range; it belongs to an [`AcceptEntry`].

use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::fmt;

static ANY: Lazy<MediaRange> = Lazy::new(|| MediaRange::new("*", "*"));
static OCTET_STREAM: Lazy<MediaRange> = Lazy::new(|| MediaRange::new("application", "octet-stream"));

/// Produces rank for a route that declares no `produces` at all.
/// Declared types, even `*/*`, always rank above it.
pub const RANK_UNCONSTRAINED: u8 = 0;

/// A parsed media-type pattern: `type/subtype` plus optional parameters.
///
/// `*` is allowed as the subtype wildcard (`text/*`) or for both components
/// (`*/*`). A wildcard type with a concrete subtype (`*/json`) is rejected.
/// Type, subtype and parameter names are normalized to lowercase at parse
/// time; parameter values keep their case with surrounding quotes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    main_type: String,
    subtype: String,
    params: Vec<(String, String)>,
}

/// Error raised when a media-type pattern cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The pattern was empty or whitespace.
    Empty,
    /// The pattern had no `/` separating type and subtype.
    MissingSlash(String),
    /// A wildcard type was combined with a concrete subtype (`*/json`).
    WildcardType(String),
}

impl fmt::Display for MediaTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaTypeError::Empty => write!(f, "media type is empty"),
            MediaTypeError::MissingSlash(v) => {
                write!(f, "media type '{}' is missing a '/' between type and subtype", v)
            }
            MediaTypeError::WildcardType(v) => {
                write!(
                    f,
                    "media type '{}' uses a wildcard type with a concrete subtype; only '*/*' or 'type/*' are valid",
                    v
                )
            }
        }
    }
}

impl std::error::Error for MediaTypeError {}

impl MediaRange {
    /// Build a range from already-normalized components. No validation;
    /// intended for constants and tests. Use [`MediaRange::parse`] for input.
    pub fn new(main_type: &str, subtype: &str) -> Self {
        Self {
            main_type: main_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    /// The full wildcard range `*/*`.
    pub fn any() -> Self {
        ANY.clone()
    }

    /// `application/octet-stream`, the assumed type of a body with no
    /// declared content type.
    pub fn octet_stream() -> Self {
        OCTET_STREAM.clone()
    }

    /// Parse a media-type pattern such as `text/html;charset=utf-8`.
    ///
    /// A bare `*` is accepted as legacy spelling of `*/*`. Malformed
    /// parameters (no `=`) are skipped rather than rejected; negotiation
    /// input is frequently sloppy and a dropped parameter is the safer
    /// reading.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        let mut parts = input.split(';');
        let token = parts.next().unwrap_or("").trim();
        if token.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let (main_type, subtype) = if token == "*" {
            ("*".to_string(), "*".to_string())
        } else {
            match token.split_once('/') {
                Some((t, s)) if !t.trim().is_empty() && !s.trim().is_empty() => (
                    t.trim().to_ascii_lowercase(),
                    s.trim().to_ascii_lowercase(),
                ),
                _ => return Err(MediaTypeError::MissingSlash(input.trim().to_string())),
            }
        };

        if main_type == "*" && subtype != "*" {
            return Err(MediaTypeError::WildcardType(input.trim().to_string()));
        }

        let mut params = Vec::new();
        for raw in parts {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            if let Some((name, value)) = raw.split_once('=') {
                params.push((
                    name.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                ));
            }
        }

        Ok(Self {
            main_type,
            subtype,
            params,
        })
    }

    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of the named parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Remove and return the named parameter. Used by `Accept` parsing to
    /// lift `q` out of the range.
    fn take_param(&mut self, name: &str) -> Option<String> {
        let idx = self.params.iter().position(|(n, _)| n == name)?;
        Some(self.params.remove(idx).1)
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.main_type == "*"
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.subtype == "*"
    }

    /// True when neither component is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    /// Specificity class: 2 = exact, 1 = subtype wildcard, 0 = full wildcard.
    pub fn specificity(&self) -> u8 {
        if self.is_wildcard_type() {
            0
        } else if self.is_wildcard_subtype() {
            1
        } else {
            2
        }
    }

    /// Symmetric wildcard-tolerant compatibility, ignoring parameters.
    ///
    /// `text/*` is compatible with `text/html`; `*/*` with anything;
    /// `text/html` is not compatible with `application/json`.
    pub fn compatible_with(&self, other: &MediaRange) -> bool {
        let type_ok = self.is_wildcard_type()
            || other.is_wildcard_type()
            || self.main_type == other.main_type;
        let subtype_ok = self.is_wildcard_subtype()
            || other.is_wildcard_subtype()
            || self.subtype == other.subtype;
        type_ok && subtype_ok
    }

    /// Pattern-side acceptance used by `consumes`: type/subtype compatible
    /// (wildcards allowed on either side) and every parameter declared on
    /// the pattern present with an equal value on the declared type.
    pub fn accepts(&self, declared: &MediaRange) -> bool {
        if !self.compatible_with(declared) {
            return false;
        }
        self.params
            .iter()
            .all(|(name, value)| declared.param(name) == Some(value.as_str()))
    }

    /// Structured equality for header predicates: type and subtype equal
    /// (no wildcard semantics), parameters ignored unless this side carries
    /// some, in which case each must be present and equal on `other`.
    pub fn token_equals(&self, other: &MediaRange) -> bool {
        if self.main_type != other.main_type || self.subtype != other.subtype {
            return false;
        }
        self.params
            .iter()
            .all(|(name, value)| other.param(name) == Some(value.as_str()))
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for MediaRange {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaRange::parse(s)
    }
}

/// One entry of a parsed `Accept` header: a media range plus its quality
/// weight and position within the header.
#[derive(Debug, Clone)]
pub struct AcceptEntry {
    pub range: MediaRange,
    pub quality: f32,
    pub position: usize,
}

/// Parse `Accept` header values into entries.
///
/// Multiple header occurrences are concatenated in order. Entries that fail
/// to parse are skipped. The `q` parameter (default 1.0, clamped to
/// `[0.0, 1.0]`) is lifted off the range.
pub fn parse_accept<'a, I>(values: I) -> Vec<AcceptEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = Vec::new();
    for value in values {
        for piece in value.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let mut range = match MediaRange::parse(piece) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let quality = range
                .take_param("q")
                .and_then(|q| q.parse::<f32>().ok())
                .map(|q| q.clamp(0.0, 1.0))
                .unwrap_or(1.0);
            entries.push(AcceptEntry {
                range,
                quality,
                position: entries.len(),
            });
        }
    }
    entries
}

/// Order `Accept` entries for negotiation: quality descending, then
/// specificity descending, then header position.
pub fn rank_accept(entries: &mut [AcceptEntry]) {
    entries.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.range.specificity().cmp(&a.range.specificity()))
            .then_with(|| a.position.cmp(&b.position))
    });
}

/// Does the request's declared content type satisfy a route's `consumes`?
///
/// An empty `consumes` set accepts anything. `content_type` is `Some` for a
/// parseable (or assumed `application/octet-stream`) type and `None` for a
/// declared-but-unparseable one, which no non-empty pattern set accepts.
pub fn consumes_match(consumes: &[MediaRange], content_type: Option<&MediaRange>) -> bool {
    if consumes.is_empty() {
        return true;
    }
    match content_type {
        Some(ct) => consumes.iter().any(|pattern| pattern.accepts(ct)),
        None => false,
    }
}

/// Negotiate the produced media type for one route.
///
/// `entries` must already be ranked by [`rank_accept`]. Walks the accept
/// entries from most to least preferred, skipping zero-quality ones; the
/// first entry compatible with any producible type wins, and among the
/// producible types compatible with it the most specific is chosen,
/// declaration order breaking ties. Returns the chosen type and its
/// specificity rank for cross-route tie-breaking, or `None` when nothing is
/// compatible.
///
/// A route with no declared `produces` satisfies any `Accept`; it yields the
/// configured default type at [`RANK_UNCONSTRAINED`].
pub fn negotiate_produces(
    produces: &[MediaRange],
    entries: &[AcceptEntry],
    default_produced: &MediaRange,
) -> Option<(MediaRange, u8)> {
    if produces.is_empty() {
        return Some((default_produced.clone(), RANK_UNCONSTRAINED));
    }

    for entry in entries {
        if entry.quality <= 0.0 {
            continue;
        }
        let best = produces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.compatible_with(&entry.range))
            .max_by(|(ai, a), (bi, b)| {
                a.specificity()
                    .cmp(&b.specificity())
                    .then_with(|| bi.cmp(ai))
            });
        if let Some((_, pattern)) = best {
            let chosen = concretize(pattern, &entry.range);
            return Some((chosen, pattern.specificity() + 1));
        }
    }
    None
}

/// Resolve a producible pattern against the accept range it matched,
/// replacing wildcard components with the concrete side where possible.
fn concretize(pattern: &MediaRange, accepted: &MediaRange) -> MediaRange {
    if pattern.is_concrete() {
        return pattern.clone();
    }
    let main_type = if pattern.is_wildcard_type() && !accepted.is_wildcard_type() {
        accepted.main_type()
    } else {
        pattern.main_type()
    };
    let subtype = if pattern.is_wildcard_subtype() && !accepted.is_wildcard_subtype() {
        accepted.subtype()
    } else {
        pattern.subtype()
    };
    MediaRange::new(main_type, subtype)
}

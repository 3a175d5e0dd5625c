//! Path pattern parsing and segment matching.
//!
//! Patterns are split into segments at `/` and matched segment-by-segment
//! with no backtracking and no regular expressions:
//!
//! - a literal segment matches itself exactly (case-sensitive),
//! - `{name}` matches any single non-empty segment and binds it,
//! - `*` matches any single non-empty segment without binding,
//! - a trailing `*` or `**` matches all remaining segments (including none).
//!
//! `**` anywhere but the final segment is a parse error. Variable values are
//! percent-decoded on extraction; [`PathPattern::expand`] re-encodes them.

use crate::runtime_config::TrailingSlash;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Most patterns bind only a handful of variables; keep them inline.
pub const MAX_INLINE_VARS: usize = 8;

/// Variable bindings extracted by a successful match, in pattern order.
/// Lookups scan from the back so later bindings shadow earlier ones.
pub type PathVars = SmallVec<[(Arc<str>, String); MAX_INLINE_VARS]>;

/// Error raised when a path pattern cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern was empty.
    Empty,
    /// The pattern did not start with `/`.
    MissingLeadingSlash(String),
    /// The pattern contained an empty segment (`//`).
    EmptySegment(String),
    /// A variable segment had no name (`{}`).
    EmptyVariable(String),
    /// `**` appeared before the final segment.
    CatchAllPosition(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "path pattern is empty"),
            PatternError::MissingLeadingSlash(p) => {
                write!(f, "path pattern '{}' must start with '/'", p)
            }
            PatternError::EmptySegment(p) => {
                write!(f, "path pattern '{}' contains an empty segment", p)
            }
            PatternError::EmptyVariable(p) => {
                write!(f, "path pattern '{}' contains a variable with no name", p)
            }
            PatternError::CatchAllPosition(p) => {
                write!(f, "path pattern '{}' uses '**' before the final segment", p)
            }
        }
    }
}

impl std::error::Error for PatternError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(Arc<str>),
    Wildcard,
    CatchAll,
}

/// Static specificity of a pattern, compared without looking at any request.
///
/// `Ord` is arranged so that **smaller sorts first and means more specific**:
/// fewer catch-alls, then fewer single-segment wildcards, then fewer
/// variables, then the longer total literal length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternScore {
    pub catch_alls: u8,
    pub wildcards: u16,
    pub variables: u16,
    pub literal_len: u32,
}

impl Ord for PatternScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.catch_alls
            .cmp(&other.catch_alls)
            .then_with(|| self.wildcards.cmp(&other.wildcards))
            .then_with(|| self.variables.cmp(&other.variables))
            .then_with(|| other.literal_len.cmp(&self.literal_len))
    }
}

impl PartialOrd for PatternScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed path pattern plus its precomputed specificity score.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
    score: PatternScore,
}

impl PathPattern {
    /// Parse a pattern such as `/pets/{petId}/photos/**`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let Some(inner) = raw.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        };
        let trailing_slash = raw.len() > 1 && raw.ends_with('/');
        let inner = if trailing_slash {
            &inner[..inner.len() - 1]
        } else {
            inner
        };

        let mut segments = Vec::new();
        if !inner.is_empty() {
            let pieces: Vec<&str> = inner.split('/').collect();
            let last = pieces.len() - 1;
            for (i, piece) in pieces.iter().enumerate() {
                let segment = match *piece {
                    "" => return Err(PatternError::EmptySegment(raw.to_string())),
                    "**" if i == last => Segment::CatchAll,
                    "**" => return Err(PatternError::CatchAllPosition(raw.to_string())),
                    "*" if i == last => Segment::CatchAll,
                    "*" => Segment::Wildcard,
                    other => match other.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                        Some("") => return Err(PatternError::EmptyVariable(raw.to_string())),
                        Some(name) => Segment::Variable(Arc::from(name)),
                        None => Segment::Literal(other.to_string()),
                    },
                };
                segments.push(segment);
            }
        }

        let score = score_of(&segments);
        Ok(Self {
            raw: raw.to_string(),
            segments,
            trailing_slash,
            score,
        })
    }

    /// The pattern exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn score(&self) -> PatternScore {
        self.score
    }

    pub fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll))
    }

    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// Variable names in pattern order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_ref()),
            _ => None,
        })
    }

    /// Match a concrete request path against this pattern.
    ///
    /// Returns the extracted (percent-decoded) variable bindings on success.
    /// Under [`TrailingSlash::Strict`] the presence of a trailing slash must
    /// agree between path and pattern; a catch-all absorbs the difference.
    pub fn matches(&self, path: &str, trailing: TrailingSlash) -> Option<PathVars> {
        let Some(inner) = path.strip_prefix('/') else {
            return None;
        };
        let path_trailing = path.len() > 1 && path.ends_with('/');
        let inner = if path_trailing {
            &inner[..inner.len() - 1]
        } else {
            inner
        };
        let parts: Vec<&str> = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split('/').collect()
        };

        let has_catch_all = self.has_catch_all();
        if matches!(trailing, TrailingSlash::Strict)
            && !has_catch_all
            && path_trailing != self.trailing_slash
        {
            return None;
        }

        if has_catch_all {
            // the catch-all itself may consume zero segments
            if parts.len() + 1 < self.segments.len() {
                return None;
            }
        } else if parts.len() != self.segments.len() {
            return None;
        }

        let mut vars = PathVars::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll => break,
                Segment::Literal(lit) => {
                    if parts[i] != lit {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    if parts[i].is_empty() {
                        return None;
                    }
                    vars.push((Arc::clone(name), decode_segment(parts[i])));
                }
                Segment::Wildcard => {
                    if parts[i].is_empty() {
                        return None;
                    }
                }
            }
        }
        Some(vars)
    }

    /// Rebuild a concrete path from this pattern and a set of variable
    /// values, percent-encoding each value. Returns `None` when the pattern
    /// contains wildcard segments or a variable has no binding.
    pub fn expand(&self, vars: &PathVars) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Variable(name) => {
                    let (_, value) = vars.iter().rev().find(|(n, _)| n == name)?;
                    out.push_str(&urlencoding::encode(value));
                }
                Segment::Wildcard | Segment::CatchAll => return None,
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        if self.trailing_slash {
            out.push('/');
        }
        Some(out)
    }

    /// Structural equivalence ignoring variable names: `/pets/{id}` and
    /// `/pets/{petId}` have the same shape and admit exactly the same paths.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.trailing_slash == other.trailing_slash
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Variable(_), Segment::Variable(_)) => true,
                    (Segment::Wildcard, Segment::Wildcard) => true,
                    (Segment::CatchAll, Segment::CatchAll) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathPattern::parse(s)
    }
}

fn score_of(segments: &[Segment]) -> PatternScore {
    let mut score = PatternScore {
        catch_alls: 0,
        wildcards: 0,
        variables: 0,
        literal_len: 0,
    };
    for segment in segments {
        match segment {
            Segment::CatchAll => score.catch_alls += 1,
            Segment::Wildcard => score.wildcards += 1,
            Segment::Variable(_) => score.variables += 1,
            Segment::Literal(lit) => score.literal_len += lit.len() as u32,
        }
    }
    score
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(value) => value.into_owned(),
        Err(_) => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(raw: &str) -> PathPattern {
        PathPattern::parse(raw).unwrap()
    }

    #[test]
    fn test_literal_match() {
        let p = pat("/pets/dogs");
        assert!(p.matches("/pets/dogs", TrailingSlash::Strict).is_some());
        assert!(p.matches("/pets/cats", TrailingSlash::Strict).is_none());
        assert!(p.matches("/pets", TrailingSlash::Strict).is_none());
        assert!(p.matches("/pets/dogs/1", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_root_pattern() {
        let p = pat("/");
        assert!(p.matches("/", TrailingSlash::Strict).is_some());
        assert!(p.matches("/pets", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_variable_binding() {
        let p = pat("/pets/{petId}/photos/{photoId}");
        let vars = p.matches("/pets/42/photos/7", TrailingSlash::Strict).unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].0.as_ref(), "petId");
        assert_eq!(vars[0].1, "42");
        assert_eq!(vars[1].1, "7");
    }

    #[test]
    fn test_variable_rejects_empty_segment() {
        let p = pat("/pets/{id}/x");
        assert!(p.matches("/pets//x", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_variable_percent_decoding() {
        let p = pat("/files/{name}");
        let vars = p.matches("/files/a%20b%2Fc", TrailingSlash::Strict).unwrap();
        assert_eq!(vars[0].1, "a b/c");
    }

    #[test]
    fn test_single_wildcard() {
        let p = pat("/a/*/c");
        assert!(p.matches("/a/b/c", TrailingSlash::Strict).is_some());
        assert!(p.matches("/a/x/c", TrailingSlash::Strict).is_some());
        assert!(p.matches("/a/c", TrailingSlash::Strict).is_none());
        assert!(p.matches("/a/b/b/c", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_catch_all_consumes_rest() {
        let p = pat("/files/**");
        assert!(p.matches("/files", TrailingSlash::Strict).is_some());
        assert!(p.matches("/files/a", TrailingSlash::Strict).is_some());
        assert!(p.matches("/files/a/b/c", TrailingSlash::Strict).is_some());
        assert!(p.matches("/other/a", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_trailing_star_is_catch_all() {
        let p = pat("/files/*");
        assert!(p.matches("/files/a/b", TrailingSlash::Strict).is_some());
        assert!(p.matches("/files", TrailingSlash::Strict).is_some());
    }

    #[test]
    fn test_catch_all_mid_pattern_rejected() {
        assert!(matches!(
            PathPattern::parse("/a/**/b"),
            Err(PatternError::CatchAllPosition(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(PathPattern::parse(""), Err(PatternError::Empty)));
        assert!(matches!(
            PathPattern::parse("pets"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            PathPattern::parse("/a//b"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse("/a/{}"),
            Err(PatternError::EmptyVariable(_))
        ));
    }

    #[test]
    fn test_trailing_slash_strict() {
        let bare = pat("/pets");
        let slashed = pat("/pets/");
        assert!(bare.matches("/pets", TrailingSlash::Strict).is_some());
        assert!(bare.matches("/pets/", TrailingSlash::Strict).is_none());
        assert!(slashed.matches("/pets/", TrailingSlash::Strict).is_some());
        assert!(slashed.matches("/pets", TrailingSlash::Strict).is_none());
    }

    #[test]
    fn test_trailing_slash_insensitive() {
        let bare = pat("/pets");
        assert!(bare.matches("/pets/", TrailingSlash::Insensitive).is_some());
        assert!(bare.matches("/pets", TrailingSlash::Insensitive).is_some());
    }

    #[test]
    fn test_score_ordering() {
        let literal = pat("/pets/dogs").score();
        let var = pat("/pets/{id}").score();
        let wild = pat("/pets/*/x").score();
        let catch = pat("/pets/**").score();

        assert!(literal < var);
        assert!(var < wild);
        assert!(wild < catch);
        // longer literals are more specific
        assert!(pat("/pets/special").score() < pat("/pets/{id}").score());
        assert!(pat("/alpha/beta").score() < pat("/ab").score());
    }

    #[test]
    fn test_expand_round_trip() {
        let p = pat("/pets/{petId}/photos/{photoId}");
        let vars = p
            .matches("/pets/a%20b/photos/7", TrailingSlash::Strict)
            .unwrap();
        let rebuilt = p.expand(&vars).unwrap();
        assert_eq!(rebuilt, "/pets/a%20b/photos/7");
        let again = p.matches(&rebuilt, TrailingSlash::Strict).unwrap();
        assert_eq!(again, vars);
    }

    #[test]
    fn test_expand_missing_variable() {
        let p = pat("/pets/{id}");
        assert!(p.expand(&PathVars::new()).is_none());
        assert!(pat("/files/**").expand(&PathVars::new()).is_none());
    }

    #[test]
    fn test_same_shape_ignores_variable_names() {
        assert!(pat("/pets/{id}").same_shape(&pat("/pets/{petId}")));
        assert!(!pat("/pets/{id}").same_shape(&pat("/pets/dogs")));
        assert!(!pat("/pets/{id}").same_shape(&pat("/pets/{id}/")));
        assert!(pat("/files/**").same_shape(&pat("/files/*")));
    }
}

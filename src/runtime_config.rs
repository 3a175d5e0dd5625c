//! # Matcher Configuration
//!
//! Environment variable-based configuration for matching policy. These are
//! behavioral knobs that deliberately sit outside the route table: the same
//! table can be run strict or lenient without editing any route.
//!
//! ## Environment Variables
//!
//! ### `WAYFINDER_TRAILING_SLASH`
//!
//! `strict` (default) or `insensitive`. Under `strict`, `/pets` and `/pets/`
//! are different paths and a pattern only matches its own form. Under
//! `insensitive` the trailing slash is ignored on both sides.
//!
//! ### `WAYFINDER_TIE_BREAK`
//!
//! `produces-first` (default) or `path-first`. Orders the first two rungs of
//! the cross-route tie-break ladder when several routes survive every
//! matching stage: media-type specificity before path specificity, or the
//! reverse.
//!
//! ### `WAYFINDER_DEFAULT_PRODUCES`
//!
//! Media type reported for routes that declare no `produces` at all.
//! Default: `application/octet-stream`.
//!
//! ## Usage
//!
//! ```rust
//! use wayfinder::runtime_config::MatcherConfig;
//!
//! let config = MatcherConfig::from_env();
//! println!("trailing slash policy: {:?}", config.trailing_slash);
//! ```

use crate::router::media::MediaRange;
use std::env;

/// How trailing slashes are treated during path matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSlash {
    /// `/pets` and `/pets/` are distinct.
    #[default]
    Strict,
    /// Trailing slashes are ignored on both pattern and path.
    Insensitive,
}

/// Order of the first two rungs of the cross-route tie-break ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Prefer the route whose negotiated media type is more specific, then
    /// the more specific path.
    #[default]
    ProducesFirst,
    /// Prefer the more specific path, then the more specific media type.
    PathFirst,
}

/// Matching policy, loaded once at startup and shared by every matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub trailing_slash: TrailingSlash,
    pub tie_break: TieBreak,
    /// Media type reported for routes with an empty `produces` set.
    pub default_produces: MediaRange,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            trailing_slash: TrailingSlash::default(),
            tie_break: TieBreak::default(),
            default_produces: MediaRange::octet_stream(),
        }
    }
}

impl MatcherConfig {
    /// Load configuration from environment variables. Unset or unrecognized
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let trailing_slash = match env::var("WAYFINDER_TRAILING_SLASH") {
            Ok(val) if val.eq_ignore_ascii_case("insensitive") => TrailingSlash::Insensitive,
            _ => TrailingSlash::Strict,
        };
        let tie_break = match env::var("WAYFINDER_TIE_BREAK") {
            Ok(val) if val.eq_ignore_ascii_case("path-first") => TieBreak::PathFirst,
            _ => TieBreak::ProducesFirst,
        };
        let default_produces = env::var("WAYFINDER_DEFAULT_PRODUCES")
            .ok()
            .and_then(|val| MediaRange::parse(&val).ok())
            .unwrap_or_else(MediaRange::octet_stream);
        MatcherConfig {
            trailing_slash,
            tie_break,
            default_produces,
        }
    }
}

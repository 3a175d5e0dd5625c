//! # Wayfinder
//!
//! **Wayfinder** is a declarative request-dispatch core for HTTP services: given a route table
//! and an incoming request, it decides which handler owns the request and which representation
//! the response should carry.
//!
//! ## Overview
//!
//! Wayfinder treats routing as negotiation rather than a bare path lookup. A route declares the
//! path patterns it answers, the HTTP methods it accepts, predicates over query parameters and
//! headers, the media types it consumes and produces, and an API version constraint. At request
//! time the matcher narrows the table stage by stage and reports *why* a request missed, not just
//! that it did, so adapters can answer with the right status code and diagnostic headers.
//!
//! ## Architecture
//!
//! The library is organized into a handful of modules:
//!
//! - **[`spec`]** - Route declarations: [`RouteSpec`], its builder, and the YAML/JSON table loader
//! - **[`router`]** - Path patterns, predicates, media-type negotiation, API versioning, and the
//!   registry/matcher pair that ties them together
//! - **[`server`]** - The transport-neutral [`MatchRequest`] view of an incoming request
//! - **[`runtime_config`]** - Environment-driven matcher tuning
//! - **[`cli`]** - The `wayfinder-check` route-table inspection tool
//!
//! ### Resolution Flow
//!
//! A request walks a fixed elimination pipeline. Each stage shrinks the candidate set, and the
//! first stage that empties it names the failure:
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Adapter
//!     participant Matcher
//!     participant Path as Path patterns
//!     participant Pred as Predicates
//!     participant Media as Media types
//!     participant Ver as Versioning
//!
//!     Adapter->>Matcher: resolve(GET /pets/123)
//!     Matcher->>Path: match segments, capture variables
//!     alt no pattern matches
//!         Matcher-->>Adapter: NoPathMatch (404)
//!     end
//!     Matcher->>Matcher: filter by HTTP method
//!     alt path known, method not
//!         Matcher-->>Adapter: MethodNotAllowed + Allow (405)
//!     end
//!     Matcher->>Pred: evaluate param/header predicates
//!     Matcher->>Media: Content-Type vs consumes
//!     alt body not consumable
//!         Matcher-->>Adapter: UnsupportedMediaType (415)
//!     end
//!     Matcher->>Ver: resolve requested version
//!     alt version unsupported
//!         Matcher-->>Adapter: UnsupportedVersion (400)
//!     end
//!     Matcher->>Media: Accept vs produces
//!     alt nothing acceptable
//!         Matcher-->>Adapter: NotAcceptable (406)
//!     end
//!     Matcher-->>Adapter: Matched candidate + produced type
//! ```
//!
//! Survivors of every stage are ranked by produced-type quality, path specificity and predicate
//! count; an unresolvable tie is reported as [`NegotiationOutcome::AmbiguousMapping`] instead of
//! being decided by registration order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use wayfinder::router::RouteRegistry;
//! use wayfinder::server::MatchRequest;
//! use wayfinder::spec::RouteSpec;
//!
//! let mut registry = RouteRegistry::new();
//! registry
//!     .register(
//!         RouteSpec::builder("list_pets")
//!             .pattern("/pets")
//!             .method(Method::GET)
//!             .produces("application/json")
//!             .build()
//!             .expect("valid route"),
//!     )
//!     .expect("no conflicting route");
//!
//! let matcher = registry.into_matcher();
//! let request = MatchRequest::from_target(Method::GET, "/pets?limit=10")
//!     .with_header("accept", "application/json");
//! let outcome = matcher.resolve(&request);
//! assert!(outcome.candidate().is_some());
//! ```
//!
//! Route tables can also be loaded from YAML or JSON files with [`spec::load_route_table`]; the
//! `wayfinder-check` binary validates, dumps and probes such tables from the command line.
//!
//! ## Key Properties
//!
//! 1. **Deterministic**: resolution depends only on the sealed table and the request, never on
//!    registration order or hash iteration order
//! 2. **Diagnosable**: every rejection carries what an adapter needs (`Allow` methods, supported
//!    media types, deprecation headers)
//! 3. **Transport-neutral**: nothing in the matching core touches sockets or framework types
//! 4. **Fail-fast tables**: conflicting route declarations are rejected at registration, and
//!    ties that survive to request time surface as explicit ambiguity errors

pub mod cli;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;

pub use router::{MatchCandidate, Matcher, NegotiationOutcome, RouteRegistry};
pub use runtime_config::{MatcherConfig, TieBreak, TrailingSlash};
pub use server::{MatchRequest, VersionSource};
pub use spec::{load_route_table, Predicate, RegistrationError, RouteSpec, RouteTable};

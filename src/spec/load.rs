//! Route table loading from YAML or JSON declaration files.
//!
//! A declaration file carries a `routes` list and an optional
//! `deprecations` list:
//!
//! ```yaml
//! routes:
//!   - handler: list_pets
//!     path: /pets
//!     methods: [GET]
//!     params: ["kind=dog"]
//!     produces: [application/json, text/csv]
//!     version: "1.2+"
//! deprecations:
//!   - version: "1.0"
//!     sunset: "2026-12-31"
//! ```
//!
//! Loading only deserializes and parses; registration-time ambiguity
//! checking happens in [`RouteTable::into_registry`].

use super::types::{Predicate, RegistrationError, RouteSpec};
use crate::router::registry::RouteRegistry;
use crate::router::version::{ApiVersion, DeprecationInfo, DeprecationRule};
use crate::runtime_config::MatcherConfig;
use anyhow::Context;
use http::Method;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct TableDecl {
    #[serde(default)]
    routes: Vec<RouteDecl>,
    #[serde(default)]
    deprecations: Vec<DeprecationDecl>,
}

#[derive(Debug, Deserialize)]
struct RouteDecl {
    handler: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    methods: Vec<String>,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    consumes: Vec<String>,
    #[serde(default)]
    produces: Vec<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeprecationDecl {
    version: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    sunset: Option<String>,
}

/// A parsed declaration file: specs plus deprecation rules, not yet
/// validated against each other.
#[derive(Debug)]
pub struct RouteTable {
    pub specs: Vec<RouteSpec>,
    pub deprecations: Vec<DeprecationRule>,
}

impl RouteTable {
    /// Register everything into a fresh registry, failing on the first
    /// ambiguous pair.
    pub fn into_registry(self, config: MatcherConfig) -> Result<RouteRegistry, RegistrationError> {
        let mut registry = RouteRegistry::with_config(config);
        for spec in self.specs {
            registry.register(spec)?;
        }
        for rule in self.deprecations {
            registry.deprecate(rule);
        }
        Ok(registry)
    }
}

/// Load a route table from a `.yaml`/`.yml` or JSON file.
pub fn load_route_table(file_path: &str) -> anyhow::Result<RouteTable> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read route table '{}'", file_path))?;
    let decl: TableDecl = if file_path.ends_with(".yaml") || file_path.ends_with(".yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML route table '{}'", file_path))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON route table '{}'", file_path))?
    };

    let mut specs = Vec::with_capacity(decl.routes.len());
    for route in decl.routes {
        specs.push(build_spec(route)?);
    }

    let mut deprecations = Vec::with_capacity(decl.deprecations.len());
    for dep in decl.deprecations {
        let version: ApiVersion = dep
            .version
            .parse()
            .with_context(|| format!("deprecation entry '{}'", dep.version))?;
        deprecations.push(DeprecationRule {
            version,
            info: DeprecationInfo {
                link: dep.link,
                sunset: dep.sunset,
            },
        });
    }

    info!(
        file = file_path,
        route_count = specs.len(),
        deprecation_count = deprecations.len(),
        "route table loaded"
    );
    Ok(RouteTable {
        specs,
        deprecations,
    })
}

fn build_spec(decl: RouteDecl) -> anyhow::Result<RouteSpec> {
    let handler = decl.handler;
    let mut builder = RouteSpec::builder(&handler);
    if let Some(path) = decl.path {
        builder = builder.pattern(path);
    }
    builder = builder.patterns(decl.paths);
    for raw in &decl.methods {
        let method = raw
            .to_ascii_uppercase()
            .parse::<Method>()
            .map_err(|_| anyhow::anyhow!("route '{}': invalid method '{}'", handler, raw))?;
        builder = builder.method(method);
    }
    for expr in &decl.params {
        let predicate =
            expr.parse::<Predicate>()
                .map_err(|source| RegistrationError::InvalidPredicate {
                    handler: handler.clone(),
                    source,
                })?;
        builder = builder.param(predicate);
    }
    for expr in &decl.headers {
        let predicate =
            expr.parse::<Predicate>()
                .map_err(|source| RegistrationError::InvalidPredicate {
                    handler: handler.clone(),
                    source,
                })?;
        builder = builder.header(predicate);
    }
    for media in decl.consumes {
        builder = builder.consumes(media);
    }
    for media in decl.produces {
        builder = builder.produces(media);
    }
    if let Some(version) = decl.version {
        builder = builder.version(version);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_spec_from_yaml_decl() {
        let decl: TableDecl = serde_yaml::from_str(
            r#"
routes:
  - handler: list_pets
    path: /pets
    methods: [get, GET, head]
    params: ["kind=dog"]
    headers: ["!x-debug"]
    consumes: [application/json]
    produces: [application/json, text/csv]
    version: "1.2+"
deprecations:
  - version: "1.0"
    sunset: "2026-12-31"
"#,
        )
        .unwrap();
        assert_eq!(decl.routes.len(), 1);
        assert_eq!(decl.deprecations.len(), 1);

        let spec = build_spec(decl.routes.into_iter().next().unwrap()).unwrap();
        assert_eq!(spec.handler_name, "list_pets");
        assert_eq!(spec.methods, vec![Method::GET, Method::HEAD]);
        assert_eq!(spec.param_predicates, vec![Predicate::equals("kind", "dog")]);
        assert_eq!(spec.header_predicates, vec![Predicate::absent("x-debug")]);
        assert_eq!(spec.produces.len(), 2);
        assert_eq!(spec.version.to_string(), "1.2+");
    }

    #[test]
    fn test_build_spec_rejects_bad_method() {
        let decl = RouteDecl {
            handler: "h".to_string(),
            path: Some("/x".to_string()),
            paths: vec![],
            methods: vec!["GE T".to_string()],
            params: vec![],
            headers: vec![],
            consumes: vec![],
            produces: vec![],
            version: None,
        };
        let err = build_spec(decl).unwrap_err();
        assert!(err.to_string().contains("invalid method"));
    }

    #[test]
    fn test_build_spec_rejects_bad_predicate() {
        let decl = RouteDecl {
            handler: "h".to_string(),
            path: Some("/x".to_string()),
            paths: vec![],
            methods: vec![],
            params: vec!["=oops".to_string()],
            headers: vec![],
            consumes: vec![],
            produces: vec![],
            version: None,
        };
        let err = build_spec(decl).unwrap_err();
        assert!(err.to_string().contains("invalid predicate"));
    }
}

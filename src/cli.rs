//! Command-line interface for the route table tools.
//!
//! `check` validates a declaration file including ambiguity checks,
//! `routes` prints the resolved table, and `probe` resolves one synthetic
//! request against it and reports the outcome.

use crate::router::registry::RouteRegistry;
use crate::router::NegotiationOutcome;
use crate::runtime_config::MatcherConfig;
use crate::server::MatchRequest;
use crate::spec::load_route_table;
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use http::Method;
use std::path::{Path, PathBuf};

/// Command-line interface for Wayfinder
///
/// Provides commands for validating route declaration files and probing
/// how requests would resolve against them.
#[derive(Parser)]
#[command(name = "wayfinder")]
#[command(about = "Wayfinder route table tools", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a route declaration file, including ambiguity checks
    Check {
        /// Path to the route table file (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Print the resolved routing table
    Routes {
        /// Path to the route table file (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Resolve one synthetic request against the table
    Probe {
        /// Path to the route table file (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method of the synthetic request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target, e.g. "/pets/42?limit=10"
        target: String,

        /// Accept header value
        #[arg(long)]
        accept: Option<String>,

        /// Content-Type header value
        #[arg(long)]
        content_type: Option<String>,

        /// API version token, e.g. "1.2"
        #[arg(long)]
        api_version: Option<String>,

        /// Extra header in "Name: value" form; repeatable
        #[arg(long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,
    },
}

/// Parse arguments from the process command line and run.
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { routes } => {
            let registry = build_registry(&routes)?;
            println!("route table OK: {} routes", registry.len());
            Ok(())
        }
        Commands::Routes { routes } => {
            let registry = build_registry(&routes)?;
            print!("{}", registry.dump_routes());
            Ok(())
        }
        Commands::Probe {
            routes,
            method,
            target,
            accept,
            content_type,
            api_version,
            headers,
        } => {
            let registry = build_registry(&routes)?;
            let method: Method = method
                .to_ascii_uppercase()
                .parse()
                .map_err(|_| anyhow!("invalid method '{}'", method))?;

            let mut request = MatchRequest::from_target(method, &target);
            if let Some(accept) = accept {
                request = request.with_header("accept", accept);
            }
            if let Some(content_type) = content_type {
                request = request.with_header("content-type", content_type);
            }
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| anyhow!("header '{}' is not in 'Name: value' form", header))?;
                request = request.with_header(name.trim(), value.trim());
            }
            if let Some(version) = api_version {
                request = request.with_version(version);
            }

            let outcome = registry.into_matcher().resolve(&request);
            print_outcome(&outcome);
            Ok(())
        }
    }
}

fn build_registry(path: &Path) -> anyhow::Result<RouteRegistry> {
    let table = load_route_table(path.to_string_lossy().as_ref())?;
    let registry = table.into_registry(MatcherConfig::from_env())?;
    Ok(registry)
}

fn print_outcome(outcome: &NegotiationOutcome) {
    match outcome {
        NegotiationOutcome::Matched(candidate) => {
            println!(
                "matched: {} (produces {})",
                candidate.handler_name(),
                candidate.produced
            );
            for (name, value) in candidate.path_variables.iter() {
                println!("  {} = {}", name, value);
            }
        }
        NegotiationOutcome::DeprecatedVersion(candidate, info) => {
            println!(
                "matched: {} (produces {}, deprecated version)",
                candidate.handler_name(),
                candidate.produced
            );
            for (name, value) in candidate.path_variables.iter() {
                println!("  {} = {}", name, value);
            }
            for (name, value) in info.headers() {
                println!("  {}: {}", name, value);
            }
        }
        other => {
            let status = other.status_code();
            println!(
                "no match: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            if let Some(allow) = other.allow_header() {
                println!("  allow: {}", allow);
            }
            if let Some(accept) = other.accept_header() {
                println!("  accept: {}", accept);
            }
            if let NegotiationOutcome::AmbiguousMapping(first, second) = other {
                println!("  between: {}", first);
                println!("  and:     {}", second);
            }
        }
    }
}

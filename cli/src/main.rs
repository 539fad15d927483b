//! rbac CLI — driving adapter for the rbac authorization engine.
//!
//! Subcommands:
//! - `eval <config> [--method M] [--principal P] [--header k=v]... [--source A] [--destination A] [--trace]`
//! - `check <config>` — validate config compiles without errors
//!
//! Logging goes to stderr, filtered by `RUST_LOG` (default `warn`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rbac::{AuthorizationEngine, RbacConfig};
use rbac_test::TestRequest;

#[derive(Parser, Debug)]
#[command(name = "rbac", version, about = "Evaluate RBAC policies against a request")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a config against a request and print ALLOW or DENY
    Eval {
        /// Path to the RBAC config (.json, otherwise YAML)
        config: PathBuf,

        #[command(flatten)]
        request: RequestArgs,

        /// Print every policy checked and why it did or did not match
        #[arg(long)]
        trace: bool,
    },
    /// Validate that a config compiles
    Check {
        /// Path to the RBAC config (.json, otherwise YAML)
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct RequestArgs {
    /// Full method name, e.g. /pkg.Service/Method
    #[arg(long, default_value = "")]
    method: String,

    /// Authenticated principal name (omit for an unauthenticated request)
    #[arg(long)]
    principal: Option<String>,

    /// Request header as name=value (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Peer address
    #[arg(long, default_value = "")]
    source: String,

    /// Local address
    #[arg(long, default_value = "")]
    destination: String,
}

impl RequestArgs {
    fn build(&self) -> TestRequest {
        let mut req = TestRequest::new(self.method.as_str())
            .with_source(self.source.as_str())
            .with_destination(self.destination.as_str());
        if let Some(principal) = &self.principal {
            req = req.with_principal(principal.as_str());
        }
        for (name, value) in &self.headers {
            req = req.with_header(name, value);
        }
        req
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Eval {
            config,
            request,
            trace,
        } => cmd_eval(config, request, *trace),
        Command::Check { config } => cmd_check(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(config: &Path, request: &RequestArgs, trace: bool) -> Result<()> {
    let engine = load_engine(config)?;
    let req = request.build();

    if trace {
        print!("{}", engine.evaluate_with_trace(&req));
    } else {
        println!("{}", engine.evaluate(&req));
    }
    Ok(())
}

fn cmd_check(config: &Path) -> Result<()> {
    let engine = load_engine(config)?;
    println!(
        "Config valid: {} {} ({:?})",
        engine.policies().len(),
        if engine.policies().len() == 1 {
            "policy"
        } else {
            "policies"
        },
        engine.action(),
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_engine(path: &Path) -> Result<AuthorizationEngine> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read \"{}\"", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = parse_config(&content, is_json)
        .with_context(|| format!("failed to parse \"{}\"", path.display()))?;
    tracing::debug!(path = %path.display(), policies = config.policies.len(), "loaded config");

    config.compile().context("config invalid")
}

fn parse_config(content: &str, is_json: bool) -> Result<RbacConfig> {
    if is_json {
        Ok(serde_json::from_str(content)?)
    } else {
        // Default to YAML (handles .yaml and .yml). Rules are single-key maps.
        let de = serde_yaml::Deserializer::from_str(content);
        Ok(serde_yaml::with::singleton_map_recursive::deserialize(de)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_header(pair: &str) -> Result<(String, String), String> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("invalid header \"{pair}\", expected name=value"))?;
    if name.is_empty() {
        return Err(format!("invalid header \"{pair}\", name is empty"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

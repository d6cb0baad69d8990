//! stackvet — provision a Terraform-defined AWS stack, verify the live
//! resources against expected configuration, and always tear it down.
//!
//! ## Commands
//!
//! - `run`: apply the stack, execute the validation checks, destroy, report
//! - `checks`: list the builtin checks and their short-mode behavior

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

use stackvet_core::PollConfig;
use stackvet_infra::{AwsResourceQuery, BackendConfig, StackConfig, TerraformCli};
use stackvet_suite::{builtin_checks, Expectations, NamedCheck, SuiteConfig, ValidationHarness};

#[derive(Parser)]
#[command(name = "stackvet")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provision-and-verify harness for Terraform-defined AWS stacks", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the stack, run the validation checks, and tear it down
    Run(RunArgs),

    /// List the builtin checks
    Checks,
}

#[derive(Args)]
struct RunArgs {
    /// Terraform template directory
    #[arg(long, default_value = "../terraform")]
    template_dir: PathBuf,

    /// Variable file passed to apply and destroy (repeatable)
    #[arg(long = "var-file")]
    var_files: Vec<PathBuf>,

    /// AWS region (falls back to TEST_REGION, then us-east-2)
    #[arg(long, env = "TEST_REGION", default_value = "us-east-2")]
    region: String,

    /// Remote state bucket
    #[arg(long, requires = "backend_key")]
    backend_bucket: Option<String>,

    /// Remote state key
    #[arg(long, requires = "backend_bucket")]
    backend_key: Option<String>,

    /// Expectation overrides (JSON file); absent fields keep defaults
    #[arg(long)]
    expectations: Option<PathBuf>,

    /// Skip slow checks (endpoint listing, SSM polling, scheduler)
    #[arg(long)]
    short: bool,

    /// Skip individual checks by name (repeatable)
    #[arg(long = "skip")]
    skip: Vec<String>,

    /// SSM registration poll attempts
    #[arg(long, default_value_t = 30)]
    ssm_max_attempts: u32,

    /// Seconds between SSM poll attempts
    #[arg(long, default_value_t = 10)]
    ssm_interval_secs: u64,

    /// Abort the run after this many seconds (teardown still runs)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Binary used for provisioning (terraform or tofu)
    #[arg(long, default_value = "terraform")]
    terraform_bin: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    stackvet_core::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Checks => cmd_checks(),
    }
}

/// Provision, validate, and tear down one stack.
async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut stack = StackConfig::new(&args.template_dir, &args.region);
    for var_file in &args.var_files {
        stack = stack.with_var_file(var_file);
    }
    if let (Some(bucket), Some(key)) = (&args.backend_bucket, &args.backend_key) {
        stack = stack.with_backend(BackendConfig {
            bucket: bucket.clone(),
            key: key.clone(),
            region: args.region.clone(),
        });
    }

    let mut config = SuiteConfig::new(stack, &args.region).with_ssm_poll(PollConfig::new(
        args.ssm_max_attempts,
        Duration::from_secs(args.ssm_interval_secs),
    ));

    if let Some(ref path) = args.expectations {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read expectations file: {:?}", path))?;
        config.expect =
            Expectations::from_json(&raw).context("Failed to parse expectations as JSON")?;
    }

    let checks = select_checks(builtin_checks(), args.short, &args.skip);
    anyhow::ensure!(!checks.is_empty(), "No checks left to run");

    println!("Validating stack in {:?}", args.template_dir);
    println!("Region: {}", args.region);
    println!(
        "Checks: {}",
        checks
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let provisioner = Arc::new(TerraformCli::with_binary(&args.terraform_bin));
    let query = Arc::new(AwsResourceQuery::connect(&args.region).await);
    let harness = ValidationHarness::new(provisioner, query);

    let cancel = CancellationToken::new();
    if let Some(secs) = args.timeout_secs {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("Run deadline reached, cancelling");
            token.cancel();
        });
    }
    // An interrupt cancels the run; teardown still executes
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling");
                token.cancel();
            }
        });
    }

    let report = harness.run(&config, checks, &cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render_text());
    }

    if report.success {
        Ok(())
    } else {
        anyhow::bail!("Validation failed")
    }
}

/// List the builtin checks in execution order.
fn cmd_checks() -> Result<()> {
    println!("Builtin checks (execution order):");
    for check in builtin_checks() {
        let mark = if check.slow { " (slow)" } else { "" };
        println!("  {}{}", check.name, mark);
    }
    Ok(())
}

fn select_checks(all: Vec<NamedCheck>, short: bool, skip: &[String]) -> Vec<NamedCheck> {
    all.into_iter()
        .filter(|c| !(short && c.slow))
        .filter(|c| !skip.contains(&c.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from(["stackvet", "run"]).expect("parse failed");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.ssm_max_attempts, 30);
                assert_eq!(args.ssm_interval_secs, 10);
                assert_eq!(args.terraform_bin, "terraform");
                assert!(!args.short);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_backend_bucket_requires_key() {
        let result = Cli::try_parse_from([
            "stackvet",
            "run",
            "--backend-bucket",
            "dev-state-bucket",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_mode_drops_slow_checks() {
        let checks = select_checks(builtin_checks(), true, &[]);
        assert!(checks.iter().all(|c| !c.slow));
        assert!(checks.iter().any(|c| c.name == "vpc_config"));
    }

    #[test]
    fn test_skip_drops_named_checks() {
        let skip = vec!["ssm_managed".to_string()];
        let checks = select_checks(builtin_checks(), false, &skip);
        assert!(!checks.iter().any(|c| c.name == "ssm_managed"));
        assert_eq!(checks.len(), builtin_checks().len() - 1);
    }
}

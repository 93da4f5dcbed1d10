//! Thin command-line surface over the repair engine.
//!
//! `mend repair` runs one repair request end to end; `mend bank list`
//! inspects the repair bank. Everything interesting happens in the
//! engine crates — this binary only wires configuration, I/O, and exit
//! codes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use mend_core::config::MendConfig;
use mend_core::errors::MendErrorCode;
use mend_core::traits::{RepairMemory, TemplateProposer};
use mend_core::types::value::Value;
use mend_engine::{Budgets, Controller, RepairStatus, TemplateOrigin};
use mend_k8s::{
    standard_oracles, DefaultTemplateCatalog, HttpProposer, K8sPatchExecutor, Manifest,
};
use mend_storage::RepairBank;

#[derive(Parser)]
#[command(name = "mend", version, about = "Oracle-guided repair for Kubernetes manifests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Repair a manifest until every oracle passes.
    Repair(RepairArgs),
    /// Inspect the repair bank.
    Bank(BankArgs),
}

#[derive(Args)]
struct RepairArgs {
    /// Input manifest path.
    manifest: PathBuf,

    /// Directory the output manifest is written into.
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the candidate budget.
    #[arg(long)]
    max_candidates: Option<u64>,

    /// Override the stale-iteration budget.
    #[arg(long)]
    max_iters: Option<u64>,

    /// Override the wall-clock budget in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip bank lookup and update.
    #[arg(long)]
    no_bank: bool,

    /// Skip the remote proposer even if configured.
    #[arg(long)]
    no_proposer: bool,

    /// Override the bank file location.
    #[arg(long)]
    bank_path: Option<PathBuf>,

    /// Signature context entry, `key=value`. Repeatable.
    #[arg(long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,
}

#[derive(Subcommand)]
enum BankCommand {
    /// List bank entries.
    List,
}

#[derive(Args)]
struct BankArgs {
    #[command(subcommand)]
    command: BankCommand,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bank file location.
    #[arg(long)]
    bank_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Repair(args) => run_repair(args),
        Command::Bank(args) => run_bank(args),
    };
    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("mend: {message}");
            ExitCode::from(2)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MendConfig, String> {
    match path {
        Some(path) => MendConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(MendConfig::default()),
    }
}

fn parse_context(entries: &[String]) -> Result<BTreeMap<String, Value>, String> {
    let mut context = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid context entry `{entry}`, expected key=value"))?;
        context.insert(key.to_string(), Value::Str(value.to_string()));
    }
    Ok(context)
}

fn run_repair(args: RepairArgs) -> Result<ExitCode, String> {
    let config = load_config(args.config.as_deref())?;
    let manifest = Manifest::from_path(&args.manifest).map_err(|e| e.to_string())?;
    let context = parse_context(&args.context)?;

    let budgets = Budgets {
        max_candidates: args
            .max_candidates
            .unwrap_or_else(|| config.budgets.effective_max_candidates()),
        max_iters: args
            .max_iters
            .unwrap_or_else(|| config.budgets.effective_max_iters()),
        timeout: Duration::from_secs(
            args.timeout_secs
                .unwrap_or_else(|| config.budgets.effective_timeout_secs()),
        ),
    };

    let oracles = standard_oracles(&config.policy);
    let executor = K8sPatchExecutor::new();
    let catalog = DefaultTemplateCatalog::from_config(&config.policy);

    let proposer = if args.no_proposer || !config.proposer.effective_enabled() {
        None
    } else {
        match &config.proposer.endpoint {
            Some(endpoint) => {
                let timeout = Duration::from_secs(config.proposer.effective_timeout_secs());
                match HttpProposer::new(endpoint.clone(), timeout) {
                    Ok(proposer) => Some(proposer),
                    Err(e) => {
                        warn!(error = %e, "proposer client unavailable, continuing without it");
                        None
                    }
                }
            }
            None => None,
        }
    };

    let bank_enabled = !args.no_bank && config.bank.effective_enabled();
    let bank_path = args.bank_path.unwrap_or_else(|| config.bank.effective_path());
    let mut bank = bank_enabled.then(|| RepairBank::load(&bank_path));

    let mut controller = Controller::new(&oracles, &executor, &catalog).with_budgets(budgets);
    if let Some(proposer) = proposer.as_ref() {
        controller = controller.with_proposer(proposer as &dyn TemplateProposer<Manifest>);
    }

    let report = controller.repair(
        &manifest,
        &context,
        bank.as_mut().map(|b| b as &mut dyn RepairMemory),
        chrono::Utc::now(),
    );

    let origin = match report.template_origin {
        Some(TemplateOrigin::Bank) => "bank",
        Some(TemplateOrigin::Proposer) => "proposer",
        Some(TemplateOrigin::Default) => "default",
        None => "-",
    };
    println!(
        "status: {}  template: {origin}  candidates: {}  iterations: {}  constraints: {}",
        report.status.label(),
        report.candidates_tried,
        report.iterations,
        report.constraints_learned.len(),
    );

    let output = match &report.status {
        RepairStatus::NoViolationsInitially => Some(&manifest),
        RepairStatus::Repaired { artifact, assignment } => {
            for (hole, value) in assignment {
                println!("  {hole} = {value}");
            }
            Some(artifact)
        }
        _ => None,
    };

    match output {
        Some(repaired) => {
            if matches!(report.status, RepairStatus::Repaired { .. }) {
                if let Some(bank) = &bank {
                    bank.save().map_err(|e| e.to_string())?;
                }
            }
            let file_name = args
                .manifest
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("manifest.yaml"));
            std::fs::create_dir_all(&args.out_dir).map_err(|e| e.to_string())?;
            let out_path = args.out_dir.join(file_name);
            repaired.write_to(&out_path).map_err(|e| e.to_string())?;
            println!("wrote {}", out_path.display());
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

fn run_bank(args: BankArgs) -> Result<ExitCode, String> {
    let config = load_config(args.config.as_deref())?;
    let bank_path = args.bank_path.unwrap_or_else(|| config.bank.effective_path());
    let bank = RepairBank::load(&bank_path);
    if let Some(e) = bank.load_error() {
        eprintln!("warning [{}]: {e}", e.error_code());
    }

    match args.command {
        BankCommand::List => {
            if bank.is_empty() {
                println!("bank is empty");
                return Ok(ExitCode::SUCCESS);
            }
            for entry in bank.entries() {
                println!(
                    "{} | codes: {} | successes: {} | last used: {}",
                    entry.signature.failed_oracles.join(","),
                    entry.signature.error_codes.join(","),
                    entry.metadata.success_count,
                    entry.metadata.last_used.to_rfc3339(),
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

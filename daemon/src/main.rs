//! Custody daemon: entry point for running operation scripts against a node.

use anyhow::{bail, Context};
use clap::Parser;
use custody_growth::CardRecord;
use custody_node::{ClockMode, CustodyNode, LogFormat, NodeConfig, Operation, OperationOutcome};
use custody_staking::{LockRecord, StakeRecord};
use custody_types::{Address, NetworkId, Timestamp};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "custody-daemon", about = "Token custody ledger daemon")]
struct Cli {
    /// Network: "live", "test", or "dev".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "CUSTODY_NETWORK")]
    network: Option<String>,

    /// Directory that relative --resume and --save paths resolve against.
    #[arg(long, env = "CUSTODY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CUSTODY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CUSTODY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print Prometheus metrics after the run.
    #[arg(long, env = "CUSTODY_ENABLE_METRICS")]
    metrics: bool,

    /// Use a manual clock starting at this Unix time (not allowed on live).
    #[arg(long, env = "CUSTODY_MANUAL_CLOCK")]
    manual_clock: Option<u64>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CUSTODY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Execute a JSON array of operations and print the resulting state.
    RunScript {
        /// Script file.
        script: PathBuf,

        /// Resume from this snapshot instead of an empty ledger
        /// (relative to the data directory).
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Write a snapshot here after the run (relative to the data directory).
        #[arg(long)]
        save: Option<PathBuf>,

        /// Stop at the first failed operation and exit non-zero.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    PrintConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            NodeConfig::from_toml_file(&path).with_context(|| format!("loading {path}"))?
        }
        None => NodeConfig::default(),
    };
    if let Some(network) = cli.network.as_deref() {
        config.network = network.parse::<NetworkId>()?;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(start) = cli.manual_clock {
        config.clock.mode = ClockMode::Manual;
        config.clock.start_secs = start;
    }
    config.enable_metrics |= cli.metrics;
    config.validate()?;
    Ok(config)
}

/// One script step as printed after the run.
#[derive(Serialize)]
struct StepReport {
    step: usize,
    op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<OperationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct StateReport<'a> {
    now: Timestamp,
    total_supply: u128,
    minter: &'a Address,
    balances: Vec<(Address, u128)>,
    stakes: Vec<&'a StakeRecord>,
    locks: Vec<&'a LockRecord>,
    cards: Vec<&'a CardRecord>,
    pending_requests: usize,
}

#[derive(Serialize)]
struct RunReport<'a> {
    steps: &'a [StepReport],
    failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<StateReport<'a>>,
}

fn state_report(node: &CustodyNode) -> StateReport<'_> {
    let mut balances: Vec<(Address, u128)> =
        node.ledger().holders().map(|(a, b)| (*a, b)).collect();
    balances.sort();
    StateReport {
        now: node.now(),
        total_supply: node.ledger().total_supply(),
        minter: node.ledger().minter(),
        balances,
        stakes: node.staking().stakes().collect(),
        locks: node.staking().locks().collect(),
        cards: node.growth().state().cards.values().flatten().collect(),
        pending_requests: node.growth().pending_count(),
    }
}

fn run_script(
    config: NodeConfig,
    script: PathBuf,
    resume: Option<PathBuf>,
    save: Option<PathBuf>,
    strict: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&script)
        .with_context(|| format!("reading {}", script.display()))?;
    let ops: Vec<Operation> = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", script.display()))?;

    let enable_metrics = config.enable_metrics;
    let save = save.map(|p| config.snapshot_path(&p));
    let mut node = match resume {
        Some(path) => {
            let path = config.snapshot_path(&path);
            CustodyNode::load_snapshot(config, &path)
                .with_context(|| format!("resuming from {}", path.display()))?
        }
        None => CustodyNode::new(config)?,
    };
    tracing::info!(steps = ops.len(), script = %script.display(), "running script");

    let mut steps = Vec::with_capacity(ops.len());
    let mut failures = 0usize;
    for (step, op) in ops.into_iter().enumerate() {
        let name = op.name();
        match node.apply(op) {
            Ok(outcome) => steps.push(StepReport {
                step,
                op: name,
                ok: Some(outcome),
                error: None,
            }),
            Err(e) => {
                failures += 1;
                let message = e.to_string();
                steps.push(StepReport {
                    step,
                    op: name,
                    ok: None,
                    error: Some(message.clone()),
                });
                if strict {
                    let partial = RunReport {
                        steps: &steps,
                        failures,
                        state: None,
                    };
                    println!("{}", serde_json::to_string_pretty(&partial)?);
                    bail!("step {step} ({name}) failed: {message}");
                }
            }
        }
    }

    let report = RunReport {
        steps: &steps,
        failures,
        state: Some(state_report(&node)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if enable_metrics {
        println!("{}", node.metrics().encode()?);
    }
    if let Some(path) = save {
        node.save_snapshot(&path)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format: LogFormat = config.log_format.parse()?;
    custody_node::init_logging(format, &config.log_level)?;

    match cli.command {
        Command::RunScript {
            script,
            resume,
            save,
            strict,
        } => run_script(config, script, resume, save, strict)?,
        Command::PrintConfig => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

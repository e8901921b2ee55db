//! rule-curator
//!
//! Re-validates one shard of a DNS blocklist per invocation and retires rules
//! whose domains keep failing to resolve.
//!
//! # Architecture Overview
//!
//! ```text
//!   tmp/part_NN.txt ──┐
//!                     ├─▶ candidates ─▶ lifecycle plan ─▶ probe scheduler ─▶ DNS
//!   dist/validated_ ──┘                                         │
//!   part_NN.txt                                                 ▼
//!                                    outage guard ◀──── outcome map
//!                                         │
//!                                         ▼
//!                     lifecycle advance ─▶ store merge ─▶ dist/delete_counter_NN.json
//!                                         │
//!                                         └─▶ dist/validated_part_NN.txt + COMMIT_STATS
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use rule_curator::config::{load_config, CuratorConfig};
use rule_curator::lifecycle::{LifecycleStore, RuleState};
use rule_curator::observability::{init_logging, metrics};
use rule_curator::probe::DnsProber;
use rule_curator::rules::extract_domain;
use rule_curator::{run_shard, Shutdown, ShardJob};

#[derive(Parser)]
#[command(name = "rule-curator")]
#[command(about = "Prune blocklist rules whose domains no longer resolve", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one curation round for a shard
    Run {
        #[arg(short, long)]
        shard: u32,
        /// Override the shard input file
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override the previous round's retained file
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Override the output file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show lifecycle store contents for a shard
    Inspect {
        #[arg(short, long)]
        shard: u32,
        /// Show a single rule's record
        #[arg(short, long)]
        rule: Option<String>,
    },
    /// Validate the configuration and print the effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "rule-curator failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CuratorConfig::default(),
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("warning: logging not initialized: {e}");
    }

    match cli.command {
        Commands::Run {
            shard,
            input,
            previous,
            output,
        } => {
            let mut job = ShardJob::from_config(&config.shards, shard);
            if let Some(input) = input {
                job.input = input;
            }
            if let Some(output) = output {
                job.previous = output.clone();
                job.output = output;
            }
            if let Some(previous) = previous {
                job.previous = previous;
            }
            run_round(&config, &job).await
        }
        Commands::Inspect { shard, rule } => inspect(&config, shard, rule.as_deref()),
        Commands::CheckConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_round(config: &CuratorConfig, job: &ShardJob) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = match &config.observability.metrics_textfile {
        Some(path) => match metrics::init_metrics() {
            Ok(handle) => Some((handle, PathBuf::from(path))),
            Err(e) => {
                tracing::warn!(error = %e, "Metrics recorder not installed");
                None
            }
        },
        None => None,
    };

    tracing::info!(
        shard = job.shard,
        concurrency = config.probe.concurrency,
        timeout_ms = config.probe.timeout_ms,
        policy = ?config.probe.failure_policy,
        "rule-curator v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(shutdown.clone().listen_for_ctrl_c());

    let prober = Arc::new(DnsProber::new(&config.resolver, &config.probe)?);
    let result = run_shard(config, job, prober, Some(receiver)).await;

    if let Some((handle, path)) = &recorder {
        if let Err(e) = metrics::write_textfile(handle, path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
        }
    }

    println!("{}", result?);
    Ok(())
}

fn inspect(config: &CuratorConfig, shard: u32, rule: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store = LifecycleStore::for_shard(&config.store, shard);
    let records = store.load()?;

    if let Some(rule) = rule {
        let domain = extract_domain(rule);
        println!("rule:   {rule}");
        println!("domain: {}", domain.as_deref().unwrap_or("(none, always retained)"));
        match records.get(rule) {
            Some(record) => {
                println!("state:  {:?}", record.state(&config.lifecycle));
                println!("record: {}", serde_json::to_string(record)?);
            }
            None => println!("record: (none)"),
        }
        return Ok(());
    }

    let skipped = records
        .values()
        .filter(|r| r.state(&config.lifecycle) == RuleState::Skipped)
        .count();
    let forced = records.values().filter(|r| r.force_probe).count();
    let failing = records.values().filter(|r| r.failures > 0).count();

    println!("store:       {}", store.path().display());
    println!("records:     {}", records.len());
    println!("active:      {}", records.len() - skipped);
    println!("failing:     {failing}");
    println!("skipped:     {skipped}");
    println!("force-probe: {forced}");
    Ok(())
}

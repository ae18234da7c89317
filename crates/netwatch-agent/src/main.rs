//! CLI entry point for the netwatch presence agent.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;

use netwatch_core::network_range;

use netwatch_agent::audit;
use netwatch_agent::config::AgentConfig;
use netwatch_agent::engine::PresenceEngine;
use netwatch_agent::input::{self, parse_address_list, process_address_list};
use netwatch_agent::runner::ProcessRunner;
use netwatch_agent::store::{harden_store_dir, ScanStore};

#[derive(Parser)]
#[command(name = "netwatch-agent")]
#[command(about = "Record whether an address is a known device on its subnet")]
struct Cli {
    /// Comma-separated addresses to check; skips stdin and the prompt.
    #[arg(short, long)]
    target: Option<String>,

    /// Print the stored record for an address and exit.
    #[arg(long, value_name = "ADDRESS")]
    show: Option<String>,

    /// Override the status store path.
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Override the audit log path.
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Config file prefix (default: netwatch).
    #[arg(short, long, default_value = "netwatch")]
    config: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut agent_config = load_agent_config(&cli.config)?;
    if let Some(path) = &cli.store_path {
        agent_config.store_path = path.clone();
    }
    if let Some(path) = &cli.log_path {
        agent_config.log_path = path.clone();
    }

    audit::init_logging(&agent_config.log_path, &agent_config.log_level)?;

    let store = ScanStore::open(&agent_config.store_path)?;
    harden_store_dir(&agent_config.store_path, &agent_config.group_name);

    if let Some(address) = cli.show.as_deref() {
        match store.get(address.trim())? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("No record for {}", address.trim()),
        }
        return Ok(());
    }

    let runner = ProcessRunner;
    let engine = PresenceEngine::new(&agent_config, &runner, &store);

    if let Some(list) = cli.target.as_deref() {
        println!("ip Discovery Tool");
        return run_address_list(&engine, &parse_address_list(list)).await;
    }

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        // Active-response hook: one JSON alert on stdin.
        let target = match input::read_alert(stdin.lock()) {
            Ok(ip) => ip,
            Err(_) => {
                tracing::error!("No target ip found in stdin. Exiting...");
                std::process::exit(1);
            }
        };
        let range = match network_range(&target) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Cannot derive network range for {target}: {e}");
                std::process::exit(1);
            }
        };
        tracing::info!("Initiating network check for ip: {target}");
        engine.decide(&target, &range).await?;
        return Ok(());
    }

    println!("ip Discovery Tool");
    print!("Enter a comma-separated list of IPs: ");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;

    run_address_list(&engine, &parse_address_list(&line)).await
}

async fn run_address_list(
    engine: &PresenceEngine<'_, ProcessRunner>,
    addresses: &[String],
) -> anyhow::Result<()> {
    if addresses.is_empty() {
        println!("No valid IPs provided. Exiting...");
        tracing::warn!("No valid IPs provided by the user.");
        return Ok(());
    }

    let completed = process_address_list(engine, addresses).await;
    tracing::info!(
        requested = addresses.len(),
        completed,
        "Address list processed"
    );
    println!("Processing completed. Check logs for more details.");
    Ok(())
}

fn load_agent_config(file_prefix: &str) -> anyhow::Result<AgentConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NETWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<AgentConfig>("agent") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(AgentConfig::default()),
        Err(e) => Err(e.into()),
    }
}

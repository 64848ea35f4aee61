use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use confsync_client::{RandomSelector, Transport};
use confsync_core::{ApplyOutcome, SyncError};
use confsync_runner::{node_identity, Agent, CommandEngine, Config};

#[derive(Parser)]
#[command(
    name = "confsync",
    version,
    about = "Pulls a generated configuration bundle for this node and converges against it"
)]
struct Cli {
    /// Tag of the configuration to generate, fetch and activate. Without a
    /// tag the currently active configuration is re-applied unchanged.
    tag: Option<String>,

    /// Path to the agent configuration file.
    #[arg(long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Skip the sync stages entirely and only run convergence, even when a
    /// tag is given.
    #[arg(long)]
    no_sync: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(outcome) if outcome.success => {}
        Ok(outcome) => {
            // the engine's own exit code is passed through
            let code = outcome.exit_code.filter(|c| *c != 0).unwrap_or(1);
            eprintln!("confsync: applying failed: convergence engine exited with status {code}");
            exit(code);
        }
        Err(e) => {
            match e.downcast_ref::<SyncError>() {
                Some(sync) => eprintln!("confsync: {} failed: {sync}", sync.stage()),
                None => eprintln!("confsync: {e:#}"),
            }
            exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ApplyOutcome> {
    let cfg = Config::load_from(&cli.config)?;
    let node = node_identity(&cfg)?;

    let tag = if cli.no_sync {
        if cli.tag.is_some() {
            warn!("--no-sync given; ignoring the tag and skipping sync");
        }
        None
    } else {
        cli.tag.as_deref()
    };

    let transport = Transport::new(cfg.retry_policy(), cfg.timeout())?;
    let engine = CommandEngine::new(cfg.engine.program.clone(), cfg.engine.args.clone());
    let agent = Agent {
        host: cfg.server.host.clone(),
        port: cfg.server.port,
        node,
        remote_tarballs: cfg.paths.remote_tarballs.clone(),
        local_tarballs: cfg.local_tarballs(),
        active_pointer: cfg.active_pointer(),
        transport: &transport,
        selector: &RandomSelector,
        engine: &engine,
    };

    Ok(agent.run(tag)?)
}

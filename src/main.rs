//! Critters - Entry Point
//!
//! Runs the pet simulation headless at its fixed tick rate. Without a display
//! the interesting output is the log: throws, catches, greetings, and a
//! periodic status line.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use critters::command::{Command, CommandExecutor};
use critters::core::config::SimulationConfig;
use critters::core::error::Result;
use critters::entity::species::Species;
use critters::persistence::roster::RosterStore;
use critters::renderer::artwork::SilhouetteRenderer;
use critters::simulation::events::SimulationEvent;
use critters::simulation::tick::Scheduler;
use critters::ui::router::EventRouter;

/// Headless critters simulation
#[derive(Parser, Debug)]
#[command(name = "critters")]
#[command(about = "Run the desktop pet simulation without a display")]
struct Args {
    /// TOML config file; defaults are used for anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,

    /// Roster file to restore on start and save on exit
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Stop after this many ticks (runs until Ctrl-C otherwise)
    #[arg(long)]
    ticks: Option<u64>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Agents to spawn when no roster is restored
    #[arg(long, default_value_t = 3)]
    agents: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("critters=info")),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    tracing::info!(tick_rate = config.tick_rate_hz, seed = ?config.seed, "critters starting");

    let scheduler = Arc::new(Scheduler::new(config.clone(), Arc::new(SilhouetteRenderer))?);
    let store = args.roster.clone().map(RosterStore::new);
    let executor = CommandExecutor::new(Arc::clone(&scheduler), store.clone());

    populate(&executor, store.as_ref(), args.agents);

    let rt = Runtime::new()?;
    rt.block_on(run(&executor, &config, args.ticks));

    if let Err(e) = executor.shutdown() {
        tracing::warn!(error = %e, "could not save roster on exit");
    }
    tracing::info!(
        ticks = scheduler.tick_count(),
        agents = scheduler.agent_count(),
        "critters stopped"
    );
    Ok(())
}

/// Restore the saved roster, or spawn a starter population
fn populate(executor: &CommandExecutor, store: Option<&RosterStore>, count: usize) {
    let scheduler = executor.scheduler();
    if let Some(store) = store {
        scheduler.restore_roster(&store.load());
    }
    if scheduler.agent_count() > 0 {
        return;
    }
    for species in Species::ALL.iter().cycle().take(count) {
        let command = Command::AddAgent {
            species: *species,
            color: None,
            name: None,
        };
        if let Err(e) = executor.execute(command) {
            tracing::warn!(error = %e, "could not spawn starter agent");
            break;
        }
    }
}

async fn run(executor: &CommandExecutor, config: &SimulationConfig, max_ticks: Option<u64>) {
    let scheduler = executor.scheduler();
    let dt = config.tick_delta();
    let status_every = (config.tick_rate_hz * 10.0).round().max(1.0) as u64;

    let mut router = EventRouter::new();
    let (world_tx, world_rx) = std::sync::mpsc::channel();
    router.observe_world(world_tx);

    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }

        router.dispatch(scheduler.tick(dt));
        log_world_events(&world_rx);

        let tick = scheduler.tick_count();
        if tick % status_every == 0 {
            let stats = scheduler.cache().stats();
            tracing::info!(
                tick,
                elapsed_secs = scheduler.elapsed(),
                agents = scheduler.agent_count(),
                ball = scheduler.ball().is_some(),
                cache_len = scheduler.cache().len(),
                cache_hits = stats.hits,
                cache_misses = stats.misses,
                "status"
            );
        }
        if max_ticks.is_some_and(|max| tick >= max) {
            break;
        }
    }
}

fn log_world_events(rx: &Receiver<SimulationEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            SimulationEvent::BallThrown { ball_id, thrower, .. } => {
                tracing::info!(ball = ball_id, ?thrower, "ball thrown")
            }
            SimulationEvent::BallCaught { ball_id, by } => {
                tracing::info!(ball = ball_id, agent = %by, "ball caught")
            }
            SimulationEvent::Greeting { first, second } => {
                tracing::info!(%first, %second, "greeting")
            }
            other => tracing::debug!(?other, "world event"),
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Merge Farm session.

mod config;
mod sink;
mod store;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use merge_farm_core::{Command, KeyValueStore, ShopOffer};
use merge_farm_session::Session;
use merge_farm_system_persistence::MemoryStore;
use merge_farm_world::query;

use crate::{config::load_balance, sink::LoggingSink, store::JsonFileStore};

/// Headless Merge Farm simulation.
#[derive(Debug, Parser)]
#[command(name = "merge-farm", version)]
struct Cli {
    /// TOML file overriding balance values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON save file; progress is kept in memory when omitted.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Seed for spawn slot selection, overriding the config file.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Logical milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Buy the auto-merge offer before simulating.
    #[arg(long)]
    auto_merge: bool,
    /// Number of rewarded ads to watch before simulating.
    #[arg(long, default_value_t = 0)]
    watch_ads: u32,
    /// Wipe saved progress before simulating.
    #[arg(long)]
    reset: bool,
}

/// Entry point for the Merge Farm command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut balance = load_balance(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        balance.rng_seed = seed;
    }

    let store: Box<dyn KeyValueStore> = match &cli.save {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };

    let mut session = Session::with_sinks(balance, store, vec![Box::new(LoggingSink)])
        .context("failed to restore saved progress")?;
    println!("{}", query::welcome_banner(session.world()));

    if cli.reset {
        session.submit(Command::ResetProgress);
    }
    for _ in 0..cli.watch_ads {
        session.submit(Command::GrantAdReward);
    }
    if cli.auto_merge {
        session.submit(Command::Purchase {
            offer: ShopOffer::AutoMerge,
        });
    }

    let dt = Duration::from_millis(cli.tick_ms);
    for _ in 0..cli.ticks {
        session.step(dt);
    }

    print_summary(&session);
    Ok(())
}

fn print_summary(session: &Session) {
    let world = session.world();
    let ledger = query::ledger(world);
    println!(
        "level {} | {} coins | {}/{} xp",
        ledger.level, ledger.coins, ledger.experience, ledger.experience_to_next
    );
    println!(
        "achievements {}/{} | items on grid {} | clock {:.1}s",
        query::completed_achievements(world),
        query::total_achievements(world),
        query::item_view(world).len(),
        query::clock(world).as_secs_f64()
    );
}

//! lteasim - closed-loop MAC scheduler simulation
//!
//! Runs the per-TTI scheduling loop against the built-in reference
//! channel, traffic and error models: schedule, transmit, decode,
//! deliver deferred HARQ feedback, retransmit, and report the final
//! ACK/NACK/drop counters.
//!
//! # Usage
//!
//! ```bash
//! lteasim -c config/sim.yaml --ticks 1000
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

use lteasim_common::config::SimulationConfig;
use lteasim_common::logging::{init_logging, LogLevel};
use lteasim_common::sim_tick::SimulationClock;
use lteasim_common::types::{Ratio, UserId};
use lteasim_mac::models::{
    ExponentialEffectiveSinr, FullBufferQueue, LogisticBlerModel, StaticChannelState,
};
use lteasim_mac::Scheduler;

/// lteasim - LTE MAC scheduler and HARQ simulator
#[derive(Parser, Debug)]
#[command(name = "lteasim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<String>,

    /// Number of TTIs to simulate, overriding the configuration
    #[arg(short = 't', long = "ticks")]
    ticks: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    log_level: LogLevel,

    /// PRNG seed, overriding the configuration
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config_file {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => SimulationConfig {
            time: Default::default(),
            num_users: 4,
            seed: 1,
            mac: Default::default(),
        },
    };
    if let Some(ticks) = args.ticks {
        config.time.total_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    info!(
        num_users = config.num_users,
        num_prbs = config.mac.num_prbs,
        total_ticks = config.time.total_ticks,
        seed = config.seed,
        "starting simulation"
    );

    let users: Vec<UserId> = (0..config.num_users).map(UserId).collect();

    // Each user gets a fixed flat SINR drawn from a plausible cell range,
    // so link adaptation spreads users over the MCS table.
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut channel = StaticChannelState::new(Ratio::from_db(0.0));
    for &user in &users {
        let sinr_db = rng.gen_range(-4.0..22.0);
        channel.set_flat(user, Ratio::from_db(sinr_db), config.mac.num_prbs);
        debug!(%user, sinr_db, "channel state");
    }

    let mut scheduler = Scheduler::new(
        &config.mac,
        users,
        Box::new(channel),
        Box::new(ExponentialEffectiveSinr::default()),
        Box::new(ExponentialEffectiveSinr::default()),
        Box::new(LogisticBlerModel::default()),
        Box::new(FullBufferQueue::new(1_000_000)),
        config.seed,
    );

    let mut clock = SimulationClock::new(config.time);
    let mut total_grants = 0u64;
    let mut total_bits = 0u64;

    while !clock.is_complete() {
        let tti = clock.current_tick();
        let result = scheduler.run_tti(tti);

        total_grants += result.grants.len() as u64;
        for grant in &result.grants {
            if grant.new_data {
                total_bits += u64::from(grant.block_size);
            }
        }
        for block in result.transmissions {
            scheduler.receive_and_decode(block, tti);
        }

        clock.tick();
    }

    let harq = scheduler.harq();
    info!(
        ticks = clock.current_tick().value(),
        grants = total_grants,
        scheduled_mbit = total_bits as f64 / 1e6,
        acks = harq.total_acks(),
        nacks = harq.total_nacks(),
        drops = harq.total_drops(),
        pending_feedback = harq.pending_feedback(),
        "simulation finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

//! Offline exerciser for the linac control library.
//!
//! Runs against the in-memory mock provider, so it is safe to poke at the
//! topology and the orchestration logic without a control network.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::info;

use sc_linac::channel::mock::MockProvider;
use sc_linac::channel::ChannelRegistry;
use sc_linac::config::Settings;
use sc_linac::constants::DEFAULT_STEPPER_MAX_STEPS;
use sc_linac::topology::Topology;

#[derive(Parser)]
#[command(name = "sc_linac", about = "Superconducting linac control exerciser")]
struct Cli {
    /// Path to a settings TOML file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the full machine topology and print a summary.
    Topology,
    /// Run a segmented tuner move against the mock provider.
    Move {
        /// Cryomodule name, e.g. "02" or "H1".
        #[arg(long)]
        cryomodule: String,
        /// Cavity number 1-8.
        #[arg(long)]
        cavity: u8,
        /// Signed number of steps.
        #[arg(long)]
        steps: i64,
        /// Maximum steps per segment.
        #[arg(long, default_value_t = DEFAULT_STEPPER_MAX_STEPS)]
        max_steps: i64,
        /// Motor speed in steps/second.
        #[arg(long, default_value_t = 20_000)]
        speed: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    sc_linac::logging::init(&settings).context("initializing tracing")?;

    let provider = Arc::new(MockProvider::new());
    let registry = ChannelRegistry::new(provider.clone(), settings.channel.retry_policy());
    let topology = Topology::build(&registry, &settings.timing).context("building topology")?;

    match cli.command {
        Command::Topology => {
            for linac in &topology.linacs {
                println!(
                    "{}: {} cryomodules, {} beamline vacuum gauges",
                    linac.name,
                    linac.cryomodules.len(),
                    linac.beamline_vacuum.len()
                );
                for cryomodule in linac.cryomodules.values() {
                    println!(
                        "  CM{} ({}){}",
                        cryomodule.name,
                        cryomodule.channel_prefix,
                        if cryomodule.is_harmonic_linearizer {
                            " [harmonic linearizer]"
                        } else {
                            ""
                        }
                    );
                }
            }
            println!(
                "total: {} cryomodules, {} cavities, {} channels",
                topology.cryomodule_count(),
                topology.cavity_count(),
                registry.len()
            );
        }
        Command::Move {
            cryomodule,
            cavity,
            steps,
            max_steps,
            speed,
        } => {
            let Some(cm) = topology.cryomodule(&cryomodule) else {
                bail!("unknown cryomodule '{cryomodule}'");
            };
            let Some(cavity) = cm.cavity(cavity) else {
                bail!("no cavity {cavity} in cryomodule {cryomodule}");
            };

            // Seed the mock with plausible motor behavior: never busy, always
            // done, and a stepper temperature safely below the interlock.
            let prefix = cavity.id().channel_prefix();
            let mut rng = rand::thread_rng();
            provider.set(&format!("{prefix}STEP:STAT_MOV"), 0i64);
            provider.set(&format!("{prefix}STEP:STAT_DONE"), 1i64);
            provider.set(&format!("{prefix}STEPTEMP"), rng.gen_range(25.0..35.0));

            cavity
                .tuner
                .move_steps(steps, max_steps, speed, true)
                .await
                .context("tuner move failed")?;

            info!(steps, "move complete");
            for (name, value) in provider.all_puts() {
                println!("{name} <- {value:?}");
            }
        }
    }

    Ok(())
}

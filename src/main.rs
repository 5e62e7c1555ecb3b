//! KhojNav - runs relocalization and the search mission on the simulated rover

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use khoj_nav::devices::mock::{RecordingPeripherals, SimScanner, SimWorld};
use khoj_nav::{KhojConfig, MapDriver, Result, Robot, RobotDevices, RoundOutcome};

#[derive(Parser, Debug)]
#[command(name = "khoj-nav")]
#[command(about = "Relocalize on the floor grid, then search the zone for objects")]
struct Args {
    /// Configuration file (default: khoj.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of search rounds
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Start the mission from the configured pose without relocalizing
    #[arg(long)]
    skip_localization: bool,

    /// Simulator noise seed (0 = random)
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<KhojConfig> {
    let mut config = match &args.config {
        Some(path) => KhojConfig::load(path)?,
        None if Path::new("khoj.toml").exists() => KhojConfig::load("khoj.toml")?,
        None => KhojConfig::default(),
    };

    if let Some(rounds) = args.rounds {
        config.mission.rounds = rounds;
    }
    if let Some(seed) = args.seed {
        config.simulation.random_seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("KhojNav v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config, args.skip_localization) {
        error!("Mission aborted: {}", e);
        std::process::exit(1);
    }
}

fn run(config: KhojConfig, skip_localization: bool) -> Result<()> {
    let world = SimWorld::new(
        config.simulation.clone(),
        &config.robot,
        config.localization.sensor_offset,
    );
    let devices = world.devices();
    let mut robot = Robot::new(
        config.clone(),
        RobotDevices {
            drive: devices.drive_base(),
            gyro: devices.gyro.clone(),
            reflectance: devices.reflectance.clone(),
        },
    );

    let odometer = robot.start_odometer()?;
    let navigator = robot.navigator()?;

    if skip_localization {
        info!("Skipping relocalization");
    } else {
        robot.localizer(&navigator).localize()?;
    }

    let peripherals = RecordingPeripherals::new();
    let scanner = SimScanner::new(world.clone());
    let mut driver = MapDriver::new(
        &navigator,
        &peripherals,
        &scanner,
        config.mission.clone(),
        config.robot.tile_size,
    );
    let outcomes = driver.drive()?;

    let retrieved = outcomes
        .iter()
        .filter(|o| matches!(o, RoundOutcome::Retrieved { .. }))
        .count();
    info!(
        "Mission complete: {} of {} rounds retrieved an object",
        retrieved,
        outcomes.len()
    );

    let estimated = odometer.pose();
    let actual = world.true_pose();
    info!(
        "Final pose: estimated ({:.1}, {:.1}, {:.1}) actual ({:.1}, {:.1}, {:.1})",
        estimated.x, estimated.y, estimated.heading, actual.x, actual.y, actual.heading
    );
    let stats = odometer.stats();
    info!(
        "Pose estimator: {} cycles, {} overruns",
        stats.cycles, stats.overruns
    );

    robot.shutdown();
    Ok(())
}

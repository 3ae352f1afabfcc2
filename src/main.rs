use highway_sim::{
    AddVehicle, DriverType, Scenario, Scheduler, SharedSimulation, SimResult, SimulationEngine,
    SimulationState, Statistics, TrafficGenerator,
};
use log::{info, warn};
use std::time::{Duration, Instant};
use structopt::StructOpt;
use tokio::sync::broadcast::error::RecvError;

#[derive(StructOpt)]
#[structopt(name = "highway-sim")]
struct Flags {
    /// Number of ticks to simulate
    #[structopt(long, default_value = "6000")]
    steps: usize,

    /// Traffic entering each lane, in vehicles/h
    #[structopt(long, default_value = "1200")]
    rate: f64,

    /// Seed for traffic generation and desired speeds
    #[structopt(long, default_value = "1")]
    seed: u64,

    /// Spacing of the vehicles on the road at the start, in m
    #[structopt(long, default_value = "100")]
    spacing: f64,

    /// Spread of the starting drivers' desired speeds, as a fraction of the nominal speed
    #[structopt(long, default_value = "0.1")]
    speed_spread: f64,

    /// Log statistics every this many ticks
    #[structopt(long, default_value = "600")]
    report_every: usize,

    /// Step in real time on a scheduler instead of as fast as possible
    #[structopt(long)]
    realtime: bool,

    /// How much faster than real time to run with --realtime
    #[structopt(long, default_value = "10")]
    speedup: f64,
}

#[tokio::main]
async fn main() -> SimResult<()> {
    env_logger::init();
    let flags = Flags::from_args();

    let scenario = Scenario::simple();
    let mut engine = SimulationEngine::with_scenario(&scenario)?;
    let mix = [
        (DriverType::Normal, 0.5),
        (DriverType::Cautious, 0.3),
        (DriverType::Aggressive, 0.2),
    ];
    for lane_id in 0..scenario.lanes {
        let driver_type = mix[lane_id % mix.len()].0;
        let mut position = flags.spacing.max(10.0);
        while position < scenario.length {
            engine.add_vehicle(&AddVehicle::new(lane_id, position, driver_type))?;
            position += flags.spacing.max(10.0);
        }

        let seed = flags.seed.wrapping_add(lane_id as u64);
        engine.add_generator(TrafficGenerator::with_mix(lane_id, flags.rate, &mix, seed)?)?;
    }
    engine.randomise_velocity_adjusts(flags.speed_spread, flags.seed)?;

    if flags.realtime {
        run_scheduled(engine, &flags).await
    } else {
        run_headless(engine, &flags)
    }
}

/// Steps as fast as possible, reporting throughput.
fn run_headless(mut engine: SimulationEngine, flags: &Flags) -> SimResult<()> {
    info!("Simulating {} ticks...", flags.steps);
    let report_every = flags.report_every.max(1);
    let mut done = 0;
    while done < flags.steps {
        let batch = report_every.min(flags.steps - done);
        let start = Instant::now();
        for _ in 0..batch {
            engine.step()?;
        }
        done += batch;

        let tick = start.elapsed() / batch as u32;
        let speedup = engine.settings().time_step / tick.as_secs_f64().max(1e-9);
        report(engine.stats());
        info!("Avg. tick: {:?} --> {:.0}x real time", tick, speedup);
    }
    Ok(())
}

/// Steps on a scheduler until the time limit stops the simulation.
async fn run_scheduled(mut engine: SimulationEngine, flags: &Flags) -> SimResult<()> {
    let mut settings = *engine.settings();
    settings.real_time_factor = flags.speedup;
    settings.max_simulation_time = settings.time_step * flags.steps.max(1) as f64;
    engine.set_settings(settings)?;

    let sim = SharedSimulation::new(engine);
    let mut snapshots = sim.subscribe();
    let scheduler = Scheduler::spawn(sim.clone());
    sim.start()?;

    let report_interval = Duration::from_secs_f64(
        settings.time_step * flags.report_every.max(1) as f64 / settings.real_time_factor,
    );
    let mut last_report = Instant::now();
    loop {
        let snapshot = match snapshots.recv().await {
            Ok(snapshot) => snapshot,
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {} snapshots", missed);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if last_report.elapsed() >= report_interval {
            report(&snapshot.stats);
            last_report = Instant::now();
        }
        if snapshot.state == SimulationState::Stopped {
            report(&snapshot.stats);
            break;
        }
    }
    scheduler.shutdown().await;
    Ok(())
}

fn report(stats: &Statistics) {
    info!(
        "t = {:.0} s: {} vehicles ({} crashed), {} completed, {:.1} m/s, {:.0} veh/h, {:.1} veh/km",
        stats.current_time,
        stats.active_vehicles,
        stats.crashed_vehicles,
        stats.completed_vehicles,
        stats.average_speed,
        stats.total_flow,
        stats.average_density,
    );
}

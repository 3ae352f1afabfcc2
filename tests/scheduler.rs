//! Tests of automatic stepping, using tokio's paused clock.

use assert_approx_eq::assert_approx_eq;
use highway_sim::{
    AddVehicle, DriverType, Scenario, Scheduler, Settings, SharedSimulation, SimulationEngine,
    SimulationState,
};
use std::time::Duration;

fn shared(settings: Settings) -> SharedSimulation {
    let mut engine = SimulationEngine::with_scenario(&Scenario::simple()).unwrap();
    engine.set_settings(settings).unwrap();
    engine
        .add_vehicle(&AddVehicle::new(0, 0.0, DriverType::Normal))
        .unwrap();
    SharedSimulation::new(engine)
}

#[tokio::test(start_paused = true)]
async fn steps_only_while_running() {
    let sim = shared(Settings::default());
    let scheduler = Scheduler::spawn(sim.clone());

    // Stopped: nothing happens
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sim.read(|engine| engine.time()), 0.0);

    let mut rx = sim.subscribe();
    sim.start().unwrap();
    assert_eq!(rx.recv().await.unwrap().state, SimulationState::Running);
    for i in 1..=10 {
        let snapshot = rx.recv().await.unwrap();
        assert_approx_eq!(snapshot.stats.current_time, 0.1 * i as f64);
    }

    sim.pause().unwrap();
    let paused_at = sim.read(|engine| engine.time());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(sim.read(|engine| engine.time()), paused_at);

    sim.resume().unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    assert_approx_eq!(sim.read(|engine| engine.time()), paused_at + 1.0, 0.15);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn real_time_factor_sets_the_cadence() {
    let sim = shared(Settings {
        time_step: 0.1,
        real_time_factor: 4.0,
        ..Default::default()
    });
    let scheduler = Scheduler::spawn(sim.clone());
    sim.start().unwrap();

    // 40 ticks of 25 ms fit in a second of wall clock time
    tokio::time::sleep(Duration::from_millis(1010)).await;
    assert_approx_eq!(sim.read(|engine| engine.time()), 4.0, 0.15);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn time_limit_stops_the_simulation() {
    let sim = shared(Settings {
        max_simulation_time: 2.0,
        ..Default::default()
    });
    let mut rx = sim.subscribe();
    let scheduler = Scheduler::spawn(sim.clone());
    sim.start().unwrap();

    let last = loop {
        let snapshot = rx.recv().await.unwrap();
        if snapshot.state == SimulationState::Stopped {
            break snapshot;
        }
    };
    assert_approx_eq!(last.stats.current_time, 2.0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_approx_eq!(sim.read(|engine| engine.time()), 2.0);

    // Manual steps still work
    sim.step().unwrap();
    assert_approx_eq!(sim.read(|engine| engine.time()), 2.1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_stepping() {
    let sim = shared(Settings::default());
    let scheduler = Scheduler::spawn(sim.clone());
    sim.start().unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;
    scheduler.shutdown().await;

    let time = sim.read(|engine| engine.time());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sim.read(|engine| engine.time()), time);
    assert_eq!(sim.snapshot().state, SimulationState::Running);
}

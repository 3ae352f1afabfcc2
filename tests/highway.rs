//! Tests that drive a whole highway simulation through the public API.

use assert_approx_eq::assert_approx_eq;
use highway_sim::{
    evaluate, idm, AddVehicle, DriverType, Evaluation, LaneChangeDirection, Leader, Scenario,
    Settings, SimError, SimulationEngine, SimulationState, TrafficGenerator, VehicleId,
};

fn simple() -> SimulationEngine {
    SimulationEngine::with_scenario(&Scenario::simple()).unwrap()
}

fn add(engine: &mut SimulationEngine, lane_id: usize, position: f64) -> VehicleId {
    engine
        .add_vehicle(&AddVehicle::new(lane_id, position, DriverType::Idm))
        .unwrap()
}

/// Test that lanes stay ordered and nobody reverses in busy traffic.
#[test]
fn busy_road_keeps_invariants() {
    let mut engine = simple();
    let mix = [
        (DriverType::Aggressive, 1.0),
        (DriverType::Normal, 1.0),
        (DriverType::Cautious, 1.0),
    ];
    for lane_id in 0..3 {
        for pos in [150.0, 400.0, 800.0] {
            add(&mut engine, lane_id, pos + 20.0 * lane_id as f64);
        }
        let generator = TrafficGenerator::with_mix(lane_id, 1500.0, &mix, lane_id as u64).unwrap();
        engine.add_generator(generator).unwrap();
    }
    engine.randomise_velocity_adjusts(0.1, 99).unwrap();

    for _ in 0..1500 {
        engine.step().unwrap();
        for lane in engine.network().lanes() {
            assert!(lane.is_sorted(), "lane {} out of order", lane.id());
            for vehicle in lane.vehicles() {
                assert!(vehicle.vel() >= 0.0);
                assert!(vehicle.pos_mid() <= lane.length());
                assert_eq!(vehicle.lane_id(), lane.id());
            }
        }
    }

    let stats = engine.stats();
    assert!(stats.completed_vehicles > 0);
    assert_eq!(
        stats.total_vehicles,
        stats.active_vehicles + stats.completed_vehicles
    );
}

#[test]
fn idm_equilibrium_on_free_road() {
    for ty in DriverType::ALL {
        let params = ty.params();
        let acc = idm(params, params.desired_speed, params.desired_speed, None);
        assert_approx_eq!(acc, 0.0);
    }
}

#[test]
fn idm_is_deterministic() {
    let params = DriverType::Normal.params();
    let leader = Some(Leader {
        gap: 23.5,
        vel: 17.0,
    });
    let first = idm(params, 30.0, 21.0, leader);
    for _ in 0..10 {
        assert_eq!(idm(params, 30.0, 21.0, leader), first);
    }
    assert!(first < 0.0);
}

/// Test that a worthwhile lane change is vetoed if the new follower would brake too hard.
#[test]
fn unsafe_lane_change_is_vetoed() {
    let mut engine = simple();
    let mover = add(&mut engine, 0, 100.0);
    add(&mut engine, 0, 107.0);
    add(&mut engine, 1, 95.0);

    // The mover would gain from moving left...
    let network = engine.network();
    let lane = network.lane(0).unwrap();
    let vehicle = lane.get(mover).unwrap();
    let (leader, _) = lane.neighbors(mover).unwrap();
    let gain = vehicle.acc_behind(None) - vehicle.acc_behind(leader);
    assert!(gain > vehicle.params().lane_change_threshold);

    // ...but the vehicle it would cut in front of couldn't stop safely
    let evaluation = evaluate(network, vehicle, leader, LaneChangeDirection::Left);
    assert!(
        matches!(evaluation, Evaluation::Unsafe { follower_acc } if follower_acc < -vehicle.params().safe_deceleration),
        "{evaluation:?}"
    );

    for _ in 0..3 {
        engine.step().unwrap();
        assert_eq!(engine.vehicle(mover).unwrap().lane_id(), 0);
    }
}

/// Test that a vehicle with equally good lanes on both sides moves left,
/// and eases across between the lane centres.
#[test]
fn tie_moves_left_and_eases_across() {
    let mut engine = simple();
    let mover = add(&mut engine, 1, 300.0);
    add(&mut engine, 1, 307.0);

    engine.step().unwrap();
    let snapshot = engine.snapshot();
    let info = snapshot.vehicle(mover).unwrap();
    assert_eq!(info.lane_id, 2);
    assert!(info.is_changing_lane);
    assert_eq!(info.lane_change_direction, Some(LaneChangeDirection::Left));
    assert_approx_eq!(info.y, snapshot.lanes[1].y);

    for _ in 0..15 {
        engine.step().unwrap();
    }
    let snapshot = engine.snapshot();
    let info = snapshot.vehicle(mover).unwrap();
    assert!(info.y > snapshot.lanes[1].y && info.y < snapshot.lanes[2].y);
    assert!(info.lane_change_progress > 0.4 && info.lane_change_progress < 0.6);

    for _ in 0..20 {
        engine.step().unwrap();
    }
    let snapshot = engine.snapshot();
    let info = snapshot.vehicle(mover).unwrap();
    assert!(!info.is_changing_lane);
    assert_eq!(info.lane_change_direction, None);
    assert_approx_eq!(info.y, snapshot.lanes[2].y);
}

#[test]
fn first_vehicle_gets_id_zero() {
    let mut engine = simple();
    let id = add(&mut engine, 0, 0.0);
    assert_eq!(id, VehicleId(0));
    let vehicle = engine.vehicle(id).unwrap();
    assert_eq!(vehicle.vel(), 0.0);
    assert_eq!(vehicle.driver_type(), DriverType::Idm);
}

#[test]
fn simple_scenario_status() {
    let mut engine = simple();
    add(&mut engine, 1, 50.0);
    engine.start().unwrap();

    engine.load_scenario(&Scenario::simple()).unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.state, SimulationState::Stopped);
    assert_eq!(snapshot.stats.active_vehicles, 0);
    assert_eq!(snapshot.lanes.len(), 3);
    assert!(snapshot.vehicles.is_empty());
}

#[test]
fn clock_advances_by_time_step() {
    for real_time_factor in [0.5, 1.0, 20.0] {
        let mut engine = simple();
        engine
            .set_settings(Settings {
                time_step: 0.25,
                real_time_factor,
                ..Default::default()
            })
            .unwrap();
        for _ in 0..37 {
            engine.step().unwrap();
        }
        assert_approx_eq!(engine.stats().current_time, 37.0 * 0.25);
    }
}

#[test]
fn overlapping_placement_is_rejected() {
    let mut engine = simple();
    add(&mut engine, 2, 500.0);
    let err = engine
        .add_vehicle(&AddVehicle::new(2, 500.0, DriverType::Cautious))
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::PlacementConflict {
            lane_id: 2,
            other: VehicleId(0),
            ..
        }
    ));
    assert_eq!(engine.stats().active_vehicles, 1);
    assert_eq!(engine.stats().total_vehicles, 1);

    // The same spot in another lane is fine
    assert_eq!(add(&mut engine, 1, 500.0), VehicleId(1));
}

#[test]
fn reset_clears_everything_but_the_lanes() {
    let mut engine = simple();
    add(&mut engine, 0, 10.0);
    add(&mut engine, 1, 10.0);
    engine.start().unwrap();
    engine.step().unwrap();
    engine.step().unwrap();

    engine.reset();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.state, SimulationState::Stopped);
    assert_eq!(snapshot.stats.active_vehicles, 0);
    assert_eq!(snapshot.stats.total_vehicles, 0);
    assert_eq!(snapshot.stats.current_time, 0.0);
    assert_eq!(snapshot.lanes.len(), 3);
    assert_eq!(add(&mut engine, 0, 10.0), VehicleId(0));
}

#[test]
fn stop_keeps_vehicles_and_time() {
    let mut engine = simple();
    add(&mut engine, 0, 10.0);
    engine.start().unwrap();
    engine.step().unwrap();
    engine.stop();
    assert_eq!(engine.state(), SimulationState::Stopped);
    assert_eq!(engine.stats().active_vehicles, 1);
    assert_approx_eq!(engine.time(), 0.1);
}

#[test]
fn state_errors_leave_the_engine_alone() {
    let mut engine = simple();
    assert_eq!(
        engine.resume(),
        Err(SimError::InvalidTransition {
            command: "resume",
            state: SimulationState::Stopped
        })
    );
    assert_eq!(engine.state(), SimulationState::Stopped);
}

#[test]
fn parses_driver_types() {
    assert_eq!("aggressive".parse::<DriverType>(), Ok(DriverType::Aggressive));
    assert_eq!("IDM".parse::<DriverType>(), Ok(DriverType::Idm));
    assert_eq!(
        "reckless".parse::<DriverType>(),
        Err(SimError::UnknownDriverType("reckless".into()))
    );
}

#[test]
fn statistics_follow_the_traffic() {
    let mut engine = simple();
    for (lane_id, pos) in [(0, 100.0), (0, 300.0), (1, 100.0), (2, 1999.0)] {
        add(&mut engine, lane_id, pos);
    }
    let stats = *engine.stats();
    assert_eq!(stats.active_vehicles, 4);
    assert_eq!(stats.average_speed, 0.0);
    assert_approx_eq!(stats.average_density, 4.0 / 3.0 / 2.0);
    assert_eq!(stats.total_flow, 0.0);

    for _ in 0..50 {
        engine.step().unwrap();
    }
    let stats = *engine.stats();
    assert_eq!(stats.completed_vehicles, 1);
    assert_eq!(stats.active_vehicles, 3);
    assert!(stats.average_speed > 0.0);
    assert!(stats.total_flow > 0.0);
    assert_approx_eq!(stats.current_time, 5.0);
}

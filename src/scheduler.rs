//! Sharing a simulation between tasks, and stepping it in real time.

use crate::error::SimResult;
use crate::scenario::Scenario;
use crate::settings::Settings;
use crate::simulation::{AddVehicle, SimulationEngine};
use crate::snapshot::Snapshot;
use crate::vehicle::VehicleId;
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// The number of snapshots a slow subscriber can fall behind before it misses some.
const SNAPSHOT_BUFFER: usize = 64;

/// A handle to a simulation which can be shared between tasks.
///
/// Every command and every tick holds the lock for its whole duration, so no one
/// ever sees a half-simulated tick. A snapshot is published to subscribers after
/// every tick and every successful command.
#[derive(Clone, Debug)]
pub struct SharedSimulation {
    engine: Arc<Mutex<SimulationEngine>>,
    snapshots: broadcast::Sender<Arc<Snapshot>>,
}

impl SharedSimulation {
    pub fn new(engine: SimulationEngine) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            snapshots,
        }
    }

    /// Subscribes to the snapshots published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.snapshots.subscribe()
    }

    /// Takes a snapshot of the simulation as it is now.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Gets the current settings.
    pub fn settings(&self) -> Settings {
        *self.lock().settings()
    }

    /// Runs a read-only query against the simulation.
    pub fn read<R>(&self, query: impl FnOnce(&SimulationEngine) -> R) -> R {
        query(&*self.lock())
    }

    pub fn start(&self) -> SimResult<()> {
        self.command(SimulationEngine::start)
    }

    pub fn pause(&self) -> SimResult<()> {
        self.command(SimulationEngine::pause)
    }

    pub fn resume(&self) -> SimResult<()> {
        self.command(SimulationEngine::resume)
    }

    pub fn stop(&self) {
        let _ = self.command(|engine| {
            engine.stop();
            Ok(())
        });
    }

    pub fn reset(&self) {
        let _ = self.command(|engine| {
            engine.reset();
            Ok(())
        });
    }

    pub fn load_scenario(&self, scenario: &Scenario) -> SimResult<()> {
        self.command(|engine| engine.load_scenario(scenario))
    }

    pub fn set_settings(&self, settings: Settings) -> SimResult<()> {
        self.command(|engine| engine.set_settings(settings))
    }

    pub fn add_vehicle(&self, request: &AddVehicle) -> SimResult<VehicleId> {
        self.command(|engine| engine.add_vehicle(request))
    }

    pub fn remove_vehicle(&self, id: VehicleId) -> SimResult<()> {
        self.command(|engine| engine.remove_vehicle(id))
    }

    /// Simulates one tick, whatever the lifecycle state, and publishes the result.
    pub fn step(&self) -> SimResult<Arc<Snapshot>> {
        let mut engine = self.lock();
        engine.step()?;
        Ok(self.publish(&engine))
    }

    /// Simulates one tick if the simulation is running.
    /// Returns the published snapshot if a tick was simulated.
    pub fn advance(&self) -> SimResult<Option<Arc<Snapshot>>> {
        let mut engine = self.lock();
        if engine.advance()? {
            Ok(Some(self.publish(&engine)))
        } else {
            Ok(None)
        }
    }

    /// The wall clock time between automatic ticks.
    pub fn tick_interval(&self) -> Duration {
        self.lock().settings().tick_interval()
    }

    fn command<R>(&self, f: impl FnOnce(&mut SimulationEngine) -> SimResult<R>) -> SimResult<R> {
        let mut engine = self.lock();
        let result = f(&mut *engine)?;
        self.publish(&engine);
        Ok(result)
    }

    fn publish(&self, engine: &SimulationEngine) -> Arc<Snapshot> {
        let snapshot = Arc::new(engine.snapshot());
        // Nobody listening is fine
        let _ = self.snapshots.send(snapshot.clone());
        snapshot
    }

    /// Ticks are committed all at once, so the engine is consistent even if
    /// a holder of the lock panicked.
    fn lock(&self) -> MutexGuard<'_, SimulationEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Steps a shared simulation in real time while it's running.
///
/// The time between ticks is `time_step / real_time_factor`, read afresh before
/// each tick. The scheduler stops when shut down or dropped.
#[derive(Debug)]
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the scheduling task onto the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(simulation: SharedSimulation) -> Self {
        let (shutdown, mut signal) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(simulation.tick_interval()) => {}
                    _ = signal.changed() => break,
                }
                if let Err(err) = simulation.advance() {
                    warn!("Scheduled tick failed: {}", err);
                }
            }
            debug!("Scheduler stopped");
        });
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Stops scheduling ticks, waiting for any tick in progress to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

use crate::vehicle::lane_change::Evaluation;
use crate::vehicle::{LaneChangeDirection, VehicleId};
use serde_json::json;

/// Diagnostic records gathered while simulating one step.
/// Nothing is recorded unless the frame is enabled.
#[derive(Clone, Debug, Default)]
pub struct DebugFrame {
    enabled: bool,
    entries: Vec<serde_json::Value>,
}

impl DebugFrame {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: vec![],
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn push(&mut self, entry: impl FnOnce() -> serde_json::Value) {
        if self.enabled {
            self.entries.push(entry());
        }
    }

    pub fn lane_change_rejected(
        &mut self,
        vehicle: VehicleId,
        direction: LaneChangeDirection,
        evaluation: Evaluation,
    ) {
        self.push(|| {
            let (reason, value) = match evaluation {
                Evaluation::NoLane => ("no_lane", None),
                Evaluation::Blocked => ("blocked", None),
                Evaluation::Unsafe { follower_acc } => ("unsafe", Some(follower_acc)),
                Evaluation::NoIncentive { margin } => ("no_incentive", Some(margin)),
                Evaluation::Change { margin } => ("superseded", Some(margin)),
            };
            json!({
                "type": "lane_change_rejected",
                "vehicle": vehicle.0,
                "direction": format!("{direction:?}"),
                "reason": reason,
                "value": value,
            })
        })
    }

    pub fn lane_change(&mut self, vehicle: VehicleId, from: usize, to: usize, margin: f64) {
        self.push(|| {
            json!({
                "type": "lane_change",
                "vehicle": vehicle.0,
                "from": from,
                "to": to,
                "margin": margin,
            })
        })
    }

    pub fn collision(&mut self, lane_id: usize, follower: VehicleId, leader: VehicleId) {
        self.push(|| {
            json!({
                "type": "collision",
                "lane": lane_id,
                "follower": follower.0,
                "leader": leader.0,
            })
        })
    }

    pub fn exit(&mut self, vehicle: VehicleId, lane_id: usize) {
        self.push(|| {
            json!({
                "type": "exit",
                "vehicle": vehicle.0,
                "lane": lane_id,
            })
        })
    }

    /// Takes the records as a JSON array, leaving the frame empty.
    pub fn take(&mut self) -> serde_json::Value {
        serde_json::Value::Array(std::mem::take(&mut self.entries))
    }
}

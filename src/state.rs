use serde::{Deserialize, Serialize};

use crate::assist::AssistFlags;
use crate::body::{RigidBody, WheelState};
use crate::telemetry::TelemetrySample;

/// Per-tick rider input. Out-of-range values are clamped silently so the
/// interactive loop never stalls on a noisy controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    pub throttle: f32,    // 0..1
    pub brake_front: f32, // 0..1
    pub brake_rear: f32,  // 0..1
    pub steer: f32,       // -1..1, + = right
}

impl ControlInput {
    pub fn clamped(self) -> Self {
        // NaN has no order, so it maps to neutral; infinities saturate
        // through the range clamp like any other out-of-range value.
        let sanitize = |v: f32| if v.is_nan() { 0.0 } else { v };
        Self {
            throttle: sanitize(self.throttle).clamp(0.0, 1.0),
            brake_front: sanitize(self.brake_front).clamp(0.0, 1.0),
            brake_rear: sanitize(self.brake_rear).clamp(0.0, 1.0),
            steer: sanitize(self.steer).clamp(-1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WheelSnapshot {
    pub compression: f32, // m
    pub spin: f32,        // rad/s
    pub grounded: bool,
}

impl From<&WheelState> for WheelSnapshot {
    fn from(w: &WheelState) -> Self {
        Self {
            compression: w.compression,
            spin: w.spin,
            grounded: w.grounded,
        }
    }
}

/// The per-tick publication: a fully formed, immutable copy of everything a
/// rendering/UI/graph consumer needs. Owned by the consumer until the next
/// tick replaces it; never a handle into live simulation memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    pub tick: u64,
    pub vehicle: String,

    pub position: [f32; 3],
    pub orientation: [f32; 4], // quaternion (i, j, k, w)
    pub linvel: [f32; 3],

    pub front_wheel: WheelSnapshot,
    pub rear_wheel: WheelSnapshot,

    pub telemetry: TelemetrySample,
    pub assists: AssistFlags,

    /// True when this tick was rejected and the body snapshot above is the
    /// previous valid one.
    pub numeric_instability: bool,
}

impl SimulationState {
    pub fn capture(
        tick: u64,
        vehicle: &str,
        body: &RigidBody,
        front: &WheelState,
        rear: &WheelState,
        telemetry: TelemetrySample,
        assists: AssistFlags,
        numeric_instability: bool,
    ) -> Self {
        let q = body.orientation.quaternion();
        Self {
            tick,
            vehicle: vehicle.to_string(),
            position: [body.position.x, body.position.y, body.position.z],
            orientation: [q.i, q.j, q.k, q.w],
            linvel: [body.linvel.x, body.linvel.y, body.linvel.z],
            front_wheel: front.into(),
            rear_wheel: rear.into(),
            telemetry,
            assists,
            numeric_instability,
        }
    }
}

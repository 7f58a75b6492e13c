// ==============================================================================
// telemetry.rs — DERIVED, HUMAN-FACING QUANTITIES (PURE)
// ==============================================================================
// Everything here is computed from rigid-body state; nothing feeds back into
// the integrator. The assist systems read the previous tick's sample, which
// is the only cross-tick coupling in the loop.
// ==============================================================================

use nalgebra::Vector3;
use serde::Serialize;

use crate::body::{lean_angle, RigidBodyModel, WheelState};
use crate::engine::EngineModel;
use crate::vehicle::DrivetrainSpec;

/// Ground-speed floor for slip ratios, so a standstill never divides by zero.
pub const SLIP_EPSILON: f32 = 0.5; // m/s

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub speed: f32,      // m/s
    pub rpm: f32,        // 0..max_rpm
    pub gear: u8,        // 1..=6
    pub lean_angle: f32, // deg, + = rider's right
    pub pitch: f32,      // deg, + = nose up
    pub roll: f32,       // deg, same derivation as lean_angle
    pub yaw: f32,        // deg, heading
    pub slip_front: f32, // (surface - ground) / max(ground, eps)
    pub slip_rear: f32,
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self {
            speed: 0.0,
            rpm: 0.0,
            gear: 1,
            lean_angle: 0.0,
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
            slip_front: 0.0,
            slip_rear: 0.0,
        }
    }
}

fn slip_ratio(wheel: &WheelState, ground_speed: f32) -> f32 {
    (wheel.surface_speed() - ground_speed) / ground_speed.abs().max(SLIP_EPSILON)
}

pub struct TelemetryAggregator;

impl TelemetryAggregator {
    /// Pure derivation; gear is a function of speed only (no hysteresis,
    /// matching the instantaneous band table).
    pub fn derive(model: &RigidBodyModel, drivetrain: &DrivetrainSpec) -> TelemetrySample {
        let body = &model.body;
        let speed = body.linvel.norm();
        let heading = model.heading();
        let ground = model.ground_speed();

        let gear = EngineModel::gear_for(speed * 3.6);
        let rpm = drivetrain.engine_rpm(model.rear.spin, gear);

        let fwd = body.orientation * Vector3::x();
        let up = body.orientation * Vector3::y();

        let pitch = fwd.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = (-fwd.z).atan2(fwd.x).to_degrees();
        let roll = lean_angle(&up, &heading).to_degrees();

        TelemetrySample {
            speed,
            rpm,
            gear,
            lean_angle: roll,
            pitch,
            roll,
            yaw,
            slip_front: slip_ratio(&model.front, ground),
            slip_rear: slip_ratio(&model.rear, ground),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBodyModel;
    use crate::catalog;
    use nalgebra::UnitQuaternion;

    fn model() -> RigidBodyModel {
        RigidBodyModel::from_spec(&catalog::r1m())
    }

    #[test]
    fn standstill_sample_is_quiet() {
        let m = model();
        let s = TelemetryAggregator::derive(&m, &catalog::r1m().drivetrain);
        assert_eq!(s.speed, 0.0);
        assert_eq!(s.gear, 1);
        assert_eq!(s.rpm, 0.0);
        assert_eq!(s.slip_front, 0.0);
        assert_eq!(s.slip_rear, 0.0);
    }

    #[test]
    fn gear_tracks_speed_bands() {
        let mut m = model();
        m.body.linvel = Vector3::new(30.0, 0.0, 0.0); // 108 km/h
        let s = TelemetryAggregator::derive(&m, &catalog::r1m().drivetrain);
        assert_eq!(s.gear, 3);
    }

    #[test]
    fn rpm_clamps_to_redline() {
        let spec = catalog::r1m();
        let mut m = model();
        m.rear.spin = 10_000.0; // absurd spin
        let s = TelemetryAggregator::derive(&m, &spec.drivetrain);
        assert_eq!(s.rpm, spec.drivetrain.max_rpm);
    }

    #[test]
    fn rear_slip_positive_when_spinning_up() {
        let mut m = model();
        m.body.linvel = Vector3::new(10.0, 0.0, 0.0);
        m.rear.spin = 12.0 / m.rear.radius; // surface 12 m/s vs ground 10
        let s = TelemetryAggregator::derive(&m, &catalog::r1m().drivetrain);
        assert!((s.slip_rear - 0.2).abs() < 1e-3);
    }

    #[test]
    fn front_slip_negative_under_lockup() {
        let mut m = model();
        m.body.linvel = Vector3::new(20.0, 0.0, 0.0);
        m.front.spin = 10.0 / m.front.radius; // surface 10 m/s vs ground 20
        let s = TelemetryAggregator::derive(&m, &catalog::r1m().drivetrain);
        assert!(s.slip_front < -0.4);
    }

    #[test]
    fn lean_sign_follows_orientation() {
        let mut m = model();
        // roll about the forward (+X) axis: negative angle tips the up axis
        // toward world right (-Z)
        m.body.orientation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -0.2);
        let s = TelemetryAggregator::derive(&m, &catalog::r1m().drivetrain);
        assert!(s.lean_angle > 5.0);
        assert_eq!(s.roll, s.lean_angle);
    }
}

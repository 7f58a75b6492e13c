// ==============================================================================
// body.rs — CHASSIS + WHEEL RIGID-BODY MODEL (FIXED-SUBSTEP INTEGRATION)
// ==============================================================================
// Self-contained constraint model for a fixed two-wheel topology: no
// broadphase, no contact solver. Each substep applies, in order:
//
// 1) gravity on the chassis
// 2) per-wheel spring-damper suspension (compression clamped to [0, travel])
// 3) aerodynamic drag  F = -1/2 * rho * Cd * A * |v| * v
// 4) drive force at the rear contact patch (below the COM, so hard launches
//    pitch the nose up)
// 5) brake forces opposing longitudinal motion at the wheel contacts
// 6) steer torque (yaw) + lean spring toward the steer-implied roll target
// 7) wheel spin update (drive/brake torque + relaxation toward ground speed)
//
// then integrates with semi-implicit Euler and renormalizes the orientation.
// A non-finite result anywhere rejects the whole tick: the body and wheels
// roll back to the snapshot taken at the start of `step` and the caller gets
// `NumericInstability`.
//
// Axes: +X forward, +Y up, +Z left (right-handed). Ground is the y = 0 plane.
// ==============================================================================

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::SimError;
use crate::vehicle::{AeroSpec, SuspensionSpec, VehicleSpec};

pub const GRAVITY: f32 = 9.81;      // m/s^2
pub const AIR_DENSITY: f32 = 1.225; // kg/m^3

pub const FIXED_STEP: f32 = 1.0 / 60.0; // s, internal substep
pub const MAX_SUBSTEPS: usize = 5;

// Lean dynamics: steer torque maps to a roll target, and a spring-damper
// pulls the chassis toward it. Orientation stays the single source of truth
// for the telemetry lean angle.
const STEER_TORQUE_REF: f32 = 300.0; // N*m of steer torque per full roll target
const MAX_LEAN: f32 = 0.96;          // rad (~55 deg)
const LEAN_STIFFNESS: f32 = 2600.0;  // N*m/rad
const LEAN_DAMPING: f32 = 520.0;     // N*m*s/rad

// Wheel spin relaxes toward ground speed while grounded; slip builds up only
// while drive/brake torque outruns this coupling.
const SPIN_COUPLING: f32 = 9.0; // 1/s
const WHEEL_INERTIA: f32 = 0.8; // kg*m^2 about the spin axis

/// Chassis state. Orientation is kept unit-norm by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub mass: f32,                // kg
    pub inertia: Vector3<f32>,    // kg*m^2, diagonal approximation
    pub position: Vector3<f32>,   // m, COM in world space
    pub orientation: UnitQuaternion<f32>,
    pub linvel: Vector3<f32>,     // m/s
    pub angvel: Vector3<f32>,     // rad/s, world space
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspensionLink {
    pub rest_length: f32, // m
    pub stiffness: f32,   // N/m
    pub damping: f32,     // N*s/m
    pub travel: f32,      // m
}

impl From<SuspensionSpec> for SuspensionLink {
    fn from(s: SuspensionSpec) -> Self {
        Self {
            rest_length: s.rest_length,
            stiffness: s.stiffness,
            damping: s.damping,
            travel: s.travel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub anchor: Vector3<f32>, // chassis-local suspension anchor
    pub radius: f32,          // m
    pub link: SuspensionLink,
    pub compression: f32,     // m, always in [0, travel]
    pub spin: f32,            // rad/s
    pub grounded: bool,
    pub driven: bool,
}

impl WheelState {
    fn new(anchor: Vector3<f32>, radius: f32, link: SuspensionLink, driven: bool) -> Self {
        Self {
            anchor,
            radius,
            link,
            compression: 0.0,
            spin: 0.0,
            grounded: false,
            driven,
        }
    }

    /// Wheel surface speed at the contact (m/s).
    pub fn surface_speed(&self) -> f32 {
        self.spin * self.radius
    }
}

/// Per-tick force/torque request, already shaped by the assist systems.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelCommand {
    pub drive_force: f32,  // N, at the rear contact along heading
    pub brake_front: f32,  // N
    pub brake_rear: f32,   // N
    pub steer_torque: f32, // N*m about world up
}

/// Fixed-step accumulator: converts irregular frame intervals into whole
/// substeps of `h`, capped per call. Fractional time carries over; time
/// beyond the cap is dropped so a long stall cannot trigger a catch-up
/// burst. `reset` is called on resume.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    pub h: f32,
    pub max_substeps: usize,
    acc: f32,
}

impl FixedStep {
    pub fn new(h: f32, max_substeps: usize) -> Self {
        Self { h, max_substeps, acc: 0.0 }
    }

    /// Number of whole substeps to run for this call's `dt`.
    pub fn advance(&mut self, dt: f32) -> usize {
        self.acc += dt.max(0.0);
        // small tolerance so dt == h reliably yields one substep
        let mut n = (self.acc / self.h + 1e-4) as usize;
        if n > self.max_substeps {
            n = self.max_substeps;
            self.acc = 0.0;
        } else {
            self.acc = (self.acc - n as f32 * self.h).max(0.0);
        }
        n
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }

    #[cfg(test)]
    pub(crate) fn accumulated(&self) -> f32 {
        self.acc
    }
}

pub struct RigidBodyModel {
    pub body: RigidBody,
    pub front: WheelState,
    pub rear: WheelState,
    pub aero: AeroSpec,
    scheduler: FixedStep,
}

impl RigidBodyModel {
    pub fn from_spec(spec: &VehicleSpec) -> Self {
        let wb = spec.wheelbase;
        let h = spec.com_height;
        let m = spec.mass;

        // Slim-box inertia approximation: yaw and pitch from the wheelbase,
        // roll from the COM height.
        let inertia = Vector3::new(
            0.4 * m * h * h,          // roll (about +X)
            0.10 * m * wb * wb,       // yaw (about +Y)
            0.125 * m * wb * wb,      // pitch (about +Z)
        );

        let body = RigidBody {
            mass: m,
            inertia,
            position: Vector3::new(0.0, h, 0.0),
            orientation: UnitQuaternion::identity(),
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
        };

        let r = spec.drivetrain.wheel_radius;
        let front = WheelState::new(
            Vector3::new(wb * 0.5, 0.0, 0.0),
            r,
            spec.front_suspension.into(),
            false,
        );
        let rear = WheelState::new(
            Vector3::new(-wb * 0.5, 0.0, 0.0),
            r,
            spec.rear_suspension.into(),
            true,
        );

        Self {
            body,
            front,
            rear,
            aero: spec.aero,
            scheduler: FixedStep::new(FIXED_STEP, MAX_SUBSTEPS),
        }
    }

    /// Heading direction: chassis forward projected onto the ground plane.
    pub fn heading(&self) -> Vector3<f32> {
        let fwd = self.body.orientation * Vector3::x();
        let flat = Vector3::new(fwd.x, 0.0, fwd.z);
        if flat.norm() > 1e-6 {
            flat.normalize()
        } else {
            Vector3::x()
        }
    }

    /// Signed longitudinal ground speed (m/s along heading).
    pub fn ground_speed(&self) -> f32 {
        self.body.linvel.dot(&self.heading())
    }

    /// Scale suspension stiffness/damping on both wheels (handling upgrades).
    pub fn scale_suspension(&mut self, factor: f32) {
        for w in [&mut self.front, &mut self.rear] {
            w.link.stiffness *= factor;
            w.link.damping *= factor;
        }
    }

    /// Adjust chassis mass (weight upgrades). Clamped to a sane floor so a
    /// stack of weight deltas can never invert the dynamics.
    pub fn add_mass(&mut self, delta_kg: f32) {
        self.body.mass = (self.body.mass + delta_kg).max(50.0);
    }

    pub fn reset_accumulator(&mut self) {
        self.scheduler.reset();
    }

    /// Advance by `dt` in fixed substeps. On a non-finite result the whole
    /// tick is rejected: state rolls back and `NumericInstability` is
    /// returned (recoverable; the caller keeps ticking).
    pub fn step(&mut self, dt: f32, cmd: &WheelCommand) -> Result<(), SimError> {
        let snapshot = (self.body.clone(), self.front, self.rear);

        let n = self.scheduler.advance(dt);
        for _ in 0..n {
            self.substep(self.scheduler.h, cmd);
            if !self.is_finite() {
                self.body = snapshot.0.clone();
                self.front = snapshot.1;
                self.rear = snapshot.2;
                return Err(SimError::NumericInstability);
            }
        }
        Ok(())
    }

    fn is_finite(&self) -> bool {
        let b = &self.body;
        let q = b.orientation.quaternion();
        b.position.iter().all(|v| v.is_finite())
            && b.linvel.iter().all(|v| v.is_finite())
            && b.angvel.iter().all(|v| v.is_finite())
            && q.coords.iter().all(|v| v.is_finite())
            && self.front.compression.is_finite()
            && self.rear.compression.is_finite()
            && self.front.spin.is_finite()
            && self.rear.spin.is_finite()
    }

    fn substep(&mut self, h: f32, cmd: &WheelCommand) {
        let mut force = Vector3::new(0.0, -self.body.mass * GRAVITY, 0.0);
        let mut torque = Vector3::zeros();

        let rot = self.body.orientation;
        let pos = self.body.position;
        let heading = self.heading();
        let v_long = self.body.linvel.dot(&heading);

        // ------------------------------------------------------------
        // Suspension: spring-damper per wheel, compression clamped
        // ------------------------------------------------------------
        for w in [&mut self.front, &mut self.rear] {
            let anchor_world = pos + rot * w.anchor;
            let raw = w.link.rest_length + w.radius - anchor_world.y;
            let compression = raw.clamp(0.0, w.link.travel);
            let rate = (compression - w.compression) / h;

            w.grounded = raw > 0.0;
            w.compression = compression;

            if w.grounded {
                let spring = w.link.stiffness * compression;
                let damper = w.link.damping * rate;
                let mut magnitude = (spring + damper).max(0.0);

                // bump stop: once travel is used up the spring alone can no
                // longer carry the load, so stiffen sharply past the limit
                if raw > w.link.travel {
                    magnitude += 8.0 * w.link.stiffness * (raw - w.link.travel);
                }

                let f = Vector3::new(0.0, magnitude, 0.0);
                force += f;
                torque += (anchor_world - pos).cross(&f);
            }
        }

        // ------------------------------------------------------------
        // Aerodynamic drag
        // ------------------------------------------------------------
        let v = self.body.linvel;
        let speed = v.norm();
        if speed > 1e-4 {
            force += -0.5 * AIR_DENSITY * self.aero.drag_coefficient * self.aero.frontal_area
                * speed
                * v;
        }

        // ------------------------------------------------------------
        // Drive force at the rear contact patch
        // ------------------------------------------------------------
        if self.rear.grounded && cmd.drive_force != 0.0 {
            let anchor_world = pos + rot * self.rear.anchor;
            let contact = Vector3::new(anchor_world.x, 0.0, anchor_world.z);
            let f = heading * cmd.drive_force;
            force += f;
            torque += (contact - pos).cross(&f);
        }

        // ------------------------------------------------------------
        // Brakes oppose longitudinal motion at the contact patches
        // ------------------------------------------------------------
        if v_long.abs() > 0.05 {
            let dir = -v_long.signum();
            for (w, requested) in [(&self.front, cmd.brake_front), (&self.rear, cmd.brake_rear)] {
                if !w.grounded || requested <= 0.0 {
                    continue;
                }
                // never push the chassis backwards through zero
                let cap = v_long.abs() * self.body.mass / h;
                let f = heading * (dir * requested.min(cap));
                let anchor_world = pos + rot * w.anchor;
                let contact = Vector3::new(anchor_world.x, 0.0, anchor_world.z);
                force += f;
                torque += (contact - pos).cross(&f);
            }
        }

        // ------------------------------------------------------------
        // Steering: yaw torque + lean spring toward the implied roll
        // ------------------------------------------------------------
        torque.y += cmd.steer_torque;

        let up = rot * Vector3::y();
        let roll = lean_angle(&up, &heading);
        // lean-positive sense: leaning right is a negative rotation about
        // the heading axis
        let roll_rate = -self.body.angvel.dot(&heading);
        let roll_target =
            (cmd.steer_torque / STEER_TORQUE_REF).clamp(-1.0, 1.0) * MAX_LEAN * speed_authority(speed);
        let lean_torque = LEAN_STIFFNESS * (roll_target - roll) - LEAN_DAMPING * roll_rate;
        torque -= heading * lean_torque;

        // ------------------------------------------------------------
        // Wheel spin: drive/brake torque, then relax toward ground speed
        // ------------------------------------------------------------
        for (w, brake) in [
            (&mut self.front, cmd.brake_front),
            (&mut self.rear, cmd.brake_rear),
        ] {
            if w.driven {
                w.spin += h * cmd.drive_force * w.radius / WHEEL_INERTIA;
            }
            if brake > 0.0 && w.spin != 0.0 {
                let decel = h * brake * w.radius / WHEEL_INERTIA;
                // brake torque stops at zero spin, never reverses it
                w.spin -= w.spin.signum() * decel.min(w.spin.abs());
            }
            if w.grounded {
                let ground_w = v_long / w.radius;
                w.spin += (ground_w - w.spin) * (SPIN_COUPLING * h).min(1.0);
            }
        }

        // ------------------------------------------------------------
        // Semi-implicit Euler
        // ------------------------------------------------------------
        self.body.linvel += force * (h / self.body.mass);
        self.body.position += self.body.linvel * h;

        self.body.angvel += Vector3::new(
            torque.x / self.body.inertia.x,
            torque.y / self.body.inertia.y,
            torque.z / self.body.inertia.z,
        ) * h;

        let delta = UnitQuaternion::from_scaled_axis(self.body.angvel * h);
        self.body.orientation =
            UnitQuaternion::new_normalize((delta * self.body.orientation).into_inner());
    }

}

/// Roll of the chassis up axis about the heading, positive = leaning toward
/// the rider's right. Orientation-based on purpose: transient acceleration
/// noise never shows up here.
pub fn lean_angle(chassis_up: &Vector3<f32>, heading: &Vector3<f32>) -> f32 {
    // world right = world up x heading (+X forward, +Z left)
    let right = Vector3::y().cross(heading);
    chassis_up.dot(&right).atan2(chassis_up.y.max(1e-6))
}

/// Lean authority grows with speed; a stationary bike does not roll over
/// from steer input alone.
fn speed_authority(speed: f32) -> f32 {
    (speed / 8.0).clamp(0.0, 1.0)
}

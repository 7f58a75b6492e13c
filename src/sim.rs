// ==============================================================================
// sim.rs — SIMULATION CONTEXT (ONE VEHICLE, ONE LOOP)
// ==============================================================================
// Owns the engine model, rigid body, assist bank and the active assist
// config, and runs the per-tick pipeline:
//
//   clamp input -> engine output at last tick's rpm/gear -> wheel command
//   -> assist bank shapes the command -> body step -> derive telemetry
//   -> publish an immutable SimulationState
//
// The assists always see the *previous* tick's telemetry, so their reaction
// is one tick behind by construction. A rejected body step (numeric
// instability) publishes the previous valid body under a raised flag and
// the loop keeps running.
// ==============================================================================

use crate::assist::{AssistBank, AssistConfig, AssistFlags, AssistSystem, RidingMode};
use crate::body::{RigidBodyModel, WheelCommand};
use crate::engine::{CurveSample, EngineModel};
use crate::error::SimError;
use crate::state::{ControlInput, SimulationState};
use crate::telemetry::{TelemetryAggregator, TelemetrySample};
use crate::vehicle::{UpgradeEffect, VehicleSpec};

// Full brake lever / pedal force at the contact patch.
const MAX_BRAKE_FRONT: f32 = 6000.0; // N
const MAX_BRAKE_REAR: f32 = 3000.0;  // N
// Full steer input torque; matches the roll-target reference in the body
// model so steer = 1 asks for the maximum lean.
const MAX_STEER_TORQUE: f32 = 300.0; // N*m

pub struct SimulationContext {
    spec: VehicleSpec,
    engine: EngineModel,
    body: RigidBodyModel,
    assists: AssistBank,
    assist_config: AssistConfig,

    last_sample: TelemetrySample,
    last_state: SimulationState,
    running: bool,
    tick: u64,
    instability_count: u64,

    #[cfg(test)]
    poison_next: bool,
}

impl SimulationContext {
    /// Validates the spec first; a rejected spec constructs nothing.
    pub fn new(spec: &VehicleSpec) -> Result<Self, SimError> {
        spec.validate()?;
        let engine = EngineModel::from_spec(spec)?;
        let body = RigidBodyModel::from_spec(spec);

        let last_sample = TelemetrySample::default();
        let last_state = SimulationState::capture(
            0,
            &spec.name,
            &body.body,
            &body.front,
            &body.rear,
            last_sample,
            AssistFlags::default(),
            false,
        );

        Ok(Self {
            spec: spec.clone(),
            engine,
            body,
            assists: AssistBank::new(),
            assist_config: AssistConfig::default(),
            last_sample,
            last_state,
            running: true,
            tick: 0,
            instability_count: 0,
            #[cfg(test)]
            poison_next: false,
        })
    }

    /// Advance one tick. While paused this is a no-op that returns the last
    /// published state unchanged.
    pub fn tick(&mut self, dt: f32, input: ControlInput) -> &SimulationState {
        if !self.running {
            return &self.last_state;
        }

        let input = input.clamped();

        // Engine output at the operating point the rider currently sees.
        let out = self.engine.evaluate(self.last_sample.rpm, input.throttle);
        let mut cmd = WheelCommand {
            drive_force: self.spec.drivetrain.wheel_force(out.torque, self.last_sample.gear),
            brake_front: input.brake_front * MAX_BRAKE_FRONT,
            brake_rear: input.brake_rear * MAX_BRAKE_REAR,
            steer_torque: input.steer * MAX_STEER_TORQUE,
        };

        let flags = self.assists.apply(&self.assist_config, &self.last_sample, &mut cmd);

        #[cfg(test)]
        if std::mem::take(&mut self.poison_next) {
            cmd.drive_force = f32::NAN;
        }

        let unstable = self.body.step(dt, &cmd).is_err();
        if unstable {
            self.instability_count += 1;
        }

        // On a rejected step the body is already rolled back, so this
        // derives the previous valid telemetry.
        self.last_sample = TelemetryAggregator::derive(&self.body, &self.spec.drivetrain);
        self.tick += 1;
        self.last_state = SimulationState::capture(
            self.tick,
            &self.spec.name,
            &self.body.body,
            &self.body.front,
            &self.body.rear,
            self.last_sample,
            flags,
            unstable,
        );
        &self.last_state
    }

    /// Install an upgrade by catalog id. `Ok(false)` means already
    /// installed; only a fresh install touches the body.
    pub fn apply_upgrade(&mut self, id: &str) -> Result<bool, SimError> {
        let modifier = self
            .spec
            .find_upgrade(id)
            .ok_or_else(|| SimError::UnknownUpgradeId(id.to_string()))?
            .clone();

        let newly = self.engine.apply_upgrade(&modifier)?;
        if newly {
            match modifier.effect {
                UpgradeEffect::SuspensionGain { factor } => self.body.scale_suspension(factor),
                UpgradeEffect::WeightDelta { kg } => self.body.add_mass(kg),
                UpgradeEffect::EngineGain { .. } => {}
            }
        }
        Ok(newly)
    }

    pub fn set_riding_mode(&mut self, mode: RidingMode) {
        self.assist_config.set_mode(mode);
    }

    pub fn set_assist_level(&mut self, system: AssistSystem, level: u8) {
        self.assist_config.set_level(system, level);
    }

    /// Replace the active vehicle. Transactional: a spec that fails
    /// validation leaves the current vehicle untouched.
    pub fn swap_vehicle(&mut self, spec: &VehicleSpec) -> Result<(), SimError> {
        spec.validate()?;
        let engine = EngineModel::from_spec(spec)?;

        self.engine = engine;
        self.body = RigidBodyModel::from_spec(spec);
        self.spec = spec.clone();
        self.assists.reset();
        self.assist_config = AssistConfig::default();
        self.last_sample = TelemetrySample::default();
        self.last_state = SimulationState::capture(
            self.tick,
            &self.spec.name,
            &self.body.body,
            &self.body.front,
            &self.body.rear,
            self.last_sample,
            AssistFlags::default(),
            false,
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume ticking. Drops any banked fixed-step time so the first tick
    /// after a pause never runs a catch-up burst.
    pub fn resume(&mut self) {
        self.running = true;
        self.body.reset_accumulator();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &SimulationState {
        &self.last_state
    }

    pub fn telemetry(&self) -> &TelemetrySample {
        &self.last_sample
    }

    pub fn assist_config(&self) -> &AssistConfig {
        &self.assist_config
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    pub fn instability_count(&self) -> u64 {
        self.instability_count
    }

    /// Sampled power/torque curves with installed upgrades applied, for
    /// graph consumers.
    pub fn performance_curves(&self, samples: usize) -> Vec<CurveSample> {
        self.engine.sample_curves(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FIXED_STEP;
    use crate::catalog;

    fn context() -> SimulationContext {
        SimulationContext::new(&catalog::r1m()).unwrap()
    }

    fn run(ctx: &mut SimulationContext, ticks: usize, input: ControlInput) {
        for _ in 0..ticks {
            ctx.tick(FIXED_STEP, input);
        }
    }

    fn full_throttle() -> ControlInput {
        ControlInput { throttle: 1.0, ..Default::default() }
    }

    #[test]
    fn invalid_spec_constructs_nothing() {
        let mut spec = catalog::r1m();
        spec.mass = -10.0;
        assert!(matches!(
            SimulationContext::new(&spec),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn accelerates_from_standstill_under_full_throttle() {
        let mut ctx = context();
        run(&mut ctx, 120, ControlInput::default()); // settle onto suspension
        run(&mut ctx, 600, full_throttle());

        let s = ctx.state();
        assert!(s.telemetry.speed > 8.0, "speed {}", s.telemetry.speed);
        assert!(s.telemetry.rpm > 0.0);
        assert_eq!(s.tick, 720);
    }

    #[test]
    fn rejected_tick_publishes_previous_body_and_counts_once() {
        let mut ctx = context();
        run(&mut ctx, 300, ControlInput::default());
        let before = ctx.state().clone();

        ctx.poison_next = true;
        let rejected = ctx.tick(FIXED_STEP, ControlInput::default()).clone();
        assert!(rejected.numeric_instability);
        assert_eq!(rejected.position, before.position);
        assert_eq!(rejected.tick, before.tick + 1);
        assert_eq!(ctx.instability_count(), 1);

        // next tick recovers
        let next = ctx.tick(FIXED_STEP, ControlInput::default());
        assert!(!next.numeric_instability);
        assert_eq!(ctx.instability_count(), 1);
    }

    #[test]
    fn unknown_upgrade_id_is_an_error() {
        let mut ctx = context();
        assert_eq!(
            ctx.apply_upgrade("nitro"),
            Err(SimError::UnknownUpgradeId("nitro".to_string()))
        );
    }

    #[test]
    fn suspension_upgrade_applies_once() {
        let mut ctx = context();
        let base = ctx.body.front.link.stiffness;

        assert!(ctx.apply_upgrade("ohlins").unwrap());
        let once = ctx.body.front.link.stiffness;
        assert!((once - base * 1.40).abs() < 1e-3);

        assert!(!ctx.apply_upgrade("ohlins").unwrap());
        assert_eq!(ctx.body.front.link.stiffness, once);
    }

    #[test]
    fn weight_upgrade_lightens_the_chassis_once() {
        let mut ctx = context();
        let base = ctx.body.body.mass;
        assert!(ctx.apply_upgrade("ti_exhaust").unwrap());
        assert_eq!(ctx.body.body.mass, base - 6.0);
        assert!(!ctx.apply_upgrade("ti_exhaust").unwrap());
        assert_eq!(ctx.body.body.mass, base - 6.0);
    }

    #[test]
    fn engine_upgrade_raises_drive_output() {
        let mut ctx = context();
        let base = ctx.performance_curves(10)[5].power;
        ctx.apply_upgrade("stage3").unwrap();
        assert!(ctx.performance_curves(10)[5].power > base);
    }

    #[test]
    fn swap_replaces_vehicle_and_resets_motion() {
        let mut ctx = context();
        run(&mut ctx, 120, ControlInput::default());
        run(&mut ctx, 300, full_throttle());
        assert!(ctx.telemetry().speed > 1.0);

        ctx.set_riding_mode(RidingMode::Race);
        ctx.swap_vehicle(&catalog::zx10rr()).unwrap();
        assert_eq!(ctx.state().vehicle, "Kawasaki ZX-10RR 2024");
        assert_eq!(ctx.telemetry().speed, 0.0);
        // a new vehicle starts back at the road defaults
        assert_eq!(ctx.assist_config().mode, RidingMode::Road);

        // still ticks after the swap
        run(&mut ctx, 60, ControlInput::default());
        assert_eq!(ctx.state().vehicle, "Kawasaki ZX-10RR 2024");
    }

    #[test]
    fn failed_swap_keeps_current_vehicle() {
        let mut ctx = context();
        run(&mut ctx, 60, ControlInput::default());

        let mut bad = catalog::v4r();
        bad.power_curve.clear();
        assert!(matches!(
            ctx.swap_vehicle(&bad),
            Err(SimError::InvalidConfig(_))
        ));
        assert_eq!(ctx.state().vehicle, "Yamaha R1M 2024");
        ctx.tick(FIXED_STEP, ControlInput::default());
    }

    #[test]
    fn paused_ticks_change_nothing() {
        let mut ctx = context();
        run(&mut ctx, 120, ControlInput::default());
        let frozen = ctx.state().clone();

        ctx.pause();
        run(&mut ctx, 100, full_throttle());
        assert_eq!(*ctx.state(), frozen);
    }

    #[test]
    fn resume_does_not_run_a_catch_up_burst() {
        let mut ctx = context();
        run(&mut ctx, 300, ControlInput::default());
        ctx.pause();
        ctx.resume();

        let before = ctx.state().position[0];
        ctx.tick(FIXED_STEP, full_throttle());
        let moved = (ctx.state().position[0] - before).abs();
        // one tick's worth of travel at most, not a multi-substep burst
        assert!(moved < 0.05, "moved {moved}");
    }

    #[test]
    fn mode_and_slider_changes_reach_the_config() {
        let mut ctx = context();
        ctx.set_riding_mode(RidingMode::Race);
        assert_eq!(ctx.assist_config().abs_level, 20);

        ctx.set_assist_level(AssistSystem::Wheelie, 55);
        assert_eq!(ctx.assist_config().mode, RidingMode::Custom);
        assert_eq!(ctx.assist_config().wheelie_level, 55);
    }
}

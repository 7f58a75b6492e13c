//! Motorcycle dynamics core for an interactive configurator: engine curves
//! with purchasable upgrade modifiers, a fixed-substep rigid-body chassis on
//! two sprung wheels, derived telemetry, and the rider-assist bank (ABS,
//! traction, wheelie and launch control) with riding-mode presets.
//!
//! `SimulationContext` is the front door: build it from a `VehicleSpec`,
//! feed it `ControlInput` once per frame, read the published
//! `SimulationState`.

pub mod assist;
pub mod body;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod sim;
pub mod state;
pub mod telemetry;
pub mod vehicle;

pub use assist::{AssistConfig, AssistFlags, AssistSystem, RidingMode};
pub use body::{RigidBodyModel, WheelCommand, FIXED_STEP};
pub use engine::{CurveSample, EngineModel, EngineOutput};
pub use error::SimError;
pub use sim::SimulationContext;
pub use state::{ControlInput, SimulationState};
pub use telemetry::{TelemetryAggregator, TelemetrySample};
pub use vehicle::{
    AeroSpec, CurvePoint, DrivetrainSpec, SuspensionSpec, UpgradeEffect, UpgradeModifier,
    VehicleSpec,
};

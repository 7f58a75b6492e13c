//! Rider-assist limiters: ABS, traction control, wheelie control, launch
//! control. Each is a threshold comparator over the previous tick's
//! telemetry plus a carried engagement flag for hysteresis (engage above the
//! threshold, release below 0.8x). The bank shapes the `WheelCommand`
//! before it reaches the integrator; flags are published for UI feedback.

pub mod abs;
pub mod launch;
pub mod traction;
pub mod wheelie;

use serde::{Deserialize, Serialize};

use crate::body::WheelCommand;
use crate::telemetry::TelemetrySample;

use abs::AbsController;
use launch::LaunchController;
use traction::TractionController;
use wheelie::WheelieController;

/// Fraction of the engage threshold at which an engaged limiter releases.
pub const HYSTERESIS_RELEASE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RidingMode {
    Rain,
    Road,
    Sport,
    Race,
    /// Set implicitly by any single-slider edit.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistSystem {
    Abs,
    Traction,
    Wheelie,
    Launch,
}

/// Per-system intervention level, 0..=100. Mode selection replaces all four
/// levels atomically from the preset table; a slider edit touches exactly
/// one level and relabels the mode as `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssistConfig {
    pub mode: RidingMode,
    pub abs_level: u8,
    pub traction_level: u8,
    pub wheelie_level: u8,
    pub launch_level: u8,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self::for_mode(RidingMode::Road)
    }
}

impl AssistConfig {
    /// Preset table (abs / traction / wheelie / launch). Higher assist
    /// levels mean earlier ABS/TCS intervention but a *higher* allowed
    /// wheelie pitch and launch rpm cap, so race is permissive everywhere
    /// it counts.
    pub fn for_mode(mode: RidingMode) -> Self {
        let (abs, traction, wheelie, launch) = match mode {
            RidingMode::Rain => (90, 90, 10, 10),
            RidingMode::Road | RidingMode::Custom => (70, 70, 30, 40),
            RidingMode::Sport => (40, 40, 60, 70),
            RidingMode::Race => (20, 20, 90, 90),
        };
        Self {
            mode,
            abs_level: abs,
            traction_level: traction,
            wheelie_level: wheelie,
            launch_level: launch,
        }
    }

    /// Atomic full replacement; no field from the previous config survives.
    pub fn set_mode(&mut self, mode: RidingMode) {
        *self = Self::for_mode(mode);
    }

    pub fn set_level(&mut self, system: AssistSystem, level: u8) {
        let level = level.min(100);
        match system {
            AssistSystem::Abs => self.abs_level = level,
            AssistSystem::Traction => self.traction_level = level,
            AssistSystem::Wheelie => self.wheelie_level = level,
            AssistSystem::Launch => self.launch_level = level,
        }
        self.mode = RidingMode::Custom;
    }
}

/// Engagement flags published with every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssistFlags {
    pub abs: bool,
    pub traction: bool,
    pub wheelie: bool,
    pub launch: bool,
}

/// The four limiters with their carried engagement state.
#[derive(Debug, Default)]
pub struct AssistBank {
    abs: AbsController,
    traction: TractionController,
    wheelie: WheelieController,
    launch: LaunchController,
}

impl AssistBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all carried engagement state (vehicle swap).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shape `cmd` in place from the previous tick's telemetry.
    pub fn apply(
        &mut self,
        config: &AssistConfig,
        last: &TelemetrySample,
        cmd: &mut WheelCommand,
    ) -> AssistFlags {
        AssistFlags {
            abs: self.abs.apply(config.abs_level, last, cmd),
            traction: self.traction.apply(config.traction_level, last, cmd),
            wheelie: self.wheelie.apply(config.wheelie_level, last, cmd),
            launch: self.launch.apply(config.launch_level, last, cmd),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// One (rpm, value) control point on an engine curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub rpm: f32,   // engine speed
    pub value: f32, // kW for power curves, N*m for torque curves
}

/// Spring-damper constants for one axle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuspensionSpec {
    pub rest_length: f32, // m
    pub stiffness: f32,   // N/m
    pub damping: f32,     // N*s/m
    pub travel: f32,      // m, max compression
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AeroSpec {
    pub drag_coefficient: f32, // Cd
    pub frontal_area: f32,     // m^2
}

/// Gearbox + final drive. Converts wheel spin to engine rpm and engine
/// torque to rear-wheel force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivetrainSpec {
    pub gear_ratios: [f32; 6],
    pub final_drive: f32,
    pub wheel_radius: f32, // m
    pub max_rpm: f32,
}

impl DrivetrainSpec {
    /// Rear-wheel force for a given engine torque in the given gear (1..=6).
    pub fn wheel_force(&self, engine_torque: f32, gear: u8) -> f32 {
        let ratio = self.gear_ratios[gear.clamp(1, 6) as usize - 1];
        engine_torque * ratio * self.final_drive / self.wheel_radius
    }

    /// Engine rpm implied by a rear-wheel spin (rad/s) in the given gear.
    pub fn engine_rpm(&self, wheel_spin: f32, gear: u8) -> f32 {
        let ratio = self.gear_ratios[gear.clamp(1, 6) as usize - 1];
        let wheel_rpm = wheel_spin * 60.0 / std::f32::consts::TAU;
        (wheel_rpm * ratio * self.final_drive).clamp(0.0, self.max_rpm)
    }
}

/// What an upgrade does. Closed set: every target/kind combination is
/// matched exhaustively where effects are folded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Shifts or scales the power and/or torque curve output.
    EngineGain {
        power_add: f32,   // kW added before multipliers
        torque_add: f32,  // N*m added before multipliers
        power_scale: f32, // multiplier applied after additive gains
        torque_scale: f32,
    },
    /// Scales suspension stiffness/damping (handling channel).
    SuspensionGain { factor: f32 },
    /// Changes chassis mass (negative = lighter).
    WeightDelta { kg: f32 },
}

/// A purchasable upgrade. Ids are unique per catalog; re-applying an
/// installed id is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeModifier {
    pub id: String,
    pub name: String,
    pub price: u32, // currency units, not used by the simulation itself
    pub effect: UpgradeEffect,
}

/// Full vehicle description consumed at load/swap time. Externally
/// validated for shape; `validate` only checks internal consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub name: String,

    pub mass: f32,       // kg, chassis + rider
    pub wheelbase: f32,  // m, front axle to rear axle
    pub com_height: f32, // m, center of mass above ground at rest

    pub front_suspension: SuspensionSpec,
    pub rear_suspension: SuspensionSpec,

    pub aero: AeroSpec,
    pub drivetrain: DrivetrainSpec,

    pub power_curve: Vec<CurvePoint>,  // kW over rpm
    pub torque_curve: Vec<CurvePoint>, // N*m over rpm

    pub upgrades: Vec<UpgradeModifier>, // catalog of installable upgrades
}

pub(crate) fn check_curve(name: &str, points: &[CurvePoint]) -> Result<(), SimError> {
    if points.len() < 2 {
        return Err(SimError::InvalidConfig(format!(
            "{name} curve needs at least 2 points, got {}",
            points.len()
        )));
    }
    for p in points {
        if !p.rpm.is_finite() || !p.value.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "{name} curve contains a non-finite point"
            )));
        }
    }
    for w in points.windows(2) {
        if w[1].rpm <= w[0].rpm {
            return Err(SimError::InvalidConfig(format!(
                "{name} curve rpm not strictly increasing at {}",
                w[1].rpm
            )));
        }
    }
    Ok(())
}

fn check_suspension(name: &str, s: &SuspensionSpec) -> Result<(), SimError> {
    let fields = [
        ("rest_length", s.rest_length),
        ("stiffness", s.stiffness),
        ("damping", s.damping),
        ("travel", s.travel),
    ];
    for (field, v) in fields {
        if !v.is_finite() || v < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "{name} suspension {field} must be finite and >= 0, got {v}"
            )));
        }
    }
    if s.travel == 0.0 {
        return Err(SimError::InvalidConfig(format!(
            "{name} suspension travel must be > 0"
        )));
    }
    Ok(())
}

impl VehicleSpec {
    /// Internal-consistency check run before a spec is accepted by
    /// `SimulationContext`. Rejecting here leaves the active vehicle intact.
    pub fn validate(&self) -> Result<(), SimError> {
        let positives = [
            ("mass", self.mass),
            ("wheelbase", self.wheelbase),
            ("com_height", self.com_height),
            ("wheel_radius", self.drivetrain.wheel_radius),
            ("final_drive", self.drivetrain.final_drive),
            ("max_rpm", self.drivetrain.max_rpm),
        ];
        for (field, v) in positives {
            if !v.is_finite() || v <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{field} must be finite and > 0, got {v}"
                )));
            }
        }
        for (i, r) in self.drivetrain.gear_ratios.iter().enumerate() {
            if !r.is_finite() || *r <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "gear ratio {} must be finite and > 0, got {r}",
                    i + 1
                )));
            }
        }
        for (field, v) in [
            ("drag_coefficient", self.aero.drag_coefficient),
            ("frontal_area", self.aero.frontal_area),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{field} must be finite and >= 0, got {v}"
                )));
            }
        }

        check_suspension("front", &self.front_suspension)?;
        check_suspension("rear", &self.rear_suspension)?;
        check_curve("power", &self.power_curve)?;
        check_curve("torque", &self.torque_curve)?;

        for u in &self.upgrades {
            u.validate()?;
        }
        Ok(())
    }

    pub fn find_upgrade(&self, id: &str) -> Option<&UpgradeModifier> {
        self.upgrades.iter().find(|u| u.id == id)
    }
}

impl UpgradeModifier {
    pub fn validate(&self) -> Result<(), SimError> {
        let magnitudes: &[f32] = match &self.effect {
            UpgradeEffect::EngineGain {
                power_add,
                torque_add,
                power_scale,
                torque_scale,
            } => &[*power_add, *torque_add, *power_scale, *torque_scale],
            UpgradeEffect::SuspensionGain { factor } => &[*factor],
            UpgradeEffect::WeightDelta { kg } => &[*kg],
        };
        for m in magnitudes {
            if !m.is_finite() {
                return Err(SimError::InvalidConfig(format!(
                    "upgrade '{}' has a non-finite magnitude",
                    self.id
                )));
            }
        }
        if let UpgradeEffect::SuspensionGain { factor } = self.effect {
            if factor <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "upgrade '{}' suspension factor must be > 0",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn catalog_presets_validate() {
        for spec in [catalog::r1m(), catalog::v4r(), catalog::zx10rr()] {
            spec.validate().unwrap_or_else(|e| panic!("{}: {e}", spec.name));
        }
    }

    #[test]
    fn non_monotonic_curve_rejected() {
        let mut spec = catalog::r1m();
        spec.power_curve[2].rpm = spec.power_curve[1].rpm;
        assert!(matches!(spec.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn negative_stiffness_rejected() {
        let mut spec = catalog::r1m();
        spec.front_suspension.stiffness = -1.0;
        assert!(matches!(spec.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn short_curve_rejected() {
        let mut spec = catalog::r1m();
        spec.torque_curve.truncate(1);
        assert!(matches!(spec.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_upgrade_rejected() {
        let u = UpgradeModifier {
            id: "bad".into(),
            name: "Bad".into(),
            price: 0,
            effect: UpgradeEffect::WeightDelta { kg: f32::NAN },
        };
        assert!(matches!(u.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn wheel_force_matches_drivetrain_math() {
        let dt = catalog::r1m().drivetrain;
        // torque * first gear * final drive / radius
        let f = dt.wheel_force(100.0, 1);
        let expect = 100.0 * dt.gear_ratios[0] * dt.final_drive / dt.wheel_radius;
        assert!((f - expect).abs() < 1e-3);
    }
}

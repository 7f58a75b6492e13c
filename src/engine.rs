// ==============================================================================
// engine.rs — ENGINE PERFORMANCE MODEL (CURVES + UPGRADE MODIFIERS + GEARING)
// ==============================================================================
// Evaluates power/torque at a given rpm and throttle by linear interpolation
// over strictly-increasing control points, then folds installed upgrade
// modifiers: additive gains sum first, multiplicative gains apply after,
// per channel.
//
// Out-of-domain rpm clamps to the nearest endpoint value (no extrapolation).
// Out-of-range throttle clamps to [0, 1] rather than erroring.
// ==============================================================================

use serde::Serialize;

use crate::error::SimError;
use crate::vehicle::{check_curve, CurvePoint, UpgradeEffect, UpgradeModifier, VehicleSpec};

/// Engine output at one operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineOutput {
    pub power: f32,  // kW
    pub torque: f32, // N*m
}

/// One sampled point for graph consumers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurveSample {
    pub rpm: f32,
    pub power: f32,
    pub torque: f32,
}

/// Piecewise-linear curve over strictly increasing rpm control points.
#[derive(Debug, Clone)]
pub struct EngineCurve {
    points: Vec<CurvePoint>,
}

impl EngineCurve {
    pub fn new(name: &str, points: Vec<CurvePoint>) -> Result<Self, SimError> {
        check_curve(name, &points)?;
        Ok(Self { points })
    }

    /// First and last control-point rpm.
    pub fn domain(&self) -> (f32, f32) {
        (
            self.points.first().map(|p| p.rpm).unwrap_or(0.0),
            self.points.last().map(|p| p.rpm).unwrap_or(0.0),
        )
    }

    /// Interpolated value at `rpm`, clamped to the curve endpoints.
    pub fn value_at(&self, rpm: f32) -> f32 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if rpm <= first.rpm {
            return first.value;
        }
        if rpm >= last.rpm {
            return last.value;
        }

        // Bracketing segment via binary search over control-point rpm.
        let hi = self.points.partition_point(|p| p.rpm < rpm);
        let a = self.points[hi - 1];
        let b = self.points[hi];
        let t = (rpm - a.rpm) / (b.rpm - a.rpm);
        a.value + t * (b.value - a.value)
    }
}

/// Folded view of installed engine gains: additive sums and multiplicative
/// products per channel.
#[derive(Debug, Clone, Copy)]
struct GainFold {
    power_add: f32,
    torque_add: f32,
    power_scale: f32,
    torque_scale: f32,
}

pub struct EngineModel {
    power: EngineCurve,
    torque: EngineCurve,
    installed: Vec<UpgradeModifier>, // insertion order, unique ids
}

impl EngineModel {
    pub fn from_spec(spec: &VehicleSpec) -> Result<Self, SimError> {
        Ok(Self {
            power: EngineCurve::new("power", spec.power_curve.clone())?,
            torque: EngineCurve::new("torque", spec.torque_curve.clone())?,
            installed: Vec::new(),
        })
    }

    fn fold_gains(&self) -> GainFold {
        let mut fold = GainFold {
            power_add: 0.0,
            torque_add: 0.0,
            power_scale: 1.0,
            torque_scale: 1.0,
        };
        for m in &self.installed {
            if let UpgradeEffect::EngineGain {
                power_add,
                torque_add,
                power_scale,
                torque_scale,
            } = m.effect
            {
                fold.power_add += power_add;
                fold.torque_add += torque_add;
                fold.power_scale *= power_scale;
                fold.torque_scale *= torque_scale;
            }
        }
        fold
    }

    /// Power/torque at `rpm` under `throttle`. Throttle outside [0, 1] is
    /// clamped, not rejected.
    pub fn evaluate(&self, rpm: f32, throttle: f32) -> EngineOutput {
        let throttle = throttle.clamp(0.0, 1.0);
        let fold = self.fold_gains();

        let power = (self.power.value_at(rpm) * throttle + fold.power_add * throttle)
            * fold.power_scale;
        let torque = (self.torque.value_at(rpm) * throttle + fold.torque_add * throttle)
            * fold.torque_scale;

        EngineOutput { power, torque }
    }

    /// Install an upgrade. Returns `Ok(true)` if newly installed and
    /// `Ok(false)` if the id was already present (idempotent no-op).
    pub fn apply_upgrade(&mut self, modifier: &UpgradeModifier) -> Result<bool, SimError> {
        modifier.validate()?;
        if self.installed.iter().any(|m| m.id == modifier.id) {
            return Ok(false);
        }
        self.installed.push(modifier.clone());
        Ok(true)
    }

    pub fn installed(&self) -> &[UpgradeModifier] {
        &self.installed
    }

    /// Evenly spaced (rpm, power, torque) samples over the power-curve
    /// domain, at full throttle with installed gains applied. Feeds the
    /// performance-graph collaborator.
    pub fn sample_curves(&self, n: usize) -> Vec<CurveSample> {
        let n = n.max(2);
        let (lo, hi) = self.power.domain();
        let step = (hi - lo) / (n - 1) as f32;
        (0..n)
            .map(|i| {
                let rpm = lo + step * i as f32;
                let out = self.evaluate(rpm, 1.0);
                CurveSample {
                    rpm,
                    power: out.power,
                    torque: out.torque,
                }
            })
            .collect()
    }

    /// Fixed speed-band gear lookup (km/h). Monotonic non-decreasing in
    /// speed by construction: bands are listed in increasing order.
    pub fn gear_for(speed_kmh: f32) -> u8 {
        match speed_kmh {
            s if s < 40.0 => 1,
            s if s < 90.0 => 2,
            s if s < 130.0 => 3,
            s if s < 170.0 => 4,
            s if s < 200.0 => 5,
            _ => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn scenario_model() -> EngineModel {
        // Curve fixed by the acceptance scenario: 200 kg bike, power
        // [(0,0),(6000,100),(12000,200),(14000,190)].
        let points = [(0.0, 0.0), (6000.0, 100.0), (12_000.0, 200.0), (14_000.0, 190.0)];
        let curve: Vec<CurvePoint> = points
            .iter()
            .map(|&(rpm, value)| CurvePoint { rpm, value })
            .collect();
        EngineModel {
            power: EngineCurve::new("power", curve.clone()).unwrap(),
            torque: EngineCurve::new("torque", curve).unwrap(),
            installed: Vec::new(),
        }
    }

    #[test]
    fn exact_control_point_has_no_interpolation_error() {
        let m = scenario_model();
        assert_eq!(m.evaluate(6000.0, 1.0).power, 100.0);
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        let m = scenario_model();
        assert!((m.evaluate(9000.0, 1.0).power - 150.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_domain_rpm_clamps_to_endpoints() {
        let m = scenario_model();
        assert_eq!(m.evaluate(-500.0, 1.0).power, 0.0);
        assert_eq!(m.evaluate(1.0e6, 1.0).power, 190.0);
    }

    #[test]
    fn power_monotonic_in_throttle() {
        let m = scenario_model();
        let mut last = -1.0;
        for i in 0..=20 {
            let throttle = i as f32 / 20.0;
            let p = m.evaluate(9000.0, throttle).power;
            assert!(p >= last, "power dropped at throttle {throttle}");
            last = p;
        }
    }

    #[test]
    fn throttle_out_of_range_is_clamped() {
        let m = scenario_model();
        assert_eq!(m.evaluate(9000.0, 2.5).power, m.evaluate(9000.0, 1.0).power);
        assert_eq!(m.evaluate(9000.0, -1.0).power, 0.0);
    }

    #[test]
    fn duplicate_upgrade_is_idempotent() {
        let spec = catalog::r1m();
        let stage1 = spec.find_upgrade("stage1").unwrap();

        let mut m = EngineModel::from_spec(&spec).unwrap();
        assert!(m.apply_upgrade(stage1).unwrap());
        let once = m.evaluate(10_000.0, 1.0);

        assert!(!m.apply_upgrade(stage1).unwrap());
        let twice = m.evaluate(10_000.0, 1.0);

        assert_eq!(once, twice);
        assert_eq!(m.installed().len(), 1);
    }

    #[test]
    fn additive_gains_sum_before_multiplicative() {
        let spec = catalog::r1m();
        let mut m = EngineModel::from_spec(&spec).unwrap();
        let add = UpgradeModifier {
            id: "add10".into(),
            name: "add".into(),
            price: 0,
            effect: UpgradeEffect::EngineGain {
                power_add: 10.0,
                torque_add: 0.0,
                power_scale: 1.0,
                torque_scale: 1.0,
            },
        };
        let mul = UpgradeModifier {
            id: "mul2".into(),
            name: "mul".into(),
            price: 0,
            effect: UpgradeEffect::EngineGain {
                power_add: 0.0,
                torque_add: 0.0,
                power_scale: 2.0,
                torque_scale: 1.0,
            },
        };
        let base = m.evaluate(10_000.0, 1.0).power;
        m.apply_upgrade(&mul).unwrap();
        m.apply_upgrade(&add).unwrap();
        // (base + 10) * 2 regardless of install order
        assert!((m.evaluate(10_000.0, 1.0).power - (base + 10.0) * 2.0).abs() < 1e-3);
    }

    #[test]
    fn gear_bands_match_table() {
        assert_eq!(EngineModel::gear_for(0.0), 1);
        assert_eq!(EngineModel::gear_for(35.0), 1);
        assert_eq!(EngineModel::gear_for(85.0), 2);
        assert_eq!(EngineModel::gear_for(125.0), 3);
        assert_eq!(EngineModel::gear_for(195.0), 5);
        assert_eq!(EngineModel::gear_for(205.0), 6);
    }

    #[test]
    fn gear_monotonic_in_speed() {
        let mut last = 0;
        for s in 0..300 {
            let g = EngineModel::gear_for(s as f32);
            assert!(g >= last);
            last = g;
        }
    }

    #[test]
    fn sampled_curve_spans_domain_in_order() {
        let m = EngineModel::from_spec(&catalog::r1m()).unwrap();
        let samples = m.sample_curves(50);
        assert_eq!(samples.len(), 50);
        assert_eq!(samples[0].rpm, 4000.0);
        assert!((samples[49].rpm - 14_000.0).abs() < 0.5);
        for w in samples.windows(2) {
            assert!(w[1].rpm > w[0].rpm);
        }
    }
}

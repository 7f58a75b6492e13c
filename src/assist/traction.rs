// ==============================================================================
// traction.rs — TRACTION CONTROL (DRIVE-SLIP LIMITER)
// ==============================================================================
// Symmetric to ABS but watching positive rear slip (wheel spinning up under
// power). While engaged the drive force is cut by a fixed factor each tick.
// ==============================================================================

use crate::assist::HYSTERESIS_RELEASE;
use crate::body::WheelCommand;
use crate::telemetry::TelemetrySample;

const DRIVE_CUT: f32 = 0.5;

#[derive(Debug, Default)]
pub struct TractionController {
    engaged: bool,
}

impl TractionController {
    pub fn apply(&mut self, level: u8, last: &TelemetrySample, cmd: &mut WheelCommand) -> bool {
        let driving = cmd.drive_force > 0.0;
        let spin_up = last.slip_rear.max(0.0);
        let threshold = (100 - level.min(100)) as f32 / 100.0;

        if self.engaged {
            if !driving || spin_up < threshold * HYSTERESIS_RELEASE {
                self.engaged = false;
            }
        } else if driving && spin_up > threshold {
            self.engaged = true;
        }

        if self.engaged {
            cmd.drive_force *= DRIVE_CUT;
        }
        self.engaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spinning_sample(slip_rear: f32) -> TelemetrySample {
        TelemetrySample { speed: 15.0, slip_rear, ..Default::default() }
    }

    #[test]
    fn engage_and_release_follow_hysteresis() {
        let mut tcs = TractionController::default();
        // level 80 -> threshold 0.2, release below 0.16

        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(!tcs.apply(80, &spinning_sample(0.15), &mut cmd));
        assert_eq!(cmd.drive_force, 3000.0);

        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(tcs.apply(80, &spinning_sample(0.25), &mut cmd));
        assert_eq!(cmd.drive_force, 1500.0);

        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(tcs.apply(80, &spinning_sample(0.18), &mut cmd));

        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(!tcs.apply(80, &spinning_sample(0.10), &mut cmd));
        assert_eq!(cmd.drive_force, 3000.0);
    }

    #[test]
    fn braking_slip_does_not_trigger_tcs() {
        let mut tcs = TractionController::default();
        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(!tcs.apply(90, &spinning_sample(-0.8), &mut cmd));
    }

    #[test]
    fn releases_when_throttle_closes() {
        let mut tcs = TractionController::default();
        let mut cmd = WheelCommand { drive_force: 3000.0, ..Default::default() };
        assert!(tcs.apply(80, &spinning_sample(0.5), &mut cmd));

        let mut cmd = WheelCommand::default();
        assert!(!tcs.apply(80, &spinning_sample(0.5), &mut cmd));
    }
}

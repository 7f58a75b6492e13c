// ==============================================================================
// abs.rs — ANTI-LOCK BRAKING (BRAKING-SLIP LIMITER)
// ==============================================================================
// Lockup shows up as negative wheel slip (surface slower than ground). The
// allowed slip fraction shrinks as the level rises: threshold =
// (100 - level) / 100. While engaged, both requested brake forces are cut
// by a fixed factor every tick until slip recovers past the hysteresis band.
// ==============================================================================

use crate::assist::HYSTERESIS_RELEASE;
use crate::body::WheelCommand;
use crate::telemetry::TelemetrySample;

/// Brake-force reduction applied each engaged tick.
const BRAKE_CUT: f32 = 0.5;

#[derive(Debug, Default)]
pub struct AbsController {
    engaged: bool,
}

impl AbsController {
    /// Returns the engagement flag after processing this tick.
    pub fn apply(&mut self, level: u8, last: &TelemetrySample, cmd: &mut WheelCommand) -> bool {
        let braking = cmd.brake_front > 0.0 || cmd.brake_rear > 0.0;

        // worst braking slip across both wheels, as a positive magnitude
        let lockup = (-last.slip_front.min(last.slip_rear)).max(0.0);
        let threshold = (100 - level.min(100)) as f32 / 100.0;

        if self.engaged {
            if !braking || lockup < threshold * HYSTERESIS_RELEASE {
                self.engaged = false;
            }
        } else if braking && lockup > threshold {
            self.engaged = true;
        }

        if self.engaged {
            cmd.brake_front *= BRAKE_CUT;
            cmd.brake_rear *= BRAKE_CUT;
        }
        self.engaged
    }
}

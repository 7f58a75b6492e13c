// ==============================================================================
// wheelie.rs — WHEELIE CONTROL (PITCH LIMITER)
// ==============================================================================
// The level scales the *allowed* nose-up pitch: threshold = level/100 * 45
// degrees. Race settings permit big wheelies; rain settings stop the nose
// from rising at all. Past the threshold the drive force is cut until pitch
// drops back through the hysteresis band.
// ==============================================================================

use crate::assist::HYSTERESIS_RELEASE;
use crate::body::WheelCommand;
use crate::telemetry::TelemetrySample;

const MAX_ALLOWED_PITCH_DEG: f32 = 45.0;
const DRIVE_CUT: f32 = 0.5;

#[derive(Debug, Default)]
pub struct WheelieController {
    engaged: bool,
}

impl WheelieController {
    pub fn apply(&mut self, level: u8, last: &TelemetrySample, cmd: &mut WheelCommand) -> bool {
        let threshold = level.min(100) as f32 / 100.0 * MAX_ALLOWED_PITCH_DEG;
        let pitch = last.pitch.max(0.0); // nose-down never counts

        if self.engaged {
            if pitch < threshold * HYSTERESIS_RELEASE {
                self.engaged = false;
            }
        } else if pitch > threshold {
            self.engaged = true;
        }

        if self.engaged {
            cmd.drive_force *= DRIVE_CUT;
        }
        self.engaged
    }
}

// ==============================================================================
// launch.rs — LAUNCH CONTROL (STANDING-START RPM CAP)
// ==============================================================================
// Active only below a speed threshold. The rpm cap rises with the level:
// cap = 8000 + level/100 * 4000. Any tick where the engine would exceed the
// cap gets its drive force zeroed; unlike the slip limiters this is a hard
// cut, so no hysteresis band is needed.
// ==============================================================================

use crate::body::WheelCommand;
use crate::telemetry::TelemetrySample;

const ACTIVE_BELOW_SPEED: f32 = 5.0; // m/s
const BASE_RPM_CAP: f32 = 8000.0;
const RPM_CAP_RANGE: f32 = 4000.0;

#[derive(Debug, Default)]
pub struct LaunchController {
    engaged: bool,
}

impl LaunchController {
    pub fn apply(&mut self, level: u8, last: &TelemetrySample, cmd: &mut WheelCommand) -> bool {
        if last.speed >= ACTIVE_BELOW_SPEED {
            self.engaged = false;
            return false;
        }

        let cap = BASE_RPM_CAP + level.min(100) as f32 / 100.0 * RPM_CAP_RANGE;
        self.engaged = last.rpm > cap;
        if self.engaged {
            cmd.drive_force = 0.0;
        }
        self.engaged
    }
}

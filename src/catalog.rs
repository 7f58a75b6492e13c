//! Built-in bike presets. Plays the same role as the hardcoded vehicle
//! configs in a config-file-less build: a known-good spec per model, plus
//! its upgrade catalog. External callers may just as well deserialize a
//! `VehicleSpec` from JSON; these are the defaults the demo runner uses.

use crate::vehicle::{
    AeroSpec, CurvePoint, DrivetrainSpec, SuspensionSpec, UpgradeEffect, UpgradeModifier,
    VehicleSpec,
};

fn pts(raw: &[(f32, f32)]) -> Vec<CurvePoint> {
    raw.iter().map(|&(rpm, value)| CurvePoint { rpm, value }).collect()
}

/// Shared supersport gearbox (six ratios + final drive).
fn supersport_drivetrain() -> DrivetrainSpec {
    DrivetrainSpec {
        gear_ratios: [2.885, 2.062, 1.762, 1.522, 1.333, 1.200],
        final_drive: 2.933,
        wheel_radius: 0.3302, // m
        max_rpm: 14_000.0,
    }
}

fn engine_stage(id: &str, name: &str, price: u32, power: f32, torque: f32) -> UpgradeModifier {
    UpgradeModifier {
        id: id.to_string(),
        name: name.to_string(),
        price,
        effect: UpgradeEffect::EngineGain {
            power_add: power,
            torque_add: torque,
            power_scale: 1.0,
            torque_scale: 1.0,
        },
    }
}

fn suspension_stage(id: &str, name: &str, price: u32, factor: f32) -> UpgradeModifier {
    UpgradeModifier {
        id: id.to_string(),
        name: name.to_string(),
        price,
        effect: UpgradeEffect::SuspensionGain { factor },
    }
}

fn exhaust(price: u32, kg: f32) -> UpgradeModifier {
    UpgradeModifier {
        id: "ti_exhaust".to_string(),
        name: "Titanium Full Exhaust".to_string(),
        price,
        effect: UpgradeEffect::WeightDelta { kg },
    }
}

pub fn r1m() -> VehicleSpec {
    VehicleSpec {
        name: "Yamaha R1M 2024".to_string(),
        mass: 201.0,      // kg
        wheelbase: 1.405, // m
        com_height: 0.60, // m
        front_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 10_000.0,
            damping: 1_200.0,
            travel: 0.120,
        },
        rear_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 12_000.0,
            damping: 1_400.0,
            travel: 0.120,
        },
        aero: AeroSpec {
            drag_coefficient: 0.48,
            frontal_area: 0.85,
        },
        drivetrain: supersport_drivetrain(),
        power_curve: pts(&[
            (4000.0, 60.0),
            (6000.0, 100.0),
            (8000.0, 140.0),
            (10_000.0, 180.0),
            (12_000.0, 200.0),
            (14_000.0, 190.0),
        ]),
        torque_curve: pts(&[
            (4000.0, 80.0),
            (6000.0, 95.0),
            (8000.0, 105.0),
            (10_000.0, 113.0),
            (12_000.0, 108.0),
            (14_000.0, 95.0),
        ]),
        upgrades: vec![
            engine_stage("stage1", "Stage 1 ECU Flash", 800, 10.0, 5.0),
            engine_stage("stage2", "Stage 2 Performance Kit", 2500, 15.0, 8.0),
            engine_stage("stage3", "Stage 3 Race Package", 5000, 25.0, 12.0),
            suspension_stage("springs", "Race Springs", 600, 1.10),
            suspension_stage("cartridge", "Cartridge Kit", 2200, 1.25),
            suspension_stage("ohlins", "Ohlins Package", 4500, 1.40),
            exhaust(1400, -6.0),
        ],
    }
}

pub fn v4r() -> VehicleSpec {
    VehicleSpec {
        name: "Ducati V4R 2024".to_string(),
        mass: 193.0,
        wheelbase: 1.420,
        com_height: 0.60,
        front_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 10_500.0,
            damping: 1_250.0,
            travel: 0.125,
        },
        rear_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 12_500.0,
            damping: 1_450.0,
            travel: 0.130,
        },
        aero: AeroSpec {
            drag_coefficient: 0.45,
            frontal_area: 0.82,
        },
        drivetrain: supersport_drivetrain(),
        power_curve: pts(&[
            (4000.0, 70.0),
            (6000.0, 120.0),
            (8000.0, 160.0),
            (10_000.0, 190.0),
            (12_000.0, 218.0),
            (14_000.0, 210.0),
        ]),
        torque_curve: pts(&[
            (4000.0, 85.0),
            (6000.0, 98.0),
            (8000.0, 108.0),
            (10_000.0, 111.0),
            (12_000.0, 106.0),
            (14_000.0, 98.0),
        ]),
        upgrades: vec![
            engine_stage("stage1", "Stage 1 ECU Flash", 900, 12.0, 6.0),
            engine_stage("stage2", "Stage 2 Performance Kit", 3000, 18.0, 9.0),
            engine_stage("stage3", "Stage 3 Race Package", 6000, 28.0, 14.0),
            suspension_stage("springs", "Race Springs", 700, 1.12),
            suspension_stage("cartridge", "Cartridge Kit", 2500, 1.28),
            suspension_stage("ohlins", "Ohlins Package", 5000, 1.45),
            exhaust(1600, -5.0),
        ],
    }
}

pub fn zx10rr() -> VehicleSpec {
    VehicleSpec {
        name: "Kawasaki ZX-10RR 2024".to_string(),
        mass: 207.0,
        wheelbase: 1.450,
        com_height: 0.60,
        front_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 9_800.0,
            damping: 1_150.0,
            travel: 0.120,
        },
        rear_suspension: SuspensionSpec {
            rest_length: 0.30,
            stiffness: 11_800.0,
            damping: 1_350.0,
            travel: 0.114,
        },
        aero: AeroSpec {
            drag_coefficient: 0.49,
            frontal_area: 0.87,
        },
        drivetrain: supersport_drivetrain(),
        power_curve: pts(&[
            (4000.0, 65.0),
            (6000.0, 110.0),
            (8000.0, 150.0),
            (10_000.0, 185.0),
            (12_000.0, 203.0),
            (14_000.0, 195.0),
        ]),
        torque_curve: pts(&[
            (4000.0, 82.0),
            (6000.0, 96.0),
            (8000.0, 107.0),
            (10_000.0, 114.0),
            (12_000.0, 110.0),
            (14_000.0, 96.0),
        ]),
        upgrades: vec![
            engine_stage("stage1", "Stage 1 ECU Flash", 750, 9.0, 4.0),
            engine_stage("stage2", "Stage 2 Performance Kit", 2800, 14.0, 7.0),
            engine_stage("stage3", "Stage 3 Race Package", 5500, 24.0, 11.0),
            suspension_stage("springs", "Race Springs", 550, 1.08),
            suspension_stage("cartridge", "Cartridge Kit", 2000, 1.22),
            suspension_stage("ohlins", "Ohlins Package", 4200, 1.38),
            exhaust(1200, -7.0),
        ],
    }
}

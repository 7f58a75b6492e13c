use anyhow::Result;
use tokio::time::{interval, Duration};

use moto_physics::{catalog, ControlInput, RidingMode, SimulationContext, FIXED_STEP};

/// Scripted demo run: launch an R1M from standstill, install a stage-1 flash
/// and switch to race mode mid-run, then brake to a stop. One JSON snapshot
/// per second on stdout.
#[tokio::main]
async fn main() -> Result<()> {
    println!("moto-physics demo: Yamaha R1M, 60 Hz, 20 s script");

    let mut ctx = SimulationContext::new(&catalog::r1m())?;

    let mut ticker = interval(Duration::from_millis(16));
    for tick in 0..1200u32 {
        ticker.tick().await;

        // 5 s in: stage 1 flash + race mode
        if tick == 300 {
            let installed = ctx.apply_upgrade("stage1")?;
            ctx.set_riding_mode(RidingMode::Race);
            println!("t=5s stage1 installed={installed}, mode=race");
        }

        let input = script(tick);
        let state = ctx.tick(FIXED_STEP, input);

        if tick % 60 == 0 {
            println!("{}", serde_json::to_string(state)?);
        }
    }

    println!(
        "done: final speed {:.1} m/s, rejected ticks {}",
        ctx.telemetry().speed,
        ctx.instability_count()
    );
    Ok(())
}

fn script(tick: u32) -> ControlInput {
    match tick {
        // settle on the suspension
        0..=119 => ControlInput::default(),
        // full-throttle launch
        120..=779 => ControlInput { throttle: 1.0, ..Default::default() },
        // brake to a stop
        _ => ControlInput {
            brake_front: 0.8,
            brake_rear: 0.4,
            ..Default::default()
        },
    }
}

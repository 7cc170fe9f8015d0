//! Weft headless driver
//!
//! Run the pulse-lattice engine for a number of frames and report
//! diagnostics. This is the minimal stand-in for the rendering layer: it
//! drives `step()`, reads diagnostics between frames, and prints a final
//! JSON report.

use std::env;

use weft_engine::{Engine, EngineConfig, Mode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();

    let frames: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);

    let mode = match args.get(2).map(String::as_str) {
        Some("phase") => Mode::Phase,
        _ => Mode::Carrier,
    };

    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(42);

    let config = EngineConfig {
        mode,
        seed,
        ..EngineConfig::default()
    };

    println!("Weft Pulse Lattice");
    println!("==================");
    println!();
    println!(
        "Grid {}x{}, radius {}, {} events/frame, {:?} mode, seed {}",
        config.width, config.height, config.radius, config.events_per_frame, config.mode, seed
    );
    println!();

    let mut engine = Engine::new(config)?;

    for frame in 0..frames {
        engine.step();
        if (frame + 1) % 10 == 0 {
            let diag = engine.diagnostics();
            println!(
                "  frame {:>5}: boundary {:.4}, mean |acc| {:.3}, knots {}",
                diag.frame, diag.boundary_density, diag.mean_accumulator, diag.knot_count
            );
        }
    }

    println!();
    println!("Final diagnostics:");
    println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);

    Ok(())
}

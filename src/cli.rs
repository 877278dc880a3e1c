// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the depth mapping viewer
//!
//! This module provides command-line functionality for:
//! - Printing sensor and calibration details
//! - Running the frame mapper headless

use depth_mapping::app::{App, create_device};
use depth_mapping::config::Config;
use depth_mapping::constants::app_info;
use depth_mapping::constants::keys::MODE_KEYS;
use depth_mapping::constants::timing::INPUT_POLL;
use depth_mapping::mapping::{MapOutcome, MappingMode};
use depth_mapping::sensor::CameraIntrinsics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Print the source, its frame sizes and the calibration in use
pub fn show_info(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = create_device(config)?;

    // Sources report their size once the first frame arrives
    let start = Instant::now();
    while !device.is_frame_new() && start.elapsed() < INPUT_POLL * 100 {
        device.update()?;
    }

    let (dw, dh) = device.depth_pixels().dimensions();
    let (cw, ch) = device.color_pixels().dimensions();
    let calibration = config.calibration();

    println!("{} {}", app_info::APP_NAME, app_info::version());
    println!();
    println!("Source: {}", device.name());
    println!("  Depth frame: {}x{}", dw, dh);
    println!("  Color frame: {}x{}", cw, ch);
    println!();
    println!("Calibration:");
    print_intrinsics("Depth", &calibration.depth.scaled_to(dw, dh));
    print_intrinsics("Color", &calibration.color.scaled_to(cw, ch));
    let t = calibration.depth_to_color.translation;
    println!(
        "  Depth to color translation: ({:.4}, {:.4}, {:.4}) m",
        t[0], t[1], t[2]
    );
    println!();
    println!("Modes:");
    for mode in MappingMode::ALL {
        println!("  [{}] {}", mode.key(), mode.display_name());
    }

    Ok(())
}

fn print_intrinsics(label: &str, k: &CameraIntrinsics) {
    println!(
        "  {} intrinsics: fx {:.2}, fy {:.2}, cx {:.2}, cy {:.2}",
        label, k.fx, k.fy, k.cx, k.cy
    );
}

/// Run the frame mapper without a terminal UI
///
/// `mode` is 1-based, matching the viewer's mode keys. `frames` of 0 runs
/// until Ctrl+C.
pub fn stream(
    config: &Config,
    mode: Option<usize>,
    frames: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = create_device(config)?;
    let mut app = App::new(device, config);

    if let Some(mode) = mode {
        let key = mode
            .checked_sub(1)
            .and_then(|i| MODE_KEYS.get(i))
            .ok_or_else(|| format!("Mode {} out of range (1-{})", mode, MODE_KEYS.len()))?;
        app.handle_key(*key);
    }

    println!("Source: {}", app.device().name());
    println!("Mode: {}", app.mode().display_name());
    println!("Streaming... (press Ctrl+C to stop)");

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let mut mapped = 0u64;
    while frames == 0 || mapped < frames {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        match app.update()? {
            Some(MapOutcome::Skipped) | None => std::thread::sleep(INPUT_POLL),
            Some(outcome) => {
                mapped += 1;
                println!("Frame {}: {}", mapped, outcome);
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!();
    println!(
        "Mapped {} frames in {:.2}s ({:.2} FPS)",
        mapped,
        elapsed,
        mapped as f64 / elapsed.max(f64::EPSILON)
    );

    let mesh = match app.mode() {
        MappingMode::WorldAuto => app.world_mesh(),
        _ => app.mapper().mesh(),
    };
    if let Some((min, max)) = mesh.bounds() {
        println!(
            "Last cloud: {} of {} points valid",
            mesh.valid_count(),
            mesh.num_vertices()
        );
        println!(
            "  Extent: x {:.2}..{:.2} m, y {:.2}..{:.2} m, z {:.2}..{:.2} m",
            min[0], max[0], min[1], max[1], min[2], max[2]
        );
    }

    Ok(())
}

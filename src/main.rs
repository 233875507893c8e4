//! Trajectory animation CLI - Animate a wide-format position CSV.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use trajectory_anim::{
    animation::AnimationRecorder,
    compute::{RawTable, WindowedAnimator, normalize_detailed},
    schema::AnimationConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <data.csv> [config.json]", args[0]);
        eprintln!();
        eprintln!("Animate the trajectories of three tracked entities.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  data.csv     Wide-format CSV: Time (or SimTime), N0x..N2z");
        eprintln!("  config.json  Window, playback and output settings (optional)");
        eprintln!();
        eprintln!("Example configuration is printed with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let csv_path = PathBuf::from(&args[1]);

    // Load configuration
    let config: AnimationConfig = match args.get(2) {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => AnimationConfig::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    // Load and normalize data
    let start = Instant::now();
    let table = RawTable::from_path(&csv_path, config.delimiter).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", csv_path.display(), e);
        std::process::exit(1);
    });
    let normalized = normalize_detailed(&table).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let tidy = &normalized.records;

    let window = match config.resolve_window(tidy) {
        Ok(Some(window)) => window,
        Ok(None) => {
            eprintln!("Error: No valid data.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    let animator = WindowedAnimator::new(tidy, window).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let settings = config.playback();
    let plan = animator.plan(&settings);
    let b = animator.bounds();

    println!("Trajectory Animation");
    println!("====================");
    println!("Rows: {}", table.row_count());
    println!(
        "Records: {} (time column read as {:?})",
        tidy.len(),
        normalized.time_encoding
    );
    println!("Window: {}", window);
    println!(
        "Frames: {} ({} records in window)",
        plan.frame_count,
        animator.records().len()
    );
    println!(
        "Bounds: x [{:.3}, {:.3}], y [{:.3}, {:.3}], z [{:.3}, {:.3}]",
        b.x_min, b.x_max, b.y_min, b.y_max, b.z_min, b.z_max
    );
    println!("Playback: {} fps, {} ms/frame", plan.fps, plan.delay_ms);
    println!();

    let Some(output) = &config.output else {
        println!("No output configured; done in {:.2}s", start.elapsed().as_secs_f32());
        return;
    };

    println!("Recording to {}...", output.display());
    let mut recorder = AnimationRecorder::new(output, &plan, config.recorder.clone())
        .unwrap_or_else(|e| {
            eprintln!("Error creating {}: {}", output.display(), e);
            std::process::exit(1);
        });
    if let Err(e) = animator.play(&mut recorder, &settings) {
        eprintln!("Error recording frames: {}", e);
        std::process::exit(1);
    }
    match recorder.finalize() {
        Ok(stats) => println!("Saved {}: {}", output.display(), stats),
        Err(e) => {
            eprintln!("Error finalizing {}: {}", output.display(), e);
            std::process::exit(1);
        }
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
}

fn print_example_config() {
    let config = AnimationConfig {
        window_start: Some("2024-01-01T00:00:00Z".into()),
        window_end: Some("2024-01-01T00:05:00Z".into()),
        output: Some(PathBuf::from("trajectories.trja")),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}

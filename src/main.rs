// src/main.rs
//
// Replays a directory of pre-warped binary lane masks through the tracker.
// Calibration, thresholding and the perspective warp happen upstream.

use anyhow::{Context, Result};
use lane_tracker::debug::render_search;
use lane_tracker::tracking::{FrameController, FrameReport, LaneReading, TrackerConfig};
use lane_tracker::{BinaryGrid, Config};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const MASK_EXTENSIONS: [&str; 3] = ["png", "pgm", "bmp"];

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lane_tracker={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛣️  Lane tracker replay starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Search: {} windows, margin={}px, recenter>={}px, tracked margin={}px",
        config.search.window_count,
        config.search.margin,
        config.search.min_pixels_to_recenter,
        config.search.tracked_margin
    );
    info!(
        "Tracking: history={}, failure threshold={}, curvature ceiling={:.0}m",
        config.tracking.history_len,
        config.tracking.failure_threshold,
        config.tracking.curvature_ceiling_m
    );

    let masks = find_mask_files(&config.replay.input_dir)?;
    if masks.is_empty() {
        error!("No mask images found in {}", config.replay.input_dir);
        return Ok(());
    }
    info!("Found {} mask frame(s)", masks.len());

    if let Some(dir) = &config.replay.debug_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating debug directory {}", dir))?;
    }

    let mut report_writer = match &config.replay.report_path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating report {}", path))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let mut controller = FrameController::new(TrackerConfig::from(&config));

    for path in &masks {
        let grid = match load_mask(path) {
            Ok(grid) => grid,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                continue;
            }
        };

        let report = controller.process(&grid);
        log_report(&report, path);

        if let Some(dir) = &config.replay.debug_dir {
            save_debug_frame(dir, &report, &grid, &controller)?;
        }

        if let Some(writer) = report_writer.as_mut() {
            serde_json::to_writer(&mut *writer, &report).context("serializing frame report")?;
            writeln!(writer).context("writing frame report")?;
        }
    }

    if let Some(mut writer) = report_writer {
        writer.flush().context("flushing frame report")?;
    }

    let stats = controller.stats();
    info!("\n========================================");
    info!("✓ Replay complete");
    info!("  Frames:             {}", stats.frames);
    info!("  Initial searches:   {}", stats.initial_searches);
    info!("  Tracked searches:   {}", stats.tracked_searches);
    info!("  Accepted fits:      {}", stats.accepted_fits);
    info!("  Rejected fits:      {}", stats.rejected_fits);
    info!("  Search failures:    {}", stats.search_failures);
    info!("  Track resets:       {}", stats.track_resets);
    info!("========================================");

    Ok(())
}

fn find_mask_files(dir: &str) -> Result<Vec<PathBuf>> {
    let root = Path::new(dir);
    if !root.is_dir() {
        anyhow::bail!("mask directory does not exist: {}", dir);
    }

    let mut masks = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_mask = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| MASK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_mask && path.is_file() {
            masks.push(path.to_path_buf());
        }
    }
    Ok(masks)
}

fn load_mask(path: &Path) -> Result<BinaryGrid> {
    let img = image::open(path).with_context(|| format!("opening mask {}", path.display()))?;
    Ok(BinaryGrid::from_luma(&img.to_luma8()))
}

fn log_report(report: &FrameReport, path: &Path) {
    let radius = |reading: &LaneReading| {
        reading
            .estimate()
            .map_or_else(|| "  n/a".to_string(), |e| format!("{:5.0}m", e.radius_m))
    };
    let offset = report
        .offset
        .map_or_else(|| "no lane data".to_string(), |o| format!("vehicle is {}", o));

    info!(
        "Frame {:5} [{:?}] {} | left R={} right R={} | {}",
        report.frame_index,
        report.search,
        path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
        radius(&report.left),
        radius(&report.right),
        offset
    );

    if !report.left.is_fresh() || !report.right.is_fresh() {
        info!("  left: {:?}", report.left);
        info!("  right: {:?}", report.right);
    }
}

fn save_debug_frame(
    dir: &str,
    report: &FrameReport,
    grid: &BinaryGrid,
    controller: &FrameController,
) -> Result<()> {
    let img = render_search(
        grid,
        controller.last_windows(),
        controller.left().current_fit(),
        controller.right().current_fit(),
    );
    let path = Path::new(dir).join(format!("frame_{:05}.png", report.frame_index));
    img.save(&path)
        .with_context(|| format!("saving debug image {}", path.display()))
}

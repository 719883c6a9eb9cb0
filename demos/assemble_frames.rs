//! Render a small search animation and stitch it into a video.
//!
//! Usage:
//!   cargo run --example assemble_frames -- [output.mp4]

use std::error::Error;
use std::sync::Arc;

use framestitch::{AssemblyOptions, ProgressCallback, ProgressInfo, VideoProbe};
use image::{Rgb, RgbImage};

const GRID: u32 = 20;
const CELL: u32 = 10;

struct PrintProgress;

impl ProgressCallback for PrintProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(pct) = info.percentage {
            println!("  {pct:5.1}% ({}/{})", info.current, info.total);
        }
    }
}

/// One snapshot: visited cells in blue, the frontier cell in red.
fn snapshot(step: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(GRID * CELL, GRID * CELL, Rgb([255, 255, 255]));
    for visited in 0..=step {
        let (cx, cy) = (visited % GRID, visited / GRID);
        let colour = if visited == step {
            Rgb([220, 30, 30])
        } else {
            Rgb([40, 90, 220])
        };
        for y in cy * CELL..(cy + 1) * CELL {
            for x in cx * CELL..(cx + 1) * CELL {
                image.put_pixel(x, y, colour);
            }
        }
    }
    image
}

fn main() -> Result<(), Box<dyn Error>> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pathfinding.mp4".to_string());

    let frames_dir = tempfile::tempdir()?;
    // Spaced keys: playback order follows the integer, not the gaps.
    for step in 0..60 {
        snapshot(step).save(frames_dir.path().join(format!("{}.png", step * 10)))?;
    }
    println!("Rendered 60 frames into {}", frames_dir.path().display());

    let options = AssemblyOptions::new()
        .with_source_dir(frames_dir.path())
        .with_output_path(&output_path)
        .with_progress(Arc::new(PrintProgress))
        .with_batch_size(10);
    let summary = framestitch::assemble(&options)?;
    println!(
        "Wrote {} frames in {:.2?}",
        summary.frames_written, summary.elapsed
    );

    let info = VideoProbe::probe(&output_path)?;
    println!(
        "{output_path}: {}x{}, {:.2} fps, {} frames, {}",
        info.width, info.height, info.frame_rate, info.frame_count, info.codec_name
    );

    Ok(())
}

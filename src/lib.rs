//! # framestitch
//!
//! Stitch numbered PNG frame snapshots into an MP4 video.
//!
//! `framestitch` scans a directory for `<integer>.png` files, orders them by
//! the integer in the file name (so `2.png` comes before `10.png`), resizes
//! each one to a fixed frame size and encodes them into a video container
//! through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framestitch::AssemblyOptions;
//!
//! // ./*.png -> ./pathfinding.mp4 at 400x400, 30 fps, mp4v.
//! let summary = framestitch::assemble(&AssemblyOptions::default())?;
//! println!("{} frames", summary.frames_written);
//! # Ok::<(), framestitch::AssemblyError>(())
//! ```
//!
//! ### Custom Output
//!
//! ```no_run
//! use framestitch::{AssemblyOptions, FourCc, FrameSize, Interpolation};
//!
//! let options = AssemblyOptions::new()
//!     .with_source_dir("snapshots")
//!     .with_output_path("search.mp4")
//!     .with_frame_size(FrameSize::new(800, 600))
//!     .with_frame_rate(60)
//!     .with_codec(FourCc::AVC1)
//!     .with_interpolation(Interpolation::Lanczos3);
//! framestitch::assemble(&options)?;
//! # Ok::<(), framestitch::AssemblyError>(())
//! ```
//!
//! ### Writing Frames Directly
//!
//! [`VideoWriter`] is the scoped handle the pipeline uses; it can also be
//! driven by hand. It is finalized by [`VideoWriter::finish`], or on drop.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod assembler;
pub mod codec;
pub mod configuration;
pub mod discovery;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod probe;
pub mod progress;
pub mod writer;

pub use assembler::{AssemblySummary, FrameAssembler, assemble};
pub use codec::FourCc;
pub use configuration::{
    AssemblyOptions, ColorMode, DEFAULT_FRAME_RATE, DEFAULT_OUTPUT_PATH, FailurePolicy, FrameSize,
    WriterOptions,
};
pub use discovery::{FrameSource, discover_frames};
pub use error::AssemblyError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::Interpolation;
pub use probe::{VideoProbe, VideoProbeInfo};
pub use progress::{ProgressCallback, ProgressInfo};
pub use writer::VideoWriter;

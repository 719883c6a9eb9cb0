//! Assembly configuration.
//!
//! [`AssemblyOptions`] is a builder carrying every input of a run: the
//! source directory, the output path, the writer settings, the resize
//! policy, and an optional progress callback. Defaults reproduce the
//! classic pathfinding export: `./*.png` to `pathfinding.mp4`, 400x400,
//! 30 fps, `mp4v`, colour.
//!
//! # Example
//!
//! ```
//! use framestitch::{AssemblyOptions, FrameSize, FourCc};
//!
//! let options = AssemblyOptions::new()
//!     .with_source_dir("frames")
//!     .with_output_path("out/run.mp4")
//!     .with_frame_size(FrameSize::new(640, 480))
//!     .with_frame_rate(24)
//!     .with_codec(FourCc::MP4V);
//! assert!(options.validate().is_ok());
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use ffmpeg_next::format::Pixel;

use crate::codec::FourCc;
use crate::error::AssemblyError;
use crate::frame::Interpolation;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default output file name, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "pathfinding.mp4";
/// Default frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Width and height of every frame written to the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check the size is encodable.
    ///
    /// Both dimensions must be non-zero and even, since the encoder works
    /// on 4:2:0 chroma-subsampled pictures.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.width == 0 || self.height == 0 {
            return Err(AssemblyError::InvalidOptions(format!(
                "frame size {self} must be non-zero"
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(AssemblyError::InvalidOptions(format!(
                "frame size {self} must have even dimensions"
            )));
        }
        Ok(())
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(400, 400)
    }
}

impl Display for FrameSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = AssemblyError;

    /// Parse `WIDTHxHEIGHT`, e.g. `400x400`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || AssemblyError::InvalidOptions(format!("invalid frame size: {value}"));
        let (width, height) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(width, height))
    }
}

/// Whether frames are written in colour or as grayscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// 3-channel RGB frames. This is the default.
    #[default]
    Color,
    /// Single-channel luma frames.
    Grayscale,
}

impl ColorMode {
    /// FFmpeg pixel format of the frames handed to the writer.
    pub(crate) fn source_pixel(self) -> Pixel {
        match self {
            ColorMode::Color => Pixel::RGB24,
            ColorMode::Grayscale => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            ColorMode::Color => 3,
            ColorMode::Grayscale => 1,
        }
    }
}

/// What happens to the output file when a run fails after the writer opened.
///
/// The writer is always finalized first; this only decides whether the
/// finalized partial video is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep the finalized, playable partial video.
    #[default]
    Finalize,
    /// Remove the output file after finalizing it.
    Discard,
}

/// Settings the video writer is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Output codec.
    pub codec: FourCc,
    /// Frames per second.
    pub frame_rate: u32,
    /// Dimension of every frame.
    pub frame_size: FrameSize,
    /// Colour mode of every frame.
    pub color_mode: ColorMode,
    /// Target bitrate in bits per second. `None` keeps the encoder default.
    pub bit_rate: Option<usize>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            codec: FourCc::MP4V,
            frame_rate: DEFAULT_FRAME_RATE,
            frame_size: FrameSize::default(),
            color_mode: ColorMode::Color,
            bit_rate: None,
        }
    }
}

impl WriterOptions {
    /// Check the settings before any backend work happens.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.frame_rate == 0 {
            return Err(AssemblyError::InvalidOptions(
                "frame rate must be greater than zero".to_string(),
            ));
        }
        if i32::try_from(self.frame_rate).is_err() {
            return Err(AssemblyError::InvalidOptions(format!(
                "frame rate {} is too large",
                self.frame_rate
            )));
        }
        self.frame_size.validate()
    }
}

/// Every input of one assembly run.
///
/// All fields have defaults; a default-constructed value stitches
/// `./*.png` into `./pathfinding.mp4`.
#[derive(Clone)]
pub struct AssemblyOptions {
    pub(crate) source_dir: PathBuf,
    pub(crate) output_path: PathBuf,
    pub(crate) writer: WriterOptions,
    pub(crate) interpolation: Interpolation,
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often the progress callback fires (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for AssemblyOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AssemblyOptions")
            .field("source_dir", &self.source_dir)
            .field("output_path", &self.output_path)
            .field("writer", &self.writer)
            .field("interpolation", &self.interpolation)
            .field("failure_policy", &self.failure_policy)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyOptions {
    /// Create options with the default settings.
    pub fn new() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            writer: WriterOptions::default(),
            interpolation: Interpolation::NearestExact,
            failure_policy: FailurePolicy::Finalize,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the directory scanned for `<integer>.png` frames.
    #[must_use]
    pub fn with_source_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.source_dir = dir.into();
        self
    }

    /// Set the video file to create or overwrite.
    #[must_use]
    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the dimension every frame is resized to.
    #[must_use]
    pub fn with_frame_size(mut self, size: FrameSize) -> Self {
        self.writer.frame_size = size;
        self
    }

    /// Set the output frame rate.
    #[must_use]
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.writer.frame_rate = fps;
        self
    }

    /// Set the output codec.
    #[must_use]
    pub fn with_codec(mut self, codec: FourCc) -> Self {
        self.writer.codec = codec;
        self
    }

    /// Write colour or grayscale frames.
    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.writer.color_mode = mode;
        self
    }

    /// Set the target bitrate in bits per second.
    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: usize) -> Self {
        self.writer.bit_rate = Some(bit_rate);
        self
    }

    /// Set the resize interpolation policy.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Decide whether a failed run keeps its partial output.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The source directory.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The output path.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The writer settings.
    pub fn writer(&self) -> &WriterOptions {
        &self.writer
    }

    /// The resize interpolation policy.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// The failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Check the options before any I/O happens.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        self.writer.validate()
    }
}

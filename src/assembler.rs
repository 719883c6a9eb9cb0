//! The frame assembly pipeline.
//!
//! [`FrameAssembler`] runs one linear pass: discover `<integer>.png` files,
//! order them, open a [`VideoWriter`], then decode, resize and append each
//! frame before finalizing the writer. The writer is finalized on every
//! exit path, including failures partway through.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::codec::FourCc;
use crate::configuration::{AssemblyOptions, FailurePolicy, FrameSize};
use crate::discovery::{FrameSource, discover_frames};
use crate::error::AssemblyError;
use crate::frame::load_frame;
use crate::progress::ProgressTracker;
use crate::writer::VideoWriter;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySummary {
    /// The video that was written.
    pub output_path: PathBuf,
    /// Frames appended to the video.
    pub frames_written: u64,
    /// Dimension of every frame.
    pub frame_size: FrameSize,
    /// Frames per second.
    pub frame_rate: u32,
    /// Codec the video was encoded with.
    pub codec: FourCc,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Stitches a directory of numbered frames into one video.
///
/// # Example
///
/// ```no_run
/// use framestitch::{AssemblyOptions, FrameAssembler};
///
/// let summary = FrameAssembler::new(
///     AssemblyOptions::new()
///         .with_source_dir("frames")
///         .with_output_path("pathfinding.mp4"),
/// )
/// .run()?;
/// println!("wrote {} frames", summary.frames_written);
/// # Ok::<(), framestitch::AssemblyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    options: AssemblyOptions,
}

impl FrameAssembler {
    /// Create an assembler for `options`.
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// The options this assembler runs with.
    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Run the pipeline once.
    ///
    /// Frame names are validated before the writer is opened, so an
    /// [`InvalidFrameName`](AssemblyError::InvalidFrameName) leaves the
    /// output path untouched. An empty directory is not an error: it
    /// produces a valid zero-frame video.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::InvalidOptions`] for unusable options.
    /// - [`AssemblyError::SourceDirectory`] if the directory cannot be read.
    /// - [`AssemblyError::InvalidFrameName`] for a non-integer stem.
    /// - [`AssemblyError::WriterOpenError`] if the writer cannot open.
    /// - [`AssemblyError::DecodeError`] if a frame cannot be decoded.
    /// - [`AssemblyError::WriteError`] if a frame cannot be appended or the
    ///   video cannot be finalized.
    pub fn run(&self) -> Result<AssemblySummary, AssemblyError> {
        let started = Instant::now();
        let options = &self.options;
        options.validate()?;

        let frames = discover_frames(&options.source_dir)?;
        log::info!(
            "Assembling {} frame(s) from {} into {} ({}, {} fps, {})",
            frames.len(),
            options.source_dir.display(),
            options.output_path.display(),
            options.writer.codec,
            options.writer.frame_rate,
            options.writer.frame_size,
        );

        let mut writer = VideoWriter::open(&options.output_path, options.writer)?;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            frames.len() as u64,
            options.batch_size,
        );

        let written = self.write_frames(&mut writer, &frames, &mut tracker);
        let finished = writer.finish();

        match (written, finished) {
            (Ok(()), Ok(frames_written)) => {
                tracker.finish();
                log::info!(
                    "Wrote {frames_written} frame(s) to {} in {:.2?}",
                    options.output_path.display(),
                    tracker.elapsed(),
                );
                Ok(AssemblySummary {
                    output_path: options.output_path.clone(),
                    frames_written,
                    frame_size: options.writer.frame_size,
                    frame_rate: options.writer.frame_rate,
                    codec: options.writer.codec,
                    elapsed: started.elapsed(),
                })
            }
            (Err(error), finished) => {
                if let Err(finalize_error) = finished {
                    log::warn!(
                        "Could not finalize {} after failure: {finalize_error}",
                        options.output_path.display()
                    );
                }
                self.apply_failure_policy();
                Err(error)
            }
            (Ok(()), Err(error)) => {
                self.apply_failure_policy();
                Err(error)
            }
        }
    }

    fn write_frames(
        &self,
        writer: &mut VideoWriter,
        frames: &[FrameSource],
        tracker: &mut ProgressTracker,
    ) -> Result<(), AssemblyError> {
        let options = &self.options;
        for source in frames {
            let frame = load_frame(
                source.path(),
                options.writer.frame_size,
                options.interpolation,
                options.writer.color_mode,
            )?;
            writer.write(&frame)?;
            log::debug!(
                "Frame {} <- {} (key {})",
                writer.frames_written() - 1,
                source.path().display(),
                source.sort_key(),
            );
            tracker.advance(source.path());
        }
        Ok(())
    }

    fn apply_failure_policy(&self) {
        if self.options.failure_policy != FailurePolicy::Discard {
            return;
        }
        let path = &self.options.output_path;
        match fs::remove_file(path) {
            Ok(()) => log::info!("Discarded partial output {}", path.display()),
            Err(error) => log::warn!("Could not discard {}: {error}", path.display()),
        }
    }
}

/// Stitch the frames described by `options` into a video.
///
/// Shorthand for `FrameAssembler::new(options.clone()).run()`.
///
/// # Example
///
/// ```no_run
/// // ./*.png -> ./pathfinding.mp4, 400x400, 30 fps, mp4v
/// let summary = framestitch::assemble(&framestitch::AssemblyOptions::default())?;
/// # Ok::<(), framestitch::AssemblyError>(())
/// ```
pub fn assemble(options: &AssemblyOptions) -> Result<AssemblySummary, AssemblyError> {
    FrameAssembler::new(options.clone()).run()
}

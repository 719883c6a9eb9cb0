//! Error types for the `framestitch` crate.
//!
//! This module defines [`AssemblyError`], the error type returned by every
//! fallible operation in the crate. Backend failures from FFmpeg and the
//! `image` crate are translated into these variants so callers can tell
//! failure causes apart without matching on backend messages.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framestitch` operations.
///
/// None of these are recoverable mid-run: each one aborts the assembly
/// after the video writer (if it was opened) has been finalized.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssemblyError {
    /// A `.png` file's stem is not a base-10 integer sort key.
    #[error("Invalid frame name {path}: stem {stem:?} is not an integer")]
    InvalidFrameName {
        /// The offending file.
        path: PathBuf,
        /// The stem that failed to parse.
        stem: String,
    },

    /// A source file could not be read or decoded as an image.
    #[error("Failed to decode frame {path}: {source}")]
    DecodeError {
        /// The file that failed to decode.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: ImageError,
    },

    /// The video writer could not be initialised.
    #[error("Failed to open video writer at {path}: {reason}")]
    WriterOpenError {
        /// Output path passed to the writer.
        path: PathBuf,
        /// Why the backend refused to open.
        reason: String,
    },

    /// A frame could not be appended, or the writer could not be finalized.
    #[error("Video write error: {0}")]
    WriteError(String),

    /// The assembly options are unusable (zero fps, odd frame size, ...).
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The source directory is missing or cannot be listed.
    #[error("Cannot read source directory {path}: {source}")]
    SourceDirectory {
        /// Directory that was passed in.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// An existing video could not be inspected.
    #[error("Failed to probe video: {0}")]
    ProbeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl From<FfmpegError> for AssemblyError {
    fn from(error: FfmpegError) -> Self {
        AssemblyError::FfmpegError(error.to_string())
    }
}

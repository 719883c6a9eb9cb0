//! FFmpeg process-level setup.
//!
//! [`initialize`] registers FFmpeg's formats and codecs once per process.
//! [`set_ffmpeg_log_level`] tunes what FFmpeg itself prints to stderr; the
//! encoder is chatty at its default level, so the CLI lowers it unless
//! asked otherwise. Crate diagnostics go through the `log` facade and are
//! not affected by this.
//!
//! ```no_run
//! use framestitch::FfmpegLogLevel;
//!
//! framestitch::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::sync::OnceLock;

use ffmpeg_next::util::log::Level;

use crate::error::AssemblyError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialise FFmpeg. Cheap after the first call.
pub(crate) fn initialize() -> Result<(), AssemblyError> {
    INIT.get_or_init(|| ffmpeg_next::init().map_err(|error| error.to_string()))
        .clone()
        .map_err(AssemblyError::FfmpegError)
}

/// FFmpeg log verbosity, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Nothing.
    Quiet,
    /// Conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings. FFmpeg's own default.
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    fn into_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Set what FFmpeg prints to stderr.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into_level());
}

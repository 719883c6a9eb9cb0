//! Frame discovery.
//!
//! Scans a directory for `<integer>.png` files and orders them by the
//! integer in the file stem, so `2.png` plays before `10.png` regardless of
//! zero padding.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AssemblyError;

/// Extension of the files picked up as frames. Matched case-sensitively.
pub const FRAME_EXTENSION: &str = "png";

/// One discovered frame file and its playback sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    path: PathBuf,
    sort_key: i64,
}

impl FrameSource {
    /// Derive the sort key from `path`'s stem.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidFrameName`] if the stem is not a
    /// base-10 integer that fits in an `i64`.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Result<Self, AssemblyError> {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parse_sort_key(&stem) {
            Some(sort_key) => Ok(Self { path, sort_key }),
            None => Err(AssemblyError::InvalidFrameName { path, stem }),
        }
    }

    /// Path of the frame image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Integer parsed from the file stem.
    pub fn sort_key(&self) -> i64 {
        self.sort_key
    }
}

/// Parse a file stem as a sort key.
///
/// Accepts an optional sign followed by ASCII digits. Anything else,
/// including stems that overflow an `i64`, yields `None`.
pub(crate) fn parse_sort_key(stem: &str) -> Option<i64> {
    stem.parse::<i64>().ok()
}

/// Whether `path` looks like a frame file by name alone.
///
/// A file named just `.png` has no extension as far as [`Path`] is
/// concerned, but it still ends in `.png`, so it is picked up and then
/// rejected as an [`InvalidFrameName`](AssemblyError::InvalidFrameName).
fn has_frame_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FRAME_EXTENSION)
        || path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix('.'))
            == Some(FRAME_EXTENSION)
}

/// List every frame in `dir`, ordered for playback.
///
/// Only regular files (or links to them) with a `.png` extension are
/// considered; everything else in the directory is ignored. Every
/// candidate is validated before this returns, so a bad name is reported
/// before any output is created.
///
/// Entries are sorted ascending by sort key. Equal keys (`1.png` and
/// `01.png`) are ordered by file name.
///
/// # Errors
///
/// - [`AssemblyError::SourceDirectory`] if `dir` cannot be listed.
/// - [`AssemblyError::InvalidFrameName`] for the first candidate whose stem
///   is not an integer.
pub fn discover_frames<P: AsRef<Path>>(dir: P) -> Result<Vec<FrameSource>, AssemblyError> {
    let dir = dir.as_ref();
    let directory_error = |source| AssemblyError::SourceDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(directory_error)? {
        let path = entry.map_err(directory_error)?.path();
        if has_frame_extension(&path) && path.is_file() {
            candidates.push(path);
        }
    }
    // Directory order is filesystem-defined; fix it so the first reported
    // bad name is the same on every run.
    candidates.sort();

    let mut frames = candidates
        .into_iter()
        .map(FrameSource::from_path)
        .collect::<Result<Vec<_>, _>>()?;

    frames.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });

    log::debug!("Discovered {} frame(s) in {}", frames.len(), dir.display());
    Ok(frames)
}

//! Four-character codec identifiers.
//!
//! Output codecs are named the way container tooling names them: by a
//! four-character code such as `mp4v` or `avc1`. [`FourCc`] validates the
//! code and maps it onto the FFmpeg encoder that produces that bitstream.
//!
//! # Example
//!
//! ```
//! use framestitch::FourCc;
//!
//! let codec: FourCc = "avc1".parse()?;
//! assert_eq!(codec.as_str(), "avc1");
//! assert_eq!(FourCc::default(), FourCc::MP4V);
//! # Ok::<(), framestitch::AssemblyError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::codec::Id;
use ffmpeg_next::format::Pixel;

use crate::error::AssemblyError;

/// A four-character codec code (FourCC).
///
/// Only printable ASCII is accepted. Matching against known encoders is
/// case-insensitive, but the code is stored as given so it can be written
/// into the container's stream tag unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// MPEG-4 Part 2, the default for `.mp4` output.
    pub const MP4V: FourCc = FourCc(*b"mp4v");
    /// H.264 / AVC.
    pub const AVC1: FourCc = FourCc(*b"avc1");
    /// H.265 / HEVC.
    pub const HEV1: FourCc = FourCc(*b"hev1");
    /// Motion JPEG.
    pub const MJPG: FourCc = FourCc(*b"MJPG");

    /// Build a code from a four-character string.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidOptions`] if `code` is not exactly
    /// four printable ASCII characters.
    pub fn new(code: &str) -> Result<Self, AssemblyError> {
        let bytes: [u8; 4] = code.as_bytes().try_into().map_err(|_| {
            AssemblyError::InvalidOptions(format!(
                "codec {code:?} must be exactly four characters"
            ))
        })?;
        if !bytes.iter().all(|byte| byte.is_ascii_graphic() || *byte == b' ') {
            return Err(AssemblyError::InvalidOptions(format!(
                "codec {code:?} must be printable ASCII"
            )));
        }
        Ok(Self(bytes))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// The little-endian tag value FFmpeg stores in `codec_tag`.
    pub fn tag(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// The FFmpeg codec that produces this bitstream, if the code is known.
    pub(crate) fn codec_id(self) -> Option<Id> {
        let lower = self.0.map(|byte| byte.to_ascii_lowercase());
        match &lower {
            b"mp4v" | b"fmp4" | b"divx" | b"dx50" | b"xvid" => Some(Id::MPEG4),
            b"avc1" | b"h264" | b"x264" => Some(Id::H264),
            b"hev1" | b"hvc1" | b"h265" | b"hevc" => Some(Id::HEVC),
            b"mjpg" => Some(Id::MJPEG),
            b"vp80" => Some(Id::VP8),
            b"vp09" | b"vp90" => Some(Id::VP9),
            b"av01" => Some(Id::AV1),
            _ => None,
        }
    }

    /// Pixel format the encoder is fed after colour conversion.
    pub(crate) fn encoder_pixel_format(self) -> Pixel {
        match self.codec_id() {
            Some(Id::MJPEG) => Pixel::YUVJ420P,
            _ => Pixel::YUV420P,
        }
    }
}

impl Default for FourCc {
    fn default() -> Self {
        Self::MP4V
    }
}

impl Display for FourCc {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FourCc {
    type Err = AssemblyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

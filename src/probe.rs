//! Read back an assembled video.
//!
//! [`VideoProbe`] opens a finished file and reports what a player would
//! see: dimensions, frame rate, frame count and codec. It can also decode
//! every frame to RGB, which is how the CLI's `--verify` flag and the
//! integration tests check a run end to end.
//!
//! ```no_run
//! use framestitch::VideoProbe;
//!
//! let info = VideoProbe::probe("pathfinding.mp4")?;
//! println!("{}x{} @ {} fps, {} frames", info.width, info.height, info.frame_rate, info.frame_count);
//! # Ok::<(), framestitch::AssemblyError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::decoder::Video as VideoDecoder;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use image::RgbImage;

use crate::error::AssemblyError;

/// Metadata of the video stream in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbeInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second, `0.0` when the stream carries no rate.
    pub frame_rate: f64,
    /// Number of frames in the stream.
    pub frame_count: u64,
    /// FFmpeg codec name, e.g. `mpeg4`.
    pub codec_name: String,
    /// Container format name, e.g. `mov,mp4,m4a,3gp,3g2,mj2`.
    pub format: String,
    /// Container duration.
    pub duration: Duration,
}

/// Inspection helpers for finished videos.
pub struct VideoProbe;

impl VideoProbe {
    /// Read the video stream's metadata from `path`.
    ///
    /// When the container does not record a frame count, packets are
    /// counted instead.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::ProbeError`] if the file cannot be opened or
    /// has no video stream.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoProbeInfo, AssemblyError> {
        let path = path.as_ref();
        let mut input = open_input(path)?;

        let format = input.format().name().to_string();
        let duration = u64::try_from(input.duration())
            .map(Duration::from_micros)
            .unwrap_or(Duration::ZERO);

        let (stream_index, recorded_frames, frame_rate, decoder) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| probe_error(path, "no video stream"))?;
            let rate = stream.avg_frame_rate();
            let frame_rate = if rate.denominator() != 0 {
                f64::from(rate.numerator()) / f64::from(rate.denominator())
            } else {
                0.0
            };
            (
                stream.index(),
                stream.frames(),
                frame_rate,
                video_decoder(path, stream.parameters())?,
            )
        };

        let frame_count = count_frames(&mut input, stream_index, recorded_frames);

        Ok(VideoProbeInfo {
            width: decoder.width(),
            height: decoder.height(),
            frame_rate,
            frame_count,
            codec_name: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_default(),
            format,
            duration,
        })
    }

    /// Count the video frames in `path`.
    ///
    /// A container without a video stream holds zero frames. This is what
    /// an MP4 finalized without any frames looks like: the muxer drops
    /// empty tracks.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::ProbeError`] if the file cannot be opened.
    pub fn frame_count<P: AsRef<Path>>(path: P) -> Result<u64, AssemblyError> {
        let path = path.as_ref();
        let mut input = open_input(path)?;
        let Some((stream_index, recorded_frames)) = input
            .streams()
            .best(Type::Video)
            .map(|stream| (stream.index(), stream.frames()))
        else {
            return Ok(0);
        };
        Ok(count_frames(&mut input, stream_index, recorded_frames))
    }

    /// Decode every frame of `path` to RGB, in presentation order.
    ///
    /// A container without a video stream yields no frames.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::ProbeError`] if the file cannot be opened or
    /// decoded.
    pub fn frames<P: AsRef<Path>>(path: P) -> Result<Vec<RgbImage>, AssemblyError> {
        let path = path.as_ref();
        let mut input = open_input(path)?;

        let (stream_index, mut decoder) = {
            let Some(stream) = input.streams().best(Type::Video) else {
                return Ok(Vec::new());
            };
            (stream.index(), video_decoder(path, stream.parameters())?)
        };

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| probe_error(path, format!("cannot create scaler: {error}")))?;

        let mut images = Vec::new();
        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|error| probe_error(path, format!("send_packet failed: {error}")))?;
            receive_images(path, &mut decoder, &mut scaler, &mut images)?;
        }

        decoder
            .send_eof()
            .map_err(|error| probe_error(path, format!("send_eof failed: {error}")))?;
        receive_images(path, &mut decoder, &mut scaler, &mut images)?;

        Ok(images)
    }
}

fn probe_error(path: &Path, reason: impl std::fmt::Display) -> AssemblyError {
    AssemblyError::ProbeError(format!("{}: {reason}", path.display()))
}

fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, AssemblyError> {
    crate::ffmpeg::initialize()?;
    ffmpeg_next::format::input(path).map_err(|error| probe_error(path, error))
}

/// Trust the container's frame count when it records one, else count packets.
fn count_frames(
    input: &mut ffmpeg_next::format::context::Input,
    stream_index: usize,
    recorded_frames: i64,
) -> u64 {
    if recorded_frames > 0 {
        return recorded_frames as u64;
    }
    input
        .packets()
        .filter(|(stream, _)| stream.index() == stream_index)
        .count() as u64
}

fn video_decoder(
    path: &Path,
    parameters: ffmpeg_next::codec::Parameters,
) -> Result<VideoDecoder, AssemblyError> {
    CodecContext::from_parameters(parameters)
        .and_then(|context| context.decoder().video())
        .map_err(|error| probe_error(path, format!("cannot create decoder: {error}")))
}

fn receive_images(
    path: &Path,
    decoder: &mut VideoDecoder,
    scaler: &mut ScalingContext,
    images: &mut Vec<RgbImage>,
) -> Result<(), AssemblyError> {
    let mut decoded = VideoFrame::empty();
    let mut rgb = VideoFrame::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        scaler
            .run(&decoded, &mut rgb)
            .map_err(|error| probe_error(path, format!("colour conversion failed: {error}")))?;
        images.push(frame_to_image(path, &rgb)?);
    }
    Ok(())
}

/// Copy an RGB24 frame into a tightly packed image, dropping row padding.
fn frame_to_image(path: &Path, frame: &VideoFrame) -> Result<RgbImage, AssemblyError> {
    let width = frame.width();
    let height = frame.height();
    let row_len = width as usize * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let mut buffer = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_len]);
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| probe_error(path, "decoded frame has an unexpected size"))
}

//! Video writer: a scoped handle that encodes frames into a container.
//!
//! [`VideoWriter`] is bound to one output path, codec, frame rate, frame
//! size and colour mode for its whole life. Frames go in with
//! [`write`](VideoWriter::write); [`finish`](VideoWriter::finish) flushes
//! the encoder and writes the container trailer, which is what makes the
//! file playable. A writer dropped without `finish` finalizes itself.
//!
//! # Example
//!
//! ```no_run
//! use framestitch::{AssemblyError, VideoWriter, WriterOptions};
//! use image::{DynamicImage, RgbImage};
//!
//! let mut writer = VideoWriter::open("out.mp4", WriterOptions::default())?;
//! writer.write(&DynamicImage::ImageRgb8(RgbImage::new(400, 400)))?;
//! let frames = writer.finish()?;
//! assert_eq!(frames, 1);
//! # Ok::<(), AssemblyError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::Flags as FormatFlags;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};
use image::DynamicImage;

use crate::configuration::{ColorMode, WriterOptions};
use crate::error::AssemblyError;

/// Encoder state created while opening, before the handle exists.
struct OpenedStream {
    encoder: ffmpeg_next::encoder::video::Encoder,
    scaler: ScalingContext,
    stream_index: usize,
    stream_time_base: Rational,
}

/// An open video file accepting frames.
pub struct VideoWriter {
    path: PathBuf,
    options: WriterOptions,
    output: Output,
    encoder: ffmpeg_next::encoder::video::Encoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    frames_written: u64,
    finished: bool,
}

impl VideoWriter {
    /// Create (or truncate) `path` and prepare it for frames.
    ///
    /// The container is inferred from the file extension.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::InvalidOptions`] if `options` fail validation.
    /// - [`AssemblyError::WriterOpenError`] if the codec is unknown, the
    ///   encoder is unavailable, or the file cannot be created. Nothing is
    ///   left at `path` in that case.
    pub fn open<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self, AssemblyError> {
        let path = path.as_ref();
        options.validate()?;

        let open_error = |reason: String| AssemblyError::WriterOpenError {
            path: path.to_path_buf(),
            reason,
        };

        crate::ffmpeg::initialize().map_err(|error| open_error(error.to_string()))?;

        let codec_id = options
            .codec
            .codec_id()
            .ok_or_else(|| open_error(format!("unknown codec {}", options.codec)))?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| open_error(format!("no encoder for {} ({codec_id:?})", options.codec)))?;

        let mut output = ffmpeg_next::format::output(path)
            .map_err(|error| open_error(format!("cannot create output: {error}")))?;

        let opened = match Self::configure(&mut output, codec, codec_id, &options) {
            Ok(opened) => opened,
            Err(reason) => {
                drop(output);
                let _ = fs::remove_file(path);
                return Err(open_error(reason));
            }
        };

        log::debug!(
            "Opened video writer {} ({}, {} fps, {}, {:?})",
            path.display(),
            options.codec,
            options.frame_rate,
            options.frame_size,
            options.color_mode,
        );

        Ok(Self {
            path: path.to_path_buf(),
            encoder_time_base: Rational::new(1, options.frame_rate as i32),
            options,
            output,
            encoder: opened.encoder,
            scaler: opened.scaler,
            stream_index: opened.stream_index,
            stream_time_base: opened.stream_time_base,
            frames_written: 0,
            finished: false,
        })
    }

    fn configure(
        output: &mut Output,
        codec: ffmpeg_next::codec::Codec,
        codec_id: Id,
        options: &WriterOptions,
    ) -> Result<OpenedStream, String> {
        let width = options.frame_size.width;
        let height = options.frame_size.height;
        let fps = options.frame_rate as i32;
        let target_pixel = options.codec.encoder_pixel_format();

        // Read before add_stream borrows the context.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);
        let accepts_tag = container_accepts_tag(output, codec_id, options.codec.tag());

        let mut stream = output
            .add_stream(codec)
            .map_err(|error| format!("cannot add stream: {error}"))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|error| format!("cannot create video encoder: {error}"))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(target_pixel);
        encoder.set_time_base(Rational::new(1, fps));
        encoder.set_frame_rate(Some(Rational::new(fps, 1)));
        if let Some(bit_rate) = options.bit_rate {
            encoder.set_bit_rate(bit_rate);
        }
        if needs_global_header {
            encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        if accepts_tag {
            unsafe {
                (*encoder.as_mut_ptr()).codec_tag = options.codec.tag();
            }
        } else {
            log::debug!(
                "Container does not accept tag {}; using its default for {codec_id:?}",
                options.codec
            );
        }

        let encoder = encoder
            .open_as(codec)
            .map_err(|error| format!("cannot open encoder: {error}"))?;
        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|error| format!("cannot write header: {error}"))?;

        // The muxer may pick its own stream time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| format!("stream {stream_index} vanished after header"))?;

        let scaler = ScalingContext::get(
            options.color_mode.source_pixel(),
            width,
            height,
            target_pixel,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| format!("cannot create scaler: {error}"))?;

        Ok(OpenedStream {
            encoder,
            scaler,
            stream_index,
            stream_time_base,
        })
    }

    /// Append one frame.
    ///
    /// The frame must be exactly the configured size, `ImageRgb8` for
    /// [`ColorMode::Color`] or `ImageLuma8` for [`ColorMode::Grayscale`].
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::WriteError`] on a size or colour mismatch,
    /// after `finish`, or when encoding or muxing fails.
    pub fn write(&mut self, frame: &DynamicImage) -> Result<(), AssemblyError> {
        if self.finished {
            return Err(AssemblyError::WriteError(
                "writer is already finalized".to_string(),
            ));
        }

        let size = self.options.frame_size;
        if frame.width() != size.width || frame.height() != size.height {
            return Err(AssemblyError::WriteError(format!(
                "frame {} is {}x{}, writer expects {size}",
                self.frames_written,
                frame.width(),
                frame.height(),
            )));
        }

        let pixels = match (self.options.color_mode, frame) {
            (ColorMode::Color, DynamicImage::ImageRgb8(buffer)) => buffer.as_raw(),
            (ColorMode::Grayscale, DynamicImage::ImageLuma8(buffer)) => buffer.as_raw(),
            (mode, other) => {
                return Err(AssemblyError::WriteError(format!(
                    "frame {} has colour type {:?}, writer expects {mode:?}",
                    self.frames_written,
                    other.color(),
                )));
            }
        };

        let mut source_frame = VideoFrame::new(
            self.options.color_mode.source_pixel(),
            size.width,
            size.height,
        );
        let row_len = size.width as usize * self.options.color_mode.bytes_per_pixel();
        let stride = source_frame.stride(0);
        let data = source_frame.data_mut(0);
        for (row, source_row) in pixels.chunks_exact(row_len).enumerate() {
            let start = row * stride;
            data[start..start + row_len].copy_from_slice(source_row);
        }

        let mut encoded_frame = VideoFrame::empty();
        self.scaler
            .run(&source_frame, &mut encoded_frame)
            .map_err(|error| AssemblyError::WriteError(format!("colour conversion failed: {error}")))?;
        encoded_frame.set_pts(Some(self.frames_written as i64));

        self.encoder
            .send_frame(&encoded_frame)
            .map_err(|error| AssemblyError::WriteError(format!("send_frame failed: {error}")))?;
        self.drain_packets()?;

        self.frames_written += 1;
        Ok(())
    }

    /// Flush the encoder and write the trailer. Returns the frame count.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::WriteError`] if flushing or the trailer
    /// fails; the file may then be unplayable.
    pub fn finish(mut self) -> Result<u64, AssemblyError> {
        self.finalize()?;
        log::debug!(
            "Finalized {} with {} frame(s)",
            self.path.display(),
            self.frames_written
        );
        Ok(self.frames_written)
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings the writer was opened with.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    fn finalize(&mut self) -> Result<(), AssemblyError> {
        if self.finished {
            return Ok(());
        }
        // Never attempt a second finalization, even if this one fails.
        self.finished = true;

        self.encoder
            .send_eof()
            .map_err(|error| AssemblyError::WriteError(format!("send_eof failed: {error}")))?;
        self.drain_packets()?;
        self.output
            .write_trailer()
            .map_err(|error| AssemblyError::WriteError(format!("cannot write trailer: {error}")))?;
        Ok(())
    }

    fn drain_packets(&mut self) -> Result<(), AssemblyError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|error| AssemblyError::WriteError(format!("write packet failed: {error}")))?;
        }
        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(error) = self.finalize() {
            log::warn!(
                "Finalizing {} on drop failed: {error}",
                self.path.display()
            );
        }
    }
}

/// Whether the output container can carry `tag` for `codec_id`.
fn container_accepts_tag(output: &Output, codec_id: Id, tag: u32) -> bool {
    unsafe {
        let format = output.format().as_ptr();
        let tags = (*format).codec_tag;
        let expected: ffmpeg_sys_next::AVCodecID = codec_id.into();
        !tags.is_null() && ffmpeg_sys_next::av_codec_get_id(tags, tag) == expected
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, RgbImage};

    use super::*;
    use crate::codec::FourCc;
    use crate::configuration::FrameSize;

    fn small_options() -> WriterOptions {
        WriterOptions {
            frame_size: FrameSize::new(16, 16),
            ..WriterOptions::default()
        }
    }

    /// Open a writer, or `None` when this FFmpeg build lacks the encoder.
    fn try_open(path: &Path, options: WriterOptions) -> Option<VideoWriter> {
        match VideoWriter::open(path, options) {
            Ok(writer) => Some(writer),
            Err(AssemblyError::WriterOpenError { reason, .. }) if reason.contains("no encoder") => {
                eprintln!("Skipping: {reason}");
                None
            }
            Err(error) => panic!("open failed: {error}"),
        }
    }

    #[test]
    fn unknown_codec_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        let options = WriterOptions {
            codec: FourCc::new("zzzz").unwrap(),
            ..small_options()
        };

        let result = VideoWriter::open(&path, options);
        assert!(matches!(result, Err(AssemblyError::WriterOpenError { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn missing_parent_directory_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.mp4");

        let result = VideoWriter::open(&path, small_options());
        assert!(matches!(result, Err(AssemblyError::WriterOpenError { .. })));
    }

    #[test]
    fn odd_frame_size_is_rejected_before_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        let options = WriterOptions {
            frame_size: FrameSize::new(15, 16),
            ..WriterOptions::default()
        };

        let result = VideoWriter::open(&path, options);
        assert!(matches!(result, Err(AssemblyError::InvalidOptions(_))));
        assert!(!path.exists());
    }

    #[test]
    fn rejects_mismatched_frames() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        let Some(mut writer) = try_open(&path, small_options()) else {
            return;
        };

        let wrong_size = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        assert!(matches!(
            writer.write(&wrong_size),
            Err(AssemblyError::WriteError(_))
        ));

        let wrong_colour = DynamicImage::ImageLuma8(GrayImage::new(16, 16));
        assert!(matches!(
            writer.write(&wrong_colour),
            Err(AssemblyError::WriteError(_))
        ));

        assert_eq!(writer.frames_written(), 0);
        assert_eq!(writer.finish().expect("finish"), 0);
    }

    #[test]
    fn counts_written_frames() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        let Some(mut writer) = try_open(&path, small_options()) else {
            return;
        };

        let frame = DynamicImage::ImageRgb8(RgbImage::new(16, 16));
        for _ in 0..3 {
            writer.write(&frame).expect("write");
        }
        assert_eq!(writer.finish().expect("finish"), 3);
        assert!(fs::metadata(&path).expect("metadata").len() > 0);
    }

    #[test]
    fn grayscale_writer_accepts_luma() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        let options = WriterOptions {
            color_mode: ColorMode::Grayscale,
            ..small_options()
        };
        let Some(mut writer) = try_open(&path, options) else {
            return;
        };

        writer
            .write(&DynamicImage::ImageLuma8(GrayImage::new(16, 16)))
            .expect("write");
        assert_eq!(writer.finish().expect("finish"), 1);
    }

    #[test]
    fn drop_finalizes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.mp4");
        {
            let Some(mut writer) = try_open(&path, small_options()) else {
                return;
            };
            writer
                .write(&DynamicImage::ImageRgb8(RgbImage::new(16, 16)))
                .expect("write");
        }

        let info = crate::probe::VideoProbe::probe(&path).expect("probe");
        assert_eq!(info.frame_count, 1);
    }
}

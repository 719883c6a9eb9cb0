//! Video writer integration tests.
//!
//! Drives [`VideoWriter`] directly, without the directory pipeline.
//! Tests return early when the local FFmpeg has no encoder for the codec.

use std::path::Path;

use framestitch::{
    AssemblyError, ColorMode, FourCc, FrameSize, VideoProbe, VideoWriter, WriterOptions,
};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

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

fn options(width: u32, height: u32) -> WriterOptions {
    WriterOptions {
        frame_size: FrameSize::new(width, height),
        ..WriterOptions::default()
    }
}

#[test]
fn write_frames_to_mp4() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("writer.mp4");
    let Some(mut writer) = try_open(&output, options(64, 48)) else {
        return;
    };

    for shade in [0_u8, 64, 128, 192, 255] {
        let frame = RgbImage::from_pixel(64, 48, Rgb([shade, shade, shade]));
        writer
            .write(&DynamicImage::ImageRgb8(frame))
            .expect("write frame");
    }
    assert_eq!(writer.frames_written(), 5);
    assert_eq!(writer.path(), output.as_path());
    assert_eq!(writer.finish().expect("finish"), 5);

    let info = VideoProbe::probe(&output).expect("probe");
    assert_eq!(info.frame_count, 5);
    assert_eq!((info.width, info.height), (64, 48));
    assert!(info.format.contains("mp4"), "format was {}", info.format);
}

#[test]
fn custom_frame_rate_is_recorded() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("fps.mp4");
    let Some(mut writer) = try_open(
        &output,
        WriterOptions {
            frame_rate: 10,
            ..options(32, 32)
        },
    ) else {
        return;
    };

    for _ in 0..10 {
        writer
            .write(&DynamicImage::ImageRgb8(RgbImage::new(32, 32)))
            .expect("write frame");
    }
    writer.finish().expect("finish");

    let info = VideoProbe::probe(&output).expect("probe");
    assert!((info.frame_rate - 10.0).abs() < 0.5, "fps was {}", info.frame_rate);
    assert!(
        info.duration.as_secs_f64() > 0.5 && info.duration.as_secs_f64() < 1.5,
        "duration was {:?}",
        info.duration
    );
}

#[test]
fn grayscale_writer_accepts_luma_frames() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("gray.mp4");
    let Some(mut writer) = try_open(
        &output,
        WriterOptions {
            color_mode: ColorMode::Grayscale,
            ..options(32, 32)
        },
    ) else {
        return;
    };

    let frame = GrayImage::from_pixel(32, 32, Luma([200]));
    writer
        .write(&DynamicImage::ImageLuma8(frame))
        .expect("write luma frame");

    let colour = RgbImage::new(32, 32);
    let mismatch = writer.write(&DynamicImage::ImageRgb8(colour));
    assert!(matches!(mismatch, Err(AssemblyError::WriteError(_))));

    assert_eq!(writer.finish().expect("finish"), 1);
}

#[test]
fn mjpeg_in_avi_container() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("motion.avi");
    let Some(mut writer) = try_open(
        &output,
        WriterOptions {
            codec: FourCc::MJPG,
            ..options(32, 32)
        },
    ) else {
        return;
    };

    for _ in 0..3 {
        writer
            .write(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
                32,
                32,
                Rgb([10, 200, 30]),
            )))
            .expect("write frame");
    }
    writer.finish().expect("finish");

    let info = VideoProbe::probe(&output).expect("probe");
    assert_eq!(info.codec_name, "mjpeg");
    assert_eq!(info.frame_count, 3);
}

#[test]
fn dropping_an_unfinished_writer_still_produces_a_playable_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("dropped.mp4");
    {
        let Some(mut writer) = try_open(&output, options(32, 32)) else {
            return;
        };
        for _ in 0..2 {
            writer
                .write(&DynamicImage::ImageRgb8(RgbImage::new(32, 32)))
                .expect("write frame");
        }
    }

    assert_eq!(VideoProbe::frame_count(&output).expect("probe"), 2);
}

#[test]
fn finished_writer_with_no_frames() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("empty.mp4");
    let Some(writer) = try_open(&output, options(32, 32)) else {
        return;
    };

    assert_eq!(writer.finish().expect("finish"), 0);
    assert!(output.exists());
    assert_eq!(VideoProbe::frame_count(&output).expect("probe"), 0);
}

//! Benchmarks for frame discovery, resizing and end-to-end assembly.
//!
//! Run with: cargo bench

use std::path::Path;

use criterion::Criterion;
use ffmpeg_next::util::log::Level as LogLevel;
use framestitch::{AssemblyOptions, FrameSize, Interpolation, discover_frames};
use image::{DynamicImage, Rgb, RgbImage};

fn write_frames(dir: &Path, count: u32, size: u32) {
    for index in 0..count {
        let shade = (index * 7 % 256) as u8;
        RgbImage::from_pixel(size, size, Rgb([shade, 255 - shade, 128]))
            .save(dir.join(format!("{index}.png")))
            .unwrap();
    }
}

fn benchmark_discovery(criterion: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), 500, 2);

    criterion.bench_function("discover 500 frames", |bencher| {
        bencher.iter(|| discover_frames(dir.path()).unwrap());
    });
}

fn benchmark_resize(criterion: &mut Criterion) {
    let source = DynamicImage::ImageRgb8(RgbImage::from_fn(100, 100, |x, y| {
        Rgb([x as u8, y as u8, (x ^ y) as u8])
    }));
    let size = FrameSize::default();

    let mut group = criterion.benchmark_group("resize 100x100 -> 400x400");
    for (name, interpolation) in [
        ("nearest-exact", Interpolation::NearestExact),
        ("nearest", Interpolation::Nearest),
        ("triangle", Interpolation::Triangle),
        ("lanczos3", Interpolation::Lanczos3),
    ] {
        group.bench_function(name, |bencher| {
            bencher.iter(|| {
                framestitch::frame::prepare(
                    &source,
                    size,
                    interpolation,
                    framestitch::ColorMode::Color,
                )
            });
        });
    }
    group.finish();
}

fn benchmark_assembly(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), 30, 50);
    let options = AssemblyOptions::new()
        .with_source_dir(dir.path())
        .with_output_path(dir.path().join("bench.mp4"));

    if let Err(error) = framestitch::assemble(&options) {
        eprintln!("Skipping benchmark: {error}");
        return;
    }

    let mut group = criterion.benchmark_group("assembly");
    group.sample_size(10);
    group.bench_function("30 frames at 400x400", |bencher| {
        bencher.iter(|| framestitch::assemble(&options).unwrap());
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_discovery,
    benchmark_resize,
    benchmark_assembly,
);
criterion::criterion_main!(benches);

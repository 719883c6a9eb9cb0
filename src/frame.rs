//! Frame loading: decode, colour-convert and resize one source image.
//!
//! Decoding is delegated to the `image` crate. Resizing defaults to
//! [`Interpolation::NearestExact`], which samples the source pixel under
//! the centre of each destination pixel. Visualization frames are flat
//! colour blocks, and this keeps their edges hard.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, ImageError, ImageReader, Pixel};

use crate::configuration::{ColorMode, FrameSize};
use crate::error::AssemblyError;

/// How a frame is resampled to the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Pixel-centre nearest neighbour: destination pixel `d` reads source
    /// pixel `floor((d + 0.5) * src / dst)`. This is the default.
    #[default]
    NearestExact,
    /// The `image` crate's nearest-neighbour filter.
    Nearest,
    /// Bilinear.
    Triangle,
    /// Bicubic (Catmull-Rom).
    CatmullRom,
    /// Lanczos with window 3.
    Lanczos3,
}

impl Interpolation {
    fn filter_type(self) -> Option<FilterType> {
        match self {
            Interpolation::NearestExact => None,
            Interpolation::Nearest => Some(FilterType::Nearest),
            Interpolation::Triangle => Some(FilterType::Triangle),
            Interpolation::CatmullRom => Some(FilterType::CatmullRom),
            Interpolation::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

/// Decode `path` into an image.
///
/// The format is sniffed from the file contents, not the extension, so a
/// JPEG saved as `3.png` still decodes.
///
/// # Errors
///
/// Returns [`AssemblyError::DecodeError`] if the file cannot be read or is
/// not a decodable image.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<DynamicImage, AssemblyError> {
    let path = path.as_ref();
    let decode_error = |source: ImageError| AssemblyError::DecodeError {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|error| decode_error(ImageError::IoError(error)))?
        .decode()
        .map_err(decode_error)
}

/// Decode `path` and bring it to the writer's size and colour mode.
///
/// The result is `ImageRgb8` for [`ColorMode::Color`] and `ImageLuma8` for
/// [`ColorMode::Grayscale`], exactly `size` pixels.
pub fn load_frame<P: AsRef<Path>>(
    path: P,
    size: FrameSize,
    interpolation: Interpolation,
    color_mode: ColorMode,
) -> Result<DynamicImage, AssemblyError> {
    let image = decode(path)?;
    Ok(prepare(&image, size, interpolation, color_mode))
}

/// Convert `image` to `color_mode` and resize it to exactly `size`.
pub fn prepare(
    image: &DynamicImage,
    size: FrameSize,
    interpolation: Interpolation,
    color_mode: ColorMode,
) -> DynamicImage {
    // Drop channels before resampling so the resize touches less data.
    match color_mode {
        ColorMode::Color => {
            DynamicImage::ImageRgb8(resize_buffer(image.to_rgb8(), size, interpolation))
        }
        ColorMode::Grayscale => {
            DynamicImage::ImageLuma8(resize_buffer(image.to_luma8(), size, interpolation))
        }
    }
}

fn resize_buffer<P>(
    buffer: ImageBuffer<P, Vec<P::Subpixel>>,
    size: FrameSize,
    interpolation: Interpolation,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    if buffer.dimensions() == (size.width, size.height) {
        return buffer;
    }
    match interpolation.filter_type() {
        Some(filter) => imageops::resize(&buffer, size.width, size.height, filter),
        None => resize_nearest_exact(&buffer, size.width, size.height),
    }
}

fn resize_nearest_exact<P: Pixel>(
    source: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (source_width, source_height) = source.dimensions();
    if source_width == 0 || source_height == 0 {
        return ImageBuffer::new(width, height);
    }

    let columns: Vec<u32> = (0..width)
        .map(|x| centre_sample(x, width, source_width))
        .collect();
    let rows: Vec<u32> = (0..height)
        .map(|y| centre_sample(y, height, source_height))
        .collect();

    ImageBuffer::from_fn(width, height, |x, y| {
        *source.get_pixel(columns[x as usize], rows[y as usize])
    })
}

/// Source index under the centre of destination index `dst`.
fn centre_sample(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    let index = ((2 * u64::from(dst) + 1) * u64::from(src_len)) / (2 * u64::from(dst_len));
    (index as u32).min(src_len - 1)
}

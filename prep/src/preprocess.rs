use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader};
use ndarray::{Array3, ArrayD, Axis};

use crate::config::{ColorMode, PixelFormat, PreprocessConfig};
use crate::errors::{PrepError, PrepResult};
use crate::normalization::Normalization;
use crate::tensor::ImageTensor;

/// Decodes the image at `path`, guessing the format from its content.
pub fn decode(path: impl AsRef<Path>) -> PrepResult<DynamicImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PrepError::NotFound { path: path.to_path_buf() });
    }
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| PrepError::Decode { path: path.to_path_buf(), source })?;
    debug!("decoded {path:?}: {:?} {:?}", image.dimensions(), image.color());
    Ok(image)
}

/// The preprocessing pipeline: color conversion, Lanczos resize, element type
/// conversion, normalization and optional batch axis.
pub fn preprocess_image(image: &DynamicImage, config: &PreprocessConfig) -> PrepResult<ImageTensor> {
    config.validate()?;
    let (width, height) = (config.width, config.height);
    let raw = match config.color {
        ColorMode::Rgb => {
            imageops::resize(&image.to_rgb8(), width, height, FilterType::Lanczos3).into_raw()
        }
        ColorMode::Gray => {
            imageops::resize(&image.to_luma8(), width, height, FilterType::Lanczos3).into_raw()
        }
    };
    // grayscale keeps an explicit trailing channel axis of size 1
    let pixels =
        Array3::from_shape_vec((height as usize, width as usize, config.color.channels()), raw)?;

    let tensor = match config.pixel_format {
        PixelFormat::UInt8 => {
            if config.normalization != Normalization::None {
                debug!("u8 target, ignoring {} normalization", config.normalization);
            }
            ImageTensor::UInt8(with_batch(pixels, config.batch))
        }
        PixelFormat::Float32 => {
            let mut floats = pixels.mapv(f32::from);
            config.normalization.apply(&mut floats)?;
            ImageTensor::Float32(with_batch(floats, config.batch))
        }
    };
    debug!("preprocessed to {tensor}");
    Ok(tensor)
}

/// Decodes and preprocesses the image at `path`.
pub fn preprocess_path(path: impl AsRef<Path>, config: &PreprocessConfig) -> PrepResult<ImageTensor> {
    let image = decode(path)?;
    preprocess_image(&image, config)
}

/// RGB, float, batched preprocessing to `target_size` (width, height).
pub fn load_and_preprocess(
    path: impl AsRef<Path>,
    target_size: (u32, u32),
    normalization: Normalization,
) -> PrepResult<ImageTensor> {
    let (width, height) = target_size;
    preprocess_path(path, &PreprocessConfig::rgb(width, height, normalization))
}

/// Preprocessing for models with unusual inputs: 1 or 3 channels, float or u8
/// elements. When `normalize` is set, float values are scaled to `[0,1]`
/// unless they already are.
pub fn preprocess_custom(
    path: impl AsRef<Path>,
    height: u32,
    width: u32,
    channels: usize,
    pixel_format: PixelFormat,
    normalize: bool,
) -> PrepResult<ImageTensor> {
    let config = PreprocessConfig {
        width,
        height,
        color: ColorMode::for_channels(channels)?,
        pixel_format,
        normalization: if normalize { Normalization::ZeroOneIfRaw } else { Normalization::None },
        batch: true,
    };
    preprocess_path(path, &config)
}

fn with_batch<A>(pixels: Array3<A>, batch: bool) -> ArrayD<A> {
    let pixels = pixels.into_dyn();
    if batch { pixels.insert_axis(Axis(0)) } else { pixels }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
        }))
    }

    #[test]
    fn rgb_float_batched() -> PrepResult<()> {
        let config = PreprocessConfig::rgb(224, 224, Normalization::ImageNet);
        let tensor = preprocess_image(&gradient(300, 200), &config)?;
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.as_f32().unwrap().iter().all(|v| v.is_finite()));
        Ok(())
    }

    #[test]
    fn grayscale_keeps_channel_axis() -> PrepResult<()> {
        let config = PreprocessConfig::rgb(7, 5, Normalization::ZeroOneIfRaw)
            .with_color(ColorMode::Gray);
        let tensor = preprocess_image(&gradient(30, 20), &config)?;
        assert_eq!(tensor.shape(), &[1, 5, 7, 1]);
        Ok(())
    }

    #[test]
    fn gray_source_to_rgb() -> PrepResult<()> {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([200])));
        let config = PreprocessConfig::rgb(4, 4, Normalization::None)
            .with_pixel_format(PixelFormat::UInt8);
        let tensor = preprocess_image(&gray, &config)?;
        assert_eq!(tensor.shape(), &[1, 4, 4, 3]);
        assert!(tensor.as_u8().unwrap().iter().all(|&v| v == 200));
        Ok(())
    }

    #[test]
    fn alpha_is_dropped() -> PrepResult<()> {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, image::Rgba([255, 0, 0, 10])));
        let config = PreprocessConfig::rgb(3, 3, Normalization::ZeroOne);
        let tensor = preprocess_image(&rgba, &config)?;
        assert_eq!(tensor.shape(), &[1, 3, 3, 3]);
        Ok(())
    }

    #[test]
    fn unbatched() -> PrepResult<()> {
        let config = PreprocessConfig::rgb(10, 12, Normalization::MinusOneOne).with_batch(false);
        let tensor = preprocess_image(&gradient(10, 10), &config)?;
        assert_eq!(tensor.shape(), &[12, 10, 3]);
        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = decode("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, PrepError::NotFound { .. }));
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}

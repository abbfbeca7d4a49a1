//! Photometric and geometric variants of an image, for checking how stable a
//! model's predictions are. This generates test data, nothing more.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, imageops};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::errors::{PrepError, PrepResult};
use crate::preprocess::decode;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// The variants, in the order `augment_image` produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Original,
    Bright,
    Dark,
    HighContrast,
    LowContrast,
    Rotated10,
    Flipped,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Original,
        Variant::Bright,
        Variant::Dark,
        Variant::HighContrast,
        Variant::LowContrast,
        Variant::Rotated10,
        Variant::Flipped,
    ];

    /// Suffix used in the output file name.
    pub fn tag(&self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Bright => "bright",
            Variant::Dark => "dark",
            Variant::HighContrast => "high_contrast",
            Variant::LowContrast => "low_contrast",
            Variant::Rotated10 => "rotated_10",
            Variant::Flipped => "flipped",
        }
    }

    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        match self {
            Variant::Original => image.clone(),
            Variant::Bright => brightness(image, 1.3),
            Variant::Dark => brightness(image, 0.7),
            Variant::HighContrast => contrast(image, 1.3),
            Variant::LowContrast => contrast(image, 0.7),
            Variant::Rotated10 => rotate_expanded(image, 10.0, WHITE),
            Variant::Flipped => imageops::flip_horizontal(image),
        }
    }
}

/// Writes the first `count` variants of the image at `path` to `output_dir`
/// (created if needed) as `{stem}_{tag}.jpg`. Returns the written paths, in
/// variant order.
pub fn augment_image(
    path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    count: usize,
) -> PrepResult<Vec<PathBuf>> {
    let (path, output_dir) = (path.as_ref(), output_dir.as_ref());
    let source = decode(path)?.to_rgb8();
    fs::create_dir_all(output_dir)?;
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

    let mut saved = Vec::with_capacity(count.min(Variant::ALL.len()));
    for variant in Variant::ALL.iter().take(count) {
        let target = output_dir.join(format!("{stem}_{}.jpg", variant.tag()));
        variant
            .apply(&source)
            .save(&target)
            .map_err(|source| PrepError::Save { path: target.clone(), source })?;
        info!("saved {target:?}");
        saved.push(target);
    }
    Ok(saved)
}

/// Blend toward black: every sample is multiplied by `factor`.
fn brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for sample in out.iter_mut() {
        *sample = clamp_u8(*sample as f32 * factor);
    }
    out
}

/// Blend toward the mean grey level of the image.
fn contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let luma = imageops::grayscale(image);
    let total: u64 = luma.iter().map(|&v| v as u64).sum();
    let mean = (total as f32 / luma.len().max(1) as f32 + 0.5).floor();
    let mut out = image.clone();
    for sample in out.iter_mut() {
        *sample = clamp_u8(mean + factor * (*sample as f32 - mean));
    }
    out
}

/// Counter-clockwise rotation by `degrees`, on a canvas grown to fit the
/// rotated image. Uncovered areas get `fill`.
fn rotate_expanded(image: &RgbImage, degrees: f32, fill: Rgb<u8>) -> RgbImage {
    let (width, height) = image.dimensions();
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let out_width = ((width as f32 * cos + height as f32 * sin).ceil() as u32).max(width);
    let out_height = ((width as f32 * sin + height as f32 * cos).ceil() as u32).max(height);

    let mut canvas = RgbImage::from_pixel(out_width, out_height, fill);
    imageops::replace(
        &mut canvas,
        image,
        ((out_width - width) / 2) as i64,
        ((out_height - height) / 2) as i64,
    );
    // imageproc turns clockwise
    rotate_about_center(&canvas, -theta, Interpolation::Bilinear, fill)
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

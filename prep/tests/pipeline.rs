use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use proptest::prelude::*;
use tempfile::TempDir;
use tfl_probe_prep::augment::{Variant, augment_image};
use tfl_probe_prep::presets::{
    preprocess_for_efficientnet, preprocess_for_mobilenet, preprocess_for_resnet,
};
use tfl_probe_prep::*;

fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

#[test]
fn imagenet_end_to_end() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let path = write_image(dir.path(), "input.png", 300, 200);
    let tensor = load_and_preprocess(&path, (224, 224), Normalization::ImageNet)?;
    assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    assert_eq!(tensor.pixel_format(), PixelFormat::Float32);
    assert!(tensor.as_f32().unwrap().iter().all(|v| v.is_finite()));
    Ok(())
}

#[test]
fn mobilenet_preset_range() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let path = write_image(dir.path(), "input.jpg", 64, 48);
    let tensor = preprocess_for_mobilenet(&path, Preset::DEFAULT_INPUT_SIZE)?;
    assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    let (lo, hi) = tensor.value_range().unwrap();
    assert!(lo >= -1.0 && hi <= 1.0);
    Ok(())
}

#[test]
fn imagenet_presets_agree() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let path = write_image(dir.path(), "input.png", 90, 60);
    let efficientnet = preprocess_for_efficientnet(&path, 96)?;
    let resnet = preprocess_for_resnet(&path, 96)?;
    assert_eq!(efficientnet.shape(), &[1, 96, 96, 3]);
    assert_eq!(efficientnet, resnet);
    let (lo, _) = resnet.value_range().unwrap();
    assert!(lo < -2.0);
    Ok(())
}

#[test]
fn custom_grayscale() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let path = write_image(dir.path(), "input.png", 50, 40);
    let tensor = preprocess_custom(&path, 28, 28, 1, PixelFormat::Float32, true)?;
    assert_eq!(tensor.shape(), &[1, 28, 28, 1]);
    let (lo, hi) = tensor.value_range().unwrap();
    assert!(lo >= 0.0 && hi <= 1.0);

    let raw = preprocess_custom(&path, 28, 28, 1, PixelFormat::Float32, false)?;
    assert!(raw.value_range().unwrap().1 > 1.0);

    let bytes = preprocess_custom(&path, 28, 14, 3, PixelFormat::UInt8, true)?;
    assert_eq!(bytes.shape(), &[1, 28, 14, 3]);
    assert!(bytes.as_u8().is_some());
    Ok(())
}

#[test]
fn not_an_image() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("noise.png");
    std::fs::write(&path, b"definitely not a png")?;
    let err = load_and_preprocess(&path, (8, 8), Normalization::ZeroOne).unwrap_err();
    assert!(matches!(err, PrepError::Decode { .. }), "{err:?}");
    Ok(())
}

#[test]
fn missing_image() {
    let err = load_and_preprocess("missing/cat.jpg", (8, 8), Normalization::ZeroOne).unwrap_err();
    assert!(matches!(err, PrepError::NotFound { .. }));
}

#[test]
fn augmentation_counts() -> PrepResult<()> {
    let dir = TempDir::new()?;
    let source = write_image(dir.path(), "cat.png", 32, 24);
    for requested in [0, 1, 3, 7, 10] {
        let out = dir.path().join(format!("aug_{requested}"));
        let written = augment_image(&source, &out, requested)?;
        assert_eq!(written.len(), requested.min(7));
        assert_eq!(std::fs::read_dir(&out)?.count(), requested.min(7));
        for (path, variant) in written.iter().zip(Variant::ALL) {
            let name = path.file_name().unwrap().to_string_lossy();
            assert_eq!(name, format!("cat_{}.jpg", variant.tag()));
            decode(path)?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn resize_is_shape_exact(
        src_w in 1u32..40, src_h in 1u32..40,
        width in 1u32..40, height in 1u32..40,
        gray in any::<bool>(),
    ) {
        let image = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(src_w, src_h, Rgb([10, 20, 30])));
        let color = if gray { ColorMode::Gray } else { ColorMode::Rgb };
        let config = PreprocessConfig::rgb(width, height, Normalization::ZeroOne).with_color(color);
        let tensor = preprocess_image(&image, &config).unwrap();
        prop_assert_eq!(
            tensor.shape(),
            &[1, height as usize, width as usize, color.channels()][..]
        );
    }
}

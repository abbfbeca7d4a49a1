use std::fmt;

use crate::errors::{PrepError, PrepResult};
use crate::normalization::Normalization;

/// Element type of a preprocessed tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit floats, normalized according to the configured `Normalization`.
    Float32,
    /// Raw 8-bit values in `[0,255]`. Normalization never applies.
    UInt8,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Float32 => write!(f, "f32"),
            PixelFormat::UInt8 => write!(f, "u8"),
        }
    }
}

/// Color representation of the preprocessed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Gray,
    Rgb,
}

impl ColorMode {
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Gray => 1,
            ColorMode::Rgb => 3,
        }
    }

    pub fn for_channels(channels: usize) -> PrepResult<ColorMode> {
        match channels {
            1 => Ok(ColorMode::Gray),
            3 => Ok(ColorMode::Rgb),
            n => Err(PrepError::InvalidConfig(format!("unsupported channel count {n}"))),
        }
    }
}

/// Everything the preprocessing pipeline needs to know. Every call site spells
/// it out: there is no implicit target size or normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub width: u32,
    pub height: u32,
    pub color: ColorMode,
    pub pixel_format: PixelFormat,
    pub normalization: Normalization,
    /// Prepend a batch axis of size 1.
    pub batch: bool,
}

impl PreprocessConfig {
    /// Batched RGB float tensor, the usual classification model input.
    pub fn rgb(width: u32, height: u32, normalization: Normalization) -> PreprocessConfig {
        PreprocessConfig {
            width,
            height,
            color: ColorMode::Rgb,
            pixel_format: PixelFormat::Float32,
            normalization,
            batch: true,
        }
    }

    pub fn with_color(self, color: ColorMode) -> PreprocessConfig {
        PreprocessConfig { color, ..self }
    }

    pub fn with_pixel_format(self, pixel_format: PixelFormat) -> PreprocessConfig {
        PreprocessConfig { pixel_format, ..self }
    }

    pub fn with_batch(self, batch: bool) -> PreprocessConfig {
        PreprocessConfig { batch, ..self }
    }

    /// Normalization that will actually run, once the pixel format is accounted for.
    pub fn effective_normalization(&self) -> Normalization {
        match self.pixel_format {
            PixelFormat::Float32 => self.normalization,
            PixelFormat::UInt8 => Normalization::None,
        }
    }

    /// Shape of the produced tensor, channels last.
    pub fn output_shape(&self) -> Vec<usize> {
        let mut shape = vec![self.height as usize, self.width as usize, self.color.channels()];
        if self.batch {
            shape.insert(0, 1);
        }
        shape
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PrepError::InvalidConfig(format!(
                "target size must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.effective_normalization() == Normalization::ImageNet && self.color != ColorMode::Rgb
        {
            return Err(PrepError::InvalidConfig(
                "imagenet normalization needs an RGB target".to_string(),
            ));
        }
        Ok(())
    }
}

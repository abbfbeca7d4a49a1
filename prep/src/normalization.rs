use std::fmt;
use std::str::FromStr;

use ndarray::{Array, Axis, Dimension, RemoveAxis};

use crate::errors::{PrepError, PrepResult};

/// Per-channel mean of the ImageNet training set, for pixels scaled to `[0,1]`.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation of the ImageNet training set.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Arithmetic mapping raw `[0,255]` pixel values to the range a model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalization {
    /// Scale to `[0,1]`, then subtract `IMAGENET_MEAN` and divide by `IMAGENET_STD`.
    ImageNet,
    /// Scale to `[0,1]`.
    ZeroOne,
    /// Scale to `[0,1]`, then shift and stretch to `[-1,1]`.
    MinusOneOne,
    /// Keep raw pixel values.
    None,
    /// Scale to `[0,1]` only when some value exceeds 1.0. Applying it twice is a no-op.
    ZeroOneIfRaw,
}

impl Normalization {
    pub const ALL: [Normalization; 5] = [
        Normalization::ImageNet,
        Normalization::ZeroOne,
        Normalization::MinusOneOne,
        Normalization::None,
        Normalization::ZeroOneIfRaw,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Normalization::ImageNet => "imagenet",
            Normalization::ZeroOne => "zero_one",
            Normalization::MinusOneOne => "minus_one_one",
            Normalization::None => "none",
            Normalization::ZeroOneIfRaw => "auto",
        }
    }

    /// Normalizes `pixels` in place. The last axis is the channel axis.
    ///
    /// For `ImageNet`, scaling to `[0,1]` is its own pass and must run before
    /// the mean/std pass.
    pub fn apply<D: Dimension + RemoveAxis>(&self, pixels: &mut Array<f32, D>) -> PrepResult<()> {
        match self {
            Normalization::ImageNet => {
                let channel_axis = channel_axis(pixels)?;
                let channels = pixels.len_of(channel_axis);
                if channels != IMAGENET_MEAN.len() {
                    return Err(PrepError::InvalidConfig(format!(
                        "imagenet normalization needs 3 channels, got {channels}"
                    )));
                }
                pixels.mapv_inplace(|v| v / 255.0);
                for (c, mut channel) in pixels.axis_iter_mut(channel_axis).enumerate() {
                    let (mean, std) = (IMAGENET_MEAN[c], IMAGENET_STD[c]);
                    channel.mapv_inplace(|v| (v - mean) / std);
                }
            }
            Normalization::ZeroOne => pixels.mapv_inplace(|v| v / 255.0),
            Normalization::MinusOneOne => pixels.mapv_inplace(|v| (v / 255.0 - 0.5) * 2.0),
            Normalization::None => (),
            Normalization::ZeroOneIfRaw => {
                if max_value(pixels) > 1.0 {
                    pixels.mapv_inplace(|v| v / 255.0);
                } else {
                    debug!("values already within [0,1], skipping scaling");
                }
            }
        }
        Ok(())
    }
}

fn channel_axis<D: Dimension>(pixels: &Array<f32, D>) -> PrepResult<Axis> {
    match pixels.ndim() {
        0 => Err(PrepError::InvalidConfig("cannot normalize a scalar".to_string())),
        n => Ok(Axis(n - 1)),
    }
}

pub(crate) fn max_value<D: Dimension>(pixels: &Array<f32, D>) -> f32 {
    pixels.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Normalization {
    type Err = PrepError;

    fn from_str(s: &str) -> PrepResult<Normalization> {
        Normalization::ALL.into_iter().find(|n| n.name() == s).ok_or_else(|| {
            PrepError::InvalidConfig(format!(
                "unknown normalization `{s}', expected one of {}",
                Normalization::ALL.map(|n| n.name()).join(", ")
            ))
        })
    }
}

use std::fmt;

use ndarray::ArrayD;

use crate::config::PixelFormat;

/// Preprocessed image, channels last: `[1, height, width, channels]` when
/// batched, `[height, width, channels]` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageTensor {
    Float32(ArrayD<f32>),
    UInt8(ArrayD<u8>),
}

impl ImageTensor {
    pub fn shape(&self) -> &[usize] {
        match self {
            ImageTensor::Float32(a) => a.shape(),
            ImageTensor::UInt8(a) => a.shape(),
        }
    }

    pub fn pixel_format(&self) -> PixelFormat {
        match self {
            ImageTensor::Float32(_) => PixelFormat::Float32,
            ImageTensor::UInt8(_) => PixelFormat::UInt8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ImageTensor::Float32(a) => a.len(),
            ImageTensor::UInt8(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            ImageTensor::Float32(a) => Some(a),
            ImageTensor::UInt8(_) => None,
        }
    }

    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            ImageTensor::UInt8(a) => Some(a),
            ImageTensor::Float32(_) => None,
        }
    }

    /// Smallest and largest value, as floats. `None` for an empty tensor.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let fold = |(lo, hi): (f32, f32), v: f32| (lo.min(v), hi.max(v));
        let init = (f32::INFINITY, f32::NEG_INFINITY);
        if self.is_empty() {
            return None;
        }
        Some(match self {
            ImageTensor::Float32(a) => a.iter().copied().fold(init, fold),
            ImageTensor::UInt8(a) => a.iter().map(|&v| v as f32).fold(init, fold),
        })
    }
}

impl fmt::Display for ImageTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.shape(), self.pixel_format())?;
        if let Some((lo, hi)) = self.value_range() {
            write!(f, " in [{lo:.3}, {hi:.3}]")?;
        }
        Ok(())
    }
}

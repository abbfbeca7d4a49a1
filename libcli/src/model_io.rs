use std::fmt;

use tfl_probe_prep::{ColorMode, Normalization, PixelFormat, PreprocessConfig};
use tract_core::prelude::*;

use crate::errors::{ProbeError, ProbeResult};

/// Shape and element type of a model input or output. Unknown (symbolic)
/// dimensions are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIoSpec {
    pub dims: Vec<Option<usize>>,
    pub datum_type: DatumType,
}

/// Spatial layout a model input expects, channels last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InputGeometry {
    pub height: u32,
    pub width: u32,
    pub color: ColorMode,
    pub batched: bool,
}

impl ModelIoSpec {
    pub fn new(shape: &[usize], datum_type: DatumType) -> ModelIoSpec {
        ModelIoSpec { dims: shape.iter().map(|&d| Some(d)).collect(), datum_type }
    }

    pub fn from_fact(fact: &TypedFact) -> ModelIoSpec {
        ModelIoSpec {
            dims: fact.shape.iter().map(|d| d.to_i64().ok().and_then(|d| usize::try_from(d).ok())).collect(),
            datum_type: fact.datum_type,
        }
    }

    /// Concrete shape, if every dimension is known.
    pub fn shape(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }

    /// Reads height, width and channels from a `[h, w, c]` or `[n, h, w, c]` shape.
    pub(crate) fn geometry(&self) -> ProbeResult<InputGeometry> {
        let unsupported = || ProbeError::UnsupportedShape { shape: self.shape_string() };
        let shape = self.shape().ok_or_else(unsupported)?;
        let (batched, height, width, channels) = match *shape.as_slice() {
            [_, h, w, c] => (true, h, w, c),
            [h, w, c] => (false, h, w, c),
            _ => return Err(unsupported()),
        };
        let color = ColorMode::for_channels(channels).map_err(|_| unsupported())?;
        let height = u32::try_from(height).map_err(|_| unsupported())?;
        let width = u32::try_from(width).map_err(|_| unsupported())?;
        if height == 0 || width == 0 {
            return Err(unsupported());
        }
        Ok(InputGeometry { height, width, color, batched })
    }

    /// u8 inputs take raw pixels, floating point inputs take normalized floats.
    pub fn pixel_format(&self) -> ProbeResult<PixelFormat> {
        match self.datum_type.unquantized() {
            DatumType::U8 => Ok(PixelFormat::UInt8),
            dt if dt.is_float() => Ok(PixelFormat::Float32),
            _ => Err(ProbeError::UnsupportedDatumType(format!("{:?}", self.datum_type))),
        }
    }

    /// Preprocessing matching this input. `normalization` only applies to float inputs.
    pub fn preprocess_config(&self, normalization: Normalization) -> ProbeResult<PreprocessConfig> {
        let geometry = self.geometry()?;
        Ok(PreprocessConfig {
            width: geometry.width,
            height: geometry.height,
            color: geometry.color,
            pixel_format: self.pixel_format()?,
            normalization,
            batch: geometry.batched,
        })
    }

    fn shape_string(&self) -> String {
        let dims: Vec<String> = self
            .dims
            .iter()
            .map(|d| d.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string()))
            .collect();
        format!("[{}]", dims.join(", "))
    }
}

impl fmt::Display for ModelIoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.shape_string(), self.datum_type)
    }
}

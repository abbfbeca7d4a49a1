use std::path::Path;

use tfl_probe_prep::{ImageTensor, Normalization, PreprocessConfig, preprocess_path};
use tract_core::prelude::*;

use crate::engine::Engine;
use crate::errors::{ProbeError, ProbeResult};
use crate::labels::Labels;
use crate::model_io::ModelIoSpec;
use crate::report::{RawOutput, Report, interpret};

/// How images are fed to the model and how its output is reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeConfig {
    /// Applied to floating point inputs only. u8 inputs always get raw pixels.
    pub normalization: Normalization,
    pub top_k: usize,
}

impl ProbeConfig {
    pub const DEFAULT_TOP_K: usize = 5;

    pub fn new(normalization: Normalization, top_k: usize) -> ProbeConfig {
        ProbeConfig { normalization, top_k }
    }
}

/// Everything a run produced, stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub input: ImageTensor,
    pub output: RawOutput,
    pub report: Report,
}

/// Runs one engine through images. The input geometry and element type come
/// from the model, never from the caller.
#[derive(Debug)]
pub struct Driver<'e, E: Engine + ?Sized> {
    engine: &'e E,
    config: ProbeConfig,
}

impl<'e, E: Engine + ?Sized> Driver<'e, E> {
    pub fn new(engine: &'e E, config: ProbeConfig) -> Driver<'e, E> {
        Driver { engine, config }
    }

    pub fn input_spec(&self) -> ProbeResult<&'e ModelIoSpec> {
        self.engine
            .input_specs()
            .first()
            .ok_or_else(|| ProbeError::UnsupportedShape { shape: "[] (model has no input)".to_string() })
    }

    pub fn preprocess_config(&self) -> ProbeResult<PreprocessConfig> {
        self.input_spec()?.preprocess_config(self.config.normalization)
    }

    /// Decodes and preprocesses `image` the way the model input wants it.
    pub fn prepare(&self, image: impl AsRef<Path>) -> ProbeResult<ImageTensor> {
        let config = self.preprocess_config()?;
        debug!("preprocessing {:?} with {config:?}", image.as_ref());
        let input = preprocess_path(image, &config)?;
        info!("input ready: {input}");
        Ok(input)
    }

    /// Feeds a prepared input to the engine and copies out its first output.
    pub fn infer(&self, input: &ImageTensor) -> ProbeResult<RawOutput> {
        let tensor = to_tract_tensor(input, self.input_spec()?)?;
        let output = self.engine.invoke(tensor)?;
        let output = RawOutput::from_tensor(&output)?;
        info!("inference done, output shape {:?}", output.shape());
        Ok(output)
    }

    pub fn report(&self, output: &RawOutput, labels: Option<&Labels>) -> Report {
        interpret(output, labels, self.config.top_k)
    }

    pub fn run(&self, image: impl AsRef<Path>, labels: Option<&Labels>) -> ProbeResult<Probe> {
        let input = self.prepare(image)?;
        let output = self.infer(&input)?;
        let report = self.report(&output, labels);
        Ok(Probe { input, output, report })
    }
}

/// Builds the tensor bound to the model input. Raw pixels are reinterpreted
/// with the input's quantization parameters, floats are cast to the input's
/// float type.
pub fn to_tract_tensor(input: &ImageTensor, spec: &ModelIoSpec) -> ProbeResult<Tensor> {
    let shape = input.shape().to_vec();
    let tensor = match input {
        ImageTensor::UInt8(pixels) => {
            let data = pixels.iter().copied().collect::<Vec<u8>>();
            let mut tensor = Tensor::from_shape(&shape, &data).map_err(|source| ProbeError::Inference { source })?;
            if spec.datum_type.unquantized() == DatumType::U8 && spec.datum_type != DatumType::U8 {
                unsafe { tensor.set_datum_type(spec.datum_type) };
            }
            tensor
        }
        ImageTensor::Float32(values) => {
            let data = values.iter().copied().collect::<Vec<f32>>();
            let tensor = Tensor::from_shape(&shape, &data).map_err(|source| ProbeError::Inference { source })?;
            if spec.datum_type.is_float() && spec.datum_type != DatumType::F32 {
                tensor
                    .cast_to_dt(spec.datum_type)
                    .map_err(|source| ProbeError::Inference { source })?
                    .into_owned()
            } else {
                tensor
            }
        }
    };
    debug!("bound input {:?} {:?}", tensor.shape(), tensor.datum_type());
    Ok(tensor)
}

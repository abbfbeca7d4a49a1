use std::fmt;
use std::path::Path;

use tract_tflite::prelude::*;

use crate::errors::{ProbeError, ProbeResult};
use crate::model_io::ModelIoSpec;

/// A loaded model, ready to run.
pub trait Engine {
    /// Metadata of the model inputs, in model order.
    fn input_specs(&self) -> &[ModelIoSpec];

    /// Metadata of the model outputs, in model order.
    fn output_specs(&self) -> &[ModelIoSpec];

    /// Binds `input` to the first input slot, runs the model and returns the
    /// first output.
    fn invoke(&self, input: Tensor) -> ProbeResult<Tensor>;
}

type Plan = Box<dyn Fn(TVec<TValue>) -> TractResult<TVec<TValue>>>;

/// tract running a TensorFlow Lite model. The execution plan and its buffers
/// live as long as this value.
pub struct TfliteEngine {
    inputs: Vec<ModelIoSpec>,
    outputs: Vec<ModelIoSpec>,
    plan: Plan,
}

impl TfliteEngine {
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<TfliteEngine> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProbeError::ModelNotFound { path: path.to_path_buf() });
        }
        info!("loading model {path:?}");
        tract_tflite::tflite()
            .model_for_path(path)
            .and_then(TfliteEngine::from_typed_model)
            .map_err(|source| ProbeError::ModelLoad { path: path.to_path_buf(), source })
    }

    /// Optimizes `model` and makes it runnable.
    pub fn from_typed_model(model: TypedModel) -> TractResult<TfliteEngine> {
        let inputs = (0..model.inputs.len())
            .map(|ix| Ok(ModelIoSpec::from_fact(model.input_fact(ix)?)))
            .collect::<TractResult<Vec<_>>>()?;
        let outputs = (0..model.outputs.len())
            .map(|ix| Ok(ModelIoSpec::from_fact(model.output_fact(ix)?)))
            .collect::<TractResult<Vec<_>>>()?;
        debug!("model inputs: {inputs:?}, outputs: {outputs:?}");
        let plan = model.into_optimized()?.into_runnable()?;
        Ok(TfliteEngine { inputs, outputs, plan: Box::new(move |values| plan.run(values)) })
    }
}

impl Engine for TfliteEngine {
    fn input_specs(&self) -> &[ModelIoSpec] {
        &self.inputs
    }

    fn output_specs(&self) -> &[ModelIoSpec] {
        &self.outputs
    }

    fn invoke(&self, input: Tensor) -> ProbeResult<Tensor> {
        if self.inputs.len() > 1 {
            warn!("model has {} inputs, only the first one is fed", self.inputs.len());
        }
        let mut outputs = (self.plan)(tvec!(input.into()))
            .map_err(|source| ProbeError::Inference { source })?;
        if outputs.is_empty() {
            return Err(ProbeError::Inference { source: anyhow::anyhow!("model produced no output") });
        }
        Ok(outputs.remove(0).into_tensor())
    }
}

impl fmt::Debug for TfliteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfliteEngine")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

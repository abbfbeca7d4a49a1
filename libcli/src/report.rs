use std::fmt;
use std::path::Path;

use ndarray::{ArrayD, Axis, IxDyn};
use tract_core::prelude::*;

use crate::errors::{ProbeError, ProbeResult};
use crate::labels::{Labels, label_for};

/// First model output, copied out of the engine, in its own element type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    U8(ArrayD<u8>),
    I8(ArrayD<i8>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
}

macro_rules! for_each_output {
    ($output: expr, $a: ident => $body: expr) => {
        match $output {
            RawOutput::F32($a) => $body,
            RawOutput::F64($a) => $body,
            RawOutput::U8($a) => $body,
            RawOutput::I8($a) => $body,
            RawOutput::I32($a) => $body,
            RawOutput::I64($a) => $body,
        }
    };
}

fn copy_out<T: Datum + Copy>(tensor: &Tensor) -> ProbeResult<ArrayD<T>> {
    let data = tensor.as_slice::<T>().map_err(|source| ProbeError::Inference { source })?;
    Ok(ArrayD::from_shape_vec(IxDyn(tensor.shape()), data.to_vec())?)
}

impl RawOutput {
    /// Quantized 8-bit outputs keep their integer values. Element types `.npy`
    /// can not hold as-is (f16, bool, ...) are cast to f32.
    pub fn from_tensor(tensor: &Tensor) -> ProbeResult<RawOutput> {
        Ok(match tensor.datum_type().unquantized() {
            DatumType::F32 => RawOutput::F32(copy_out(tensor)?),
            DatumType::F64 => RawOutput::F64(copy_out(tensor)?),
            DatumType::U8 => RawOutput::U8(copy_out(tensor)?),
            DatumType::I8 => RawOutput::I8(copy_out(tensor)?),
            DatumType::I32 => RawOutput::I32(copy_out(tensor)?),
            DatumType::I64 => RawOutput::I64(copy_out(tensor)?),
            dt => {
                warn!("output element type {dt:?} is reported and saved as f32");
                let floats =
                    tensor.cast_to::<f32>().map_err(|source| ProbeError::Inference { source })?;
                RawOutput::F32(copy_out(&floats)?)
            }
        })
    }

    pub fn shape(&self) -> &[usize] {
        for_each_output!(self, a => a.shape())
    }

    pub fn element_type(&self) -> &'static str {
        match self {
            RawOutput::F32(_) => "f32",
            RawOutput::F64(_) => "f64",
            RawOutput::U8(_) => "u8",
            RawOutput::I8(_) => "i8",
            RawOutput::I32(_) => "i32",
            RawOutput::I64(_) => "i64",
        }
    }

    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            RawOutput::F32(a) => a.clone(),
            RawOutput::F64(a) => a.mapv(|v| v as f32),
            RawOutput::U8(a) => a.mapv(f32::from),
            RawOutput::I8(a) => a.mapv(f32::from),
            RawOutput::I32(a) => a.mapv(|v| v as f32),
            RawOutput::I64(a) => a.mapv(|v| v as f32),
        }
    }

    /// Saves the array, in its own element type, as `.npy`.
    pub fn write_npy(&self, path: impl AsRef<Path>) -> ProbeResult<()> {
        let path = path.as_ref();
        for_each_output!(self, a => ndarray_npy::write_npy(path, a)?);
        info!("raw output saved to {path:?}");
        Ok(())
    }
}

/// Indices of the `k` largest scores, best first. Equal scores keep their
/// original order, lower index first.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indices.truncate(k);
    indices
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std: f32,
}

impl Stats {
    /// Population statistics. All NaN for an empty array.
    pub fn of(values: &ArrayD<f32>) -> Stats {
        if values.is_empty() {
            return Stats { min: f32::NAN, max: f32::NAN, mean: f32::NAN, std: f32::NAN };
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        Stats { min, max, mean: mean as f32, std: var.sqrt() as f32 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

impl Prediction {
    /// `score × 100`. No softmax: only meaningful for models that already
    /// output probabilities.
    pub fn percent(&self) -> f32 {
        self.score * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// 1-D scores (after dropping a leading batch axis of 1).
    Classification { predictions: Vec<Prediction> },
    /// Anything else. `detection_rows` is set for 2-D outputs with more than
    /// 4 columns, which often are per-object boxes and scores. It is only a hint.
    Tensor { shape: Vec<usize>, stats: Stats, detection_rows: Option<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub shape: Vec<usize>,
    pub element_type: &'static str,
    pub labels_loaded: Option<usize>,
    pub interpretation: Interpretation,
}

/// Interprets the first model output. Classification reports the `top` best
/// scores, labelled from `labels`.
pub fn interpret(output: &RawOutput, labels: Option<&Labels>, top: usize) -> Report {
    let mut values = output.to_f32();
    if values.ndim() > 1 && values.shape()[0] == 1 {
        values = values.index_axis_move(Axis(0), 0);
    }
    let interpretation = if values.ndim() == 1 {
        let scores = values.iter().copied().collect::<Vec<f32>>();
        let predictions = top_k(&scores, top)
            .into_iter()
            .map(|index| Prediction { index, label: label_for(labels, index), score: scores[index] })
            .collect();
        Interpretation::Classification { predictions }
    } else {
        let detection_rows =
            (values.ndim() == 2 && values.shape()[1] > 4).then(|| values.shape()[0]);
        Interpretation::Tensor { shape: values.shape().to_vec(), stats: Stats::of(&values), detection_rows }
    };
    Report {
        shape: output.shape().to_vec(),
        element_type: output.element_type(),
        labels_loaded: labels.map(|l| l.len()),
        interpretation,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model output:")?;
        writeln!(f, "   Shape: {:?}", self.shape)?;
        writeln!(f, "   Dtype: {}", self.element_type)?;
        if let Some(n) = self.labels_loaded {
            writeln!(f, "   Loaded {n} class labels")?;
        }
        match &self.interpretation {
            Interpretation::Classification { predictions } => {
                writeln!(f, "   Classification scores (top {}):", predictions.len())?;
                for (rank, p) in predictions.iter().enumerate() {
                    writeln!(
                        f,
                        "   {}. {}: {:.4} ({:.1}%)",
                        rank + 1,
                        p.label,
                        p.score,
                        p.percent()
                    )?;
                }
            }
            Interpretation::Tensor { shape, stats, detection_rows } => {
                writeln!(f, "   Raw output shape: {shape:?}")?;
                writeln!(f, "   Value range: [{:.4}, {:.4}]", stats.min, stats.max)?;
                writeln!(f, "   Mean: {:.4}, Std: {:.4}", stats.mean, stats.std)?;
                if let Some(rows) = detection_rows {
                    writeln!(f, "   Looks like object detection output (boxes + scores + classes)")?;
                    writeln!(f, "   Detected {rows} potential objects")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, array};

    #[test]
    fn top_k_unique_max() {
        let scores = [0.05, 0.1, 0.02, 0.4, 0.03, 0.08, 0.2, 0.01, 0.06, 0.05];
        assert_eq!(top_k(&scores, 5), vec![3, 6, 1, 5, 8]);
        assert_eq!(top_k(&scores, 1), vec![3]);
    }

    #[test]
    fn top_k_ties_keep_index_order() {
        let scores = [0.1, 0.3, 0.3, 0.0, 0.3, 0.1, 0.2, 0.3, 0.0, 0.0];
        assert_eq!(top_k(&scores, 5), vec![1, 2, 4, 7, 6]);
        assert_eq!(top_k(&scores, 20).len(), 10);
    }

    #[test]
    fn classification_report() {
        let mut scores = Array::linspace(0.0f32, 0.09, 10);
        scores[4] = 0.9;
        let output = RawOutput::F32(scores.into_shape_with_order((1, 10)).unwrap().into_dyn());
        let labels = Labels::new((0..8).map(|i| format!("label{i}")).collect());
        let report = interpret(&output, Some(&labels), 5);
        assert_eq!(report.shape, vec![1, 10]);
        let Interpretation::Classification { predictions } = &report.interpretation else {
            panic!("expected classification, got {report:?}")
        };
        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions[0].index, 4);
        assert_eq!(predictions[0].score, 0.9);
        assert_eq!(predictions[0].label, "label4");
        assert_eq!(predictions.iter().map(|p| p.index).collect::<Vec<_>>(), vec![4, 9, 8, 7, 6]);
        assert_eq!(predictions[1].label, "Class 9");
        let text = report.to_string();
        assert!(text.contains("1. label4: 0.9000 (90.0%)"), "{text}");
        assert!(text.contains("Loaded 8 class labels"));
    }

    #[test]
    fn detection_like_report() {
        let output = RawOutput::F32(Array::from_elem((1, 3, 6), 0.5f32).into_dyn());
        let report = interpret(&output, None, 5);
        let Interpretation::Tensor { shape, stats, detection_rows } = &report.interpretation else {
            panic!("expected raw tensor report")
        };
        assert_eq!(shape, &vec![3, 6]);
        assert_eq!(*detection_rows, Some(3));
        assert_eq!(stats.mean, 0.5);
        assert_eq!(stats.std, 0.0);
        assert!(report.to_string().contains("Detected 3 potential objects"));
    }

    #[test]
    fn segmentation_like_report() {
        let output = RawOutput::U8(array![[[0u8, 255], [0, 255]]].into_dyn());
        let report = interpret(&output, None, 5);
        let Interpretation::Tensor { stats, detection_rows, .. } = &report.interpretation else {
            panic!("expected raw tensor report")
        };
        assert_eq!(*detection_rows, None);
        assert_eq!((stats.min, stats.max), (0.0, 255.0));
        assert_abs_diff_eq!(stats.mean, 127.5);
        assert_abs_diff_eq!(stats.std, 127.5);
        assert_eq!(report.element_type, "u8");
    }

    #[test]
    fn quantized_output_keeps_integers() -> ProbeResult<()> {
        let mut tensor = Tensor::from_shape(&[1, 3], &[3u8, 200, 7]).unwrap();
        unsafe { tensor.set_datum_type(u8::datum_type().with_zp_scale(0, 0.00390625)) };
        let output = RawOutput::from_tensor(&tensor)?;
        assert_eq!(output, RawOutput::U8(array![[3u8, 200, 7]].into_dyn()));
        Ok(())
    }

    #[test]
    fn wide_integer_output_keeps_its_type() -> ProbeResult<()> {
        let tensor = Tensor::from_shape(&[1, 4], &[7i64, -2, 40, 3]).unwrap();
        let output = RawOutput::from_tensor(&tensor)?;
        assert_eq!(output, RawOutput::I64(array![[7i64, -2, 40, 3]].into_dyn()));
        let report = interpret(&output, None, 2);
        assert_eq!(report.element_type, "i64");
        let Interpretation::Classification { predictions } = &report.interpretation else {
            panic!("expected classification")
        };
        assert_eq!(predictions[0].index, 2);
        assert!(report.to_string().contains("Dtype: i64"));
        Ok(())
    }

    #[test]
    fn bool_output_is_widened() -> ProbeResult<()> {
        let tensor = Tensor::from_shape(&[2], &[true, false]).unwrap();
        assert_eq!(RawOutput::from_tensor(&tensor)?, RawOutput::F32(array![1.0f32, 0.0].into_dyn()));
        Ok(())
    }

    #[test]
    fn npy_keeps_element_type() -> ProbeResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.npy");
        let output = RawOutput::I8(array![[-3i8, 4]].into_dyn());
        output.write_npy(&path)?;
        let back: ArrayD<i8> = ndarray_npy::read_npy(&path).unwrap();
        assert_eq!(RawOutput::I8(back), output);
        Ok(())
    }
}

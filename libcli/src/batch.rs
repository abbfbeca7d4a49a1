use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::Axis;
use tfl_probe_prep::ImageTensor;

use crate::driver::Driver;
use crate::engine::Engine;
use crate::errors::{ProbeError, ProbeResult};
use crate::report::{RawOutput, top_k};

/// Outcome of one image in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub path: PathBuf,
    pub output: RawOutput,
    pub top_prediction: usize,
    pub confidence: f32,
    pub top5: Vec<usize>,
}

/// Results recorded before the batch stopped, plus the image that stopped
/// it, if any.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<ImageResult>,
    pub failure: Option<(PathBuf, ProbeError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Turns a stopped batch into its error.
    pub fn into_result(self) -> ProbeResult<Vec<ImageResult>> {
        match self.failure {
            None => Ok(self.results),
            Some((_, e)) => Err(e),
        }
    }
}

impl ImageResult {
    fn new(path: &Path, output: RawOutput) -> ImageResult {
        let mut values = output.to_f32();
        if values.ndim() > 1 && values.shape()[0] == 1 {
            values = values.index_axis_move(Axis(0), 0);
        }
        let scores = values.iter().copied().collect::<Vec<f32>>();
        let top5 = top_k(&scores, 5);
        let top_prediction = top5.first().copied().unwrap_or(0);
        let confidence = scores.get(top_prediction).copied().unwrap_or(f32::NAN);
        ImageResult { path: path.to_path_buf(), output, top_prediction, confidence, top5 }
    }
}

impl fmt::Display for ImageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: class {} ({:.4}), top5 {:?}",
            self.path.display(),
            self.top_prediction,
            self.confidence,
            self.top5
        )
    }
}

/// Runs `preprocess → infer → record` for each image in turn. Stops at the
/// first failure; the results of earlier images are returned with it.
pub fn test_with_multiple_images<E, P, F>(driver: &Driver<E>, images: &[P], mut preprocess: F) -> BatchReport
where
    E: Engine + ?Sized,
    P: AsRef<Path>,
    F: FnMut(&Path) -> ProbeResult<ImageTensor>,
{
    let mut results = vec![];
    for image in images {
        let image = image.as_ref();
        info!("batch: {image:?}");
        match preprocess(image).and_then(|input| driver.infer(&input)) {
            Ok(output) => results.push(ImageResult::new(image, output)),
            Err(e) => {
                warn!("batch stopped at {image:?}: {e}");
                return BatchReport { results, failure: Some((image.to_path_buf(), e)) };
            }
        }
    }
    BatchReport { results, failure: None }
}

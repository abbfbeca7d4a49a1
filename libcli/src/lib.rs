//! Drives a TensorFlow Lite image model through images and reports what it
//! outputs.
//!
//! `TfliteEngine` loads and runs the model, `Driver` derives preprocessing
//! from the model's first input and runs the `prepare → infer → report`
//! stages, `report` interprets the first output.
#[macro_use]
extern crate log;

pub mod batch;
pub mod driver;
pub mod engine;
pub mod errors;
pub mod labels;
pub mod model_io;
pub mod report;

pub use batch::{BatchReport, ImageResult, test_with_multiple_images};
pub use driver::{Driver, Probe, ProbeConfig};
pub use engine::{Engine, TfliteEngine};
pub use errors::{ProbeError, ProbeResult};
pub use labels::Labels;
pub use model_io::ModelIoSpec;
pub use report::{Interpretation, RawOutput, Report};

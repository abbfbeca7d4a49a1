//! Image preprocessing for classification model inputs.
//!
//! One pipeline (`preprocess_image`) maps a decoded image and a
//! `PreprocessConfig` to an `ImageTensor`: color conversion, Lanczos resize,
//! element type conversion, normalization, optional batch axis. Presets and
//! `preprocess_custom` are thin parameter bundles over it.
#[macro_use]
extern crate log;

pub mod augment;
pub mod config;
pub mod errors;
pub mod normalization;
pub mod preprocess;
pub mod presets;
pub mod tensor;

pub use config::{ColorMode, PixelFormat, PreprocessConfig};
pub use errors::{PrepError, PrepResult};
pub use normalization::Normalization;
pub use preprocess::{decode, load_and_preprocess, preprocess_custom, preprocess_image, preprocess_path};
pub use presets::Preset;
pub use tensor::ImageTensor;

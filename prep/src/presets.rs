use std::path::Path;
use std::str::FromStr;

use crate::config::PreprocessConfig;
use crate::errors::{PrepError, PrepResult};
use crate::normalization::Normalization;
use crate::preprocess::preprocess_path;
use crate::tensor::ImageTensor;

/// Parameter bundles for well-known model families. Square RGB float input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    MobileNet,
    EfficientNet,
    ResNet,
}

impl Preset {
    pub const DEFAULT_INPUT_SIZE: u32 = 224;

    pub fn normalization(&self) -> Normalization {
        match self {
            Preset::MobileNet => Normalization::MinusOneOne,
            Preset::EfficientNet | Preset::ResNet => Normalization::ImageNet,
        }
    }

    pub fn config(&self, input_size: u32) -> PreprocessConfig {
        PreprocessConfig::rgb(input_size, input_size, self.normalization())
    }

    pub fn preprocess(&self, path: impl AsRef<Path>, input_size: u32) -> PrepResult<ImageTensor> {
        preprocess_path(path, &self.config(input_size))
    }
}

impl FromStr for Preset {
    type Err = PrepError;

    fn from_str(s: &str) -> PrepResult<Preset> {
        match s.to_ascii_lowercase().as_str() {
            "mobilenet" => Ok(Preset::MobileNet),
            "efficientnet" => Ok(Preset::EfficientNet),
            "resnet" => Ok(Preset::ResNet),
            _ => Err(PrepError::InvalidConfig(format!("unknown preset `{s}'"))),
        }
    }
}

pub fn preprocess_for_mobilenet(path: impl AsRef<Path>, input_size: u32) -> PrepResult<ImageTensor> {
    Preset::MobileNet.preprocess(path, input_size)
}

pub fn preprocess_for_efficientnet(
    path: impl AsRef<Path>,
    input_size: u32,
) -> PrepResult<ImageTensor> {
    Preset::EfficientNet.preprocess(path, input_size)
}

pub fn preprocess_for_resnet(path: impl AsRef<Path>, input_size: u32) -> PrepResult<ImageTensor> {
    Preset::ResNet.preprocess(path, input_size)
}

use std::path::PathBuf;

use thiserror::Error;
use tfl_probe_prep::PrepError;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model {}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported model input shape {shape}, expected [height, width, channels] or [batch, height, width, channels] with 1 or 3 channels")]
    UnsupportedShape { shape: String },

    #[error("unsupported model input element type {0}")]
    UnsupportedDatumType(String),

    #[error("inference failed")]
    Inference {
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Prep(#[from] PrepError),

    #[error("tensor shape error")]
    Shape(#[from] ndarray::ShapeError),

    #[error("failed to write raw output")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

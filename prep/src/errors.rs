use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("image file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to save image to {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid preprocessing configuration: {0}")]
    InvalidConfig(String),

    #[error("tensor shape error")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

pub type PrepResult<T> = std::result::Result<T, PrepError>;

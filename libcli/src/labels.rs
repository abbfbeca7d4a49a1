use std::fs;
use std::path::Path;

use crate::errors::ProbeResult;

/// Class names, one per line: line `i` names class `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn new(labels: Vec<String>) -> Labels {
        Labels(labels)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ProbeResult<Labels> {
        let content = fs::read_to_string(path)?;
        Ok(Labels(content.lines().map(|l| l.trim().to_string()).collect()))
    }

    /// Reads the label file if one is given and exists. A missing file is not
    /// an error: reports fall back to synthetic names.
    pub fn load_optional(path: Option<&Path>) -> ProbeResult<Option<Labels>> {
        match path {
            None => Ok(None),
            Some(path) if !path.exists() => {
                warn!("label file {path:?} not found, using class indices");
                Ok(None)
            }
            Some(path) => {
                let labels = Labels::from_path(path)?;
                info!("loaded {} class labels from {path:?}", labels.len());
                Ok(Some(labels))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(|s| s.as_str())
    }
}

/// Name of class `index`, or `Class {index}` when unknown.
pub fn label_for(labels: Option<&Labels>, index: usize) -> String {
    labels.and_then(|l| l.get(index)).map(|s| s.to_string()).unwrap_or_else(|| format!("Class {index}"))
}

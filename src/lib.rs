pub mod core {
    pub mod batch;
    pub mod heading;
    pub mod project;
    pub mod reader;
    pub mod serialize;
    pub mod tree;
}

pub mod utils {
    pub mod files;
    pub mod summary;
    pub mod tagger;
}

pub mod config;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One paragraph of an input document: the resolved style NAME (not the
/// styleId), the concatenated text, and the runs it was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paragraph {
    pub style: String,
    pub text: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl Paragraph {
    /// Plain paragraph with a single unformatted run.
    pub fn new(style: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            style: style.into(),
            text: text.clone(),
            runs: vec![Run::new(text)],
        }
    }

    pub fn with_runs(style: impl Into<String>, runs: Vec<Run>) -> Self {
        let text = runs.iter().map(|r| r.text.as_str()).collect();
        Self {
            style: style.into(),
            text,
            runs,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Per-document outcome of a batch run. Serializes to the same shape the
/// report consumers expect: `{"file", "output_folder"}` or `{"file", "error"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BatchEntry {
    Success { file: String, output_folder: PathBuf },
    Failure { file: String, error: String },
}

impl BatchEntry {
    pub fn success(input: &Path, output_folder: PathBuf) -> Self {
        Self::Success {
            file: basename(input),
            output_folder,
        }
    }

    pub fn failure(input: &Path, error: String) -> Self {
        Self::Failure {
            file: basename(input),
            error,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Success { file, .. } | Self::Failure { file, .. } => file,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

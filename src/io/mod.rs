// Input/output module
// Frame file readers, training files, folder aggregation and file digests

pub mod ascii_matrix;
pub mod folder;
pub mod lsc;
pub mod training;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::clustering::Frame;
use crate::grid::{GridError, PixelGrid};

pub use folder::{aggregate_folder, FolderError};
pub use training::{
    parse_training_labels, read_training_labels, training_header, write_training_file,
    TrainingFileError,
};

/// Errors raised while reading a frame file
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read {file}, line {line}: {reason}. Please check the formatting.")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Could not read {file}, line {line}: {error}")]
    OutOfBounds {
        file: String,
        line: usize,
        error: GridError,
    },

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),
}

/// Supported frame file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameFormat {
    /// One `x,y count` line per hit
    #[serde(rename = "lsc")]
    Lsc,

    /// Dense whitespace-separated matrix, one grid row per line
    #[serde(rename = "ascii_matrix")]
    AsciiMatrix,
}

impl FrameFormat {
    /// Parse a format tag such as "lsc"
    pub fn from_name(name: &str) -> Result<Self, ParseError> {
        match name {
            "lsc" => Ok(FrameFormat::Lsc),
            "ascii_matrix" => Ok(FrameFormat::AsciiMatrix),
            _ => Err(ParseError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameFormat::Lsc => "lsc",
            FrameFormat::AsciiMatrix => "ascii_matrix",
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read and parse a frame file of the given size
pub fn read_frame(
    path: &Path,
    format: FrameFormat,
    width: u32,
    height: u32,
) -> Result<Frame, ParseError> {
    let file = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: file.clone(),
        source,
    })?;

    let frame = match format {
        FrameFormat::Lsc => lsc::parse_lsc(&text, &file, width, height)?,
        FrameFormat::AsciiMatrix => ascii_matrix::parse_ascii_matrix(&text, &file, width, height)?,
    };

    log::debug!("Read {} hits from {} ({})", frame.number_of_hits(), file, format);
    Ok(frame)
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA256 of a file's contents, used to identify loaded inputs in run traces
pub fn file_sha256(path: &Path) -> std::io::Result<String> {
    Ok(calculate_sha256(&fs::read(path)?))
}

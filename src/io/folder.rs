// Folder aggregation
// Depth-first merge of every frame file below a directory into one frame

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::clustering::Frame;
use crate::config::Config;
use crate::grid::GridError;
use crate::io::{read_frame, ParseError};

#[derive(Debug, Error)]
pub enum FolderError {
    #[error("Could not list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Could not merge {path}: {error}")]
    Merge { path: String, error: GridError },
}

/// Aggregate frame of every recognised frame file under `path`
///
/// Subfolders are aggregated first, then the folder's own frame files; each
/// frame is clustered before it is merged so the aggregate carries the
/// clusters of every file. Entries are visited in name order. Files whose
/// extension is not in the config's file type table are ignored.
pub fn aggregate_folder(path: &Path, config: &Config) -> Result<Frame, FolderError> {
    let (folders, files) = list_children(path, config)?;
    let mut aggregate = Frame::new(config.grid_width, config.grid_height);

    for folder in folders {
        let folder_frame = aggregate_folder(&folder, config)?;
        merge_into(&mut aggregate, folder_frame, &folder)?;
    }

    for file in files {
        let Some(format) = config.format_for_path(&file) else {
            continue;
        };
        let frame = read_frame(&file, format, config.grid_width, config.grid_height)?;
        frame.calculate_clusters();
        merge_into(&mut aggregate, frame, &file)?;
    }

    log::debug!(
        "Aggregated {} into {} clusters",
        path.display(),
        aggregate.clusters().len()
    );
    Ok(aggregate)
}

fn merge_into(aggregate: &mut Frame, frame: Frame, path: &Path) -> Result<(), FolderError> {
    aggregate.merge(frame).map_err(|error| FolderError::Merge {
        path: path.display().to_string(),
        error,
    })
}

/// Subfolders and matching frame files of `path`, each sorted by name
fn list_children(path: &Path, config: &Config) -> Result<(Vec<PathBuf>, Vec<PathBuf>), FolderError> {
    let io_error = |source| FolderError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut folders = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        let entry_path = entry.map_err(io_error)?.path();
        if entry_path.is_dir() {
            folders.push(entry_path);
        } else if config.format_for_path(&entry_path).is_some() {
            files.push(entry_path);
        } else {
            log::debug!("Skipping {}", entry_path.display());
        }
    }

    folders.sort();
    files.sort();
    Ok((folders, files))
}

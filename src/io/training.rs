// Training files
// CSV of manually classified clusters: UUID, class, then trainable attributes

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::attributes::{AttributeError, AttributeRegistry, EntityKind};
use crate::clustering::Frame;

pub const UUID_COLUMN: &str = "UUID";
pub const CLASS_COLUMN: &str = "Classification";

#[derive(Debug, Error)]
pub enum TrainingFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("Training file line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Header row naming every trainable cluster attribute in registry order
pub fn training_header(registry: &AttributeRegistry) -> String {
    let mut header = vec![UUID_COLUMN.to_string(), CLASS_COLUMN.to_string()];
    header.extend(
        registry
            .trainable_for(EntityKind::Cluster)
            .iter()
            .map(|entry| entry.name().to_string()),
    );
    header.join(",")
}

/// Header followed by one row per manually classified cluster of `frame`
pub fn render_training_file(
    frame: &Frame,
    registry: &AttributeRegistry,
) -> Result<String, AttributeError> {
    let rows = frame.get_training_rows(registry)?;
    let mut text = training_header(registry);
    text.push('\n');
    if !rows.is_empty() {
        text.push_str(&rows);
        text.push('\n');
    }
    Ok(text)
}

/// Save manual classes of `frame` as a training file
/// Returns the number of data rows written
pub fn write_training_file(
    path: &Path,
    frame: &Frame,
    registry: &AttributeRegistry,
) -> Result<usize, TrainingFileError> {
    let text = render_training_file(frame, registry)?;
    fs::write(path, &text)?;
    let rows = text.lines().count() - 1;
    log::info!("Wrote {} training rows to {}", rows, path.display());
    Ok(rows)
}

/// UUID -> class map from training file text, header skipped
pub fn parse_training_labels(text: &str) -> Result<HashMap<String, String>, TrainingFileError> {
    let mut labels = HashMap::new();
    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.trim().split(',');
        match (fields.next(), fields.next()) {
            (Some(uuid), Some(class)) if !uuid.is_empty() => {
                labels.insert(uuid.to_string(), class.to_string());
            }
            _ => {
                return Err(TrainingFileError::Malformed {
                    line: index + 1,
                    reason: "expected UUID and classification columns".to_string(),
                });
            }
        }
    }
    Ok(labels)
}

/// Read a training file into a UUID -> class map
pub fn read_training_labels(path: &Path) -> Result<HashMap<String, String>, TrainingFileError> {
    let text = fs::read_to_string(path)?;
    parse_training_labels(&text)
}

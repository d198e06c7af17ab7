// Run tracing
// Append-only JSONL record of what a CLI run loaded, clustered and classified

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Processing stage a trace entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Clustering,
    Training,
    Classification,
    Aggregation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clustering => "clustering",
            Stage::Training => "training",
            Stage::Classification => "classification",
            Stage::Aggregation => "aggregation",
        };
        f.write_str(name)
    }
}

/// A single line of the run trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp
    pub timestamp: String,

    pub stage: Stage,

    pub message: String,

    /// Structured details, e.g. input digest or cluster count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(stage: Stage, message: impl Into<String>, data: serde_json::Value) -> Self {
        TraceEntry {
            data: Some(data),
            ..TraceEntry::new(stage, message)
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Writer for an append-only JSONL trace file
#[derive(Debug, Clone)]
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append an entry, creating the file if needed
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        self.write_batch(std::slice::from_ref(entry))
    }

    pub fn write_batch(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            file.write_all(entry.to_json_line()?.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Builder for the entries of one stage
pub struct TraceBuilder {
    stage: Stage,
}

impl TraceBuilder {
    pub fn stage(stage: Stage) -> Self {
        TraceBuilder { stage }
    }

    pub fn message(self, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self.stage, message)
    }

    pub fn with_data(self, message: impl Into<String>, data: serde_json::Value) -> TraceEntry {
        TraceEntry::with_data(self.stage, message, data)
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_entry_with_data() {
        let entry = TraceEntry::with_data(
            Stage::Clustering,
            "Clustered frame",
            json!({ "clusters": 6 }),
        );
        assert_eq!(entry.stage, Stage::Clustering);
        assert_eq!(entry.data.unwrap()["clusters"], 6);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let line = TraceBuilder::stage(Stage::Classification)
            .message("done")
            .to_json_line()
            .unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""stage":"classification""#));
        assert!(!line.contains("data"));
        assert_eq!(Stage::Load.to_string(), "load");
    }

    #[test]
    fn test_writer_appends() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("run.jsonl");
        let writer = TraceWriter::new(trace_path.clone());

        writer
            .write(&TraceBuilder::stage(Stage::Load).with_data(
                "Loaded frame.lsc",
                json!({ "sha256": "abc", "hits": 31 }),
            ))
            .unwrap();
        writer
            .write_batch(&[
                TraceEntry::new(Stage::Clustering, "6 clusters"),
                TraceEntry::new(Stage::Classification, "6 classified"),
            ])
            .unwrap();

        let entries = read_trace_file(&trace_path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].stage, Stage::Load);
        assert_eq!(entries[0].data.as_ref().unwrap()["hits"], 31);
        assert_eq!(entries[2].message, "6 classified");
        assert_eq!(writer.path(), trace_path.as_path());
    }

    #[test]
    fn test_read_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("bad.jsonl");
        std::fs::write(&trace_path, "not json\n").unwrap();
        assert!(matches!(
            read_trace_file(&trace_path),
            Err(TraceError::SerializationError(_))
        ));
    }
}

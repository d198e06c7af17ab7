// CLI commands
// Each command loads its inputs, runs the core operation and returns a serializable report

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::attributes::{builtin, AttributeRegistry, Entity};
use crate::classify::{self, ClassifierBackend, Dimension, TrainingReport, TrainingSet};
use crate::clustering::{Cluster, Frame};
use crate::config::Config;
use crate::grid::{Pixel, PixelGrid};
use crate::io::{self, ParseError};
use crate::pipeline::{Stage, TraceBuilder, TraceEntry, TraceWriter};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Shared state of one CLI run
pub struct Session {
    pub config: Config,
    pub registry: AttributeRegistry,
    trace: Option<TraceWriter>,
}

impl Session {
    pub fn new(config: Config, trace_path: Option<PathBuf>) -> CommandResult<Self> {
        let registry = AttributeRegistry::standard()?;
        Ok(Session {
            config,
            registry,
            trace: trace_path.map(TraceWriter::new),
        })
    }

    fn trace(&self, entry: TraceEntry) {
        if let Some(ref writer) = self.trace {
            if let Err(e) = writer.write(&entry) {
                log::warn!("Could not write trace to {}: {}", writer.path().display(), e);
            }
        }
    }

    /// Read a frame file, picking the format from its extension
    pub fn load_frame(&self, path: &Path) -> CommandResult<Frame> {
        let format = self.config.format_for_path(path).ok_or_else(|| {
            ParseError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })?;

        let frame = io::read_frame(path, format, self.config.grid_width, self.config.grid_height)?;
        let sha256 = io::file_sha256(path)?;

        log::info!("Loaded {} ({} hits)", path.display(), frame.number_of_hits());
        self.trace(TraceBuilder::stage(Stage::Load).with_data(
            format!("Loaded {}", path.display()),
            json!({
                "path": path.display().to_string(),
                "format": format.name(),
                "sha256": sha256,
                "hits": frame.number_of_hits(),
            }),
        ));
        Ok(frame)
    }

    fn cluster(&self, frame: &Frame) {
        let count = frame.calculate_clusters().len();
        log::info!("Found {} clusters", count);
        self.trace(TraceBuilder::stage(Stage::Clustering).with_data(
            format!("Found {} clusters", count),
            json!({ "clusters": count }),
        ));
    }
}

// ==================== REPORTS ====================

/// One row of an attribute table
/// Values use two-decimal display formatting; failures are shown, not defaulted
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRow {
    pub name: String,
    pub value: String,
}

fn attribute_table(registry: &AttributeRegistry, entity: Entity<'_>) -> Vec<AttributeRow> {
    registry
        .attributes_for(entity.kind())
        .into_iter()
        .map(|entry| AttributeRow {
            name: entry.name().to_string(),
            value: match entry.compute(entity) {
                Ok(value) => value.to_string(),
                Err(e) => format!("n/a ({})", e),
            },
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub attributes: Vec<AttributeRow>,
}

#[derive(Debug, Serialize)]
pub struct ClusterReport {
    pub index: usize,
    pub uuid: String,
    pub manual_class: String,
    pub algorithm_class: String,
    pub attributes: Vec<AttributeRow>,
}

impl ClusterReport {
    fn new(index: usize, cluster: &Cluster, registry: &AttributeRegistry) -> CommandResult<Self> {
        let attributes = attribute_table(registry, Entity::Cluster(cluster))
            .into_iter()
            .filter(|row| row.name != builtin::UUID)
            .collect();
        Ok(ClusterReport {
            index,
            uuid: cluster.uuid()?,
            manual_class: cluster.manual_class.clone(),
            algorithm_class: cluster.algorithm_class.clone(),
            attributes,
        })
    }
}

fn cluster_reports(frame: &Frame, registry: &AttributeRegistry) -> CommandResult<Vec<ClusterReport>> {
    frame
        .clusters()
        .iter()
        .enumerate()
        .map(|(index, cluster)| ClusterReport::new(index, cluster, registry))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub output: String,
    pub labelled: usize,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct LoadTrainingReport {
    pub entries: usize,
    pub updated: usize,
    pub clusters: Vec<ClusterReport>,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedCluster {
    pub uuid: String,
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub algorithm: String,
    pub k: usize,
    pub training: TrainingReport,
    pub dimensions: Vec<Dimension>,
    pub results: Vec<ClassifiedCluster>,
}

#[derive(Debug, Serialize)]
pub struct AggregateReport {
    pub folder: String,
    pub hits: usize,
    pub volume: i64,
    pub clusters: usize,
}

// ==================== FRAME COMMANDS ====================

/// Attribute table of a frame
pub fn inspect_frame(session: &Session, path: &Path) -> CommandResult<FrameReport> {
    let frame = session.load_frame(path)?;
    session.cluster(&frame);
    Ok(FrameReport {
        file: path.display().to_string(),
        width: frame.width(),
        height: frame.height(),
        attributes: attribute_table(&session.registry, Entity::Frame(&frame)),
    })
}

/// Every cluster of a frame with its attribute table
pub fn list_clusters(session: &Session, path: &Path) -> CommandResult<Vec<ClusterReport>> {
    let frame = session.load_frame(path)?;
    session.cluster(&frame);
    cluster_reports(&frame, &session.registry)
}

/// Parse a manual label of the form `x,y=Class`
pub fn parse_label(label: &str) -> CommandResult<(Pixel, String)> {
    let invalid = || CommandError {
        message: format!("Invalid label {:?}, expected x,y=Class", label),
    };
    let (coords, class) = label.split_once('=').ok_or_else(invalid)?;
    let (x, y) = coords.split_once(',').ok_or_else(invalid)?;
    let x: i32 = x.trim().parse().map_err(|_| invalid())?;
    let y: i32 = y.trim().parse().map_err(|_| invalid())?;
    let class = class.trim();
    if class.is_empty() || class.contains(',') {
        return Err(invalid());
    }
    Ok((Pixel::new(x, y), class.to_string()))
}

// ==================== TRAINING COMMANDS ====================

/// Label the clusters nearest to the given points and save a training file
pub fn export_training(
    session: &Session,
    path: &Path,
    labels: &[String],
    output: &Path,
) -> CommandResult<ExportReport> {
    let mut frame = session.load_frame(path)?;
    session.cluster(&frame);

    for label in labels {
        let (point, class) = parse_label(label)?;
        let cluster = frame.get_closest_cluster_mut(point)?;
        log::debug!("Labelled cluster {} as {}", cluster.uuid()?, class);
        cluster.manual_class = class;
    }

    let rows = io::write_training_file(output, &frame, &session.registry)?;
    session.trace(TraceBuilder::stage(Stage::Training).with_data(
        format!("Saved {} training rows", rows),
        json!({ "output": output.display().to_string(), "rows": rows }),
    ));

    Ok(ExportReport {
        output: output.display().to_string(),
        labelled: labels.len(),
        rows,
    })
}

/// Apply manual classes from a training file to a frame's clusters
pub fn load_training(
    session: &Session,
    path: &Path,
    training: &Path,
) -> CommandResult<LoadTrainingReport> {
    let mut frame = session.load_frame(path)?;
    let labels = io::read_training_labels(training)?;
    let updated = frame.load_training_data(&labels)?;

    log::info!("Matched {} of {} training entries", updated, labels.len());
    session.trace(TraceBuilder::stage(Stage::Training).with_data(
        format!("Loaded manual classes from {}", training.display()),
        json!({ "entries": labels.len(), "updated": updated }),
    ));

    Ok(LoadTrainingReport {
        entries: labels.len(),
        updated,
        clusters: cluster_reports(&frame, &session.registry)?,
    })
}

// ==================== CLASSIFICATION COMMANDS ====================

/// Train the chosen algorithm and classify every cluster of a frame
pub fn classify(
    session: &Session,
    path: &Path,
    training: &Path,
    algorithm: &str,
    k: Option<usize>,
    include: &[String],
) -> CommandResult<ClassifyReport> {
    let backend = ClassifierBackend::from_name(algorithm)?;
    let k = k.unwrap_or(session.config.default_k);
    let mut classifier = classify::create_classifier(backend, k)?;

    let set = TrainingSet::from_file(training)?;
    let report = classifier.train(set, &session.registry)?;
    if !include.is_empty() {
        let names: Vec<&str> = include.iter().map(String::as_str).collect();
        classifier.include_only(&names)?;
    }
    session.trace(TraceBuilder::stage(Stage::Training).with_data(
        format!("Trained {} on {}", backend, training.display()),
        json!({
            "examples": report.examples,
            "dimensions": report.dimensions,
            "warnings": report.warnings.len(),
        }),
    ));

    let mut frame = session.load_frame(path)?;
    session.cluster(&frame);
    let classifications = classify::classify_frame(&mut frame, classifier.as_ref(), &session.registry)?;

    let results = frame
        .clusters()
        .iter()
        .zip(classifications)
        .map(|(cluster, result)| -> CommandResult<ClassifiedCluster> {
            Ok(ClassifiedCluster {
                uuid: cluster.uuid()?,
                label: result.label,
                confidence: result.confidence,
            })
        })
        .collect::<CommandResult<Vec<_>>>()?;

    session.trace(TraceBuilder::stage(Stage::Classification).with_data(
        format!("Classified {} clusters", results.len()),
        json!({ "algorithm": backend.display_name(), "k": k, "clusters": results.len() }),
    ));

    Ok(ClassifyReport {
        algorithm: backend.display_name().to_string(),
        k,
        training: report,
        dimensions: classifier.dimensions().to_vec(),
        results,
    })
}

// ==================== FOLDER COMMANDS ====================

/// Sum every frame below a folder into one frame
pub fn aggregate(session: &Session, folder: &Path) -> CommandResult<AggregateReport> {
    let frame = io::aggregate_folder(folder, &session.config)?;
    let report = AggregateReport {
        folder: folder.display().to_string(),
        hits: frame.number_of_hits(),
        volume: builtin::volume(&frame)?,
        clusters: frame.clusters().len(),
    };

    log::info!(
        "Aggregated {}: {} hits in {} clusters",
        report.folder,
        report.hits,
        report.clusters
    );
    session.trace(TraceBuilder::stage(Stage::Aggregation).with_data(
        format!("Aggregated {}", report.folder),
        json!({ "hits": report.hits, "clusters": report.clusters }),
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::pipeline::read_trace_file;
    use std::fs;
    use tempfile::TempDir;

    fn session_with_trace(dir: &TempDir) -> Session {
        Session::new(Config::default(), Some(dir.path().join("run.jsonl"))).unwrap()
    }

    fn write_reference(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("reference.lsc");
        fs::write(&path, fixtures::reference_lsc()).unwrap();
        path
    }

    #[test]
    fn test_parse_label() {
        let (pixel, class) = parse_label("146,41=Track").unwrap();
        assert_eq!(pixel, Pixel::new(146, 41));
        assert_eq!(class, "Track");
        assert!(parse_label("146,41").is_err());
        assert!(parse_label("146=Track").is_err());
        assert!(parse_label("1,2=").is_err());
        assert!(parse_label("1,2=a,b").is_err());
    }

    #[test]
    fn test_inspect_frame() {
        let dir = TempDir::new().unwrap();
        let session = session_with_trace(&dir);
        let report = inspect_frame(&session, &write_reference(&dir)).unwrap();

        let value = |name: &str| {
            report
                .attributes
                .iter()
                .find(|row| row.name == name)
                .map(|row| row.value.clone())
        };
        assert_eq!(value("No. of hits").as_deref(), Some("31"));
        assert_eq!(value("No. of clusters").as_deref(), Some("6"));
        assert_eq!(value("Radius"), None);

        let trace = read_trace_file(&dir.path().join("run.jsonl")).unwrap();
        assert_eq!(trace[0].stage, Stage::Load);
        let sha = trace[0].data.as_ref().unwrap()["sha256"].as_str().unwrap().to_string();
        assert_eq!(sha, io::calculate_sha256(fixtures::reference_lsc().as_bytes()));
        assert_eq!(trace[1].stage, Stage::Clustering);
    }

    #[test]
    fn test_list_clusters() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(Config::default(), None).unwrap();
        let clusters = list_clusters(&session, &write_reference(&dir)).unwrap();
        assert_eq!(clusters.len(), 6);
        assert!(clusters.iter().all(|c| c.manual_class == "Unclassified"));
        assert!(clusters.iter().all(|c| c.uuid.len() == 40));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.fits");
        fs::write(&path, "").unwrap();
        let session = Session::new(Config::default(), None).unwrap();
        let error = inspect_frame(&session, &path).unwrap_err();
        assert!(error.message().contains("not supported"));
    }

    #[test]
    fn test_export_load_and_classify() {
        let dir = TempDir::new().unwrap();
        let session = session_with_trace(&dir);
        let frame_path = write_reference(&dir);
        let training_path = dir.path().join("training.csv");

        let labels = vec!["75,75=Dot".to_string(), "175,11=Blob".to_string()];
        let export = export_training(&session, &frame_path, &labels, &training_path).unwrap();
        assert_eq!(export.rows, 2);

        let loaded = load_training(&session, &frame_path, &training_path).unwrap();
        assert_eq!(loaded.entries, 2);
        assert_eq!(loaded.updated, 2);
        let manual: Vec<&str> = loaded
            .clusters
            .iter()
            .map(|c| c.manual_class.as_str())
            .filter(|c| *c != "Unclassified")
            .collect();
        assert_eq!(manual.len(), 2);

        let include = vec!["No. of hits".to_string()];
        let report = classify(&session, &frame_path, &training_path, "knn", Some(1), &include).unwrap();
        assert_eq!(report.algorithm, "K Nearest Neighbours");
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.training.examples, 2);
        assert!(report.training.warnings.is_empty());
        assert_eq!(report.dimensions.iter().filter(|d| d.included).count(), 1);

        let trace = read_trace_file(&dir.path().join("run.jsonl")).unwrap();
        assert_eq!(trace.last().unwrap().stage, Stage::Classification);
    }

    #[test]
    fn test_classify_with_unimplemented_algorithm() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(Config::default(), None).unwrap();
        let error = classify(
            &session,
            &write_reference(&dir),
            &dir.path().join("training.csv"),
            "ID3",
            None,
            &[],
        )
        .unwrap_err();
        assert!(error.message().contains("not implemented"));
    }

    #[test]
    fn test_aggregate() {
        let dir = TempDir::new().unwrap();
        write_reference(&dir);
        fs::write(dir.path().join("extra.lsc"), "75,75 4\n").unwrap();
        let session = Session::new(Config::default(), None).unwrap();

        let report = aggregate(&session, dir.path()).unwrap();
        assert_eq!(report.hits, 31);
        assert_eq!(report.clusters, 7);
    }
}

// Classifier backend abstraction
// Algorithm table: K Nearest Neighbours (implemented) and ID3 (listed, not yet implemented)

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::attributes::{AttributeError, AttributeRegistry};
use crate::classify::knn::KnnClassifier;
use crate::classify::training::{TrainingSet, UnknownAttributeWarning};
use crate::clustering::{Cluster, Frame};

/// Classification algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// Lazy learner voting over the nearest training examples
    KNearestNeighbours,

    /// Decision tree learner
    Id3,
}

impl ClassifierBackend {
    /// Every known algorithm, in menu order
    pub const ALL: [ClassifierBackend; 2] =
        [ClassifierBackend::KNearestNeighbours, ClassifierBackend::Id3];

    pub fn display_name(&self) -> &'static str {
        match self {
            ClassifierBackend::KNearestNeighbours => "K Nearest Neighbours",
            ClassifierBackend::Id3 => "ID3",
        }
    }

    /// Look up an algorithm by display name; "knn" and "id3" are accepted too
    pub fn from_name(name: &str) -> Result<Self, ClassifierError> {
        let wanted = name.trim();
        for backend in Self::ALL {
            if backend.display_name().eq_ignore_ascii_case(wanted) {
                return Ok(backend);
            }
        }
        match wanted.to_ascii_lowercase().as_str() {
            "knn" => Ok(ClassifierBackend::KNearestNeighbours),
            "id3" => Ok(ClassifierBackend::Id3),
            _ => Err(ClassifierError::UnknownBackend(name.to_string())),
        }
    }
}

impl fmt::Display for ClassifierBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Errors that can occur during training or classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Algorithm not yet trained")]
    Untrained,

    #[error("k must be between 1 and the number of training examples ({examples}), got {k}")]
    InvalidK { k: usize, examples: usize },

    #[error("Backend not implemented: {0}")]
    BackendNotImplemented(ClassifierBackend),

    #[error("Unknown algorithm: {0}")]
    UnknownBackend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid training data on line {line}: {reason}")]
    InvalidTrainingData { line: usize, reason: String },

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Dimension '{0}' cannot be computed with this registry")]
    DimensionUnavailable(String),

    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// Outcome of classifying one cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,

    /// Share of the deciding votes won by `label` [0.0, 1.0]
    pub confidence: f32,
}

/// One feature dimension of the training set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,

    /// Counted in the distance
    pub included: bool,

    /// The registry can compute it; unavailable dimensions are never included
    pub available: bool,
}

/// Summary of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub examples: usize,
    pub dimensions: usize,
    pub warnings: Vec<UnknownAttributeWarning>,
}

/// Unified classifier interface
pub trait Classifier {
    fn name(&self) -> &'static str;

    fn is_trained(&self) -> bool;

    /// Feature dimensions of the current training set, empty until trained
    fn dimensions(&self) -> &[Dimension];

    /// Include or exclude a dimension from classification
    fn set_included(&mut self, name: &str, included: bool) -> Result<(), ClassifierError>;

    /// Include exactly the named dimensions
    fn include_only(&mut self, names: &[&str]) -> Result<(), ClassifierError> {
        if let Some(name) = names
            .iter()
            .find(|name| !self.dimensions().iter().any(|d| d.name == **name))
        {
            return Err(ClassifierError::UnknownDimension(name.to_string()));
        }
        let all: Vec<String> = self.dimensions().iter().map(|d| d.name.clone()).collect();
        for name in all {
            self.set_included(&name, names.contains(&name.as_str()))?;
        }
        Ok(())
    }

    /// Replace the training data; header names the registry cannot compute are
    /// reported in the returned warnings and left out of distance computation
    fn train(
        &mut self,
        set: TrainingSet,
        registry: &AttributeRegistry,
    ) -> Result<TrainingReport, ClassifierError>;

    /// Classify one cluster, writing its `algorithm_class`
    fn classify(
        &self,
        cluster: &mut Cluster,
        registry: &AttributeRegistry,
    ) -> Result<Classification, ClassifierError>;
}

/// Create an untrained classifier for the given backend
pub fn create_classifier(
    backend: ClassifierBackend,
    k: usize,
) -> Result<Box<dyn Classifier>, ClassifierError> {
    match backend {
        ClassifierBackend::KNearestNeighbours => Ok(Box::new(KnnClassifier::new(k))),
        ClassifierBackend::Id3 => Err(ClassifierError::BackendNotImplemented(backend)),
    }
}

/// Classify every cluster of `frame`, clustering it first if needed
pub fn classify_frame(
    frame: &mut Frame,
    classifier: &dyn Classifier,
    registry: &AttributeRegistry,
) -> Result<Vec<Classification>, ClassifierError> {
    if !classifier.is_trained() {
        return Err(ClassifierError::Untrained);
    }

    // Labels are written only once every cluster has classified
    let results = frame
        .calculate_clusters()
        .iter()
        .map(|cluster| classifier.classify(&mut cluster.clone(), registry))
        .collect::<Result<Vec<_>, _>>()?;
    for (cluster, result) in frame.clusters_mut().iter_mut().zip(&results) {
        cluster.algorithm_class = result.label.clone();
    }

    log::info!("{} classified {} clusters", classifier.name(), results.len());
    Ok(results)
}

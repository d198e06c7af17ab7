// Classifier training data
// Labelled feature vectors parsed from a training CSV

use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::attributes::{AttributeRegistry, EntityKind};
use crate::classify::backend::ClassifierError;

/// Training header names an attribute this registry cannot compute for clusters
/// Recoverable: the dimension is left out of classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Training file attribute '{attribute}' cannot be calculated and will be ignored")]
pub struct UnknownAttributeWarning {
    pub attribute: String,
}

/// One labelled example
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub id: String,
    pub label: String,
    /// Aligned with `TrainingSet::attributes`
    pub features: Vec<f64>,
}

/// Parsed training file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    /// Feature column names, columns 3 onwards of the header
    pub attributes: Vec<String>,
    pub examples: Vec<TrainingExample>,
}

impl TrainingSet {
    /// Parse `UUID,Classification,<attributes...>` text
    pub fn parse(text: &str) -> Result<Self, ClassifierError> {
        let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Err(ClassifierError::InvalidTrainingData {
                line: 1,
                reason: "missing header row".to_string(),
            });
        };
        let columns: Vec<&str> = header.trim().split(',').collect();
        if columns.len() < 2 {
            return Err(ClassifierError::InvalidTrainingData {
                line: 1,
                reason: "header needs UUID and classification columns".to_string(),
            });
        }
        let attributes: Vec<String> = columns[2..].iter().map(|s| s.to_string()).collect();

        let mut examples = Vec::new();
        for (index, line) in lines {
            let line_number = index + 1;
            let fields: Vec<&str> = line.trim().split(',').collect();
            if fields.len() != columns.len() {
                return Err(ClassifierError::InvalidTrainingData {
                    line: line_number,
                    reason: format!("expected {} columns, found {}", columns.len(), fields.len()),
                });
            }

            let features = fields[2..]
                .iter()
                .zip(&attributes)
                .map(|(value, name)| {
                    value.trim().parse::<f64>().map_err(|_| ClassifierError::InvalidTrainingData {
                        line: line_number,
                        reason: format!("'{}' is not a number for {}", value, name),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            examples.push(TrainingExample {
                id: fields[0].to_string(),
                label: fields[1].to_string(),
                features,
            });
        }

        Ok(TrainingSet { attributes, examples })
    }

    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// True if the registry has a trainable (numeric) cluster attribute named `name`
    pub fn is_computable(name: &str, registry: &AttributeRegistry) -> bool {
        registry
            .get(name)
            .is_some_and(|entry| entry.applies(EntityKind::Cluster) && entry.is_trainable())
    }

    /// One warning per header attribute the registry cannot compute as a cluster feature
    pub fn check_compatibility(&self, registry: &AttributeRegistry) -> Vec<UnknownAttributeWarning> {
        self.attributes
            .iter()
            .filter(|name| !Self::is_computable(name, registry))
            .map(|name| UnknownAttributeWarning {
                attribute: name.clone(),
            })
            .collect()
    }
}

// K-Nearest Neighbours classifier
// Majority vote of the k closest training examples over the included dimensions

use crate::attributes::{AttributeError, AttributeRegistry, Entity};
use crate::classify::backend::{
    Classification, Classifier, ClassifierError, Dimension, TrainingReport,
};
use crate::classify::training::TrainingSet;
use crate::clustering::Cluster;

/// K-Nearest Neighbours classifier over training examples
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    training: Option<TrainingSet>,
    dimensions: Vec<Dimension>,
}

impl KnnClassifier {
    /// Create an untrained classifier
    /// k: number of nearest neighbours to consider
    pub fn new(k: usize) -> Self {
        KnnClassifier {
            k,
            training: None,
            dimensions: Vec::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn set_k(&mut self, k: usize) {
        self.k = k;
    }

    /// Number of stored training examples
    pub fn training_len(&self) -> usize {
        self.training.as_ref().map_or(0, TrainingSet::len)
    }

    /// (feature index, live value) for every included dimension
    fn live_features(
        &self,
        cluster: &Cluster,
        registry: &AttributeRegistry,
    ) -> Result<Vec<(usize, f64)>, ClassifierError> {
        let mut features = Vec::new();
        for (index, dimension) in self.dimensions.iter().enumerate() {
            if !dimension.included {
                continue;
            }
            let value = registry.compute_by_name(&dimension.name, Entity::Cluster(cluster))?;
            let value = value
                .as_f64()
                .ok_or_else(|| AttributeError::NotNumeric(dimension.name.clone()))?;
            features.push((index, value));
        }
        Ok(features)
    }
}

impl Default for KnnClassifier {
    fn default() -> Self {
        KnnClassifier::new(5)
    }
}

impl Classifier for KnnClassifier {
    fn name(&self) -> &'static str {
        "K Nearest Neighbours"
    }

    fn is_trained(&self) -> bool {
        self.training.is_some()
    }

    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn set_included(&mut self, name: &str, included: bool) -> Result<(), ClassifierError> {
        let dimension = self
            .dimensions
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| ClassifierError::UnknownDimension(name.to_string()))?;
        if included && !dimension.available {
            return Err(ClassifierError::DimensionUnavailable(name.to_string()));
        }
        dimension.included = included;
        Ok(())
    }

    fn train(
        &mut self,
        set: TrainingSet,
        registry: &AttributeRegistry,
    ) -> Result<TrainingReport, ClassifierError> {
        let warnings = set.check_compatibility(registry);
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        self.dimensions = set
            .attributes
            .iter()
            .map(|name| {
                let available = TrainingSet::is_computable(name, registry);
                Dimension {
                    name: name.clone(),
                    included: available,
                    available,
                }
            })
            .collect();

        let report = TrainingReport {
            examples: set.len(),
            dimensions: self.dimensions.iter().filter(|d| d.available).count(),
            warnings,
        };
        log::info!(
            "Trained on {} examples over {} dimensions",
            report.examples,
            report.dimensions
        );

        self.training = Some(set);
        Ok(report)
    }

    fn classify(
        &self,
        cluster: &mut Cluster,
        registry: &AttributeRegistry,
    ) -> Result<Classification, ClassifierError> {
        let training = self.training.as_ref().ok_or(ClassifierError::Untrained)?;
        if self.k == 0 || self.k > training.len() {
            return Err(ClassifierError::InvalidK {
                k: self.k,
                examples: training.len(),
            });
        }

        let live = self.live_features(cluster, registry)?;

        let mut distances: Vec<(&str, f64)> = training
            .examples
            .iter()
            .map(|example| {
                let distance: f64 = live
                    .iter()
                    .map(|&(index, value)| (example.features[index] - value).powi(2))
                    .sum();
                (example.label.as_str(), distance)
            })
            .collect();

        // Stable, so equidistant examples keep file order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        // Vote counts in first-encountered order
        let mut votes: Vec<(&str, usize)> = Vec::new();
        for (label, _) in distances.iter().take(self.k) {
            let seen = votes.iter().position(|(l, _)| l == label);
            match seen {
                Some(index) => votes[index].1 += 1,
                None => votes.push((*label, 1)),
            }
        }

        let mut best = votes[0];
        for &(label, count) in &votes[1..] {
            if count > best.1 {
                best = (label, count);
            }
        }

        cluster.algorithm_class = best.0.to_string();
        Ok(Classification {
            label: best.0.to_string(),
            confidence: best.1 as f32 / self.k as f32,
        })
    }
}

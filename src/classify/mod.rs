// Classification module
// Pluggable cluster classifiers trained from labelled training files

pub mod backend;
pub mod knn;
pub mod training;

pub use backend::{
    classify_frame, create_classifier, Classification, Classifier, ClassifierBackend,
    ClassifierError, Dimension, TrainingReport,
};
pub use knn::KnnClassifier;
pub use training::{TrainingExample, TrainingSet, UnknownAttributeWarning};

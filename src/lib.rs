// Crayfish - Pixel detector frame analysis
// Module declarations

pub mod attributes;
pub mod classify;
pub mod clustering;
pub mod commands;
pub mod config;
pub mod grid;
pub mod io;
pub mod pipeline;

#[cfg(test)]
mod fixtures;

pub use attributes::{AttributeRegistry, AttributeValue, Entity, EntityKind};
pub use classify::{Classifier, ClassifierBackend, KnnClassifier, TrainingSet};
pub use clustering::{Cluster, Frame};
pub use config::Config;
pub use grid::{Hit, Pixel, PixelGrid};
pub use io::FrameFormat;

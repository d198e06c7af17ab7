// Clustering module
// Frames, clusters and the connected-component labeling that links them

pub mod cluster;
pub mod frame;
pub mod labeling;

pub use cluster::{Cluster, UNCLASSIFIED};
pub use frame::{Frame, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use labeling::connected_components;

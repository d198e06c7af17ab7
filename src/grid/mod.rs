// Pixel grid module
// Sparse hit storage and the geometry shared by frames and clusters

pub mod pixel_grid;
pub mod types;

pub use pixel_grid::{HitMap, PixelGrid};
pub use types::{BoundingBox, GridError, GridResult, Hit, Pixel};

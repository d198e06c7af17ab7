// Grid primitives
// Pixel coordinates, hit counts and bounding boxes shared by frames and clusters

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by grid access and grid statistics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Pixel {pixel} outside of {width}x{height} grid")]
    OutOfBounds {
        pixel: Pixel,
        width: u32,
        height: u32,
    },

    #[error("Grid has no hits")]
    EmptyGrid,

    #[error("Hit counts overflow a 64-bit total")]
    CountOverflow,
}

pub type GridResult<T> = Result<T, GridError>;

/// An (x, y) coordinate on the detector
/// Ordered by x then y; this is the iteration order of every grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub fn new(x: i32, y: i32) -> Self {
        Pixel { x, y }
    }

    /// True if `other` is one of the 8 cells surrounding this pixel
    pub fn is_adjacent(&self, other: &Pixel) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// The 8 surrounding coordinates, unchecked against any grid
    pub fn surrounding(&self) -> impl Iterator<Item = Pixel> + '_ {
        (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| Pixel::new(self.x + dx, self.y + dy))
    }

    /// Squared Euclidean distance to another pixel
    pub fn distance_squared(&self, other: &Pixel) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for Pixel {
    fn from((x, y): (i32, i32)) -> Self {
        Pixel { x, y }
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A recorded count at one pixel
/// Ownership by a cluster is tracked by the frame, not by the hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hit {
    pub value: i64,
}

impl Hit {
    pub fn new(value: i64) -> Self {
        Hit { value }
    }

    /// The virtual hit returned for unset in-bounds pixels
    pub fn zero() -> Self {
        Hit { value: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Sum of two hits, failing instead of wrapping
    pub fn checked_add(self, other: Hit) -> GridResult<Hit> {
        self.value
            .checked_add(other.value)
            .map(Hit::new)
            .ok_or(GridError::CountOverflow)
    }
}

/// Inclusive rectangle enclosing a set of pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl BoundingBox {
    /// Smallest box enclosing every pixel, or None for an empty iterator
    pub fn enclosing<'a>(pixels: impl IntoIterator<Item = &'a Pixel>) -> Option<Self> {
        let mut pixels = pixels.into_iter();
        let first = pixels.next()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for pixel in pixels {
            bbox.min_x = bbox.min_x.min(pixel.x);
            bbox.max_x = bbox.max_x.max(pixel.x);
            bbox.min_y = bbox.min_y.min(pixel.y);
            bbox.max_y = bbox.max_y.max(pixel.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_excludes_identity() {
        let p = Pixel::new(5, 5);
        assert!(!p.is_adjacent(&p));
        assert!(p.is_adjacent(&Pixel::new(6, 6)));
        assert!(p.is_adjacent(&Pixel::new(4, 5)));
        assert!(!p.is_adjacent(&Pixel::new(7, 5)));
    }

    #[test]
    fn test_surrounding_has_eight_cells() {
        let p = Pixel::new(0, 0);
        let cells: Vec<Pixel> = p.surrounding().collect();
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&p));
        assert!(cells.iter().all(|c| p.is_adjacent(c)));
    }

    #[test]
    fn test_hits_are_summable() {
        assert_eq!(Hit::new(3).checked_add(Hit::new(4)), Ok(Hit::new(7)));
        assert_eq!(
            Hit::new(i64::MAX).checked_add(Hit::new(1)),
            Err(GridError::CountOverflow)
        );
        assert!(Hit::zero().is_zero());
    }

    #[test]
    fn test_bounding_box() {
        let pixels = [Pixel::new(3, 9), Pixel::new(1, 4), Pixel::new(2, 7)];
        let bbox = BoundingBox::enclosing(&pixels).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 1,
                max_x: 3,
                min_y: 4,
                max_y: 9
            }
        );
        assert_eq!(bbox.width(), 3);
        assert_eq!(bbox.height(), 6);

        let empty: [Pixel; 0] = [];
        assert!(BoundingBox::enclosing(&empty).is_none());
    }
}

// Sparse pixel grid
// Shared behaviour of frames and clusters over a sparse map of hits

use std::collections::BTreeMap;

use crate::grid::types::{BoundingBox, GridError, GridResult, Hit, Pixel};

/// Sparse map of hits keyed by pixel
pub type HitMap = BTreeMap<Pixel, Hit>;

/// A width x height grid storing only its hits
///
/// A 256x256 detector frame typically holds a few dozen hits, so implementors
/// keep a sparse map and synthesize zero hits for everything else. Every key
/// in `hit_map` must lie within the grid.
pub trait PixelGrid {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn hit_map(&self) -> &HitMap;

    /// Mutable access to the stored hits
    /// Implementors holding derived state must drop it here
    fn hit_map_mut(&mut self) -> &mut HitMap;

    fn in_grid(&self, pixel: Pixel) -> bool {
        pixel.x >= 0
            && pixel.y >= 0
            && (pixel.x as i64) < self.width() as i64
            && (pixel.y as i64) < self.height() as i64
    }

    fn check_bounds(&self, pixel: Pixel) -> GridResult<()> {
        if self.in_grid(pixel) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                pixel,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Stored hit at `pixel`, a zero hit if unset, or OutOfBounds
    fn get(&self, pixel: Pixel) -> GridResult<Hit> {
        self.check_bounds(pixel)?;
        Ok(self.hit_map().get(&pixel).copied().unwrap_or_else(Hit::zero))
    }

    fn set(&mut self, pixel: Pixel, hit: Hit) -> GridResult<()> {
        self.check_bounds(pixel)?;
        self.hit_map_mut().insert(pixel, hit);
        Ok(())
    }

    fn hit_pixels(&self) -> Vec<Pixel> {
        self.hit_map().keys().copied().collect()
    }

    /// Hit values in `hit_pixels` order
    fn counts(&self) -> Vec<i64> {
        self.hit_map().values().map(|hit| hit.value).collect()
    }

    fn number_of_hits(&self) -> usize {
        self.hit_map().len()
    }

    fn is_empty(&self) -> bool {
        self.hit_map().is_empty()
    }

    /// Number of in-grid, non-zero cells among the 8 surrounding `pixel`
    fn neighbour_count(&self, pixel: Pixel) -> usize {
        pixel
            .surrounding()
            .filter(|p| self.in_grid(*p))
            .filter(|p| self.hit_map().get(p).is_some_and(|hit| !hit.is_zero()))
            .count()
    }

    /// Highest neighbour count over all hits, and every pixel reaching it
    fn max_neighbour_pixels(&self) -> GridResult<(usize, Vec<Pixel>)> {
        let mut max: Option<usize> = None;
        let mut pixels = Vec::new();
        for pixel in self.hit_map().keys() {
            let count = self.neighbour_count(*pixel);
            match max {
                Some(m) if count < m => {}
                Some(m) if count == m => pixels.push(*pixel),
                _ => {
                    max = Some(count);
                    pixels = vec![*pixel];
                }
            }
        }
        max.map(|m| (m, pixels)).ok_or(GridError::EmptyGrid)
    }

    fn bounding_box(&self) -> GridResult<BoundingBox> {
        BoundingBox::enclosing(self.hit_map().keys()).ok_or(GridError::EmptyGrid)
    }

    /// Dense height x width matrix of values, indexed `[y][x]`
    fn render_energy(&self) -> Vec<Vec<i64>> {
        let mut grid = vec![vec![0; self.width() as usize]; self.height() as usize];
        for (pixel, hit) in self.hit_map() {
            grid[pixel.y as usize][pixel.x as usize] = hit.value;
        }
        grid
    }

    /// Dense matrix clipped to `bounds`, or to the grid's own bounding box
    fn render_energy_zoomed(&self, bounds: Option<BoundingBox>) -> GridResult<Vec<Vec<i64>>> {
        let bbox = match bounds {
            Some(bbox) => bbox,
            None => self.bounding_box()?,
        };
        self.check_bounds(Pixel::new(bbox.min_x, bbox.min_y))?;
        self.check_bounds(Pixel::new(bbox.max_x, bbox.max_y))?;

        let rows = (bbox.min_y..=bbox.max_y)
            .map(|y| {
                (bbox.min_x..=bbox.max_x)
                    .map(|x| {
                        self.hit_map()
                            .get(&Pixel::new(x, y))
                            .map_or(0, |hit| hit.value)
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }
}

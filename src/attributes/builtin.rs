// Built-in attributes
// The reference attribute set and the statistics behind it

use crate::attributes::registry::{
    AttributeError, AttributeRegistry, AttributeResult, AttributeValue, Entity, EntityKind,
    RegistryError,
};
use crate::clustering::{Cluster, Frame};
use crate::grid::{GridError, GridResult, PixelGrid};

pub const NUMBER_OF_HITS: &str = "No. of hits";
pub const VOLUME: &str = "Volume";
pub const MEAN_COUNT: &str = "Mean count";
pub const STANDARD_DEVIATION: &str = "Count std. dev.";
pub const NUMBER_OF_CLUSTERS: &str = "No. of clusters";
pub const GEOMETRIC_CENTRE: &str = "Geo. centre";
pub const CENTRE_OF_MASS: &str = "C. of mass";
pub const RADIUS: &str = "Radius";
pub const MOST_NEIGHBOURS: &str = "Most neighbours";
pub const UUID: &str = "UUID";

impl AttributeRegistry {
    /// Registry holding the reference attribute set
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = AttributeRegistry::new();
        register_builtin(&mut registry)?;
        Ok(registry)
    }
}

/// Register the reference attributes; order here is display and CSV order
pub fn register_builtin(registry: &mut AttributeRegistry) -> Result<(), RegistryError> {
    registry
        .register(EntityKind::PixelGrid, NUMBER_OF_HITS, number_of_hits_attr, true, None)?
        .register(EntityKind::PixelGrid, VOLUME, volume_attr, true, None)?
        .register(EntityKind::PixelGrid, MEAN_COUNT, mean_count_attr, true, None)?
        .register(EntityKind::PixelGrid, STANDARD_DEVIATION, standard_deviation_attr, true, None)?
        .register(EntityKind::Frame, NUMBER_OF_CLUSTERS, number_of_clusters_attr, false, None)?
        .register(EntityKind::Cluster, GEOMETRIC_CENTRE, geometric_centre_attr, false, None)?
        .register(EntityKind::Cluster, CENTRE_OF_MASS, centre_of_mass_attr, false, None)?
        .register(EntityKind::Cluster, RADIUS, radius_attr, true, None)?
        .register(EntityKind::Cluster, MOST_NEIGHBOURS, most_neighbours_attr, true, None)?
        .register(EntityKind::Cluster, UUID, uuid_attr, false, Some(false))?;
    Ok(())
}

// ==================== STATISTICS ====================

/// Sum of all hit values
pub fn volume(grid: &dyn PixelGrid) -> GridResult<i64> {
    grid.counts()
        .iter()
        .try_fold(0_i64, |total, &count| total.checked_add(count))
        .ok_or(GridError::CountOverflow)
}

pub fn mean_count(grid: &dyn PixelGrid) -> GridResult<f64> {
    if grid.is_empty() {
        return Err(GridError::EmptyGrid);
    }
    Ok(volume(grid)? as f64 / grid.number_of_hits() as f64)
}

/// Population standard deviation of hit values
pub fn standard_deviation(grid: &dyn PixelGrid) -> GridResult<f64> {
    let mean = mean_count(grid)?;
    let counts = grid.counts();
    let mean_square =
        counts.iter().map(|&c| (c as f64) * (c as f64)).sum::<f64>() / counts.len() as f64;
    // Rounding can push the difference marginally below zero for constant counts
    Ok((mean_square - mean * mean).max(0.0).sqrt())
}

/// Midpoint of the bounding box, counting each pixel as a unit cell
pub fn geometric_centre(grid: &dyn PixelGrid) -> GridResult<(f64, f64)> {
    let bbox = grid.bounding_box()?;
    Ok((
        bbox.width() as f64 / 2.0 + bbox.min_x as f64,
        bbox.height() as f64 / 2.0 + bbox.min_y as f64,
    ))
}

/// Value-weighted mean coordinate
pub fn centre_of_mass(grid: &dyn PixelGrid) -> AttributeResult<(f64, f64)> {
    if grid.is_empty() {
        return Err(GridError::EmptyGrid.into());
    }
    let total = volume(grid)?;
    if total == 0 {
        return Err(AttributeError::ZeroWeight(CENTRE_OF_MASS.to_string()));
    }
    let (sum_x, sum_y) = grid
        .hit_map()
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (pixel, hit)| {
            (
                sx + hit.value as f64 * pixel.x as f64,
                sy + hit.value as f64 * pixel.y as f64,
            )
        });
    Ok((sum_x / total as f64, sum_y / total as f64))
}

/// Largest distance from any hit pixel to the centre of mass
pub fn radius(grid: &dyn PixelGrid) -> AttributeResult<f64> {
    let (cx, cy) = centre_of_mass(grid)?;
    let max_squared = grid
        .hit_map()
        .keys()
        .map(|pixel| {
            let dx = pixel.x as f64 - cx;
            let dy = pixel.y as f64 - cy;
            dx * dx + dy * dy
        })
        .fold(0.0_f64, f64::max);
    Ok(max_squared.sqrt())
}

// ==================== ATTRIBUTE FUNCTIONS ====================

fn require_frame<'a>(entity: Entity<'a>, name: &str) -> AttributeResult<&'a Frame> {
    entity.as_frame().ok_or_else(|| AttributeError::NotApplicable {
        name: name.to_string(),
        kind: entity.kind(),
    })
}

fn require_cluster<'a>(entity: Entity<'a>, name: &str) -> AttributeResult<&'a Cluster> {
    entity.as_cluster().ok_or_else(|| AttributeError::NotApplicable {
        name: name.to_string(),
        kind: entity.kind(),
    })
}

fn number_of_hits_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    Ok(AttributeValue::Int(entity.grid().number_of_hits() as i64))
}

fn volume_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    Ok(AttributeValue::Int(volume(entity.grid())?))
}

fn mean_count_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    Ok(AttributeValue::Float(mean_count(entity.grid())?))
}

fn standard_deviation_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    Ok(AttributeValue::Float(standard_deviation(entity.grid())?))
}

fn number_of_clusters_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let frame = require_frame(entity, NUMBER_OF_CLUSTERS)?;
    Ok(AttributeValue::Int(frame.calculate_clusters().len() as i64))
}

fn geometric_centre_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let cluster = require_cluster(entity, GEOMETRIC_CENTRE)?;
    let (x, y) = geometric_centre(cluster)?;
    Ok(AttributeValue::Pair(x, y))
}

fn centre_of_mass_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let cluster = require_cluster(entity, CENTRE_OF_MASS)?;
    let (x, y) = centre_of_mass(cluster)?;
    Ok(AttributeValue::Pair(x, y))
}

fn radius_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let cluster = require_cluster(entity, RADIUS)?;
    Ok(AttributeValue::Float(radius(cluster)?))
}

fn most_neighbours_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let cluster = require_cluster(entity, MOST_NEIGHBOURS)?;
    let (max, _) = cluster.max_neighbour_pixels()?;
    Ok(AttributeValue::Int(max as i64))
}

fn uuid_attr(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
    let cluster = require_cluster(entity, UUID)?;
    Ok(AttributeValue::Text(cluster.uuid()?))
}

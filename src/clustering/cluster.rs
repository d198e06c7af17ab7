// Cluster
// A maximal 8-connected group of hits taken from one frame

use sha1::{Digest, Sha1};

use crate::attributes::{AttributeError, AttributeRegistry, AttributeResult, Entity, EntityKind};
use crate::grid::{GridResult, Hit, HitMap, Pixel, PixelGrid};

/// Label carried by clusters nobody has classified yet
pub const UNCLASSIFIED: &str = "Unclassified";

/// A connected subset of a frame's hits
/// Shares the frame's width and height so coordinates stay comparable
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    width: u32,
    height: u32,
    hits: HitMap,

    /// Class assigned by hand (or loaded from a training file)
    pub manual_class: String,

    /// Class assigned by a classifier
    pub algorithm_class: String,
}

impl Cluster {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Cluster {
            width,
            height,
            hits: HitMap::new(),
            manual_class: UNCLASSIFIED.to_string(),
            algorithm_class: UNCLASSIFIED.to_string(),
        }
    }

    /// Store a frame hit in this cluster
    /// The owning frame records the pixel -> cluster mapping
    pub(crate) fn add(&mut self, pixel: Pixel, hit: Hit) {
        self.hits.insert(pixel, hit);
    }

    /// True if `pixel` touches any pixel of the cluster (8-connectivity)
    pub fn is_neighbour(&self, pixel: Pixel) -> bool {
        self.hits.keys().any(|p| p.is_adjacent(&pixel))
    }

    pub fn contains(&self, pixel: Pixel) -> bool {
        self.hits.contains_key(&pixel)
    }

    pub fn is_manually_classified(&self) -> bool {
        self.manual_class != UNCLASSIFIED
    }

    /// Width of the cluster's own bounding box
    pub fn cluster_width(&self) -> GridResult<i32> {
        Ok(self.bounding_box()?.width())
    }

    /// Height of the cluster's own bounding box
    pub fn cluster_height(&self) -> GridResult<i32> {
        Ok(self.bounding_box()?.height())
    }

    /// Tab separated grid of the bounding box, top row = max_y
    ///
    /// Users read clusters with the origin at the bottom left, so rows run
    /// from max_y down to min_y. Empty cells inside the box are written as 0.
    pub fn ascii_grid(&self) -> GridResult<String> {
        let bbox = self.bounding_box()?;
        let rows: Vec<String> = (bbox.min_y..=bbox.max_y)
            .rev()
            .map(|y| {
                (bbox.min_x..=bbox.max_x)
                    .map(|x| {
                        self.hits
                            .get(&Pixel::new(x, y))
                            .map_or(0, |hit| hit.value)
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect();
        Ok(rows.join("\n"))
    }

    /// Content hash identifying this hit configuration
    /// SHA-1 hex digest of `ascii_grid`; the join key for training files
    pub fn uuid(&self) -> GridResult<String> {
        let grid = self.ascii_grid()?;
        let mut hasher = Sha1::new();
        hasher.update(grid.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// `UUID,class,<trainable cluster attributes>` in registry order
    /// Fails on a class that would break the CSV columns
    pub fn get_training_row(&self, registry: &AttributeRegistry) -> AttributeResult<String> {
        if self.manual_class.contains([',', '\n', '\r']) {
            return Err(AttributeError::InvalidLabel(self.manual_class.clone()));
        }
        let mut record = vec![self.uuid()?, self.manual_class.clone()];
        for entry in registry.trainable_for(EntityKind::Cluster) {
            record.push(entry.compute(Entity::Cluster(self))?.to_string());
        }
        Ok(record.join(","))
    }
}

impl PixelGrid for Cluster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn hit_map(&self) -> &HitMap {
        &self.hits
    }

    fn hit_map_mut(&mut self) -> &mut HitMap {
        &mut self.hits
    }
}

// Frame
// One detector exposure: its hits plus the clusters computed from them

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::attributes::{AttributeRegistry, AttributeResult};
use crate::clustering::cluster::Cluster;
use crate::clustering::labeling::connected_components;
use crate::grid::{GridError, GridResult, Hit, HitMap, Pixel, PixelGrid};
use crate::io::{self, FrameFormat, ParseError};

/// Reference detector width in pixels
pub const DEFAULT_WIDTH: u32 = 256;

/// Reference detector height in pixels
pub const DEFAULT_HEIGHT: u32 = 256;

/// Result of one clustering pass
#[derive(Debug, Clone, Default)]
struct Clustering {
    clusters: Vec<Cluster>,
    /// Which cluster owns each hit pixel
    owners: BTreeMap<Pixel, usize>,
}

impl Clustering {
    fn from_clusters(clusters: Vec<Cluster>) -> Self {
        let mut owners = BTreeMap::new();
        for (index, cluster) in clusters.iter().enumerate() {
            for pixel in cluster.hit_map().keys() {
                owners.entry(*pixel).or_insert(index);
            }
        }
        Clustering { clusters, owners }
    }
}

/// A full detector exposure
///
/// Clusters are computed on first request and kept until the hits change or
/// `invalidate_clusters` is called.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    hits: HitMap,
    clustering: OnceCell<Clustering>,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Frame {
    /// Create an empty frame
    pub fn new(width: u32, height: u32) -> Self {
        Frame {
            width,
            height,
            hits: HitMap::new(),
            clustering: OnceCell::new(),
        }
    }

    /// Build a frame from (pixel, hit) pairs, failing on the first out-of-bounds pixel
    pub fn from_hits(
        width: u32,
        height: u32,
        hits: impl IntoIterator<Item = (Pixel, Hit)>,
    ) -> GridResult<Self> {
        let mut frame = Frame::new(width, height);
        for (pixel, hit) in hits {
            frame.set(pixel, hit)?;
        }
        Ok(frame)
    }

    /// Read a 256x256 frame from a file in the given format
    /// Clusters are not computed
    pub fn from_file(path: impl AsRef<Path>, format: FrameFormat) -> Result<Self, ParseError> {
        io::read_frame(path.as_ref(), format, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Compute clusters if needed and return them
    pub fn calculate_clusters(&self) -> &[Cluster] {
        &self.clustering.get_or_init(|| self.label()).clusters
    }

    /// Clusters computed so far; empty until `calculate_clusters` runs
    pub fn clusters(&self) -> &[Cluster] {
        self.clustering
            .get()
            .map(|clustering| clustering.clusters.as_slice())
            .unwrap_or_default()
    }

    /// Mutable clusters, computing them first if needed
    pub fn clusters_mut(&mut self) -> &mut [Cluster] {
        self.calculate_clusters();
        self.clustering
            .get_mut()
            .map(|clustering| clustering.clusters.as_mut_slice())
            .unwrap_or_default()
    }

    pub fn is_clustered(&self) -> bool {
        self.clustering.get().is_some()
    }

    /// Drop the cached clusters so the next request recomputes them
    pub fn invalidate_clusters(&mut self) {
        self.clustering.take();
    }

    /// Cluster owning `pixel`, if clusters have been computed and it is a hit
    pub fn cluster_of(&self, pixel: Pixel) -> Option<&Cluster> {
        let clustering = self.clustering.get()?;
        let index = *clustering.owners.get(&pixel)?;
        clustering.clusters.get(index)
    }

    fn label(&self) -> Clustering {
        let clusters: Vec<Cluster> = connected_components(&self.hits)
            .into_iter()
            .map(|pixels| {
                let mut cluster = Cluster::new(self.width, self.height);
                for pixel in pixels {
                    cluster.add(pixel, self.hits[&pixel]);
                }
                cluster
            })
            .collect();

        log::debug!(
            "Clustered {} hits into {} clusters",
            self.hits.len(),
            clusters.len()
        );

        Clustering::from_clusters(clusters)
    }

    /// Index of the cluster owning the hit nearest to `point`
    /// Ties go to the first hit in iteration order
    fn closest_cluster_index(&self, point: Pixel) -> GridResult<usize> {
        self.calculate_clusters();
        let owners = self
            .clustering
            .get()
            .map(|clustering| &clustering.owners)
            .ok_or(GridError::EmptyGrid)?;

        let mut closest: Option<(i64, usize)> = None;
        for pixel in self.hits.keys() {
            let Some(&index) = owners.get(pixel) else {
                continue;
            };
            let distance = pixel.distance_squared(&point);
            if closest.map_or(true, |(best, _)| distance < best) {
                closest = Some((distance, index));
            }
        }

        closest.map(|(_, index)| index).ok_or(GridError::EmptyGrid)
    }

    /// Cluster owning the hit closest to `point`, computing clusters if needed
    pub fn get_closest_cluster(&self, point: Pixel) -> GridResult<&Cluster> {
        let index = self.closest_cluster_index(point)?;
        Ok(&self.calculate_clusters()[index])
    }

    /// Mutable variant of `get_closest_cluster`, used for manual labelling
    pub fn get_closest_cluster_mut(&mut self, point: Pixel) -> GridResult<&mut Cluster> {
        let index = self.closest_cluster_index(point)?;
        Ok(&mut self.clusters_mut()[index])
    }

    /// One training row per manually classified cluster, newline separated
    pub fn get_training_rows(&self, registry: &AttributeRegistry) -> AttributeResult<String> {
        let rows = self
            .calculate_clusters()
            .iter()
            .filter(|cluster| cluster.is_manually_classified())
            .map(|cluster| cluster.get_training_row(registry))
            .collect::<AttributeResult<Vec<String>>>()?;
        Ok(rows.join("\n"))
    }

    /// Apply manual classes from a UUID -> class map
    /// Returns how many clusters were updated; unmatched clusters are left alone
    pub fn load_training_data(&mut self, data: &HashMap<String, String>) -> GridResult<usize> {
        let mut updated = 0;
        for cluster in self.clusters_mut() {
            if let Some(class) = data.get(&cluster.uuid()?) {
                cluster.manual_class = class.clone();
                updated += 1;
            }
        }
        log::debug!("Loaded {} manual classes from {} training entries", updated, data.len());
        Ok(updated)
    }

    /// Add another frame's hits and clusters into this one
    ///
    /// Hit values are summed pixel by pixel and the two cluster lists are
    /// concatenated (each frame is clustered first). The merged frame keeps
    /// those clusters until `invalidate_clusters`, after which it re-clusters
    /// from the summed hits.
    pub fn merge(&mut self, other: Frame) -> GridResult<()> {
        let mut sums = Vec::with_capacity(other.hits.len());
        for (pixel, hit) in &other.hits {
            self.check_bounds(*pixel)?;
            let current = self.hits.get(pixel).copied().unwrap_or_else(Hit::zero);
            sums.push((*pixel, current.checked_add(*hit)?));
        }

        self.calculate_clusters();
        other.calculate_clusters();

        let mut clusters = self
            .clustering
            .take()
            .map(|clustering| clustering.clusters)
            .unwrap_or_default();
        let Frame {
            clustering: other_clustering,
            ..
        } = other;
        clusters.extend(
            other_clustering
                .into_inner()
                .map(|clustering| clustering.clusters)
                .unwrap_or_default(),
        );

        self.hits.extend(sums);

        self.clustering = OnceCell::from(Clustering::from_clusters(clusters));
        Ok(())
    }
}

impl PixelGrid for Frame {
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
        // Any write may change connectivity
        self.clustering.take();
        &mut self.hits
    }
}

// Connected-component labeling
// Splits a sparse hit map into maximal 8-connected groups of pixels

use std::collections::HashSet;

use crate::grid::{HitMap, Pixel};

/// Partition the stored pixels of `hits` into 8-connected components
///
/// Seeds are taken in hit map order and each component is grown from a
/// work-list, so cluster size is not limited by stack depth. Components are
/// returned in seed order with their pixels sorted.
pub fn connected_components(hits: &HitMap) -> Vec<Vec<Pixel>> {
    let mut visited: HashSet<Pixel> = HashSet::with_capacity(hits.len());
    let mut components = Vec::new();

    for &seed in hits.keys() {
        if !visited.insert(seed) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = vec![seed];

        while let Some(current) = queue.pop() {
            component.push(current);

            for neighbour in current.surrounding() {
                if hits.contains_key(&neighbour) && visited.insert(neighbour) {
                    queue.push(neighbour);
                }
            }
        }

        component.sort();
        components.push(component);
    }

    components
}

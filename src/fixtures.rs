// Test fixtures
// Reference 256x256 frame with six known clusters

use crate::clustering::{Frame, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::grid::{Hit, Pixel};

/// ((x, y), count) for each reference cluster
pub const REFERENCE_CLUSTERS: &[&[((i32, i32), i64)]] = &[
    &[
        ((175, 10), 51),
        ((176, 10), 82),
        ((176, 12), 9),
        ((174, 10), 6),
        ((174, 11), 59),
        ((175, 11), 117),
        ((176, 11), 62),
        ((174, 12), 46),
        ((175, 12), 128),
    ],
    &[
        ((146, 41), 32),
        ((147, 41), 45),
        ((146, 42), 211),
        ((147, 42), 89),
    ],
    &[
        ((95, 176), 81),
        ((96, 176), 73),
        ((92, 177), 38),
        ((93, 177), 27),
        ((94, 177), 48),
        ((91, 178), 156),
        ((92, 178), 16),
        ((93, 178), 57),
        ((91, 179), 183),
    ],
    &[((147, 240), 25), ((148, 240), 219)],
    &[
        ((156, 253), 22),
        ((156, 254), 44),
        ((157, 254), 37),
        ((157, 255), 21),
        ((158, 255), 42),
        ((159, 255), 54),
    ],
    &[((75, 75), 36)],
];

pub fn reference_hits() -> impl Iterator<Item = (Pixel, Hit)> {
    REFERENCE_CLUSTERS
        .iter()
        .flat_map(|cluster| cluster.iter())
        .map(|&(pixel, count)| (Pixel::from(pixel), Hit::new(count)))
}

/// Unclustered reference frame
pub fn reference_frame() -> Frame {
    match Frame::from_hits(DEFAULT_WIDTH, DEFAULT_HEIGHT, reference_hits()) {
        Ok(frame) => frame,
        Err(error) => panic!("reference frame out of bounds: {}", error),
    }
}

/// Reference frame as lsc text
pub fn reference_lsc() -> String {
    let mut text = String::from("// Reference frame\n");
    for (pixel, hit) in reference_hits() {
        text.push_str(&format!("{},{}\t{}\n", pixel.x, pixel.y, hit.value));
    }
    text
}

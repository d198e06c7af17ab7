// ASCII matrix frame reader
// Dense text format: one grid row per line, whitespace-separated counts

use crate::clustering::Frame;
use crate::grid::{Hit, Pixel, PixelGrid};
use crate::io::ParseError;

/// Parse a dense matrix into a frame; line index is y, column index is x
/// Only non-zero cells are stored
pub fn parse_ascii_matrix(
    text: &str,
    file: &str,
    width: u32,
    height: u32,
) -> Result<Frame, ParseError> {
    let mut frame = Frame::new(width, height);

    let rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with("//"));

    for (y, (index, line)) in rows.enumerate() {
        for (x, token) in line.split_whitespace().enumerate() {
            let count: i64 = token.parse().map_err(|_| ParseError::Malformed {
                file: file.to_string(),
                line: index + 1,
                reason: format!("invalid count {:?} in column {}", token, x + 1),
            })?;
            if count == 0 {
                continue;
            }

            let pixel = Pixel::new(x as i32, y as i32);
            frame
                .set(pixel, Hit::new(count))
                .map_err(|error| ParseError::OutOfBounds {
                    file: file.to_string(),
                    line: index + 1,
                    error,
                })?;
        }
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dense_matrix() {
        let text = "0 0 3\n0 5 0\n\n7 0 0\n";
        let frame = parse_ascii_matrix(text, "m.txt", 4, 4).unwrap();
        assert_eq!(
            frame.hit_pixels(),
            vec![Pixel::new(0, 2), Pixel::new(1, 1), Pixel::new(2, 0)]
        );
        assert_eq!(frame.get(Pixel::new(2, 0)).unwrap().value, 3);
        assert_eq!(frame.get(Pixel::new(0, 2)).unwrap().value, 7);
        assert_eq!(frame.calculate_clusters().len(), 1);
    }

    #[test]
    fn test_invalid_token() {
        let result = parse_ascii_matrix("0 1\n0 q\n", "m.txt", 4, 4);
        assert!(matches!(
            result,
            Err(ParseError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_matrix_larger_than_grid() {
        let result = parse_ascii_matrix("0 0 0 0 1\n", "m.txt", 4, 4);
        assert!(matches!(result, Err(ParseError::OutOfBounds { .. })));

        // Zero cells beyond the grid are not hits, so they are accepted
        let zeros = parse_ascii_matrix("1 0 0 0 0 0\n", "m.txt", 4, 4).unwrap();
        assert_eq!(zeros.number_of_hits(), 1);
    }
}

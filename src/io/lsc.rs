// LSC frame reader
// Sparse text format: one `x,y<whitespace>count` line per hit, `//` comments

use crate::clustering::Frame;
use crate::grid::{Hit, Pixel, PixelGrid};
use crate::io::ParseError;

/// Parse lsc text into a frame of the given size
/// `file` names the source in error messages
pub fn parse_lsc(text: &str, file: &str, width: u32, height: u32) -> Result<Frame, ParseError> {
    let mut frame = Frame::new(width, height);

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.starts_with("//") || line.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| ParseError::Malformed {
            file: file.to_string(),
            line: line_number,
            reason,
        };

        let (pixel, count) = parse_line(line).map_err(malformed)?;
        frame
            .set(pixel, Hit::new(count))
            .map_err(|error| ParseError::OutOfBounds {
                file: file.to_string(),
                line: line_number,
                error,
            })?;
    }

    Ok(frame)
}

fn parse_line(line: &str) -> Result<(Pixel, i64), String> {
    let mut fields = line.split_whitespace();
    let (Some(coords), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected `x,y count`, found {:?}", line.trim()));
    };

    let Some((x, y)) = coords.split_once(',') else {
        return Err(format!("expected `x,y` coordinates, found {:?}", coords));
    };
    let x: i32 = x
        .trim()
        .parse()
        .map_err(|_| format!("invalid x coordinate {:?}", x))?;
    let y: i32 = y
        .trim()
        .parse()
        .map_err(|_| format!("invalid y coordinate {:?}", y))?;
    let count: i64 = count
        .parse()
        .map_err(|_| format!("invalid count {:?}", count))?;

    Ok((Pixel::new(x, y), count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_parse_reference_frame() {
        let frame = parse_lsc(&fixtures::reference_lsc(), "reference.lsc", 256, 256).unwrap();
        assert_eq!(frame.width(), 256);
        assert_eq!(frame.height(), 256);
        assert_eq!(frame.get(Pixel::new(175, 10)).unwrap().value, 51);
        assert_eq!(frame.get(Pixel::new(0, 0)).unwrap().value, 0);
        assert_eq!(frame.number_of_hits(), 31);
        assert_eq!(frame.hit_map(), fixtures::reference_frame().hit_map());
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "// header\n\n1,2 3\n// 4,5 6\n   \n7,8\t9\n";
        let frame = parse_lsc(text, "t.lsc", 256, 256).unwrap();
        assert_eq!(frame.hit_pixels(), vec![Pixel::new(1, 2), Pixel::new(7, 8)]);
        assert_eq!(frame.counts(), vec![3, 9]);
    }

    #[test]
    fn test_malformed_lines_abort() {
        for bad in ["1,2", "1;2 3", "1,2 x", "a,2 3", "1,2 3 4", "1,2,3 4"] {
            let result = parse_lsc(bad, "bad.lsc", 256, 256);
            match result {
                Err(ParseError::Malformed { file, line, .. }) => {
                    assert_eq!(file, "bad.lsc");
                    assert_eq!(line, 1);
                }
                other => panic!("{:?} parsed as {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_error_names_file_and_line() {
        let text = "1,1 1\n2,2 2\noops\n";
        let error = parse_lsc(text, "frame_07.lsc", 256, 256).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("frame_07.lsc"));
        assert!(message.contains("line 3"));
    }

    #[test]
    fn test_out_of_grid_coordinates() {
        let result = parse_lsc("300,4 1\n", "wide.lsc", 256, 256);
        assert!(matches!(
            result,
            Err(ParseError::OutOfBounds { line: 1, .. })
        ));
        let negative = parse_lsc("-1,4 1\n", "neg.lsc", 256, 256);
        assert!(matches!(negative, Err(ParseError::OutOfBounds { .. })));
    }
}

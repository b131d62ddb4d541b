use crate::error::Result;
use crate::model::{Hsv, Wall};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// How walls were marked in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Four detected rectangle corners per wall
    #[default]
    Rectangle,
    /// Two user-selected end points per wall
    CornerSelection,
}

impl DetectionMode {
    pub fn vertex_count(&self) -> usize {
        match self {
            DetectionMode::Rectangle => 4,
            DetectionMode::CornerSelection => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Read the detector output file. A missing file means the detector
/// produced nothing, which yields no walls rather than an error.
pub fn read_detection_file(path: &Path, mode: DetectionMode) -> Result<Vec<Wall>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Detection output {} not found, no walls ingested", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let walls = parse_detections(file, mode);
    info!("Ingested {} walls from {}", walls.len(), path.display());
    Ok(walls)
}

/// Parse detection lines of the form `"(h, s, v)","(x1, y1)","(x2, y2)",...`.
/// Lines that do not parse are skipped.
pub fn parse_detections<R: Read>(reader: R, mode: DetectionMode) -> Vec<Wall> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut walls = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping detection line {}: {}", line + 1, e);
                continue;
            }
        };

        match parse_detection_record(&record, mode) {
            Some(wall) => walls.push(wall),
            None => debug!("Skipping malformed detection line {}", line + 1),
        }
    }

    walls
}

fn parse_detection_record(record: &StringRecord, mode: DetectionMode) -> Option<Wall> {
    let mut fields = record.iter();

    let hsv = parse_tuple(fields.next()?)?;
    if hsv.len() != 3 {
        return None;
    }
    // `as` saturates: out-of-range components clamp to 0..=255, fractions truncate
    let color = Hsv::new(hsv[0] as u8, hsv[1] as u8, hsv[2] as u8);

    let mut vertices = Vec::with_capacity(mode.vertex_count());
    for field in fields.take(mode.vertex_count()) {
        match parse_tuple(field)?.as_slice() {
            [x, y] => vertices.push(Point::new(*x, *y)),
            _ => return None,
        }
    }
    if vertices.len() < mode.vertex_count() {
        return None;
    }

    let wall = match mode {
        DetectionMode::CornerSelection => {
            Wall::from_side(color, vertices[0].distance_to(&vertices[1]))
        }
        DetectionMode::Rectangle => {
            let (side1, side2) = rectangle_sides(&vertices[0], &vertices[1], &vertices[2], &vertices[3]);
            Wall::from_rect_sides(color, side1, side2)
        }
    };

    Some(wall)
}

/// The two sides of a rectangle given its corners in any order.
/// Of the three distances from the first corner, the longest is the diagonal.
pub fn rectangle_sides(p1: &Point, p2: &Point, p3: &Point, p4: &Point) -> (f64, f64) {
    let length1 = p1.distance_to(p2);
    let length2 = p1.distance_to(p3);
    let length3 = p1.distance_to(p4);

    if length1 > length2 && length1 > length3 {
        (length2, length3)
    } else if length2 > length1 && length2 > length3 {
        (length1, length3)
    } else {
        (length1, length2)
    }
}

fn parse_tuple(field: &str) -> Option<Vec<f64>> {
    let inner = field.trim().strip_prefix('(')?.strip_suffix(')')?;
    inner
        .split(',')
        .map(|value| value.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT_LINE: &str = "\"(0, 255, 255)\",\"(0, 0)\",\"(100, 0)\",\"(100, 10)\",\"(0, 10)\"\n";

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn test_rectangle_sides_drop_diagonal() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(100.0, 0.0);
        let p3 = Point::new(100.0, 10.0);
        let p4 = Point::new(0.0, 10.0);

        let (a, b) = rectangle_sides(&p1, &p2, &p3, &p4);
        assert_eq!((a, b), (100.0, 10.0));

        // Diagonal listed first
        let (a, b) = rectangle_sides(&p1, &p3, &p2, &p4);
        assert_eq!((a, b), (100.0, 10.0));
    }

    #[test]
    fn test_parse_rectangle_line() {
        let walls = parse_detections(RECT_LINE.as_bytes(), DetectionMode::Rectangle);

        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].color, Hsv::new(0, 255, 255));
        assert_eq!(walls[0].sides(), &[100.0, 10.0]);
        assert_eq!(walls[0].length, 0.0);
    }

    #[test]
    fn test_parse_corner_line() {
        let input = "\"(10, 20, 30)\",\"(1.5, 2)\",\"(4.5, 6)\"\n";
        let walls = parse_detections(input.as_bytes(), DetectionMode::CornerSelection);

        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].sides(), &[5.0]);
    }

    #[test]
    fn test_corner_mode_ignores_extra_vertices() {
        let walls = parse_detections(RECT_LINE.as_bytes(), DetectionMode::CornerSelection);
        assert_eq!(walls[0].sides(), &[100.0]);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let input = format!(
            "garbage\n\"(1, 2)\",\"(0, 0)\",\"(1, 1)\"\n\"(1, 2, 3)\",\"(0, 0)\",\"(1, 1)\"\n{}",
            RECT_LINE
        );
        let walls = parse_detections(input.as_bytes(), DetectionMode::Rectangle);

        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].color, Hsv::new(0, 255, 255));
    }

    #[test]
    fn test_non_finite_coordinates_skipped() {
        let input = format!(
            "\"(0, 255, 255)\",\"(NaN, 0)\",\"(100, 0)\",\"(100, 10)\",\"(0, 10)\"\n\
             \"(0, 255, 255)\",\"(0, 0)\",\"(inf, 0)\",\"(100, 10)\",\"(0, 10)\"\n\
             \"(NaN, 1, 2)\",\"(0, 0)\",\"(100, 0)\",\"(100, 10)\",\"(0, 10)\"\n{}",
            RECT_LINE
        );
        let walls = parse_detections(input.as_bytes(), DetectionMode::Rectangle);

        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].sides(), &[100.0, 10.0]);
    }

    #[test]
    fn test_color_components_saturate() {
        let input = "\"(300, -5, 12.7)\",\"(0, 0)\",\"(3, 4)\"\n";
        let walls = parse_detections(input.as_bytes(), DetectionMode::CornerSelection);

        assert_eq!(walls[0].color, Hsv::new(255, 0, 12));
    }

    #[test]
    fn test_missing_file_yields_no_walls() {
        let dir = tempfile::tempdir().unwrap();
        let walls = read_detection_file(&dir.path().join("missing.csv"), DetectionMode::Rectangle).unwrap();
        assert!(walls.is_empty());
    }
}

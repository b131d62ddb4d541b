use crate::geometry::DetectionMode;
use crate::model::Wall;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Rejects detected rectangles that are not plausibly walls and scales the
/// survivors' lengths into real units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFilter {
    /// Real-world units per detected pixel
    pub scale: f64,
    /// Minimum long/short side ratio for a rectangle to count as a wall
    pub noise_threshold: f64,
    pub min_short_side: f64,
    pub max_short_side: f64,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            scale: 1.0,
            noise_threshold: 5.0,
            min_short_side: 5.0,
            max_short_side: 1000.0,
        }
    }
}

impl NoiseFilter {
    pub fn new(scale: f64, noise_threshold: f64) -> Self {
        Self {
            scale,
            noise_threshold,
            ..Self::default()
        }
    }

    /// Sets the wall length if the wall is accepted
    pub fn accept(&self, wall: &mut Wall, mode: DetectionMode) -> bool {
        match self.scaled_length(wall.sides(), mode) {
            Some(length) => {
                wall.length = length;
                true
            }
            None => false,
        }
    }

    fn scaled_length(&self, sides: &[f64], mode: DetectionMode) -> Option<f64> {
        if sides.iter().any(|side| !side.is_finite()) {
            return None;
        }
        let length = match (mode, sides) {
            (DetectionMode::CornerSelection, &[side]) => Some(side * self.scale),
            (DetectionMode::Rectangle, &[side1, side2]) => {
                let (long, short) = if side1 >= side2 {
                    (side1, side2)
                } else {
                    (side2, side1)
                };
                if short == 0.0 || long / short < self.noise_threshold {
                    return None;
                }
                if short < self.min_short_side || short > self.max_short_side {
                    return None;
                }
                Some(long * self.scale)
            }
            _ => None,
        }?;

        length.is_finite().then_some(length)
    }

    /// Keeps accepted walls in their original order
    pub fn filter_walls(&self, walls: Vec<Wall>, mode: DetectionMode) -> Vec<Wall> {
        let detected = walls.len();
        let kept: Vec<Wall> = walls
            .into_iter()
            .filter_map(|mut wall| {
                if self.accept(&mut wall, mode) {
                    Some(wall)
                } else {
                    debug!("Discarding noise with sides {:?}", wall.sides());
                    None
                }
            })
            .collect();

        info!(
            "Noise filter kept {} of {} detected walls (threshold {:.2}, scale {})",
            kept.len(),
            detected,
            self.noise_threshold,
            self.scale
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hsv;

    fn rect(side1: f64, side2: f64) -> Wall {
        Wall::from_rect_sides(Hsv::default(), side1, side2)
    }

    #[test]
    fn test_accepts_long_thin_rectangle() {
        let filter = NoiseFilter::new(0.5, 5.0);
        let mut wall = rect(10.0, 100.0);

        assert!(filter.accept(&mut wall, DetectionMode::Rectangle));
        assert_eq!(wall.length, 50.0);
    }

    #[test]
    fn test_rejects_square_blob() {
        let filter = NoiseFilter::default();
        let mut wall = rect(40.0, 30.0);

        assert!(!filter.accept(&mut wall, DetectionMode::Rectangle));
        assert_eq!(wall.length, 0.0);
    }

    #[test]
    fn test_ratio_at_threshold_is_accepted() {
        let filter = NoiseFilter::default();
        assert!(filter.accept(&mut rect(50.0, 10.0), DetectionMode::Rectangle));
    }

    #[test]
    fn test_short_side_bounds() {
        let filter = NoiseFilter::default();
        assert!(!filter.accept(&mut rect(100.0, 4.0), DetectionMode::Rectangle));
        assert!(filter.accept(&mut rect(100.0, 5.0), DetectionMode::Rectangle));
        assert!(filter.accept(&mut rect(10000.0, 1000.0), DetectionMode::Rectangle));
        assert!(!filter.accept(&mut rect(10000.0, 1001.0), DetectionMode::Rectangle));
    }

    #[test]
    fn test_zero_side_discarded() {
        let filter = NoiseFilter::default();
        assert!(!filter.accept(&mut rect(100.0, 0.0), DetectionMode::Rectangle));
        assert!(!filter.accept(&mut rect(0.0, 0.0), DetectionMode::Rectangle));
    }

    #[test]
    fn test_corner_selection_always_accepted() {
        let filter = NoiseFilter::new(2.0, 5.0);
        let mut wall = Wall::from_side(Hsv::default(), 3.0);

        assert!(filter.accept(&mut wall, DetectionMode::CornerSelection));
        assert_eq!(wall.length, 6.0);
    }

    #[test]
    fn test_mode_mismatch_discarded() {
        let filter = NoiseFilter::default();
        let mut wall = Wall::from_side(Hsv::default(), 3.0);
        assert!(!filter.accept(&mut wall, DetectionMode::Rectangle));
    }

    #[test]
    fn test_non_finite_sides_discarded() {
        let filter = NoiseFilter::default();
        assert!(!filter.accept(&mut rect(f64::NAN, 10.0), DetectionMode::Rectangle));
        assert!(!filter.accept(&mut rect(f64::INFINITY, 10.0), DetectionMode::Rectangle));

        let mut wall = Wall::from_side(Hsv::default(), f64::NAN);
        assert!(!filter.accept(&mut wall, DetectionMode::CornerSelection));
        assert_eq!(wall.length, 0.0);
    }

    #[test]
    fn test_overflowing_scale_discarded() {
        let filter = NoiseFilter::new(f64::MAX, 5.0);
        assert!(!filter.accept(&mut rect(100.0, 10.0), DetectionMode::Rectangle));
    }

    #[test]
    fn test_filter_preserves_order() {
        let filter = NoiseFilter::default();
        let walls = vec![rect(100.0, 10.0), rect(20.0, 20.0), rect(10.0, 200.0)];

        let kept = filter.filter_walls(walls, DetectionMode::Rectangle);

        let lengths: Vec<f64> = kept.iter().map(|w| w.length).collect();
        assert_eq!(lengths, vec![100.0, 200.0]);
    }
}

//! Geometry and collision utilities.
//!
//! The arena is a bounded plane with the origin in the top-left corner and
//! +y pointing down. Angles are radians measured from +x towards +y, so
//! "above" an entity means a smaller y coordinate.
//!
//! All positions use [`glam::Vec2`]. The simulation is deterministic because
//! every run performs the same float operations in the same order, not
//! because the math is fixed-point.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default arena width in world units.
pub const MAP_WIDTH: f32 = 5000.0;

/// Default arena height in world units.
pub const MAP_HEIGHT: f32 = 5000.0;

/// Thickness of the border walls; entity positions stay this far inside the
/// map edge in addition to their own radius.
pub const WALL_MARGIN: f32 = 50.0;

/// Factor applied to per-axis speed when moving diagonally.
pub const DIAGONAL_FACTOR: f32 = 0.707;

/// Rectangular extent of the playable arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::new(MAP_WIDTH, MAP_HEIGHT)
    }
}

impl MapBounds {
    /// Create map bounds of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of the map.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether a point lies inside the map (edges inclusive).
    #[must_use]
    pub fn contains(self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Clamp an entity center so its circle stays clear of the border walls.
    #[must_use]
    pub fn clamp_entity(self, position: Vec2, radius: f32) -> Vec2 {
        let inset = radius + WALL_MARGIN;
        Vec2::new(
            position.x.clamp(inset, (self.width - inset).max(inset)),
            position.y.clamp(inset, (self.height - inset).max(inset)),
        )
    }

    /// Clamp a point into `[margin, size - margin]` on both axes.
    #[must_use]
    pub fn clamp_inset(self, position: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            position.x.clamp(margin, (self.width - margin).max(margin)),
            position.y.clamp(margin, (self.height - margin).max(margin)),
        )
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closest point inside the rectangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.x, self.x + self.width),
            point.y.clamp(self.y, self.y + self.height),
        )
    }
}

/// Whether two circles overlap (touching does not count).
#[must_use]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Whether a circle overlaps a rectangle, via the rectangle's closest point.
#[must_use]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    center.distance_squared(rect.closest_point(center)) < radius * radius
}

/// Whether a point lies inside a rectangle (edges inclusive).
#[must_use]
pub fn point_in_rect(point: Vec2, rect: &Rect) -> bool {
    point.x >= rect.x
        && point.x <= rect.x + rect.width
        && point.y >= rect.y
        && point.y <= rect.y + rect.height
}

/// Unit vector for an angle in radians.
#[must_use]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the vector pointing from `from` to `to`.
#[must_use]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Absolute angular difference wrapped into `[0, PI]`.
#[must_use]
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(std::f32::consts::TAU);
    if diff > std::f32::consts::PI {
        std::f32::consts::TAU - diff
    } else {
        diff
    }
}

/// Round half away from zero and convert to an integer amount.
#[must_use]
pub fn round_to_i32(value: f32) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_circles_overlap() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_overlap(a, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circles_overlap(a, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_circle_rect_overlap_uses_closest_point() {
        let rect = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert!(circle_rect_overlap(Vec2::new(95.0, 120.0), 6.0, &rect));
        assert!(!circle_rect_overlap(Vec2::new(95.0, 120.0), 5.0, &rect));
        // Corner case: distance to corner is sqrt(50)
        assert!(!circle_rect_overlap(Vec2::new(95.0, 95.0), 7.0, &rect));
        assert!(circle_rect_overlap(Vec2::new(95.0, 95.0), 7.1, &rect));
    }

    #[test]
    fn test_point_in_rect_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_rect(Vec2::new(10.0, 10.0), &rect));
        assert!(point_in_rect(Vec2::new(5.0, 0.0), &rect));
        assert!(!point_in_rect(Vec2::new(10.1, 5.0), &rect));
    }

    #[test]
    fn test_clamp_entity() {
        let bounds = MapBounds::default();
        let clamped = bounds.clamp_entity(Vec2::new(-100.0, 6000.0), 20.0);
        assert_eq!(clamped, Vec2::new(70.0, 4930.0));
    }

    #[test]
    fn test_angle_difference_wraps() {
        assert!((angle_difference(0.1, -0.1) - 0.2).abs() < 1e-5);
        assert!((angle_difference(PI - 0.05, -PI + 0.05) - 0.1).abs() < 1e-4);
        assert!((angle_difference(FRAC_PI_2, 0.0) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_angle_to_and_direction() {
        let angle = angle_to(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((angle - FRAC_PI_2).abs() < 1e-6);
        let dir = direction(angle);
        assert!(dir.x.abs() < 1e-6);
        assert!((dir.y - 1.0).abs() < 1e-6);
    }
}

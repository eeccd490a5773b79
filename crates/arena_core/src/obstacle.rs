//! Static obstacles and the map layouts that produce them.
//!
//! Obstacles are immutable axis-aligned rectangles. They block movement of
//! every circle-shaped entity and stop projectiles dead. Grenades bounce off
//! them instead.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::math::{circle_rect_overlap, point_in_rect, MapBounds, Rect, WALL_MARGIN};

/// Distance a robot is shoved away from an obstacle it ended up inside.
pub const PUSH_OUT_DISTANCE: f32 = 5.0;

/// A static, impassable rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Extent of the obstacle.
    pub rect: Rect,
}

impl Obstacle {
    /// Create an obstacle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
        }
    }

    /// Whether a circle overlaps this obstacle.
    #[must_use]
    pub fn collides_circle(&self, center: Vec2, radius: f32) -> bool {
        circle_rect_overlap(center, radius, &self.rect)
    }

    /// Whether a point lies inside this obstacle.
    #[must_use]
    pub fn collides_point(&self, point: Vec2) -> bool {
        point_in_rect(point, &self.rect)
    }

    /// Position nudged [`PUSH_OUT_DISTANCE`] away from the obstacle's center.
    #[must_use]
    pub fn push_out(&self, position: Vec2) -> Vec2 {
        let away = position - self.rect.center();
        let dir = away.try_normalize().unwrap_or(Vec2::X);
        position + dir * PUSH_OUT_DISTANCE
    }
}

/// Whether any obstacle overlaps the circle.
#[must_use]
pub fn any_collides_circle(obstacles: &[Obstacle], center: Vec2, radius: f32) -> bool {
    obstacles.iter().any(|o| o.collides_circle(center, radius))
}

/// The four walls lining the map edge.
#[must_use]
pub fn border_walls(bounds: MapBounds) -> [Obstacle; 4] {
    let t = WALL_MARGIN;
    [
        Obstacle::new(0.0, 0.0, bounds.width, t),
        Obstacle::new(0.0, bounds.height - t, bounds.width, t),
        Obstacle::new(0.0, 0.0, t, bounds.height),
        Obstacle::new(bounds.width - t, 0.0, t, bounds.height),
    ]
}

/// Find a spot near `start` where a circle of `radius` touches no obstacle.
///
/// Probes rings of 50..500 units in 45 degree steps; returns `start` when
/// nothing is free.
#[must_use]
pub fn find_safe_position(
    obstacles: &[Obstacle],
    bounds: MapBounds,
    start: Vec2,
    radius: f32,
) -> Vec2 {
    if !any_collides_circle(obstacles, start, radius) {
        return start;
    }
    for dist in (50..500).step_by(50) {
        for step in 0..8 {
            let angle = (step as f32 * 45.0).to_radians();
            let probe = start + Vec2::new(angle.cos(), angle.sin()) * dist as f32;
            let probe = bounds.clamp_inset(probe, 100.0);
            if !any_collides_circle(obstacles, probe, radius) {
                return probe;
            }
        }
    }
    start
}

/// Supplies the interior obstacles of a map. Border walls are added by the
/// simulation regardless of the source.
pub trait ObstacleSource {
    /// Produce the obstacles for a map of the given size.
    fn obstacles(&self, bounds: MapBounds, rng: &mut Pcg32) -> Vec<Obstacle>;
}

/// A fixed list of obstacles, typically loaded from a match config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticLayout(pub Vec<Obstacle>);

impl ObstacleSource for StaticLayout {
    fn obstacles(&self, _bounds: MapBounds, _rng: &mut Pcg32) -> Vec<Obstacle> {
        self.0.clone()
    }
}

/// Built-in map layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MapLayout {
    /// Sixty randomly sized crates scattered away from the center.
    #[default]
    Random,
    /// Central pillar with two rings of pillars.
    Arena,
    /// Long walls forming corridors plus a gated center room.
    Corridors,
    /// Four corner forts and a center cross.
    Fortress,
    /// Four pillars near the center, otherwise open.
    Open,
    /// Border walls only.
    Empty,
}

impl MapLayout {
    fn random(bounds: MapBounds, rng: &mut Pcg32, out: &mut Vec<Obstacle>) {
        let center = bounds.center();
        for _ in 0..60 {
            let width = rng.random_range(60..=150) as f32;
            let height = rng.random_range(60..=150) as f32;
            let max_x = (bounds.width - 100.0 - width).max(100.0) as i32;
            let max_y = (bounds.height - 100.0 - height).max(100.0) as i32;
            let x = rng.random_range(100..=max_x) as f32;
            let y = rng.random_range(100..=max_y) as f32;
            // Keep the spawn area clear
            if (x + width / 2.0 - center.x).abs() > 200.0
                || (y + height / 2.0 - center.y).abs() > 200.0
            {
                out.push(Obstacle::new(x, y, width, height));
            }
        }
    }

    fn arena(bounds: MapBounds, out: &mut Vec<Obstacle>) {
        let c = bounds.center();
        out.push(Obstacle::new(c.x - 75.0, c.y - 75.0, 150.0, 150.0));
        for i in 0..8 {
            let angle = std::f32::consts::TAU * i as f32 / 8.0;
            let x = (c.x + angle.cos() * 400.0 - 40.0).trunc();
            let y = (c.y + angle.sin() * 400.0 - 40.0).trunc();
            out.push(Obstacle::new(x, y, 80.0, 80.0));
        }
        for i in 0..12 {
            let angle = std::f32::consts::TAU * i as f32 / 12.0 + 0.26;
            let x = (c.x + angle.cos() * 700.0 - 50.0).trunc();
            let y = (c.y + angle.sin() * 700.0 - 50.0).trunc();
            out.push(Obstacle::new(x, y, 100.0, 100.0));
        }
    }

    fn corridors(bounds: MapBounds, out: &mut Vec<Obstacle>) {
        let (w, h) = (bounds.width, bounds.height);
        let wall = 600.0;
        out.extend([
            Obstacle::new(400.0, 100.0, 60.0, wall),
            Obstacle::new(400.0, h - wall - 100.0, 60.0, wall),
            Obstacle::new(w - 460.0, 100.0, 60.0, wall),
            Obstacle::new(w - 460.0, h - wall - 100.0, 60.0, wall),
            Obstacle::new(100.0, 400.0, wall, 60.0),
            Obstacle::new(w - wall - 100.0, 400.0, wall, 60.0),
            Obstacle::new(100.0, h - 460.0, wall, 60.0),
            Obstacle::new(w - wall - 100.0, h - 460.0, wall, 60.0),
        ]);

        let c = bounds.center();
        let room = 300.0;
        let gap = 75.0;
        let side = room - gap;
        out.extend([
            Obstacle::new(c.x - room, c.y - room, side, 40.0),
            Obstacle::new(c.x + gap, c.y - room, side, 40.0),
            Obstacle::new(c.x - room, c.y + room - 40.0, side, 40.0),
            Obstacle::new(c.x + gap, c.y + room - 40.0, side, 40.0),
            Obstacle::new(c.x - room, c.y - room, 40.0, side),
            Obstacle::new(c.x - room, c.y + gap, 40.0, side),
            Obstacle::new(c.x + room - 40.0, c.y - room, 40.0, side),
            Obstacle::new(c.x + room - 40.0, c.y + gap, 40.0, side),
        ]);
    }

    fn fortress(bounds: MapBounds, out: &mut Vec<Obstacle>) {
        let size = 250.0;
        let thick = 50.0;
        let half_side = 75.0;
        let corners = [
            (150.0, 150.0),
            (bounds.width - 150.0 - size, 150.0),
            (150.0, bounds.height - 150.0 - size),
            (bounds.width - 150.0 - size, bounds.height - 150.0 - size),
        ];
        for (fx, fy) in corners {
            out.extend([
                Obstacle::new(fx, fy, size, thick),
                Obstacle::new(fx, fy + size - thick, half_side, thick),
                Obstacle::new(fx + 175.0, fy + size - thick, half_side, thick),
                Obstacle::new(fx, fy, thick, half_side),
                Obstacle::new(fx, fy + 175.0, thick, half_side),
                Obstacle::new(fx + size - thick, fy, thick, size),
            ]);
        }
        let c = bounds.center();
        out.push(Obstacle::new(c.x - 150.0, c.y - 30.0, 300.0, 60.0));
        out.push(Obstacle::new(c.x - 30.0, c.y - 150.0, 60.0, 300.0));
    }

    fn open(bounds: MapBounds, out: &mut Vec<Obstacle>) {
        let c = bounds.center();
        let d = 350.0;
        let s = 80.0;
        out.extend([
            Obstacle::new(c.x - d, c.y - d, s, s),
            Obstacle::new(c.x + d - s, c.y - d, s, s),
            Obstacle::new(c.x - d, c.y + d - s, s, s),
            Obstacle::new(c.x + d - s, c.y + d - s, s, s),
        ]);
    }
}

impl ObstacleSource for MapLayout {
    fn obstacles(&self, bounds: MapBounds, rng: &mut Pcg32) -> Vec<Obstacle> {
        let mut out = Vec::new();
        match self {
            MapLayout::Random => Self::random(bounds, rng, &mut out),
            MapLayout::Arena => Self::arena(bounds, &mut out),
            MapLayout::Corridors => Self::corridors(bounds, &mut out),
            MapLayout::Fortress => Self::fortress(bounds, &mut out),
            MapLayout::Open => Self::open(bounds, &mut out),
            MapLayout::Empty => {}
        }
        out
    }
}

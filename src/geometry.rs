//! Coordinate geometry shared by the scene builders.
//!
//! All positions are in pixels with the y axis pointing down, matching the
//! 800x600 canvas the scenes are laid out on.

use crate::error::SceneError;
use glam::Vec2;
use std::f32::consts::TAU;

/// Smallest width, height or radius a built body may have.
pub const MIN_EXTENT: f32 = 1.0;

/// Smallest constraint stiffness; zero would detach the constraint.
pub const MIN_STIFFNESS: f32 = 1e-4;

/// Incline angles are kept inside `[MIN_INCLINE_DEG, MAX_INCLINE_DEG]` so the
/// base width `height / tan(angle)` stays finite and non-zero.
pub const MIN_INCLINE_DEG: f32 = 1.0;
pub const MAX_INCLINE_DEG: f32 = 89.0;

#[inline]
pub fn to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Clamp a size to [`MIN_EXTENT`], rejecting non-finite input.
pub fn extent(name: &str, value: f32) -> Result<f32, SceneError> {
    if !value.is_finite() {
        return Err(SceneError::DegenerateGeometry(format!("{} is not finite", name)));
    }
    Ok(value.max(MIN_EXTENT))
}

/// Clamp a stiffness into `[MIN_STIFFNESS, 1]`.
pub fn stiffness(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_STIFFNESS, 1.0)
    } else {
        MIN_STIFFNESS
    }
}

/// Right-angled inclined plane standing on a ground line.
///
/// The vertical leg is on the left; the slope falls to the right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Incline {
    height: f32,
    angle: f32,
    base_width: f32,
}

impl Incline {
    /// Derive the incline from its fixed height and slope angle in degrees.
    ///
    /// The angle is floored/capped to keep `tan` well defined; a non-positive
    /// height cannot be repaired and is reported as degenerate.
    pub fn new(height: f32, angle_deg: f32) -> Result<Self, SceneError> {
        if !height.is_finite() || height < MIN_EXTENT {
            return Err(SceneError::DegenerateGeometry(format!(
                "incline height {} is too small",
                height
            )));
        }
        if !angle_deg.is_finite() {
            return Err(SceneError::DegenerateGeometry("incline angle is not finite".into()));
        }
        let angle = to_radians(angle_deg.clamp(MIN_INCLINE_DEG, MAX_INCLINE_DEG));
        Ok(Self {
            height,
            angle,
            base_width: height / angle.tan(),
        })
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Slope angle in radians (after clamping).
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn base_width(&self) -> f32 {
        self.base_width
    }

    /// World-space corners: base-left, base-right, apex.
    pub fn vertices(&self, left: f32, ground_y: f32) -> [Vec2; 3] {
        [
            Vec2::new(left, ground_y),
            Vec2::new(left + self.base_width, ground_y),
            Vec2::new(left, ground_y - self.height),
        ]
    }

    /// Unit vector pointing down the slope.
    pub fn down_slope(&self) -> Vec2 {
        Vec2::new(self.angle.cos(), self.angle.sin())
    }

    /// Unit normal of the slope pointing away from the incline.
    pub fn surface_normal(&self) -> Vec2 {
        Vec2::new(self.angle.sin(), -self.angle.cos())
    }

    /// Centre of a body resting on the slope `distance` pixels below the apex,
    /// lifted off the surface by `clearance` (half-size or radius).
    pub fn resting_position(&self, left: f32, ground_y: f32, distance: f32, clearance: f32) -> Vec2 {
        let apex = Vec2::new(left, ground_y - self.height);
        let along = distance.clamp(0.0, self.slope_length());
        apex + self.down_slope() * along + self.surface_normal() * clearance
    }

    pub fn slope_length(&self) -> f32 {
        (self.height * self.height + self.base_width * self.base_width).sqrt()
    }
}

/// Position of a pendulum bob hanging from `pivot` at `angle` radians from vertical.
pub fn pendulum_bob(pivot: Vec2, length: f32, angle: f32) -> Vec2 {
    pivot + Vec2::new(angle.sin(), angle.cos()) * length
}

/// `count` points evenly spaced on a circle, starting at `start_angle`.
pub fn ring_positions(center: Vec2, radius: f32, count: usize, start_angle: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = start_angle + i as f32 * TAU / count as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Signed area of a polygon (shoelace formula).
pub fn polygon_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Area centroid of a simple polygon. Falls back to the vertex average for
/// zero-area input.
pub fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    let area = polygon_area(vertices);
    if area.abs() < f32::EPSILON {
        let sum: Vec2 = vertices.iter().copied().sum();
        return sum / vertices.len().max(1) as f32;
    }
    let n = vertices.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        c += (a + b) * a.perp_dot(b);
    }
    c / (6.0 * area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incline_base_width() {
        let incline = Incline::new(300.0, 30.0).unwrap();
        assert!((incline.base_width() - 519.615).abs() < 0.01);
    }

    #[test]
    fn test_incline_zero_angle_is_floored() {
        let incline = Incline::new(300.0, 0.0).unwrap();
        assert!(incline.base_width().is_finite());
        assert!(incline.base_width() > 0.0);
        assert!((to_degrees(incline.angle()) - MIN_INCLINE_DEG).abs() < 1e-4);
    }

    #[test]
    fn test_incline_zero_height_is_degenerate() {
        assert!(matches!(
            Incline::new(0.0, 30.0),
            Err(SceneError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_resting_position_is_above_slope() {
        let incline = Incline::new(300.0, 30.0).unwrap();
        let p = incline.resting_position(100.0, 550.0, 50.0, 10.0);
        // Point on the slope directly below has larger y (further down the screen)
        let slope_y = 250.0 + (p.x - 100.0) * incline.height() / incline.base_width();
        assert!(p.y < slope_y);
    }

    #[test]
    fn test_pendulum_bob() {
        let p = pendulum_bob(Vec2::new(400.0, 230.0), 200.0, 0.0);
        assert_eq!(p, Vec2::new(400.0, 430.0));
    }

    #[test]
    fn test_ring_positions() {
        let pts = ring_positions(Vec2::ZERO, 150.0, 3, -std::f32::consts::FRAC_PI_2);
        assert_eq!(pts.len(), 3);
        assert!((pts[0] - Vec2::new(0.0, -150.0)).length() < 1e-3);
    }

    #[test]
    fn test_polygon_centroid_of_triangle() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0)];
        let c = polygon_centroid(&tri);
        assert!((c - Vec2::new(1.0, 1.0)).length() < 1e-5);
        assert!((polygon_area(&tri).abs() - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_stiffness_floor() {
        assert_eq!(stiffness(0.0), MIN_STIFFNESS);
        assert_eq!(stiffness(2.0), 1.0);
        assert_eq!(stiffness(f32::NAN), MIN_STIFFNESS);
    }
}

//! Fading motion trails.
//!
//! A trail remembers the last positions of one body, stamped with simulated
//! time, and hands the renderer line segments whose opacity falls off with
//! age. Simulated rather than wall-clock time keeps a paused trail frozen.

use glam::Vec2;
use std::collections::VecDeque;

/// Which body to follow and how long the trail is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSpec {
    /// Blueprint-local index of the followed body.
    pub body: usize,
    /// Maximum number of remembered points.
    pub capacity: usize,
    /// Seconds for a point to fade out completely.
    pub fade_secs: f32,
}

impl TrailSpec {
    pub fn new(body: usize) -> Self {
        Self {
            body,
            capacity: 150,
            fade_secs: 5.0,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(2);
        self
    }

    pub fn with_fade(mut self, fade_secs: f32) -> Self {
        self.fade_secs = fade_secs.max(f32::EPSILON);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TrailPoint {
    position: Vec2,
    time: f64,
}

/// One drawable piece of a trail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSegment {
    pub from: Vec2,
    pub to: Vec2,
    /// Opacity in `[0, 1]`, newer segments are more opaque.
    pub alpha: f32,
}

/// Bounded history of positions.
#[derive(Clone, Debug)]
pub struct Trail {
    spec: TrailSpec,
    points: VecDeque<TrailPoint>,
}

impl Trail {
    pub fn new(spec: TrailSpec) -> Self {
        Self {
            spec,
            points: VecDeque::with_capacity(spec.capacity),
        }
    }

    pub fn spec(&self) -> TrailSpec {
        self.spec
    }

    /// Remember a position at simulated time `time` (seconds).
    pub fn record(&mut self, position: Vec2, time: f64) {
        self.points.push_back(TrailPoint { position, time });
        while self.points.len() > self.spec.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Segments between consecutive points, faded by the age of their start.
    pub fn segments(&self, now: f64) -> impl Iterator<Item = TrailSegment> + '_ {
        let fade = self.spec.fade_secs as f64;
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(move |(a, b)| {
                let age = (now - a.time) / fade;
                TrailSegment {
                    from: a.position,
                    to: b.position,
                    alpha: (1.0 - age).clamp(0.0, 1.0) as f32,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_is_bounded() {
        let mut trail = Trail::new(TrailSpec::new(0).with_capacity(3));
        for i in 0..10 {
            trail.record(Vec2::new(i as f32, 0.0), i as f64);
        }
        assert_eq!(trail.len(), 3);
        let first = trail.segments(9.0).next().unwrap();
        assert_eq!(first.from.x, 7.0);
    }

    #[test]
    fn test_segments_fade_with_age() {
        let mut trail = Trail::new(TrailSpec::new(0).with_fade(5.0));
        trail.record(Vec2::ZERO, 0.0);
        trail.record(Vec2::X, 2.5);
        trail.record(Vec2::Y, 5.0);
        let segments: Vec<_> = trail.segments(5.0).collect();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].alpha.abs() < 1e-6);
        assert!((segments[1].alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_point_has_no_segments() {
        let mut trail = Trail::new(TrailSpec::new(0));
        trail.record(Vec2::ZERO, 0.0);
        assert_eq!(trail.segments(0.0).count(), 0);
    }
}

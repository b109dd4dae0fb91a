//! Pendulums and Newton's cradle.

use super::ground;
use crate::error::SceneError;
use crate::geometry::{extent, pendulum_bob};
use crate::params::{ParamSnapshot, Parameter};
use crate::scene::{Blueprint, Scene};
use crate::trail::TrailSpec;
use crate::world::{Anchor, BodyDesc, Color, ConstraintDesc, Style};
use glam::Vec2;

pub const SIMPLE_PENDULUM: &str = "Simple Pendulum";
pub const DOUBLE_PENDULUM: &str = "Double Pendulum";
pub const NEWTONS_CRADLE: &str = "Newton's Cradle";

const STRING: Style = Style::line(Color::WHITE, 1.0);

pub fn simple_pendulum() -> Scene {
    Scene::new(SIMPLE_PENDULUM)
        .with_description("Bob on a rigid string released from an angle")
        .with_parameter(Parameter::range("initial_angle", "Initial Angle (degrees)", 30.0, -90.0, 90.0, 1.0))
        .with_parameter(Parameter::range("pendulum_length", "Pendulum Length", 200.0, 50.0, 300.0, 1.0))
        .with_permanent(ground())
        .with_dragging()
        .with_builder(build_simple_pendulum)
}

fn build_simple_pendulum(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let pivot = Vec2::new(400.0, 230.0);
    let length = extent("pendulum length", p.get_f32("pendulum_length")?)?;
    let angle = p.get_radians("initial_angle")?;

    let mut bp = Blueprint::new();
    let bob = bp.add_body(
        BodyDesc::circle(pendulum_bob(pivot, length, angle), 25.0)
            .with_restitution(0.9)
            .with_friction(0.002)
            .with_style(Style::fill(Color::BALL)),
    );
    bp.add_constraint(
        ConstraintDesc::new(Anchor::Point(pivot), Anchor::body(bob))
            .with_length(length)
            .with_style(STRING),
    );
    Ok(bp)
}

pub fn double_pendulum() -> Scene {
    Scene::new(DOUBLE_PENDULUM)
        .with_description("Two linked pendulums with a fading trail")
        .with_parameter(Parameter::range("angle_1", "Initial Angle 1 (degrees)", 60.0, -180.0, 180.0, 1.0))
        .with_parameter(Parameter::range("angle_2", "Initial Angle 2 (degrees)", 45.0, -180.0, 180.0, 1.0))
        .with_parameter(Parameter::range("length_1", "Pendulum Length 1", 150.0, 50.0, 300.0, 1.0))
        .with_parameter(Parameter::range("length_2", "Pendulum Length 2", 150.0, 50.0, 300.0, 1.0))
        .with_permanent(ground())
        .with_dragging()
        .with_builder(build_double_pendulum)
}

/// The second angle is measured from vertical at the first bob, not
/// relative to the first rod.
fn build_double_pendulum(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let pivot = Vec2::new(400.0, 200.0);
    let l1 = extent("pendulum length 1", p.get_f32("length_1")?)?;
    let l2 = extent("pendulum length 2", p.get_f32("length_2")?)?;
    let first = pendulum_bob(pivot, l1, p.get_radians("angle_1")?);
    let second = pendulum_bob(first, l2, p.get_radians("angle_2")?);

    let mut bp = Blueprint::new();
    let b1 = bp.add_body(
        BodyDesc::circle(first, 20.0)
            .with_restitution(0.9)
            .with_friction(0.002)
            .with_density(0.001)
            .with_style(Style::fill(Color::BALL)),
    );
    let b2 = bp.add_body(
        BodyDesc::circle(second, 15.0)
            .with_restitution(0.9)
            .with_friction(0.002)
            .with_density(0.0008)
            .with_style(Style::fill(Color::BLUE)),
    );
    bp.add_constraint(
        ConstraintDesc::new(Anchor::Point(pivot), Anchor::body(b1))
            .with_length(l1)
            .with_style(STRING),
    );
    bp.add_constraint(
        ConstraintDesc::new(Anchor::body(b1), Anchor::body(b2))
            .with_length(l2)
            .with_style(STRING),
    );
    bp.set_trail(TrailSpec::new(b2).with_capacity(150).with_fade(5.0));
    Ok(bp)
}

pub fn newtons_cradle() -> Scene {
    Scene::new(NEWTONS_CRADLE)
        .with_description("Conservation of momentum and energy in a row of balls")
        .with_parameter(Parameter::range("ball_count", "Number of Balls", 5.0, 3.0, 10.0, 1.0))
        .with_parameter(Parameter::range("string_length", "String Length", 100.0, 50.0, 200.0, 1.0))
        .with_parameter(Parameter::range("ball_mass", "Ball Mass", 1.0, 0.1, 10.0, 0.1))
        .with_parameter(Parameter::range("lead_ball_mass", "Lead Ball Mass", 1.0, 0.1, 10.0, 0.1))
        .with_parameter(Parameter::range("elasticity", "Elasticity", 0.99, 0.0, 1.0, 0.01))
        .with_permanent(ground())
        .with_dragging()
        .with_builder(build_newtons_cradle)
}

const CRADLE_RADIUS: f32 = 20.0;
const CRADLE_TOP: f32 = 150.0;
const CRADLE_LIFT: f32 = 100.0;

/// The lead ball starts raised on its own arc, `CRADLE_LIFT` pixels to the
/// left of its rest position (or horizontal when the string is shorter).
fn build_newtons_cradle(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let count = p.get_f32("ball_count")?.round().max(1.0) as usize;
    let length = extent("string length", p.get_f32("string_length")?)?;
    let ball_mass = p.get_f32("ball_mass")?.max(f32::EPSILON);
    let lead_mass = p.get_f32("lead_ball_mass")?.max(f32::EPSILON);
    let elasticity = p.get_f32("elasticity")?;

    let spacing = 2.0 * CRADLE_RADIUS + 2.0;
    let start_x = 400.0 - (count - 1) as f32 * spacing / 2.0;
    let lift_angle = -(CRADLE_LIFT / length).min(1.0).asin();

    let mut bp = Blueprint::new();
    for i in 0..count {
        let pivot = Vec2::new(start_x + i as f32 * spacing, CRADLE_TOP);
        let (position, mass, color) = if i == 0 {
            (pendulum_bob(pivot, length, lift_angle), lead_mass, Color::BALL)
        } else {
            (pivot + Vec2::new(0.0, length), ball_mass, Color::hex(0x367af6ff))
        };
        let ball = bp.add_body(
            BodyDesc::circle(position, CRADLE_RADIUS)
                .with_mass(mass)
                .with_restitution(elasticity)
                .with_friction(0.00001)
                .with_friction_air(0.0001)
                .with_style(Style::fill(color)),
        );
        bp.add_constraint(
            ConstraintDesc::new(Anchor::Point(pivot), Anchor::body(ball))
                .with_length(length)
                .with_stiffness(0.999)
                .with_style(Style::line(Color::hex(0x444444ff), 2.0)),
        );
    }
    Ok(bp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneEntity;

    fn bodies(bp: &Blueprint) -> Vec<&BodyDesc> {
        bp.entities()
            .iter()
            .filter_map(|e| match e {
                SceneEntity::Body(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pendulum_bob_at_angle() {
        let scene = simple_pendulum();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        let bob = bodies(&bp)[0].position;
        assert!(((bob - Vec2::new(400.0, 230.0)).length() - 200.0).abs() < 1e-3);
        assert!((bob.x - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_double_pendulum_trails_second_bob() {
        let scene = double_pendulum();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        let trail = bp.trail().unwrap();
        assert_eq!(trail.body, 1);
        assert_eq!(trail.capacity, 150);
        assert_eq!(trail.fade_secs, 5.0);
        assert_eq!(bp.constraint_count(), 2);
    }

    #[test]
    fn test_cradle_ball_count_follows_parameter() {
        let scene = newtons_cradle();
        let mut store = scene.create_store().unwrap();
        store.set("ball_count", 7.0).unwrap();
        let bp = scene.build(&store.snapshot()).unwrap();
        assert_eq!(bp.body_count(), 7);
        assert_eq!(bp.constraint_count(), 7);
    }

    #[test]
    fn test_cradle_lead_ball_is_on_its_arc() {
        let scene = newtons_cradle();
        let mut store = scene.create_store().unwrap();
        store.set("string_length", 50.0).unwrap();
        let bp = scene.build(&store.snapshot()).unwrap();
        let lead = bodies(&bp)[0].position;
        let spacing = 2.0 * CRADLE_RADIUS + 2.0;
        let pivot = Vec2::new(400.0 - 4.0 * spacing / 2.0, CRADLE_TOP);
        assert!(((lead - pivot).length() - 50.0).abs() < 1e-3);
        assert!(lead.x < pivot.x);
    }
}

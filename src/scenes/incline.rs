//! Inclined planes with an applied force.
//!
//! The applied force and its angle are live parameters: the per-tick hook
//! reads them every step, so dragging those sliders never rebuilds or pauses
//! the scene.

use super::{ground, GROUND_TOP};
use crate::error::SceneError;
use crate::geometry::{extent, to_radians, Incline};
use crate::params::{ParamSnapshot, Parameter};
use crate::scene::{Blueprint, Scene};
use crate::world::{BodyDesc, Color, Style};
use glam::Vec2;

pub const BLOCK: &str = "Inclined Plane (Block)";
pub const BALL: &str = "Inclined Plane (Ball)";

/// Fixed height of the incline's vertical leg.
pub const INCLINE_HEIGHT: f32 = 300.0;

/// x of the incline's vertical leg.
pub const INCLINE_LEFT: f32 = 100.0;

const MOVER_MASS: f32 = 10.0;

/// Newtons per slider unit, scaled to the world's force units.
const FORCE_SCALE: f32 = 0.0002;

#[derive(Clone, Copy)]
enum Mover {
    Block,
    Ball,
}

fn incline_scene(name: &str, description: &str, size: Parameter) -> Scene {
    Scene::new(name)
        .with_description(description)
        .with_parameter(Parameter::range("friction", "Friction of Surface", 0.3, 0.0, 1.0, 0.01))
        .with_parameter(
            Parameter::range("applied_force", "Applied Force Magnitude", 0.0, 0.0, 10.0, 0.1).live(),
        )
        .with_parameter(Parameter::range("force_angle", "Force Angle (degrees)", 0.0, -90.0, 90.0, 1.0).live())
        .with_parameter(Parameter::range("plane_angle", "Incline Angle (degrees)", 30.0, 10.0, 60.0, 1.0))
        .with_parameter(size)
        .with_permanent(ground())
}

pub fn block_on_incline() -> Scene {
    incline_scene(
        BLOCK,
        "Block sliding on a frictional incline under an applied force",
        Parameter::range("block_size", "Block Size", 25.0, 15.0, 50.0, 1.0),
    )
    .with_builder(|p: &ParamSnapshot| build_incline(p, Mover::Block))
}

pub fn ball_on_incline() -> Scene {
    incline_scene(
        BALL,
        "Ball rolling down a frictional incline under an applied force",
        Parameter::range("ball_radius", "Ball Radius", 25.0, 15.0, 50.0, 1.0),
    )
    .with_builder(|p: &ParamSnapshot| build_incline(p, Mover::Ball))
}

fn build_incline(p: &ParamSnapshot, mover: Mover) -> Result<Blueprint, SceneError> {
    let friction = p.get_f32("friction")?;
    let incline = Incline::new(INCLINE_HEIGHT, p.get_f32("plane_angle")?)?;

    let mut bp = Blueprint::new();
    bp.add_body(
        BodyDesc::polygon(&incline.vertices(INCLINE_LEFT, GROUND_TOP))
            .fixed()
            .with_friction(friction)
            .with_style(Style {
                fill: Color::hex(0x87cefa99),
                stroke: Some(Color::hex(0x87ceebff)),
                line_width: 2.0,
            }),
    );

    let style = Style {
        fill: Color::hex(0xff6b35ff),
        stroke: Some(Color::hex(0xcc5429ff)),
        line_width: 2.0,
    };
    let desc = match mover {
        Mover::Block => {
            let size = extent("block size", p.get_f32("block_size")?)?;
            let at = incline.resting_position(INCLINE_LEFT, GROUND_TOP, size, size / 2.0);
            BodyDesc::rectangle(at, size, size)
                .with_angle(incline.angle())
                .without_rotation()
        }
        Mover::Ball => {
            let radius = extent("ball radius", p.get_f32("ball_radius")?)?;
            let at = incline.resting_position(INCLINE_LEFT, GROUND_TOP, radius, radius);
            BodyDesc::circle(at, radius)
        }
    };
    let body = bp.add_body(
        desc.with_mass(MOVER_MASS)
            .with_friction(friction)
            .with_friction_air(0.01)
            .with_style(style),
    );

    bp.on_tick(move |ctx| {
        let force = ctx.param_f32("applied_force", 0.0);
        if force <= 0.0 {
            return;
        }
        let angle = to_radians(ctx.param_f32("force_angle", 0.0));
        ctx.apply_force(body, Vec2::new(angle.cos(), -angle.sin()) * force * FORCE_SCALE);
    });
    Ok(bp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneEntity;
    use crate::world::Shape;

    #[test]
    fn test_incline_base_width_follows_angle() {
        let scene = block_on_incline();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        let SceneEntity::Body(plane) = &bp.entities()[0] else {
            panic!("expected the incline first");
        };
        let Shape::Polygon { vertices } = &plane.shape else {
            panic!("expected a polygon");
        };
        let min_x = vertices.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
        let max_x = vertices.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
        assert!((max_x - min_x - 519.615).abs() < 0.01);
    }

    #[test]
    fn test_ball_variant_builds_circle() {
        let scene = ball_on_incline();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        match &bp.entities()[1] {
            SceneEntity::Body(b) => assert_eq!(b.shape, Shape::Circle { radius: 25.0 }),
            other => panic!("expected the ball, got {:?}", other),
        }
        assert_eq!(bp.hook_count(), 1);
    }

    #[test]
    fn test_force_parameters_are_live() {
        let scene = block_on_incline();
        let store = scene.create_store().unwrap();
        assert!(store.parameter("applied_force").unwrap().update_mode() == crate::params::UpdateMode::Live);
        assert!(store.parameter("plane_angle").unwrap().update_mode() == crate::params::UpdateMode::Rebuild);
    }
}

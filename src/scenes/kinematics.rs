//! Straight-line motion: projectile, free fall, bounce and rolling.

use super::{ground, GROUND_TOP};
use crate::error::SceneError;
use crate::geometry::extent;
use crate::params::{ParamSnapshot, Parameter};
use crate::scene::{Blueprint, Scene};
use crate::world::{BodyDesc, Color, Style};
use glam::Vec2;

pub const PROJECTILE: &str = "Projectile Motion";
pub const MOTION_UNDER_GRAVITY: &str = "Motion Under Gravity";
pub const VERTICAL_BOUNCE: &str = "Vertical Bounce";
pub const HORIZONTAL_MOTION: &str = "Horizontal Motion";

const BALL_RADIUS: f32 = 20.0;
const LAUNCH_BLOCK_WIDTH: f32 = 60.0;
const LAUNCH_X: f32 = 100.0;
const BOX_SIZE: f32 = 40.0;

const TILE_SIZE: f32 = 200.0;
const TILE_COUNT: usize = 10;
const TILE_Y: f32 = 520.0;

pub fn projectile() -> Scene {
    Scene::new(PROJECTILE)
        .with_description("Ball launched from the top of a block")
        .with_parameter(Parameter::range(
            "block_height",
            "Height of object from ground",
            100.0,
            0.0,
            500.0,
            0.1,
        ))
        .with_parameter(Parameter::range("x_velocity", "Body Velocity X", 4.0, -20.0, 20.0, 0.1))
        .with_parameter(Parameter::range("y_velocity", "Body Velocity Y", 4.0, -20.0, 20.0, 0.1))
        .with_permanent(ground())
        .with_builder(build_projectile)
}

/// Positive `y_velocity` launches upward.
fn build_projectile(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let height = extent("block height", p.get_f32("block_height")?)?;
    let velocity = Vec2::new(p.get_f32("x_velocity")?, -p.get_f32("y_velocity")?);

    let block_y = GROUND_TOP - height / 2.0;
    let ball_y = block_y - height / 2.0 - BALL_RADIUS;

    let mut bp = Blueprint::new();
    bp.add_body(
        BodyDesc::rectangle(Vec2::new(LAUNCH_X, block_y), LAUNCH_BLOCK_WIDTH, height)
            .fixed()
            .with_style(Style::fill(Color::BLUE)),
    );
    bp.add_body(
        BodyDesc::circle(Vec2::new(LAUNCH_X, ball_y), BALL_RADIUS)
            .with_density(0.004)
            .with_friction(0.1)
            .with_velocity(velocity)
            .with_style(Style::fill(Color::BALL)),
    );
    Ok(bp)
}

pub fn motion_under_gravity() -> Scene {
    Scene::new(MOTION_UNDER_GRAVITY)
        .with_description("Box thrown straight up or down from a height")
        .with_parameter(Parameter::range(
            "object_height",
            "Height from ground",
            100.0,
            0.0,
            500.0,
            0.1,
        ))
        .with_parameter(Parameter::range("y_velocity", "Initial Y Velocity", 5.0, -20.0, 20.0, 0.1))
        .with_permanent(ground())
        .with_builder(build_motion_under_gravity)
}

fn build_motion_under_gravity(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let height = p.get_f32("object_height")?.max(0.0);
    let y = GROUND_TOP - height - BOX_SIZE / 2.0;

    let mut bp = Blueprint::new();
    bp.add_body(
        BodyDesc::rectangle(Vec2::new(400.0, y), BOX_SIZE, BOX_SIZE)
            .with_density(0.004)
            .with_friction(0.1)
            .with_velocity(Vec2::new(0.0, -p.get_f32("y_velocity")?))
            .with_style(Style::fill(Color::hex(0x0066ffff))),
    );
    Ok(bp)
}

pub fn vertical_bounce() -> Scene {
    Scene::new(VERTICAL_BOUNCE)
        .with_description("Ball bouncing on the ground with adjustable elasticity")
        .with_parameter(Parameter::range("y_velocity", "Initial Velocity Y", -8.0, -20.0, 0.0, 0.1))
        .with_parameter(Parameter::range("elasticity", "Elasticity (Bounce)", 0.8, 0.0, 1.0, 0.05))
        .with_permanent(ground().with_friction(0.0))
        .with_dragging()
        .with_builder(build_vertical_bounce)
}

/// `y_velocity` is in screen coordinates: negative moves up.
fn build_vertical_bounce(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let mut bp = Blueprint::new();
    bp.add_body(
        BodyDesc::circle(Vec2::new(400.0, 400.0), BALL_RADIUS)
            .with_restitution(p.get_f32("elasticity")?)
            .with_friction(0.0)
            .with_friction_air(0.0)
            .with_density(0.004)
            .with_velocity(Vec2::new(0.0, p.get_f32("y_velocity")?))
            .with_style(Style::fill(Color::BALL)),
    );
    Ok(bp)
}

pub fn horizontal_motion() -> Scene {
    Scene::new(HORIZONTAL_MOTION)
        .with_description("Ball rolling over an endless ground with constant acceleration")
        .with_parameter(Parameter::range(
            "initial_velocity",
            "Initial Velocity",
            5.0,
            -20.0,
            20.0,
            0.1,
        ))
        .with_parameter(Parameter::range("acceleration", "Acceleration", 0.0, -10.0, 10.0, 0.1))
        .with_dragging()
        .with_builder(build_horizontal_motion)
}

/// Tiles are recycled around the ball so the ground never ends.
fn build_horizontal_motion(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let acceleration = p.get_f32("acceleration")?;
    let start_x = -TILE_SIZE * (TILE_COUNT / 2) as f32;

    let mut bp = Blueprint::new();
    let tiles: Vec<usize> = (0..TILE_COUNT)
        .map(|i| {
            bp.add_body(
                BodyDesc::rectangle(Vec2::new(start_x + i as f32 * TILE_SIZE, TILE_Y), TILE_SIZE, 20.0)
                    .fixed()
                    .with_friction(0.0)
                    .with_friction_air(0.0)
                    .with_style(Style::fill(Color::hex(0x8b4513ff))),
            )
        })
        .collect();
    let ball = bp.add_body(
        BodyDesc::circle(Vec2::new(0.0, TILE_Y - 10.0 - BALL_RADIUS), BALL_RADIUS)
            .with_friction(0.0)
            .with_friction_air(0.0)
            .with_restitution(1.0)
            .with_velocity(Vec2::new(p.get_f32("initial_velocity")?, 0.0))
            .with_style(Style::fill(Color::BALL)),
    );

    bp.on_tick(move |ctx| {
        let Some((position, velocity, mass)) = ctx.body(ball).map(|b| (b.position(), b.velocity(), b.mass())) else {
            return;
        };
        ctx.apply_force(ball, Vec2::new(acceleration * mass / 1000.0, 0.0));

        let reach = TILE_SIZE * (TILE_COUNT as f32 / 2.0 + 1.0);
        let span = TILE_SIZE * TILE_COUNT as f32;
        for &tile in &tiles {
            let Some(tile_pos) = ctx.body(tile).map(|b| b.position()) else {
                continue;
            };
            if tile_pos.x < position.x - reach {
                ctx.set_position(tile, tile_pos + Vec2::new(span, 0.0));
            } else if tile_pos.x > position.x + reach {
                ctx.set_position(tile, tile_pos - Vec2::new(span, 0.0));
            }
        }

        ctx.report("Current Velocity", velocity.x, "m/s");
        ctx.report("Distance Traveled", position.x.abs(), "m");
        ctx.report("Time Elapsed", ctx.elapsed_secs() as f32, "s");
    });
    Ok(bp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneEntity;

    fn first_dynamic(bp: &Blueprint) -> &BodyDesc {
        bp.entities()
            .iter()
            .find_map(|e| match e {
                SceneEntity::Body(b) if !b.is_static => Some(b),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_projectile_ball_sits_on_block() {
        let scene = projectile();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        let ball = first_dynamic(&bp);
        assert_eq!(ball.position, Vec2::new(100.0, 430.0));
        assert_eq!(ball.velocity, Vec2::new(4.0, -4.0));
    }

    #[test]
    fn test_projectile_zero_height_is_not_degenerate() {
        let scene = projectile();
        let mut store = scene.create_store().unwrap();
        store.set("block_height", 0.0).unwrap();
        let bp = scene.build(&store.snapshot()).unwrap();
        assert_eq!(bp.body_count(), 2);
    }

    #[test]
    fn test_horizontal_motion_has_tiles_and_hook() {
        let scene = horizontal_motion();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        assert_eq!(bp.body_count(), TILE_COUNT + 1);
        assert_eq!(bp.hook_count(), 1);
        assert!(scene.permanent().is_empty());
    }
}

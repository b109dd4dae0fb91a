//! Spring oscillators.

use super::{ground, GROUND_TOP};
use crate::error::SceneError;
use crate::geometry::{extent, ring_positions, stiffness};
use crate::params::{ParamSnapshot, Parameter};
use crate::scene::{Blueprint, Scene};
use crate::world::{Anchor, BodyDesc, Color, ConstraintDesc, Style};
use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

pub const SIMPLE_HARMONIC: &str = "Simple Harmonic Motion";
pub const DAMPED: &str = "Damped Oscillation";

const MASS_WIDTH: f32 = 60.0;
const MASS_HEIGHT: f32 = 40.0;
const ANCHOR_RADIUS: f32 = 10.0;
const SPRING: Style = Style::line(Color::BLUE, 4.0);

fn anchor(position: Vec2) -> BodyDesc {
    BodyDesc::circle(position, ANCHOR_RADIUS)
        .fixed()
        .with_style(Style::fill(Color::ANCHOR))
}

pub fn simple_harmonic() -> Scene {
    Scene::new(SIMPLE_HARMONIC)
        .with_description("Mass held by one, two or three springs without gravity")
        .with_parameter(Parameter::options(
            "num_springs",
            "Number of Springs",
            2,
            &[("1 Spring", 1), ("2 Springs", 2), ("3 Springs", 3)],
        ))
        .with_parameter(Parameter::range("amplitude", "Amplitude", 90.0, 10.0, 100.0, 1.0))
        .with_parameter(Parameter::range("spring_stiffness", "Spring Stiffness", 0.008, 0.001, 0.05, 0.001))
        .with_parameter(Parameter::range("spring_length", "Spring Length", 120.0, 80.0, 250.0, 1.0))
        .with_dragging()
        .with_builder(build_simple_harmonic)
}

/// Anchors first, then the mass, then one spring per anchor. The mass starts
/// `amplitude` pixels right of the centre.
fn build_simple_harmonic(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let springs = p.get_choice("num_springs")?;
    let amplitude = p.get_f32("amplitude")?;
    let k = stiffness(p.get_f32("spring_stiffness")?);
    let length = extent("spring length", p.get_f32("spring_length")?)?;

    let center = Vec2::new(400.0, 300.0);
    let (anchors, offsets): (Vec<Vec2>, Vec<Vec2>) = match springs {
        1 => (
            vec![Vec2::new(400.0, 150.0)],
            vec![Vec2::new(0.0, -MASS_HEIGHT / 2.0)],
        ),
        2 => (
            vec![Vec2::new(200.0, center.y), Vec2::new(600.0, center.y)],
            vec![Vec2::new(-MASS_WIDTH / 2.0, 0.0), Vec2::new(MASS_WIDTH / 2.0, 0.0)],
        ),
        3 => (ring_positions(center, 150.0, 3, -FRAC_PI_2), vec![Vec2::ZERO; 3]),
        n => {
            return Err(SceneError::DegenerateGeometry(format!(
                "{} springs are not supported",
                n
            )))
        }
    };

    let mut bp = Blueprint::new().with_gravity(Vec2::ZERO);
    let anchor_ids: Vec<usize> = anchors.iter().map(|a| bp.add_body(anchor(*a))).collect();
    let mass = bp.add_body(
        BodyDesc::rectangle(center + Vec2::new(amplitude, 0.0), MASS_WIDTH, MASS_HEIGHT)
            .with_density(0.002)
            .with_friction(0.1)
            .with_style(Style::fill(Color::BALL)),
    );
    for (a, offset) in anchor_ids.into_iter().zip(offsets) {
        bp.add_constraint(
            ConstraintDesc::new(Anchor::body(a), Anchor::body_offset(mass, offset))
                .with_length(length)
                .with_stiffness(k)
                .with_style(SPRING),
        );
    }
    Ok(bp)
}

pub fn damped() -> Scene {
    Scene::new(DAMPED)
        .with_description("Spring-mass system losing energy to air drag")
        .with_parameter(Parameter::range("spring_stiffness", "Spring Stiffness", 0.01, 0.001, 0.05, 0.001))
        .with_parameter(Parameter::range("damping", "Damping Coefficient", 0.03, 0.0, 0.1, 0.001))
        .with_parameter(Parameter::range(
            "initial_displacement",
            "Initial Displacement",
            150.0,
            20.0,
            250.0,
            1.0,
        ))
        .with_parameter(Parameter::range("mass", "Mass", 5.0, 1.0, 10.0, 0.1))
        .with_permanent(ground())
        .with_builder(build_damped)
}

const DAMPED_ANCHOR_X: f32 = 200.0;
const DAMPED_SPRING_LENGTH: f32 = 150.0;

/// The block rests on the ground; displacement is measured from the
/// spring's rest length.
fn build_damped(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    let k = stiffness(p.get_f32("spring_stiffness")?);
    let damping = p.get_f32("damping")?.clamp(0.0, 1.0);
    let displacement = p.get_f32("initial_displacement")?;
    let mass = p.get_f32("mass")?.max(f32::EPSILON);

    let y = GROUND_TOP - MASS_HEIGHT / 2.0;
    let mut bp = Blueprint::new();
    let fixed = bp.add_body(anchor(Vec2::new(DAMPED_ANCHOR_X, y)));
    let block = bp.add_body(
        BodyDesc::rectangle(
            Vec2::new(DAMPED_ANCHOR_X + DAMPED_SPRING_LENGTH + displacement, y),
            MASS_WIDTH,
            MASS_HEIGHT,
        )
        .with_mass(mass)
        .without_rotation()
        .with_friction_air(damping)
        .with_restitution(0.0)
        .with_friction(0.0)
        .with_style(Style::fill(Color::BALL)),
    );
    bp.add_constraint(
        ConstraintDesc::new(Anchor::body(fixed), Anchor::body(block))
            .with_length(DAMPED_SPRING_LENGTH)
            .with_stiffness(k)
            .with_style(SPRING),
    );
    Ok(bp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_harmonic_disables_gravity() {
        let scene = simple_harmonic();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        assert_eq!(bp.gravity(), Vec2::ZERO);
        // 2 anchors, the mass and 2 springs
        assert_eq!(bp.body_count(), 3);
        assert_eq!(bp.constraint_count(), 2);
    }

    #[test]
    fn test_damped_block_starts_displaced() {
        let scene = damped();
        let bp = scene.build(&scene.create_store().unwrap().snapshot()).unwrap();
        assert_eq!(bp.len(), 3);
        assert_eq!(bp.gravity(), Vec2::new(0.0, 1.0));
    }
}

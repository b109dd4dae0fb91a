//! Built-in demonstration scenes.
//!
//! Every scene is laid out on an 800x600 canvas with the y axis pointing
//! down. Most share the same static ground strip along the bottom edge.

mod incline;
mod kinematics;
mod oscillation;
mod pendulum;

use crate::scene::Scene;
use crate::world::{BodyDesc, Color, Style};
use glam::Vec2;

pub use incline::{INCLINE_HEIGHT, INCLINE_LEFT};

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 600.0;

/// Top surface of the shared ground.
pub const GROUND_TOP: f32 = 550.0;

/// The static green ground strip, 800x50 centred at (400, 575).
pub fn ground() -> BodyDesc {
    BodyDesc::rectangle(Vec2::new(400.0, 575.0), CANVAS_WIDTH, 50.0)
        .fixed()
        .with_style(Style::fill(Color::GROUND))
}

/// A catalog entry.
pub struct SceneEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub scene: fn() -> Scene,
    /// Hosts should keep the first scene body in view.
    pub follow: bool,
}

impl SceneEntry {
    /// Lower-case, dash separated form of the name, e.g. `newtons-cradle`.
    pub fn slug(&self) -> String {
        slugify(self.name)
    }
}

pub static CATALOG: &[SceneEntry] = &[
    SceneEntry {
        name: kinematics::PROJECTILE,
        description: "Ball launched from the top of a block",
        scene: kinematics::projectile,
        follow: false,
    },
    SceneEntry {
        name: kinematics::MOTION_UNDER_GRAVITY,
        description: "Box thrown straight up or down from a height",
        scene: kinematics::motion_under_gravity,
        follow: false,
    },
    SceneEntry {
        name: kinematics::VERTICAL_BOUNCE,
        description: "Ball bouncing on the ground with adjustable elasticity",
        scene: kinematics::vertical_bounce,
        follow: false,
    },
    SceneEntry {
        name: kinematics::HORIZONTAL_MOTION,
        description: "Ball rolling over an endless ground with constant acceleration",
        scene: kinematics::horizontal_motion,
        follow: true,
    },
    SceneEntry {
        name: pendulum::SIMPLE_PENDULUM,
        description: "Bob on a rigid string released from an angle",
        scene: pendulum::simple_pendulum,
        follow: false,
    },
    SceneEntry {
        name: pendulum::DOUBLE_PENDULUM,
        description: "Two linked pendulums with a fading trail",
        scene: pendulum::double_pendulum,
        follow: false,
    },
    SceneEntry {
        name: pendulum::NEWTONS_CRADLE,
        description: "Conservation of momentum and energy in a row of balls",
        scene: pendulum::newtons_cradle,
        follow: false,
    },
    SceneEntry {
        name: oscillation::SIMPLE_HARMONIC,
        description: "Mass held by one, two or three springs without gravity",
        scene: oscillation::simple_harmonic,
        follow: false,
    },
    SceneEntry {
        name: oscillation::DAMPED,
        description: "Spring-mass system losing energy to air drag",
        scene: oscillation::damped,
        follow: false,
    },
    SceneEntry {
        name: incline::BLOCK,
        description: "Block sliding on a frictional incline under an applied force",
        scene: incline::block_on_incline,
        follow: false,
    },
    SceneEntry {
        name: incline::BALL,
        description: "Ball rolling down a frictional incline under an applied force",
        scene: incline::ball_on_incline,
        follow: false,
    },
];

/// Look a scene up by display name (any case) or slug.
pub fn find(query: &str) -> Option<&'static SceneEntry> {
    let slug = slugify(query);
    CATALOG
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(query) || e.slug() == slug)
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' {
            continue;
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

//! # physlab - Parameter-driven 2D physics demonstrations
//!
//! Small physics scenes (projectiles, pendulums, springs, inclined planes,
//! Newton's cradle) described declaratively and driven by named parameters.
//!
//! physlab handles the scene lifecycle (stop, clear, rebuild, resynchronize
//! the sliders, restart) so a scene is nothing more than its parameters and
//! a function building bodies from them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use physlab::prelude::*;
//!
//! fn bounce(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
//!     let mut bp = Blueprint::new();
//!     bp.add_body(
//!         BodyDesc::circle(Vec2::new(400.0, 400.0), 20.0)
//!             .with_restitution(p.get_f32("elasticity")?)
//!             .with_velocity(Vec2::new(0.0, p.get_f32("y_velocity")?)),
//!     );
//!     Ok(bp)
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scene = Scene::new("Bounce")
//!         .with_parameter(Parameter::range("y_velocity", "Initial Velocity Y", -8.0, -20.0, 0.0, 0.1))
//!         .with_parameter(Parameter::range("elasticity", "Elasticity", 0.8, 0.0, 1.0, 0.05))
//!         .with_permanent(ground())
//!         .with_builder(bounce);
//!
//!     let mut controller = SceneController::new(scene)?;
//!     controller.reset()?;
//!     for _ in 0..600 {
//!         controller.step(DEFAULT_DELTA_MS);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Parameters
//!
//! A [`ParameterStore`] holds named values with ranges or option sets.
//! Values written out of range are clamped unless the store's
//! [`ClampPolicy`] is `Reject`.
//!
//! ### Scenes and blueprints
//!
//! A [`Scene`] pairs parameter declarations with a [`SceneBuilder`]. Each
//! build returns a [`Blueprint`]: bodies and constraints to insert, the
//! gravity to use, per-tick hooks and an optional trail.
//!
//! ### Controller
//!
//! [`SceneController`] owns the world. Rebuild parameters pause the scene
//! after rebuilding; `reset()` rebuilds and runs; `resume()` continues.
//! A failed build leaves only the permanent bodies in the world.
//!
//! Scenes marked draggable let the pointer hold a body on a soft spring
//! through `grab`, `drag_to` and `release`.
//!
//! ### World
//!
//! [`World`] wraps a rapier2d pipeline but speaks the scene units: pixels,
//! milliseconds and velocities per 60 Hz tick.
//!
//! ## Built-in Scenes
//!
//! | Group | Scenes |
//! |-------|--------|
//! | Kinematics | Projectile Motion, Motion Under Gravity, Vertical Bounce, Horizontal Motion |
//! | Pendulums | Simple Pendulum, Double Pendulum, Newton's Cradle |
//! | Oscillators | Simple Harmonic Motion, Damped Oscillation |
//! | Inclines | Inclined Plane (Block), Inclined Plane (Ball) |
//!
//! See [`scenes::CATALOG`].

pub mod clock;
pub mod controller;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod params;
pub mod preset;
pub mod scene;
pub mod scenes;
pub mod telemetry;
pub mod trail;
pub mod world;

pub use clock::{Clock, ClockState};
pub use controller::{SceneController, DEFAULT_GRAVITY};
pub use controls::{Control, ControlPanel, ParamChange, Widget};
pub use error::{ParamError, PresetError, SceneError, StateError};
pub use glam::Vec2;
pub use params::{
    Bounds, ClampPolicy, ParamOption, ParamSnapshot, ParamValue, Parameter, ParameterStore, UpdateMode,
};
pub use preset::ParamPreset;
pub use scene::{Blueprint, Scene, SceneBuilder, SceneEntity, TickContext, TickHook};
pub use telemetry::{Reading, Telemetry};
pub use trail::{Trail, TrailSegment, TrailSpec};
pub use world::{Anchor, Body, BodyDesc, Color, ConstraintDesc, EntityId, Grab, Shape, Style, World};

#[cfg(feature = "egui")]
pub use controls::render_control_panel;

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use physlab::prelude::*;
/// ```
///
/// This imports:
/// - [`Scene`], [`Blueprint`], [`SceneController`] - defining and running scenes
/// - [`Parameter`], [`ParamSnapshot`] - declaring and reading parameters
/// - [`BodyDesc`], [`ConstraintDesc`], [`Anchor`] - world entities
/// - [`ground`](crate::scenes::ground) - the shared static ground
/// - [`Vec2`] - glam vector type
pub mod prelude {
    pub use crate::clock::ClockState;
    pub use crate::controller::SceneController;
    pub use crate::controls::{ControlPanel, ParamChange};
    pub use crate::error::{ParamError, SceneError};
    pub use crate::params::{ClampPolicy, ParamSnapshot, ParamValue, Parameter, ParameterStore};
    pub use crate::scene::{Blueprint, Scene, TickContext};
    pub use crate::scenes::{ground, CATALOG};
    pub use crate::trail::TrailSpec;
    pub use crate::world::{Anchor, BodyDesc, Color, ConstraintDesc, Style, DEFAULT_DELTA_MS};
    pub use crate::Vec2;
    #[cfg(feature = "egui")]
    pub use crate::controls::render_control_panel;
    #[cfg(feature = "egui")]
    pub use egui;
}

//! Scene definitions and blueprints.
//!
//! A [`Scene`] is a declarative description of one demonstration: its
//! parameters, any permanent bodies that survive rebuilds, and a
//! [`SceneBuilder`] that turns a [`ParamSnapshot`] into a [`Blueprint`].
//!
//! Builders never see the world. They return descriptors with
//! blueprint-local indices and the [`SceneController`](crate::SceneController)
//! inserts them in one go.
//!
//! # Example
//!
//! ```ignore
//! use physlab::prelude::*;
//!
//! let scene = Scene::new("Bounce")
//!     .with_parameter(Parameter::range("elasticity", "Elasticity", 0.8, 0.0, 1.0, 0.05))
//!     .with_permanent(ground())
//!     .with_builder(|p: &ParamSnapshot| -> Result<Blueprint, SceneError> {
//!         let mut bp = Blueprint::new();
//!         bp.add_body(
//!             BodyDesc::circle(Vec2::new(400.0, 400.0), 20.0)
//!                 .with_restitution(p.get_f32("elasticity")?),
//!         );
//!         Ok(bp)
//!     });
//! ```

use crate::error::{ParamError, SceneError};
use crate::params::{ParamSnapshot, Parameter, ParameterStore};
use crate::telemetry::Telemetry;
use crate::trail::TrailSpec;
use crate::world::{Body, BodyDesc, ConstraintDesc, EntityId, World};
use glam::Vec2;
use std::fmt;

/// Something a blueprint asks the world to create.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEntity {
    Body(BodyDesc),
    Constraint(ConstraintDesc),
}

impl SceneEntity {
    pub fn is_body(&self) -> bool {
        matches!(self, SceneEntity::Body(_))
    }
}

/// What a hook may touch during one tick.
///
/// Bodies are addressed by their blueprint-local index, the same index the
/// builder got back from [`Blueprint::add_body`].
pub struct TickContext<'a> {
    pub(crate) world: &'a mut World,
    pub(crate) ids: &'a [EntityId],
    pub(crate) params: &'a ParameterStore,
    pub(crate) telemetry: &'a mut Telemetry,
    pub(crate) tick: u64,
    pub(crate) elapsed_secs: f64,
    pub(crate) delta_ms: f32,
}

impl<'a> TickContext<'a> {
    /// Current parameter values, including live ones.
    pub fn params(&self) -> &ParameterStore {
        self.params
    }

    /// Numeric value of a parameter, or `fallback` when it does not exist.
    pub fn param_f32(&self, name: &str, fallback: f32) -> f32 {
        self.params.get(name).map_or(fallback, |v| v.as_f32())
    }

    pub fn id(&self, index: usize) -> Option<EntityId> {
        self.ids.get(index).copied()
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        self.id(index).and_then(|id| self.world.body(id))
    }

    pub fn apply_force(&mut self, index: usize, force: Vec2) -> bool {
        match self.id(index) {
            Some(id) => self.world.apply_force(id, force),
            None => false,
        }
    }

    pub fn set_position(&mut self, index: usize, position: Vec2) -> bool {
        match self.id(index) {
            Some(id) => self.world.set_position(id, position),
            None => false,
        }
    }

    /// Write a readout line.
    pub fn report(&mut self, label: &str, value: f32, unit: &'static str) {
        self.telemetry.set(label, value, unit);
    }

    /// Ticks completed since the last rebuild.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since the last rebuild.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }
}

/// Per-tick callback installed by a blueprint.
///
/// Runs before every world step while the controller is running. Hooks live
/// exactly as long as the build that created them.
pub trait TickHook {
    fn on_tick(&mut self, ctx: &mut TickContext<'_>);
}

impl<F> TickHook for F
where
    F: FnMut(&mut TickContext<'_>),
{
    fn on_tick(&mut self, ctx: &mut TickContext<'_>) {
        self(ctx)
    }
}

/// Everything one build produces.
pub struct Blueprint {
    entities: Vec<SceneEntity>,
    gravity: Vec2,
    hooks: Vec<Box<dyn TickHook>>,
    trail: Option<TrailSpec>,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("entities", &self.entities)
            .field("gravity", &self.gravity)
            .field("hooks", &self.hooks.len())
            .field("trail", &self.trail)
            .finish()
    }
}

impl Blueprint {
    /// Empty blueprint with standard downward gravity.
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            gravity: Vec2::new(0.0, 1.0),
            hooks: Vec::new(),
            trail: None,
        }
    }

    /// Queue a body; returns its local index for constraints and hooks.
    pub fn add_body(&mut self, desc: BodyDesc) -> usize {
        self.entities.push(SceneEntity::Body(desc));
        self.entities.len() - 1
    }

    /// Queue a constraint; returns its local index.
    pub fn add_constraint(&mut self, desc: ConstraintDesc) -> usize {
        self.entities.push(SceneEntity::Constraint(desc));
        self.entities.len() - 1
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Install a per-tick closure for the lifetime of this build.
    pub fn on_tick<F>(&mut self, hook: F)
    where
        F: FnMut(&mut TickContext<'_>) + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Follow one body with a fading trail.
    pub fn set_trail(&mut self, spec: TrailSpec) {
        self.trail = Some(spec);
    }

    pub fn entities(&self) -> &[SceneEntity] {
        &self.entities
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn trail(&self) -> Option<TrailSpec> {
        self.trail
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn body_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_body()).count()
    }

    pub fn constraint_count(&self) -> usize {
        self.entities.len() - self.body_count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<SceneEntity>, Vec2, Vec<Box<dyn TickHook>>, Option<TrailSpec>) {
        (self.entities, self.gravity, self.hooks, self.trail)
    }
}

/// Maps a parameter snapshot to a fresh blueprint.
///
/// Must be deterministic: the same snapshot always yields the same entities.
pub trait SceneBuilder {
    fn build(&self, params: &ParamSnapshot) -> Result<Blueprint, SceneError>;
}

impl<F> SceneBuilder for F
where
    F: Fn(&ParamSnapshot) -> Result<Blueprint, SceneError>,
{
    fn build(&self, params: &ParamSnapshot) -> Result<Blueprint, SceneError> {
        self(params)
    }
}

fn empty_builder(_: &ParamSnapshot) -> Result<Blueprint, SceneError> {
    Ok(Blueprint::new())
}

/// Declarative description of one demonstration scene.
///
/// Use method chaining to configure, then hand it to
/// [`SceneController::new`](crate::SceneController::new).
pub struct Scene {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    permanent: Vec<BodyDesc>,
    draggable: bool,
    builder: Box<dyn SceneBuilder>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("parameters", &self.parameters.len())
            .field("permanent", &self.permanent.len())
            .field("draggable", &self.draggable)
            .finish()
    }
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            parameters: Vec::new(),
            permanent: Vec::new(),
            draggable: false,
            builder: Box::new(empty_builder),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Declare a parameter. Declaration order is panel order.
    pub fn with_parameter(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add a static body that outlives every rebuild (e.g. the ground).
    pub fn with_permanent(mut self, desc: BodyDesc) -> Self {
        self.permanent.push(desc.fixed());
        self
    }

    /// Let the pointer grab and drag bodies while the scene runs.
    pub fn with_dragging(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn with_builder<B: SceneBuilder + 'static>(mut self, builder: B) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn permanent(&self) -> &[BodyDesc] {
        &self.permanent
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    /// A fresh store holding every declared parameter at its default.
    pub fn create_store(&self) -> Result<ParameterStore, ParamError> {
        ParameterStore::from_parameters(self.parameters.clone())
    }

    /// Run the builder against a snapshot.
    pub fn build(&self, params: &ParamSnapshot) -> Result<Blueprint, SceneError> {
        self.builder.build(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Anchor;

    fn pendulum(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
        let length = p.get_f32("length")?;
        let mut bp = Blueprint::new();
        let bob = bp.add_body(BodyDesc::circle(Vec2::new(400.0, 100.0 + length), 20.0));
        bp.add_constraint(ConstraintDesc::new(
            Anchor::Point(Vec2::new(400.0, 100.0)),
            Anchor::body(bob),
        ));
        Ok(bp)
    }

    #[test]
    fn test_blueprint_indices() {
        let mut bp = Blueprint::new();
        assert_eq!(bp.add_body(BodyDesc::circle(Vec2::ZERO, 5.0)), 0);
        assert_eq!(
            bp.add_constraint(ConstraintDesc::new(Anchor::Point(Vec2::ZERO), Anchor::body(0))),
            1
        );
        assert_eq!(bp.body_count(), 1);
        assert_eq!(bp.constraint_count(), 1);
        assert_eq!(bp.gravity(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_scene_builds_from_snapshot() {
        let scene = Scene::new("Pendulum")
            .with_parameter(Parameter::range("length", "Length", 200.0, 50.0, 300.0, 1.0))
            .with_builder(pendulum);
        let store = scene.create_store().unwrap();
        let bp = scene.build(&store.snapshot()).unwrap();
        assert_eq!(bp.len(), 2);
        match &bp.entities()[0] {
            SceneEntity::Body(desc) => assert_eq!(desc.position.y, 300.0),
            other => panic!("expected a body, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_parameter_is_scene_error() {
        let scene = Scene::new("Broken").with_builder(pendulum);
        let store = scene.create_store().unwrap();
        assert!(matches!(
            scene.build(&store.snapshot()),
            Err(SceneError::Param(ParamError::UnknownParameter(_)))
        ));
    }

    #[test]
    fn test_permanent_bodies_are_static() {
        let scene = Scene::new("Ground").with_permanent(BodyDesc::rectangle(Vec2::ZERO, 10.0, 10.0));
        assert!(scene.permanent()[0].is_static);
    }

    #[test]
    fn test_closure_hooks_are_counted() {
        let mut bp = Blueprint::new();
        bp.on_tick(|ctx| ctx.report("t", 0.0, "s"));
        assert_eq!(bp.hook_count(), 1);
    }
}

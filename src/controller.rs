//! Scene controller.
//!
//! The controller owns the world, the parameter store and the control panel
//! of one scene and is the only thing allowed to clear or populate the world.
//! Every rebuild happens inside a single call, so a host stepping the world
//! between calls never sees a half-built scene.
//!
//! ```text
//!             reset() ok                 resume()
//!   Stopped ──────────────► Running   ◄──────────── Stopped
//!      ▲                       │
//!      └───────────────────────┘
//!        pause(), apply_parameter_change(), failed reset()
//! ```

use crate::clock::{Clock, ClockState};
use crate::controls::{ControlPanel, ParamChange};
use crate::error::{ParamError, PresetError, SceneError, StateError};
use crate::params::{ClampPolicy, ParamValue, ParameterStore, UpdateMode};
use crate::preset::ParamPreset;
use crate::scene::{Scene, SceneEntity, TickContext, TickHook};
use crate::telemetry::Telemetry;
use crate::trail::Trail;
use crate::world::{EntityId, Grab, World};
use glam::Vec2;
use tracing::{debug, warn};

/// Gravity every rebuild starts from unless the blueprint overrides it.
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 1.0);

/// Runs one [`Scene`]: rebuild on change, clock state, per-tick hooks.
pub struct SceneController {
    scene: Scene,
    params: ParameterStore,
    panel: ControlPanel,
    world: World,
    clock: Clock,
    /// Hooks of the current build; replaced wholesale on every rebuild.
    hooks: Vec<Box<dyn TickHook>>,
    /// Blueprint-local index -> id, for the current build.
    entities: Vec<EntityId>,
    permanent: Vec<EntityId>,
    trail: Option<Trail>,
    telemetry: Telemetry,
    last_error: Option<SceneError>,
}

impl SceneController {
    /// Create the store and panel for `scene` and build it once.
    ///
    /// The controller starts `Stopped`. A failing first build is not an
    /// error here; it is kept in [`last_error`](Self::last_error) and the
    /// world holds only the permanent bodies.
    pub fn new(scene: Scene) -> Result<Self, ParamError> {
        let params = scene.create_store()?;
        let panel = ControlPanel::bind(&params);
        let mut controller = Self {
            scene,
            params,
            panel,
            world: World::new(),
            clock: Clock::new(),
            hooks: Vec::new(),
            entities: Vec::new(),
            permanent: Vec::new(),
            trail: None,
            telemetry: Telemetry::new(),
            last_error: None,
        };
        let _ = controller.rebuild();
        Ok(controller)
    }

    /// Stop, clear, rebuild from the current values and start again.
    ///
    /// On failure the world holds only the permanent bodies and the clock
    /// stays stopped.
    pub fn reset(&mut self) -> Result<(), SceneError> {
        self.rebuild()?;
        self.clock.run();
        debug!(scene = %self.scene.name(), "reset, running");
        Ok(())
    }

    /// Write one parameter and react to it.
    ///
    /// Rebuild parameters stop the clock, rebuild the scene and leave it
    /// stopped until [`resume`](Self::resume). Live parameters are only
    /// stored; the running state is untouched. Returns the value actually
    /// stored after clamping.
    pub fn apply_parameter_change<V: Into<ParamValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<ParamValue, SceneError> {
        let stored = match self.params.set(name, value) {
            Ok(v) => v,
            Err(e) => {
                // Put the widget back on the stored value
                self.panel.resynchronize(&self.params);
                warn!(scene = %self.scene.name(), param = name, error = %e, "parameter change rejected");
                return Err(e.into());
            }
        };

        let mode = self
            .params
            .parameter(name)
            .map(|p| p.update_mode())
            .unwrap_or_default();
        match mode {
            UpdateMode::Live => {
                self.panel.resynchronize(&self.params);
                debug!(scene = %self.scene.name(), param = name, value = stored.as_f32(), "live parameter");
            }
            UpdateMode::Rebuild => {
                debug!(scene = %self.scene.name(), param = name, value = stored.as_f32(), "parameter changed, rebuilding");
                self.rebuild()?;
            }
        }
        Ok(stored)
    }

    /// Apply a change produced by the control panel.
    pub fn apply_change(&mut self, change: &ParamChange) -> Result<ParamValue, SceneError> {
        self.apply_parameter_change(&change.name, change.value)
    }

    /// Start the clock after a parameter change or pause.
    pub fn resume(&mut self) -> Result<(), StateError> {
        if self.clock.is_running() {
            warn!(scene = %self.scene.name(), "resume ignored, already running");
            return Err(StateError {
                action: "resume",
                state: self.clock.state(),
            });
        }
        self.clock.run();
        debug!(scene = %self.scene.name(), "resumed");
        Ok(())
    }

    /// Stop the clock. Does nothing when already stopped.
    pub fn pause(&mut self) {
        if self.clock.is_running() {
            self.clock.stop();
            debug!(scene = %self.scene.name(), "paused");
        }
    }

    /// Pause when running, resume when stopped. Returns the new state.
    pub fn toggle(&mut self) -> ClockState {
        if self.clock.is_running() {
            self.pause();
        } else {
            let _ = self.resume();
        }
        self.clock.state()
    }

    /// Run one tick of `delta_ms`: hooks, world step, trail.
    ///
    /// Returns `false` without doing anything while stopped.
    pub fn step(&mut self, delta_ms: f32) -> bool {
        if !self.clock.is_running() {
            return false;
        }

        for hook in self.hooks.iter_mut() {
            let mut ctx = TickContext {
                world: &mut self.world,
                ids: &self.entities,
                params: &self.params,
                telemetry: &mut self.telemetry,
                tick: self.clock.ticks(),
                elapsed_secs: self.clock.elapsed_secs(),
                delta_ms,
            };
            hook.on_tick(&mut ctx);
        }

        self.world.step(delta_ms);
        self.clock.tick(delta_ms);

        if let Some(trail) = self.trail.as_mut() {
            let followed = self.entities.get(trail.spec().body).copied();
            if let Some(body) = followed.and_then(|id| self.world.body(id)) {
                trail.record(body.position(), self.clock.elapsed_secs());
            }
        }
        true
    }

    /// Feed real elapsed time and run as many fixed ticks as it covers.
    pub fn advance(&mut self, real_secs: f32) -> u32 {
        let steps = self.clock.advance(real_secs);
        let delta = self.clock.delta_ms();
        for _ in 0..steps {
            self.step(delta);
        }
        steps
    }

    /// Load a preset into the store and reset the scene with it.
    ///
    /// Values go through the store's clamp policy. If any value is rejected
    /// nothing changes.
    pub fn apply_preset(&mut self, preset: &ParamPreset) -> Result<(), PresetError> {
        if preset.scene != self.scene.name() {
            return Err(PresetError::SceneMismatch {
                expected: self.scene.name().to_string(),
                found: preset.scene.clone(),
            });
        }
        self.params = preset.applied_to(&self.params)?;
        self.panel.resynchronize(&self.params);
        self.reset()?;
        Ok(())
    }

    /// Put every parameter back to its default and reset the scene.
    pub fn restore_defaults(&mut self) -> Result<(), SceneError> {
        self.params.reset_defaults();
        self.panel.resynchronize(&self.params);
        self.reset()
    }

    /// Current values as a preset for this scene.
    pub fn preset(&self) -> ParamPreset {
        ParamPreset::capture(self.scene.name(), &self.params)
    }

    /// Push the store's values back into the control panel.
    ///
    /// Needed after writing through [`write_param`](Self::write_param).
    pub fn resynchronize(&mut self) {
        self.panel.resynchronize(&self.params);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Real-time multiplier for [`advance`](Self::advance). Running state is
    /// changed through the controller only.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.set_time_scale(scale);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Write a value straight into the store.
    ///
    /// Nothing is rebuilt and the panel keeps showing the old value until
    /// [`resynchronize`](Self::resynchronize). Only declared parameters can be
    /// written, so every stored value always has a widget.
    pub fn write_param<V: Into<ParamValue>>(&mut self, name: &str, value: V) -> Result<ParamValue, ParamError> {
        self.params.set(name, value)
    }

    /// How out-of-range writes are handled from now on.
    pub fn set_clamp_policy(&mut self, policy: ClampPolicy) {
        self.params.set_policy(policy);
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ControlPanel {
        &mut self.panel
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn trail(&self) -> Option<&Trail> {
        self.trail.as_ref()
    }

    /// Ids of the current build, in blueprint order.
    pub fn scene_entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn permanent_entities(&self) -> &[EntityId] {
        &self.permanent
    }

    /// Grab the topmost movable scene body under `point`.
    ///
    /// Only scenes built with [`Scene::with_dragging`] accept grabs. The body
    /// is pulled toward the pointer by a soft spring, so it keeps obeying its
    /// rods and contacts, until [`release`](Self::release) or the next
    /// rebuild.
    pub fn grab(&mut self, point: Vec2) -> Option<EntityId> {
        if !self.scene.is_draggable() {
            return None;
        }
        let id = self.world.body_at(point)?;
        if !self.world.grab(id, point) {
            return None;
        }
        debug!(scene = %self.scene.name(), x = point.x, y = point.y, "body grabbed");
        Some(id)
    }

    /// Move the pointer end of the current grab.
    pub fn drag_to(&mut self, point: Vec2) -> bool {
        self.world.drag(point)
    }

    /// Let go of the grabbed body, which keeps the velocity it had.
    pub fn release(&mut self) -> Option<EntityId> {
        let held = self.world.release()?;
        debug!(scene = %self.scene.name(), "body released");
        Some(held.body)
    }

    pub fn grabbed(&self) -> Option<Grab> {
        self.world.grabbed()
    }

    /// Error of the most recent rebuild, if it failed.
    pub fn last_error(&self) -> Option<&SceneError> {
        self.last_error.as_ref()
    }

    /// Stop, clear and rebuild. Leaves the clock stopped.
    fn rebuild(&mut self) -> Result<(), SceneError> {
        self.clock.stop();
        self.clock.reset();
        self.hooks.clear();
        self.entities.clear();
        self.trail = None;
        self.telemetry.clear();

        self.world.clear(false);
        self.world.set_gravity(DEFAULT_GRAVITY);
        let result = self.populate();
        self.panel.resynchronize(&self.params);

        match result {
            Ok(()) => {
                self.last_error = None;
                debug!(
                    scene = %self.scene.name(),
                    entities = self.world.len(),
                    hooks = self.hooks.len(),
                    "scene rebuilt"
                );
                Ok(())
            }
            Err(e) => {
                // Nothing from the failed build may survive
                self.world.clear(false);
                self.permanent = self.add_permanent().unwrap_or_default();
                warn!(scene = %self.scene.name(), error = %e, "scene build failed");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn add_permanent(&mut self) -> Result<Vec<EntityId>, SceneError> {
        let permanent: Vec<SceneEntity> = self
            .scene
            .permanent()
            .iter()
            .cloned()
            .map(SceneEntity::Body)
            .collect();
        self.world.add(&permanent)
    }

    fn populate(&mut self) -> Result<(), SceneError> {
        self.permanent = self.add_permanent()?;

        let blueprint = self.scene.build(&self.params.snapshot())?;
        let (entities, gravity, hooks, trail) = blueprint.into_parts();
        if let Some(spec) = trail {
            match entities.get(spec.body) {
                Some(SceneEntity::Body(_)) => {}
                _ => {
                    return Err(SceneError::InvalidReference {
                        index: spec.body,
                        len: entities.len(),
                    })
                }
            }
        }

        self.entities = self.world.add(&entities)?;
        self.world.set_gravity(gravity);
        self.hooks = hooks;
        self.trail = trail.map(Trail::new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;
    use crate::scene::Blueprint;
    use crate::world::BodyDesc;
    use crate::params::ParamSnapshot;

    fn bounce(p: &ParamSnapshot) -> Result<Blueprint, SceneError> {
        let mut bp = Blueprint::new();
        bp.add_body(
            BodyDesc::circle(Vec2::new(400.0, 400.0), 20.0)
                .with_velocity(Vec2::new(0.0, p.get_f32("y_velocity")?)),
        );
        Ok(bp)
    }

    fn scene() -> Scene {
        Scene::new("Bounce")
            .with_parameter(Parameter::range("y_velocity", "Vertical Velocity", -8.0, -20.0, 0.0, 0.1))
            .with_parameter(Parameter::range("spin", "Spin", 0.0, 0.0, 1.0, 0.1).live())
            .with_permanent(BodyDesc::rectangle(Vec2::new(400.0, 575.0), 800.0, 50.0))
            .with_builder(bounce)
    }

    #[test]
    fn test_new_is_stopped_and_built() {
        let controller = SceneController::new(scene()).unwrap();
        assert_eq!(controller.state(), ClockState::Stopped);
        assert_eq!(controller.world().len(), 2);
        assert_eq!(controller.scene_entities().len(), 1);
        assert_eq!(controller.permanent_entities().len(), 1);
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn test_reset_runs() {
        let mut controller = SceneController::new(scene()).unwrap();
        controller.reset().unwrap();
        assert_eq!(controller.state(), ClockState::Running);
    }

    #[test]
    fn test_resume_twice_is_state_error() {
        let mut controller = SceneController::new(scene()).unwrap();
        assert!(controller.resume().is_ok());
        let err = controller.resume().unwrap_err();
        assert_eq!(err.state, ClockState::Running);
        assert!(controller.is_running());
    }

    #[test]
    fn test_live_change_keeps_running() {
        let mut controller = SceneController::new(scene()).unwrap();
        controller.reset().unwrap();
        let before = controller.scene_entities().to_vec();
        controller.apply_parameter_change("spin", 0.5).unwrap();
        assert!(controller.is_running());
        assert_eq!(controller.scene_entities(), &before[..]);
    }

    #[test]
    fn test_rebuild_change_pauses() {
        let mut controller = SceneController::new(scene()).unwrap();
        controller.reset().unwrap();
        controller.apply_parameter_change("y_velocity", -3.0).unwrap();
        assert_eq!(controller.state(), ClockState::Stopped);
        assert!(controller.panel().is_synchronized(controller.params()));
    }

    #[test]
    fn test_step_only_while_running() {
        let mut controller = SceneController::new(scene()).unwrap();
        assert!(!controller.step(16.0));
        controller.resume().unwrap();
        assert!(controller.step(16.0));
        assert_eq!(controller.clock().ticks(), 1);
    }

    #[test]
    fn test_grab_needs_a_draggable_scene() {
        let mut controller = SceneController::new(scene()).unwrap();
        assert_eq!(controller.grab(Vec2::new(400.0, 400.0)), None);

        let mut draggable = SceneController::new(scene().with_dragging()).unwrap();
        let ball = draggable.scene_entities()[0];
        // The ground is permanent and static
        assert_eq!(draggable.grab(Vec2::new(400.0, 570.0)), None);
        assert_eq!(draggable.grab(Vec2::new(405.0, 400.0)), Some(ball));
        assert!(draggable.drag_to(Vec2::new(450.0, 380.0)));

        draggable.apply_parameter_change("y_velocity", -2.0).unwrap();
        assert!(draggable.grabbed().is_none());
        assert_eq!(draggable.release(), None);
    }

    #[test]
    fn test_write_param_only_reaches_declared_parameters() {
        let mut controller = SceneController::new(scene()).unwrap();
        assert!(matches!(
            controller.write_param("gravity", 2.0),
            Err(ParamError::UnknownParameter(_))
        ));
        assert_eq!(controller.panel().controls().len(), controller.params().len());

        controller.write_param("y_velocity", -4.0).unwrap();
        assert!(!controller.panel().is_synchronized(controller.params()));
        controller.resynchronize();
        assert!(controller.panel().is_synchronized(controller.params()));
    }

    #[test]
    fn test_restore_defaults_resets_and_runs() {
        let mut controller = SceneController::new(scene()).unwrap();
        controller.apply_parameter_change("y_velocity", -3.0).unwrap();
        controller.restore_defaults().unwrap();
        assert_eq!(controller.params().get("y_velocity"), Some(ParamValue::Number(-8.0)));
        assert!(controller.panel().is_synchronized(controller.params()));
        assert!(controller.is_running());
    }

    #[test]
    fn test_preset_for_other_scene_is_rejected() {
        let mut controller = SceneController::new(scene()).unwrap();
        let mut preset = controller.preset();
        preset.scene = "Other".into();
        assert!(matches!(
            controller.apply_preset(&preset),
            Err(PresetError::SceneMismatch { .. })
        ));
    }
}

//! 2D rigid-body world.
//!
//! The world owns every body and constraint of the running scene and keeps a
//! plain snapshot of each one for hooks and renderers. The solving itself is
//! done by rapier2d: bodies rotate, contacts use the real shapes, rods are
//! revolute joints and springs are spring joints.
//!
//! Units are pixels and milliseconds with the y axis pointing down. Velocities
//! are pixels per tick of [`DEFAULT_DELTA_MS`] and forces are in mass-pixels
//! per square millisecond, so gravity of 1 means `GRAVITY_SCALE` px/ms².
//!
//! Only the [`SceneController`](crate::SceneController) clears or populates the
//! world; per-tick hooks get a narrower view through
//! [`TickContext`](crate::scene::TickContext).

use crate::error::SceneError;
use crate::geometry::{polygon_area, polygon_centroid, MIN_EXTENT};
use crate::scene::SceneEntity;
use glam::Vec2;
use rapier2d::prelude::{
    point, vector, DefaultBroadPhase, CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderSet,
    ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager, MotorModel,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point, Real, RevoluteJointBuilder,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SpringJointBuilder, Vector,
};
use std::fmt;

/// World gravity is multiplied by this before integration.
pub const GRAVITY_SCALE: f32 = 0.001;

/// Length of one tick at 60 Hz.
pub const DEFAULT_DELTA_MS: f32 = 1000.0 / 60.0;

/// Constraints at least this stiff are solved as rigid rods.
pub const RIGID_STIFFNESS: f32 = 0.99;

/// Stiffness of the pointer spring while dragging.
pub const GRAB_STIFFNESS: f32 = 0.2;

const GRAB_DAMPING_RATIO: f32 = 0.5;

const TICKS_PER_SECOND: f32 = 1000.0 / DEFAULT_DELTA_MS;

/// px/ms² to px/s².
const ACCEL_TO_SECONDS: f32 = 1.0e6;

/// Handle to a body or constraint owned by a [`World`].
///
/// Ids are never reused within one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// From `0xRRGGBBAA`.
    pub const fn hex(rgba: u32) -> Self {
        Color([
            (rgba >> 24) as u8,
            (rgba >> 16) as u8,
            (rgba >> 8) as u8,
            rgba as u8,
        ])
    }

    pub const GROUND: Color = Color::hex(0x28ba3eff);
    pub const BALL: Color = Color::hex(0xf55a3cff);
    pub const BLUE: Color = Color::hex(0x3d3dc1ff);
    pub const ANCHOR: Color = Color::hex(0x505050ff);
    pub const WHITE: Color = Color::hex(0xffffffff);
}

/// How a body or constraint is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub fill: Color,
    pub stroke: Option<Color>,
    pub line_width: f32,
}

impl Style {
    pub const fn fill(color: Color) -> Self {
        Self {
            fill: color,
            stroke: None,
            line_width: 1.0,
        }
    }

    pub const fn line(color: Color, width: f32) -> Self {
        Self {
            fill: color,
            stroke: Some(color),
            line_width: width,
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::fill(Color::hex(0x888888ff))
    }
}

/// Collision and drawing shape, in body-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rectangle { width: f32, height: f32 },
    /// Convex polygon, vertices relative to the centroid.
    Polygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn area(&self) -> f32 {
        match self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
            Shape::Polygon { vertices } => polygon_area(vertices).abs(),
        }
    }

    /// Whether a body-local point lies inside the shape.
    pub fn contains(&self, local: Vec2) -> bool {
        match self {
            Shape::Circle { radius } => local.length_squared() <= radius * radius,
            Shape::Rectangle { width, height } => {
                local.x.abs() <= width * 0.5 && local.y.abs() <= height * 0.5
            }
            Shape::Polygon { vertices } => {
                let n = vertices.len();
                let sign = polygon_area(vertices).signum();
                n >= 3
                    && (0..n).all(|i| {
                        let a = vertices[i];
                        let b = vertices[(i + 1) % n];
                        (b - a).perp_dot(local - a) * sign >= 0.0
                    })
            }
        }
    }

    /// Outline in world space, `None` for circles.
    pub fn world_vertices(&self, position: Vec2, angle: f32) -> Option<Vec<Vec2>> {
        let rot = Vec2::from_angle(angle);
        let local = match self {
            Shape::Circle { .. } => return None,
            Shape::Rectangle { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ]
            }
            Shape::Polygon { vertices } => vertices.clone(),
        };
        Some(local.into_iter().map(|v| position + rot.rotate(v)).collect())
    }

    fn is_degenerate(&self) -> bool {
        match self {
            Shape::Circle { radius } => !(radius.is_finite() && *radius >= MIN_EXTENT),
            Shape::Rectangle { width, height } => {
                !(width.is_finite() && height.is_finite() && *width >= MIN_EXTENT && *height >= MIN_EXTENT)
            }
            Shape::Polygon { vertices } => vertices.len() < 3 || !(self.area() >= MIN_EXTENT),
        }
    }
}

/// Description of a body to create.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    /// Explicit mass; derived from density and area when `None`.
    pub mass: Option<f32>,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    pub friction_air: f32,
    pub is_static: bool,
    /// Translates without ever rotating.
    pub fixed_rotation: bool,
    pub style: Style,
}

impl BodyDesc {
    fn with_shape(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            mass: None,
            density: 0.001,
            restitution: 0.0,
            friction: 0.1,
            friction_air: 0.01,
            is_static: false,
            fixed_rotation: false,
            style: Style::default(),
        }
    }

    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self::with_shape(Shape::Circle { radius }, position)
    }

    pub fn rectangle(position: Vec2, width: f32, height: f32) -> Self {
        Self::with_shape(Shape::Rectangle { width, height }, position)
    }

    /// Convex polygon from world-space vertices; the body is placed at their centroid.
    pub fn polygon(vertices: &[Vec2]) -> Self {
        let centroid = polygon_centroid(vertices);
        let local = vertices.iter().map(|v| *v - centroid).collect();
        Self::with_shape(Shape::Polygon { vertices: local }, centroid)
    }

    /// Immovable body with infinite mass.
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Keep the starting angle for the whole run.
    pub fn without_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_friction_air(mut self, friction_air: f32) -> Self {
        self.friction_air = friction_air;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Mass the body will have once created.
    pub fn resolved_mass(&self) -> f32 {
        self.mass
            .unwrap_or(self.density * self.shape.area())
            .max(f32::EPSILON)
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        if self.shape.is_degenerate() {
            return Err(SceneError::DegenerateGeometry(format!(
                "body shape {:?} is degenerate",
                self.shape
            )));
        }
        if !(self.position.is_finite() && self.velocity.is_finite() && self.angle.is_finite()) {
            return Err(SceneError::DegenerateGeometry("body placement is not finite".into()));
        }
        Ok(())
    }

    fn rigid_body(&self) -> RigidBodyBuilder {
        if self.is_static {
            return RigidBodyBuilder::fixed()
                .translation(to_vector(self.position))
                .rotation(self.angle);
        }
        let damping = linear_damping(self.friction_air);
        let builder = RigidBodyBuilder::dynamic()
            .translation(to_vector(self.position))
            .rotation(self.angle)
            .linvel(to_vector(self.velocity * TICKS_PER_SECOND))
            .linear_damping(damping)
            .angular_damping(damping)
            .ccd_enabled(true)
            .can_sleep(false);
        if self.fixed_rotation {
            builder.lock_rotations()
        } else {
            builder
        }
    }

    fn collider(&self) -> Result<ColliderBuilder, SceneError> {
        let builder = match &self.shape {
            Shape::Circle { radius } => ColliderBuilder::ball(*radius),
            Shape::Rectangle { width, height } => ColliderBuilder::cuboid(width * 0.5, height * 0.5),
            Shape::Polygon { vertices } => {
                let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y]).collect();
                ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                    SceneError::DegenerateGeometry(format!("polygon {:?} has no convex hull", vertices))
                })?
            }
        };
        // Bounciest and least grippy surface wins
        let builder = builder
            .restitution(self.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(self.friction)
            .friction_combine_rule(CoefficientCombineRule::Min);
        Ok(match self.mass {
            Some(_) => builder.mass(self.resolved_mass()),
            None => builder.density(self.density),
        })
    }
}

/// One end of a constraint, as written by a scene builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// Fixed point in world space.
    Point(Vec2),
    /// Body at `index` in the same blueprint, with an offset from its centre.
    Body { index: usize, offset: Vec2 },
}

impl Anchor {
    pub fn body(index: usize) -> Self {
        Anchor::Body {
            index,
            offset: Vec2::ZERO,
        }
    }

    pub fn body_offset(index: usize, offset: Vec2) -> Self {
        Anchor::Body { index, offset }
    }
}

/// Description of a spring or rod between two anchors.
///
/// A stiffness of [`RIGID_STIFFNESS`] or more makes a rod; anything softer is
/// a spring pulling back by `stiffness` of the stretch each tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintDesc {
    pub a: Anchor,
    pub b: Anchor,
    /// Rest length; the initial distance when `None`.
    pub length: Option<f32>,
    pub stiffness: f32,
    pub style: Style,
}

impl ConstraintDesc {
    pub fn new(a: Anchor, b: Anchor) -> Self {
        Self {
            a,
            b,
            length: None,
            stiffness: 1.0,
            style: Style::line(Color::WHITE, 1.0),
        }
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

/// A body living in the world, as of the last step.
#[derive(Clone, Debug)]
pub struct Body {
    id: EntityId,
    handle: RigidBodyHandle,
    shape: Shape,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    mass: f32,
    restitution: f32,
    friction: f32,
    is_static: bool,
    style: Style,
}

impl Body {
    fn from_desc(id: EntityId, handle: RigidBodyHandle, desc: &BodyDesc) -> Self {
        Self {
            id,
            handle,
            shape: desc.shape.clone(),
            position: desc.position,
            angle: desc.angle,
            velocity: if desc.is_static { Vec2::ZERO } else { desc.velocity },
            mass: desc.resolved_mass(),
            restitution: desc.restitution,
            friction: desc.friction,
            is_static: desc.is_static,
            style: desc.style,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rotation in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn mass(&self) -> f32 {
        if self.is_static {
            f32::INFINITY
        } else {
            self.mass
        }
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn world_vertices(&self) -> Option<Vec<Vec2>> {
        self.shape.world_vertices(self.position, self.angle)
    }

    /// Whether a world-space point lies on this body.
    pub fn contains(&self, point: Vec2) -> bool {
        self.shape
            .contains(Vec2::from_angle(-self.angle).rotate(point - self.position))
    }
}

/// Resolved constraint endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endpoint {
    Fixed(Vec2),
    Body { id: EntityId, offset: Vec2 },
}

/// A constraint living in the world.
#[derive(Clone, Debug)]
pub struct Constraint {
    id: EntityId,
    a: Endpoint,
    b: Endpoint,
    length: f32,
    stiffness: f32,
    style: Style,
    /// `None` when both ends are fixed points.
    joint: Option<ImpulseJointHandle>,
}

impl Constraint {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn endpoints(&self) -> (Endpoint, Endpoint) {
        (self.a, self.b)
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn is_rigid(&self) -> bool {
        self.stiffness >= RIGID_STIFFNESS
    }

    pub fn style(&self) -> Style {
        self.style
    }
}

/// A body held by the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grab {
    pub body: EntityId,
    /// Grabbed point relative to the body centre, in body space.
    pub offset: Vec2,
    /// Where the pointer is pulling.
    pub target: Vec2,
}

struct PointerJoint {
    grab: Grab,
    pointer: RigidBodyHandle,
    joint: ImpulseJointHandle,
}

/// rapier state, kept together so it can be borrowed apart from the snapshots.
struct Physics {
    pipeline: PhysicsPipeline,
    integration: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Collider-less fixed body at the origin; point anchors hang off it.
    frame: RigidBodyHandle,
}

impl Physics {
    fn new() -> Self {
        let mut bodies = RigidBodySet::new();
        let frame = bodies.insert(RigidBodyBuilder::fixed().build());
        Self {
            pipeline: PhysicsPipeline::new(),
            integration: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            frame,
        }
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }
}

/// Container of all simulated bodies and constraints.
pub struct World {
    bodies: Vec<Body>,
    constraints: Vec<Constraint>,
    gravity: Vec2,
    next_id: u32,
    grab: Option<PointerJoint>,
    physics: Physics,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("bodies", &self.bodies)
            .field("constraints", &self.constraints)
            .field("gravity", &self.gravity)
            .field("grab", &self.grabbed())
            .finish()
    }
}

impl World {
    /// Empty world with downward gravity of 1.
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            constraints: Vec::new(),
            gravity: Vec2::new(0.0, 1.0),
            next_id: 0,
            grab: None,
            physics: Physics::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Number of bodies plus constraints.
    pub fn len(&self) -> usize {
        self.bodies.len() + self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Remove every constraint and every body, keeping static bodies if asked.
    ///
    /// Any grab is released.
    pub fn clear(&mut self, keep_static: bool) {
        self.release();
        for constraint in self.constraints.drain(..) {
            if let Some(joint) = constraint.joint {
                self.physics.impulse_joints.remove(joint, true);
            }
        }

        let (kept, removed): (Vec<Body>, Vec<Body>) = self
            .bodies
            .drain(..)
            .partition(|b| keep_static && b.is_static);
        for body in removed {
            self.physics.remove_body(body.handle);
        }
        self.bodies = kept;
    }

    /// Insert a batch of entities, returning one id per entity.
    ///
    /// Every entity is validated before anything is inserted, so a failed
    /// call leaves the world untouched.
    pub fn add(&mut self, entities: &[SceneEntity]) -> Result<Vec<EntityId>, SceneError> {
        let mut colliders = Vec::with_capacity(entities.len());
        for entity in entities {
            match entity {
                SceneEntity::Body(desc) => {
                    desc.validate()?;
                    colliders.push(Some(desc.collider()?));
                }
                SceneEntity::Constraint(desc) => {
                    for anchor in [desc.a, desc.b] {
                        if let Anchor::Body { index, .. } = anchor {
                            match entities.get(index) {
                                Some(SceneEntity::Body(_)) => {}
                                _ => {
                                    return Err(SceneError::InvalidReference {
                                        index,
                                        len: entities.len(),
                                    })
                                }
                            }
                        }
                    }
                    colliders.push(None);
                }
            }
        }

        let ids: Vec<EntityId> = entities
            .iter()
            .map(|_| {
                let id = EntityId(self.next_id);
                self.next_id += 1;
                id
            })
            .collect();

        for ((entity, id), collider) in entities.iter().zip(&ids).zip(colliders) {
            if let (SceneEntity::Body(desc), Some(collider)) = (entity, collider) {
                let physics = &mut self.physics;
                let handle = physics.bodies.insert(desc.rigid_body().build());
                physics
                    .colliders
                    .insert_with_parent(collider.build(), handle, &mut physics.bodies);
                self.bodies.push(Body::from_desc(*id, handle, desc));
            }
        }
        for (entity, id) in entities.iter().zip(&ids) {
            if let SceneEntity::Constraint(desc) = entity {
                let resolve = |anchor: Anchor| match anchor {
                    Anchor::Point(p) => Endpoint::Fixed(p),
                    Anchor::Body { index, offset } => Endpoint::Body {
                        id: ids[index],
                        offset,
                    },
                };
                let (a, b) = (resolve(desc.a), resolve(desc.b));
                let length = desc
                    .length
                    .unwrap_or_else(|| (self.endpoint_position(b) - self.endpoint_position(a)).length())
                    .max(0.0);
                let stiffness = crate::geometry::stiffness(desc.stiffness);
                let joint = if stiffness >= RIGID_STIFFNESS {
                    self.attach_rod(a, b, length)
                } else {
                    self.attach_spring(a, b, length, stiffness)
                };
                self.constraints.push(Constraint {
                    id: *id,
                    a,
                    b,
                    length,
                    stiffness,
                    style: desc.style,
                    joint,
                });
            }
        }
        Ok(ids)
    }

    /// World position of a constraint endpoint.
    pub fn endpoint_position(&self, endpoint: Endpoint) -> Vec2 {
        match endpoint {
            Endpoint::Fixed(p) => p,
            Endpoint::Body { id, offset } => self
                .body(id)
                .map(|b| b.position + Vec2::from_angle(b.angle).rotate(offset))
                .unwrap_or(Vec2::ZERO),
        }
    }

    /// rapier body and local anchor point of an endpoint.
    fn joint_anchor(&self, endpoint: Endpoint) -> Option<(RigidBodyHandle, Vec2)> {
        match endpoint {
            Endpoint::Fixed(p) => Some((self.physics.frame, p)),
            Endpoint::Body { id, offset } => self.body(id).map(|b| (b.handle, offset)),
        }
    }

    /// Pin `b` so that it swings `length` away from `a`.
    fn attach_rod(&mut self, a: Endpoint, b: Endpoint, length: f32) -> Option<ImpulseJointHandle> {
        // The pivot goes on the fixed end when there is one
        let (a, b) = match b {
            Endpoint::Fixed(_) => (b, a),
            Endpoint::Body { .. } => (a, b),
        };
        let Endpoint::Body { id, offset } = b else {
            return None;
        };
        let (pivot_body, pivot) = self.joint_anchor(a)?;
        let (handle, angle) = self.body(id).map(|body| (body.handle, body.angle))?;

        let toward_pivot = (self.endpoint_position(a) - self.endpoint_position(b))
            .try_normalize()
            .unwrap_or(Vec2::NEG_Y);
        let hinge = offset + Vec2::from_angle(-angle).rotate(toward_pivot * length);
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(point![pivot.x, pivot.y])
            .local_anchor2(point![hinge.x, hinge.y])
            .build();
        Some(self.physics.impulse_joints.insert(pivot_body, handle, joint, true))
    }

    fn attach_spring(
        &mut self,
        a: Endpoint,
        b: Endpoint,
        length: f32,
        stiffness: f32,
    ) -> Option<ImpulseJointHandle> {
        let (body_a, anchor_a) = self.joint_anchor(a)?;
        let (body_b, anchor_b) = self.joint_anchor(b)?;
        if body_a == body_b {
            return None;
        }
        let joint = SpringJointBuilder::new(length, spring_rate(stiffness), 0.0)
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor1(point![anchor_a.x, anchor_a.y])
            .local_anchor2(point![anchor_b.x, anchor_b.y])
            .build();
        Some(self.physics.impulse_joints.insert(body_a, body_b, joint, true))
    }

    /// Teleport a body. Static bodies may be moved this way too.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        match self.physics.bodies.get_mut(body.handle) {
            Some(rb) => {
                rb.set_translation(to_vector(position), true);
                body.position = position;
                true
            }
            None => false,
        }
    }

    /// Accumulate a force for the next step.
    pub fn apply_force(&mut self, id: EntityId, force: Vec2) -> bool {
        let Some(handle) = self.body(id).filter(|b| !b.is_static).map(|b| b.handle) else {
            return false;
        };
        match self.physics.bodies.get_mut(handle) {
            Some(rb) => {
                rb.add_force(to_vector(force * ACCEL_TO_SECONDS), true);
                true
            }
            None => false,
        }
    }

    /// Topmost movable body under a world-space point.
    pub fn body_at(&self, point: Vec2) -> Option<EntityId> {
        self.bodies
            .iter()
            .rev()
            .find(|b| !b.is_static && b.contains(point))
            .map(|b| b.id)
    }

    /// Hold `id` at `point` with a soft spring. Replaces any earlier grab.
    ///
    /// Returns `false` for static or unknown bodies.
    pub fn grab(&mut self, id: EntityId, point: Vec2) -> bool {
        self.release();
        let Some((handle, offset)) = self
            .body(id)
            .filter(|b| !b.is_static)
            .map(|b| (b.handle, Vec2::from_angle(-b.angle).rotate(point - b.position)))
        else {
            return false;
        };

        let pointer = self.physics.bodies.insert(
            RigidBodyBuilder::kinematic_position_based()
                .translation(to_vector(point))
                .build(),
        );
        let rate = spring_rate(GRAB_STIFFNESS);
        let joint = SpringJointBuilder::new(0.0, rate, 2.0 * GRAB_DAMPING_RATIO * rate.sqrt())
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor2(point![offset.x, offset.y])
            .build();
        let joint = self.physics.impulse_joints.insert(pointer, handle, joint, true);
        self.grab = Some(PointerJoint {
            grab: Grab {
                body: id,
                offset,
                target: point,
            },
            pointer,
            joint,
        });
        true
    }

    /// Move the pointer end of the current grab.
    pub fn drag(&mut self, target: Vec2) -> bool {
        let Some(held) = self.grab.as_mut() else {
            return false;
        };
        held.grab.target = target;
        match self.physics.bodies.get_mut(held.pointer) {
            Some(rb) => {
                rb.set_next_kinematic_translation(to_vector(target));
                true
            }
            None => false,
        }
    }

    /// Let go of the grabbed body. Returns what was held.
    pub fn release(&mut self) -> Option<Grab> {
        let held = self.grab.take()?;
        self.physics.impulse_joints.remove(held.joint, true);
        self.physics.remove_body(held.pointer);
        Some(held.grab)
    }

    /// The current grab, if any.
    pub fn grabbed(&self) -> Option<Grab> {
        self.grab.as_ref().map(|held| held.grab)
    }

    /// Advance the world by `delta_ms`.
    pub fn step(&mut self, delta_ms: f32) {
        if !(delta_ms > 0.0 && delta_ms.is_finite()) {
            return;
        }
        let gravity = to_vector(self.gravity * GRAVITY_SCALE * ACCEL_TO_SECONDS);
        let physics = &mut self.physics;
        physics.integration.dt = delta_ms / 1000.0;
        physics.pipeline.step(
            &gravity,
            &physics.integration,
            &mut physics.islands,
            &mut physics.broad_phase,
            &mut physics.narrow_phase,
            &mut physics.bodies,
            &mut physics.colliders,
            &mut physics.impulse_joints,
            &mut physics.multibody_joints,
            &mut physics.ccd,
            None,
            &(),
            &(),
        );

        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            let Some(rb) = physics.bodies.get_mut(body.handle) else {
                continue;
            };
            rb.reset_forces(false);
            body.position = from_vector(rb.translation());
            body.angle = rb.rotation().angle();
            body.velocity = from_vector(rb.linvel()) / TICKS_PER_SECOND;
        }
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Per-tick velocity loss as a damping rate: `1 - f` per tick equals
/// `1 / (1 + rate * dt)`.
fn linear_damping(friction_air: f32) -> f32 {
    let f = friction_air.clamp(0.0, 0.99);
    TICKS_PER_SECOND * f / (1.0 - f)
}

/// Acceleration per pixel of stretch, in 1/s², for a per-tick stiffness.
fn spring_rate(stiffness: f32) -> f32 {
    stiffness * TICKS_PER_SECOND * TICKS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> SceneEntity {
        SceneEntity::Body(BodyDesc::rectangle(Vec2::new(400.0, 575.0), 800.0, 50.0).fixed())
    }

    fn slope() -> SceneEntity {
        // 30 degree ramp falling to the right
        SceneEntity::Body(
            BodyDesc::polygon(&[
                Vec2::new(100.0, 250.0),
                Vec2::new(619.6, 550.0),
                Vec2::new(100.0, 550.0),
            ])
            .fixed()
            .with_friction(0.6),
        )
    }

    fn run(world: &mut World, ticks: usize) {
        for _ in 0..ticks {
            world.step(DEFAULT_DELTA_MS);
        }
    }

    #[test]
    fn test_add_and_clear() {
        let mut world = World::new();
        let ids = world
            .add(&[
                ground(),
                SceneEntity::Body(BodyDesc::circle(Vec2::new(400.0, 100.0), 20.0)),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(world.len(), 2);

        world.clear(true);
        assert_eq!(world.len(), 1);
        assert!(world.bodies()[0].is_static());

        world.clear(false);
        assert!(world.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut world = World::new();
        let first = world.add(&[ground()]).unwrap();
        world.clear(false);
        let second = world.add(&[ground()]).unwrap();
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn test_invalid_reference_leaves_world_untouched() {
        let mut world = World::new();
        let result = world.add(&[
            SceneEntity::Body(BodyDesc::circle(Vec2::ZERO, 5.0)),
            SceneEntity::Constraint(ConstraintDesc::new(Anchor::body(0), Anchor::body(7))),
        ]);
        assert!(matches!(result, Err(SceneError::InvalidReference { index: 7, .. })));
        assert!(world.is_empty());
    }

    #[test]
    fn test_degenerate_body_rejected() {
        let mut world = World::new();
        let result = world.add(&[SceneEntity::Body(BodyDesc::rectangle(Vec2::ZERO, 0.0, 10.0))]);
        assert!(matches!(result, Err(SceneError::DegenerateGeometry(_))));
        assert!(world.is_empty());
    }

    #[test]
    fn test_gravity_accelerates_down() {
        let mut world = World::new();
        let ids = world
            .add(&[SceneEntity::Body(BodyDesc::circle(Vec2::new(0.0, 0.0), 10.0).with_friction_air(0.0))])
            .unwrap();
        run(&mut world, 10);
        let body = world.body(ids[0]).unwrap();
        assert!(body.velocity().y > 0.0);
        assert!(body.position().y > 0.0);
        assert_eq!(body.velocity().x, 0.0);
    }

    #[test]
    fn test_ball_rests_on_ground() {
        let mut world = World::new();
        let ids = world
            .add(&[ground(), SceneEntity::Body(BodyDesc::circle(Vec2::new(400.0, 500.0), 20.0))])
            .unwrap();
        run(&mut world, 300);
        let ball = world.body(ids[1]).unwrap();
        assert!(ball.position().y <= 531.0, "sank to {}", ball.position().y);
        assert!(ball.position().y > 520.0);
    }

    #[test]
    fn test_rigid_constraint_keeps_length() {
        let mut world = World::new();
        let ids = world
            .add(&[
                SceneEntity::Body(BodyDesc::circle(Vec2::new(500.0, 230.0), 10.0)),
                SceneEntity::Constraint(
                    ConstraintDesc::new(Anchor::Point(Vec2::new(400.0, 230.0)), Anchor::body(0))
                        .with_length(100.0),
                ),
            ])
            .unwrap();
        assert!(world.constraints()[0].is_rigid());
        run(&mut world, 120);
        let bob = world.body(ids[0]).unwrap();
        let len = (bob.position() - Vec2::new(400.0, 230.0)).length();
        assert!((len - 100.0).abs() < 2.0, "length drifted to {}", len);
    }

    #[test]
    fn test_soft_constraint_oscillates_around_rest_length() {
        let mut world = World::new();
        world.set_gravity(Vec2::ZERO);
        let ids = world
            .add(&[
                SceneEntity::Body(BodyDesc::circle(Vec2::new(550.0, 300.0), 10.0).with_friction_air(0.0)),
                SceneEntity::Constraint(
                    ConstraintDesc::new(Anchor::Point(Vec2::new(400.0, 300.0)), Anchor::body(0))
                        .with_length(100.0)
                        .with_stiffness(0.01),
                ),
            ])
            .unwrap();
        assert!(!world.constraints()[0].is_rigid());
        let mut shortest = f32::INFINITY;
        for _ in 0..120 {
            world.step(DEFAULT_DELTA_MS);
            shortest = shortest.min(world.body(ids[0]).unwrap().position().x - 400.0);
        }
        // Overshoots the rest length on the way back
        assert!(shortest < 100.0, "never contracted below {}", shortest);
    }

    #[test]
    fn test_equal_circles_exchange_velocity() {
        let mut world = World::new();
        world.set_gravity(Vec2::ZERO);
        let ids = world
            .add(&[
                SceneEntity::Body(
                    BodyDesc::circle(Vec2::new(0.0, 0.0), 10.0)
                        .with_restitution(1.0)
                        .with_friction_air(0.0)
                        .with_velocity(Vec2::new(3.0, 0.0)),
                ),
                SceneEntity::Body(
                    BodyDesc::circle(Vec2::new(30.0, 0.0), 10.0)
                        .with_restitution(1.0)
                        .with_friction_air(0.0),
                ),
            ])
            .unwrap();
        run(&mut world, 10);
        let a = world.body(ids[0]).unwrap().velocity();
        let b = world.body(ids[1]).unwrap().velocity();
        assert!(a.x.abs() < 0.3, "first ball kept {}", a.x);
        assert!((b.x - 3.0).abs() < 0.3, "second ball got {}", b.x);
    }

    #[test]
    fn test_apply_force_is_consumed() {
        let mut world = World::new();
        world.set_gravity(Vec2::ZERO);
        let ids = world
            .add(&[SceneEntity::Body(
                BodyDesc::circle(Vec2::ZERO, 10.0).with_mass(1.0).with_friction_air(0.0),
            )])
            .unwrap();
        assert!(world.apply_force(ids[0], Vec2::new(0.001, 0.0)));
        world.step(DEFAULT_DELTA_MS);
        let v1 = world.body(ids[0]).unwrap().velocity().x;
        world.step(DEFAULT_DELTA_MS);
        let v2 = world.body(ids[0]).unwrap().velocity().x;
        assert!(v1 > 0.0);
        assert!((v1 - v2).abs() < 1e-4);
    }

    #[test]
    fn test_static_bodies_can_be_moved_but_not_pushed() {
        let mut world = World::new();
        let ids = world.add(&[ground()]).unwrap();
        assert!(!world.apply_force(ids[0], Vec2::X));
        assert!(world.set_position(ids[0], Vec2::new(10.0, 575.0)));
        assert_eq!(world.body(ids[0]).unwrap().position().x, 10.0);
    }

    #[test]
    fn test_ball_rolls_down_slope() {
        let mut world = World::new();
        let ids = world
            .add(&[
                ground(),
                slope(),
                SceneEntity::Body(
                    BodyDesc::circle(Vec2::new(200.0, 280.0), 20.0)
                        .with_friction(0.6)
                        .with_mass(10.0),
                ),
            ])
            .unwrap();
        // Angles wrap at pi, so look at the first half second only
        let mut turned = 0f32;
        for _ in 0..30 {
            world.step(DEFAULT_DELTA_MS);
            turned = turned.max(world.body(ids[2]).unwrap().angle().abs());
        }
        assert!(world.body(ids[2]).unwrap().position().x > 210.0);
        assert!(turned > 0.5, "ball slid without turning: {}", turned);
    }

    #[test]
    fn test_locked_body_keeps_its_angle() {
        let angle = 30f32.to_radians();
        let mut world = World::new();
        let ids = world
            .add(&[
                ground(),
                slope(),
                SceneEntity::Body(
                    BodyDesc::rectangle(Vec2::new(200.0, 290.0), 25.0, 25.0)
                        .with_angle(angle)
                        .with_friction(0.1)
                        .without_rotation(),
                ),
            ])
            .unwrap();
        run(&mut world, 100);
        let block = world.body(ids[2]).unwrap();
        assert!(block.position().x > 200.0);
        assert!((block.angle() - angle).abs() < 1e-3);
    }

    #[test]
    fn test_body_at_skips_static_bodies() {
        let mut world = World::new();
        let ids = world
            .add(&[
                ground(),
                SceneEntity::Body(BodyDesc::rectangle(Vec2::new(400.0, 300.0), 60.0, 40.0).with_angle(0.5)),
            ])
            .unwrap();
        assert_eq!(world.body_at(Vec2::new(400.0, 300.0)), Some(ids[1]));
        assert_eq!(world.body_at(Vec2::new(400.0, 570.0)), None);
        assert_eq!(world.body_at(Vec2::new(440.0, 300.0)), None);
    }

    #[test]
    fn test_grab_pulls_body_to_target() {
        let mut world = World::new();
        world.set_gravity(Vec2::ZERO);
        let ids = world
            .add(&[SceneEntity::Body(BodyDesc::circle(Vec2::new(400.0, 300.0), 20.0))])
            .unwrap();
        assert!(world.grab(ids[0], Vec2::new(400.0, 300.0)));
        let target = Vec2::new(500.0, 250.0);
        assert!(world.drag(target));
        run(&mut world, 180);
        let ball = world.body(ids[0]).unwrap().position();
        assert!((ball - target).length() < 10.0, "ball stopped at {:?}", ball);

        let held = world.release().unwrap();
        assert_eq!(held.body, ids[0]);
        assert_eq!(held.target, target);
        assert!(world.grabbed().is_none());
        assert!(!world.drag(Vec2::ZERO));
    }

    #[test]
    fn test_static_bodies_cannot_be_grabbed() {
        let mut world = World::new();
        let ids = world.add(&[ground()]).unwrap();
        assert!(!world.grab(ids[0], Vec2::new(400.0, 575.0)));
        assert!(world.grabbed().is_none());
    }

    #[test]
    fn test_clear_releases_grab() {
        let mut world = World::new();
        let ids = world
            .add(&[SceneEntity::Body(BodyDesc::circle(Vec2::new(400.0, 300.0), 20.0))])
            .unwrap();
        assert!(world.grab(ids[0], Vec2::new(405.0, 300.0)));
        world.clear(false);
        assert!(world.grabbed().is_none());
        assert!(world.is_empty());
    }
}

//! Rigid bodies coupled by frictional contacts and ball joints.
//!
//! Every body contributes six velocity degrees of freedom, linear first.
//! Every constraint row couples two bodies through four `DVec3` blocks, so
//! the Jacobian is stored row-sparse and the Schur operator is applied as
//! `J · M⁻¹ · Jᵀ` without forming any matrix.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::core::{
    constraints::{ConstraintGroup, ConstraintLayout},
    descriptor::SystemDescriptor,
};

const DOFS_PER_BODY: usize = 6;

/// Index of a body inside a [`RigidContactSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub usize);

/// Rigid body state as seen by the solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverBody {
    pub position: DVec3,
    pub linear_velocity: DVec3,
    pub angular_velocity: DVec3,
    pub mass: f64,
    pub inertia: DMat3,
    pub inverse_mass: f64,
    pub inverse_inertia: DMat3,
    /// External force applied over the step.
    pub force: DVec3,
    /// External torque applied over the step.
    pub torque: DVec3,
}

impl SolverBody {
    pub fn new(position: DVec3, mass: f64, inertia: DMat3) -> Self {
        let mut body = Self {
            position,
            linear_velocity: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            mass,
            inertia,
            inverse_mass: 0.0,
            inverse_inertia: DMat3::ZERO,
            force: DVec3::ZERO,
            torque: DVec3::ZERO,
        };
        body.recompute_inverses();
        body
    }

    /// An immovable body. Static bodies are assumed to be at rest.
    pub fn fixed(position: DVec3) -> Self {
        Self::new(position, 0.0, DMat3::ZERO)
    }

    /// Solid box with the given half extents.
    pub fn cuboid(position: DVec3, mass: f64, half_extents: DVec3) -> Self {
        let e = half_extents * 2.0;
        let inertia = DMat3::from_diagonal(DVec3::new(
            mass / 12.0 * (e.y * e.y + e.z * e.z),
            mass / 12.0 * (e.x * e.x + e.z * e.z),
            mass / 12.0 * (e.x * e.x + e.y * e.y),
        ));
        Self::new(position, mass, inertia)
    }

    pub fn with_velocity(mut self, linear: DVec3, angular: DVec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn with_force(mut self, force: DVec3) -> Self {
        self.force = force;
        self
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    pub fn recompute_inverses(&mut self) {
        if self.mass > 0.0 {
            self.inverse_mass = 1.0 / self.mass;
            self.inverse_inertia = if self.inertia.determinant().abs() > f64::EPSILON {
                self.inertia.inverse()
            } else {
                DMat3::ZERO
            };
        } else {
            self.inverse_mass = 0.0;
            self.inverse_inertia = DMat3::ZERO;
        }
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn point_velocity(&self, point: DVec3) -> DVec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.position)
    }
}

/// Contact between two bodies. The normal points from `body_a` to `body_b`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContactPoint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub point: DVec3,
    pub normal: DVec3,
    /// Positive when the shapes overlap, negative for a speculative gap.
    pub depth: f64,
    pub friction: f64,
}

/// Spherical joint pinning an anchor of `body_a` to an anchor of `body_b`.
/// Anchors are world-aligned offsets from each body's position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallJoint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub anchor_a: DVec3,
    pub anchor_b: DVec3,
}

/// One Jacobian row: `lin_a·v_a + ang_a·ω_a + lin_b·v_b + ang_b·ω_b`.
#[derive(Debug, Clone, Copy)]
struct JacobianRow {
    body_a: usize,
    body_b: usize,
    lin_a: DVec3,
    ang_a: DVec3,
    lin_b: DVec3,
    ang_b: DVec3,
}

impl JacobianRow {
    /// Relative velocity of `point` on `b` with respect to `a`, along `direction`.
    fn relative(
        bodies: &[SolverBody],
        body_a: usize,
        body_b: usize,
        point_a: DVec3,
        point_b: DVec3,
        direction: DVec3,
    ) -> Self {
        let r_a = point_a - bodies[body_a].position;
        let r_b = point_b - bodies[body_b].position;
        Self {
            body_a,
            body_b,
            lin_a: -direction,
            ang_a: -r_a.cross(direction),
            lin_b: direction,
            ang_b: r_b.cross(direction),
        }
    }
}

/// Tuning of the position-error feedback folded into the bias.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationParams {
    /// Fraction of the position error removed per step.
    pub baumgarte: f64,
    /// Upper bound on the separating velocity requested by the bias.
    pub max_correction_velocity: f64,
}

impl Default for StabilizationParams {
    fn default() -> Self {
        Self {
            baumgarte: 0.2,
            max_correction_velocity: 5.0,
        }
    }
}

/// Descriptor built from rigid bodies, contacts and ball joints for one step.
#[derive(Debug, Clone)]
pub struct RigidContactSystem {
    time_step: f64,
    stabilization: StabilizationParams,
    bodies: Vec<SolverBody>,
    rows: Vec<JacobianRow>,
    layout: ConstraintLayout,
    bias: Vec<f64>,
    free_forces: Vec<f64>,
    reactions: Vec<f64>,
    scratch: Vec<f64>,
}

impl RigidContactSystem {
    pub fn new(time_step: f64) -> Self {
        Self::with_stabilization(time_step, StabilizationParams::default())
    }

    pub fn with_stabilization(time_step: f64, stabilization: StabilizationParams) -> Self {
        Self {
            time_step,
            stabilization,
            bodies: Vec::new(),
            rows: Vec::new(),
            layout: ConstraintLayout::new(),
            bias: Vec::new(),
            free_forces: Vec::new(),
            reactions: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn add_body(&mut self, body: SolverBody) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(body);
        self.free_forces.resize(self.bodies.len() * DOFS_PER_BODY, 0.0);
        self.refresh_free_forces(handle.0);
        handle
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&SolverBody> {
        self.bodies.get(handle.0)
    }

    pub fn bodies(&self) -> &[SolverBody] {
        &self.bodies
    }

    /// Adds a frictional contact and returns the offset of its group.
    ///
    /// # Panics
    ///
    /// Panics if either handle was not returned by this system's `add_body`.
    pub fn add_contact(&mut self, contact: ContactPoint) -> usize {
        let (a, b) = (self.index_of(contact.body_a), self.index_of(contact.body_b));
        let normal = contact.normal.normalize_or_zero();
        let (t1, t2) = normal.any_orthonormal_pair();

        let offset = self.layout.push_friction(contact.friction);
        for direction in [normal, t1, t2] {
            self.rows.push(JacobianRow::relative(
                &self.bodies,
                a,
                b,
                contact.point,
                contact.point,
                direction,
            ));
        }

        let h = self.time_step;
        let normal_bias = if contact.depth > 0.0 {
            -(self.stabilization.baumgarte * contact.depth / h)
                .min(self.stabilization.max_correction_velocity)
        } else {
            // Allow closing the gap within one step, nothing more.
            -contact.depth / h
        };
        self.bias.extend_from_slice(&[normal_bias, 0.0, 0.0]);
        self.reactions.resize(self.layout.dimension(), 0.0);
        offset
    }

    /// Adds a ball joint as three bilateral rows and returns the first offset.
    ///
    /// # Panics
    ///
    /// Panics if either handle was not returned by this system's `add_body`.
    pub fn add_ball_joint(&mut self, joint: BallJoint) -> usize {
        let (a, b) = (self.index_of(joint.body_a), self.index_of(joint.body_b));
        let pivot_a = self.bodies[a].position + joint.anchor_a;
        let pivot_b = self.bodies[b].position + joint.anchor_b;
        let error = pivot_b - pivot_a;
        let gain = self.stabilization.baumgarte / self.time_step;

        let offset = self.layout.dimension();
        for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
            self.layout.push_bilateral();
            self.rows
                .push(JacobianRow::relative(&self.bodies, a, b, pivot_a, pivot_b, axis));
            self.bias.push(gain * error.dot(axis));
        }
        self.reactions.resize(self.layout.dimension(), 0.0);
        offset
    }

    fn index_of(&self, handle: BodyHandle) -> usize {
        assert!(
            handle.0 < self.bodies.len(),
            "body handle {} is not part of this system ({} bodies)",
            handle.0,
            self.bodies.len()
        );
        handle.0
    }

    /// Drops every constraint, keeping the bodies.
    pub fn clear_constraints(&mut self) {
        self.rows.clear();
        self.layout.clear();
        self.bias.clear();
        self.reactions.clear();
    }

    /// Moves bodies with their current velocities and refreshes the free
    /// forces for the next step. Constraints are cleared.
    pub fn advance_positions(&mut self) {
        let h = self.time_step;
        for body in self.bodies.iter_mut().filter(|body| !body.is_static()) {
            body.position += body.linear_velocity * h;
        }
        for index in 0..self.bodies.len() {
            self.refresh_free_forces(index);
        }
        self.clear_constraints();
    }

    /// Multipliers committed by the last solve.
    pub fn reactions(&self) -> &[f64] {
        &self.reactions
    }

    /// `(normal, tangent_1, tangent_2)` impulses of the group at `offset`.
    pub fn contact_impulse(&self, offset: usize) -> DVec3 {
        DVec3::from_slice(&self.reactions[offset..offset + 3])
    }

    /// `f_free = M·v + h·F_ext`, zero for static bodies.
    fn refresh_free_forces(&mut self, index: usize) {
        let body = &self.bodies[index];
        let (linear, angular) = if body.is_static() {
            (DVec3::ZERO, DVec3::ZERO)
        } else {
            let h = self.time_step;
            (
                body.linear_velocity * body.mass + body.force * h,
                body.inertia * body.angular_velocity + body.torque * h,
            )
        };
        let base = index * DOFS_PER_BODY;
        linear.write_to_slice(&mut self.free_forces[base..base + 3]);
        angular.write_to_slice(&mut self.free_forces[base + 3..base + 6]);
    }
}

fn read_dofs(v: &[f64], body: usize) -> (DVec3, DVec3) {
    let base = body * DOFS_PER_BODY;
    (
        DVec3::from_slice(&v[base..base + 3]),
        DVec3::from_slice(&v[base + 3..base + 6]),
    )
}

fn add_dofs(out: &mut [f64], body: usize, linear: DVec3, angular: DVec3) {
    let base = body * DOFS_PER_BODY;
    for k in 0..3 {
        out[base + k] += linear[k];
        out[base + 3 + k] += angular[k];
    }
}

impl SystemDescriptor for RigidContactSystem {
    fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    fn body_dimension(&self) -> usize {
        self.bodies.len() * DOFS_PER_BODY
    }

    fn jacobian_shape(&self) -> (usize, usize) {
        (self.rows.len(), self.body_dimension())
    }

    fn constraint_groups(&self) -> &[ConstraintGroup] {
        self.layout.groups()
    }

    fn bias_and_free_forces(&self) -> (&[f64], &[f64]) {
        (&self.bias, &self.free_forces)
    }

    fn jacobian_mul(&self, v: &[f64], out: &mut [f64]) {
        for (row, o) in self.rows.iter().zip(out.iter_mut()) {
            let (lin_a, ang_a) = read_dofs(v, row.body_a);
            let (lin_b, ang_b) = read_dofs(v, row.body_b);
            *o = row.lin_a.dot(lin_a) + row.ang_a.dot(ang_a) + row.lin_b.dot(lin_b) + row.ang_b.dot(ang_b);
        }
    }

    fn jacobian_transpose_mul(&self, gamma: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        for (row, &g) in self.rows.iter().zip(gamma) {
            if g == 0.0 {
                continue;
            }
            add_dofs(out, row.body_a, row.lin_a * g, row.ang_a * g);
            add_dofs(out, row.body_b, row.lin_b * g, row.ang_b * g);
        }
    }

    fn solve_mass(&self, f: &[f64], out: &mut [f64]) {
        for (index, body) in self.bodies.iter().enumerate() {
            let (linear, angular) = read_dofs(f, index);
            let base = index * DOFS_PER_BODY;
            (linear * body.inverse_mass).write_to_slice(&mut out[base..base + 3]);
            (body.inverse_inertia * angular).write_to_slice(&mut out[base + 3..base + 6]);
        }
    }

    /// Stores the multipliers and recovers body velocities
    /// `v = M⁻¹ (f_free + Jᵀγ)`.
    fn write_solution(&mut self, gamma: &[f64]) {
        self.reactions.clear();
        self.reactions.extend_from_slice(gamma);

        let mut impulses = std::mem::take(&mut self.scratch);
        impulses.resize(self.body_dimension(), 0.0);
        self.jacobian_transpose_mul(gamma, &mut impulses);
        for (impulse, free) in impulses.iter_mut().zip(&self.free_forces) {
            *impulse += free;
        }

        for (index, body) in self.bodies.iter_mut().enumerate() {
            if body.is_static() {
                continue;
            }
            let (linear, angular) = read_dofs(&impulses, index);
            body.linear_velocity = linear * body.inverse_mass;
            body.angular_velocity = body.inverse_inertia * angular;
        }
        self.scratch = impulses;
    }
}

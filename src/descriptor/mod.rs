//! Concrete [`SystemDescriptor`](crate::core::SystemDescriptor) implementations.

pub mod dense;
pub mod rigid;

pub use dense::DenseSystem;
pub use rigid::{BallJoint, BodyHandle, ContactPoint, RigidContactSystem, SolverBody, StabilizationParams};

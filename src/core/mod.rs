//! Core types shared by descriptors and solvers: constraint layout, the
//! descriptor contract, and configuration errors.

pub mod constraints;
pub mod descriptor;
pub mod error;

pub use constraints::{ConstraintGroup, ConstraintKind, ConstraintLayout};
pub use descriptor::{validate_descriptor, BodyWorkspace, SystemDescriptor};
pub use error::ConfigurationError;

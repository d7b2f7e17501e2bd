//! Utility helpers: dense vector kernels, logging, and profiling.

pub mod logging;
pub mod profiling;
pub mod vector;

pub use profiling::SolverProfiler;
pub use vector::JobMode;

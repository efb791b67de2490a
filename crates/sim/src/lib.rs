//! # Planner Simulation Crate
//!
//! A recording fake implementation of the planner's writer interface plus
//! harness utilities, used by the scenario tests and examples to assert on
//! the exact motion stream a layer produces.

pub mod fake_writer;
pub mod harness;

pub use fake_writer::{FakeWriter, WriteEvent};
pub use harness::RectBoundary;

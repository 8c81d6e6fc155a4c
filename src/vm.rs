//! The runtime side of the pipeline: the lowered [`Program`] model and the
//! tick-driven [`Engine`] that executes it against the hardware layer.

pub mod engine;
pub mod program;

pub use engine::{Engine, EngineState};
pub use program::{Condition, Program, RuntimeNode, ValueRef};

#[cfg(test)]
mod tests;

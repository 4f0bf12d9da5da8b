//! Feedback control: per-quantity PID loops and their arbitration.

pub mod engine;
pub mod pid;

pub use engine::{ControlDecision, ControlEngine};
pub use pid::PidController;

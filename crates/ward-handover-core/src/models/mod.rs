//! Domain models for the ward handover tracker.

mod handover;
mod patient;
mod progress;

pub use handover::*;
pub use patient::*;
pub use progress::*;

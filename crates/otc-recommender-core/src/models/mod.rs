//! Domain models for the OTC recommender.

mod features;
mod patient;
mod recommendation;

pub use features::*;
pub use patient::*;
pub use recommendation::*;

//! Simulation layer: population construction, the round protocol, and the
//! top-level model that ties them together

pub mod model;
pub mod population;
pub mod round;

pub use model::{AffinityMatrixStats, Model, StatusCounts};
pub use round::RoundEvent;

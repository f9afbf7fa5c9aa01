//! Agent-based simulation of nightlife venue choice under identity dynamics
//!
//! A fixed population of persons, each belonging to one identity group,
//! repeatedly chooses between venues. Each round every person either visits
//! the venue they expect to belong at, or withdraws when no venue has felt
//! welcoming for long enough. Venues slowly adapt their culture toward the
//! people who actually show up, which feeds back into the next round's
//! choices.
//!
//! Entry point is [`simulation::Model`]: build one from a
//! [`core::config::ModelConfig`], call `step` per round, and read results
//! through the accessors or a [`report::ModelSnapshot`]. Runs are fully
//! deterministic for a given config and seed.

pub mod core;
pub mod person;
pub mod report;
pub mod simulation;
pub mod venue;

pub use crate::core::config::ModelConfig;
pub use crate::core::error::{Result, SimError};
pub use crate::core::types::{GroupMap, IdentityGroup, PersonId, Round, VenueId};
pub use crate::simulation::Model;

//! Top-level model: owns the population, the venues, and the round counter
//!
//! All randomness flows from the configured seed. The model-level RNG seeds
//! the population and drives the per-round shuffle; each person carries a
//! private stream derived from the same seed. Two models built from equal
//! configs produce identical runs.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::core::config::ModelConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{GroupMap, IdentityGroup, PersonId, Round, VenueId};
use crate::person::{Person, Status};
use crate::simulation::population::build_population;
use crate::simulation::round::{run_round, RoundEvent};
use crate::venue::Venue;

/// Population head-count per withdrawal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub temporarily_withdrawn: usize,
    pub permanently_withdrawn: usize,
}

type Matrix = [[f64; IdentityGroup::COUNT]; IdentityGroup::COUNT];

/// Population statistics over the private affinity matrices
///
/// Cell `[r][c]` aggregates the perception of group `c` held by members of
/// group `r`; only people of group `r` contribute to row `r`. An empty group
/// leaves its row at zero except for the configured baseline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AffinityMatrixStats {
    pub mean: Matrix,
    pub std_dev: Matrix,
    pub min: Matrix,
    pub max: Matrix,
    pub baseline: Matrix,
}

pub struct Model {
    cfg: ModelConfig,
    people: Vec<Person>,
    venues: Vec<Venue>,
    round: Round,
    rng: ChaCha8Rng,
}

impl Model {
    /// Build a model from a validated config
    pub fn new(cfg: ModelConfig) -> Result<Self> {
        cfg.validate().map_err(SimError::InvalidConfig)?;

        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let people = build_population(&cfg, &mut rng);
        let venues = cfg
            .venues
            .iter()
            .enumerate()
            .map(|(i, vc)| Venue::new(VenueId(i), vc, &cfg))
            .collect();

        tracing::info!(
            venues = cfg.venues.len(),
            seed = cfg.seed,
            "model initialized"
        );
        Ok(Self {
            cfg,
            people,
            venues,
            round: 0,
            rng,
        })
    }

    /// Advance one round and return the events it produced
    pub fn step(&mut self) -> Vec<RoundEvent> {
        let events = run_round(
            &mut self.people,
            &mut self.venues,
            self.round,
            &self.cfg,
            &mut self.rng,
        );
        self.round += 1;
        events
    }

    /// Advance `rounds` rounds, discarding per-round events
    pub fn run(&mut self, rounds: u64) {
        for _ in 0..rounds {
            self.step();
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn config(&self) -> &ModelConfig {
        &self.cfg
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn venue(&self, id: VenueId) -> Result<&Venue> {
        self.venues.get(id.0).ok_or(SimError::VenueNotFound(id))
    }

    pub fn person(&self, id: PersonId) -> Result<&Person> {
        self.people
            .get(id.0 as usize)
            .ok_or(SimError::PersonNotFound(id))
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            active: 0,
            temporarily_withdrawn: 0,
            permanently_withdrawn: 0,
        };
        for person in &self.people {
            match person.status {
                Status::Active => counts.active += 1,
                Status::TemporarilyWithdrawn => counts.temporarily_withdrawn += 1,
                Status::PermanentlyWithdrawn => counts.permanently_withdrawn += 1,
            }
        }
        counts
    }

    /// Status breakdown per identity group
    pub fn status_counts_by_group(&self) -> GroupMap<StatusCounts> {
        let mut by_group = GroupMap::from_fn(|_| StatusCounts {
            active: 0,
            temporarily_withdrawn: 0,
            permanently_withdrawn: 0,
        });
        for person in &self.people {
            let counts = &mut by_group[person.group];
            match person.status {
                Status::Active => counts.active += 1,
                Status::TemporarilyWithdrawn => counts.temporarily_withdrawn += 1,
                Status::PermanentlyWithdrawn => counts.permanently_withdrawn += 1,
            }
        }
        by_group
    }

    /// Mean perception matrix: cell `[r][c]` averaged over group `r` members
    pub fn average_affinity_matrix(&self) -> Matrix {
        self.affinity_matrix_stats().mean
    }

    pub fn affinity_matrix_stats(&self) -> AffinityMatrixStats {
        let mut stats = AffinityMatrixStats {
            mean: [[0.0; IdentityGroup::COUNT]; IdentityGroup::COUNT],
            std_dev: [[0.0; IdentityGroup::COUNT]; IdentityGroup::COUNT],
            min: [[0.0; IdentityGroup::COUNT]; IdentityGroup::COUNT],
            max: [[0.0; IdentityGroup::COUNT]; IdentityGroup::COUNT],
            baseline: self.cfg.base_affinity_matrix,
        };

        for of in IdentityGroup::ALL {
            for toward in IdentityGroup::ALL {
                let values: Vec<f64> = self
                    .people
                    .iter()
                    .filter(|p| p.group == of)
                    .map(|p| p.perceived_affinity(toward))
                    .collect();
                if values.is_empty() {
                    continue;
                }

                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

                let cell = (of.index(), toward.index());
                stats.mean[cell.0][cell.1] = mean;
                stats.std_dev[cell.0][cell.1] = variance.sqrt();
                stats.min[cell.0][cell.1] = values.iter().copied().fold(f64::INFINITY, f64::min);
                stats.max[cell.0][cell.1] =
                    values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            }
        }
        stats
    }

    /// Per-group head-count of the last completed round's visitors,
    /// summed over all venues
    pub fn attendance_by_group(&self) -> GroupMap<u32> {
        let mut totals = GroupMap::<u32>::default();
        for venue in &self.venues {
            let counts = venue.current_visitors();
            for g in IdentityGroup::ALL {
                totals[g] += counts[g];
            }
        }
        totals
    }
}

//! Person state: identity, belonging evaluation, and score memory
//!
//! Each person carries a personal affinity-perception matrix sampled once at
//! creation, a bounded memory of past belonging scores per venue, and the
//! withdrawal state machine driven by [`policy`].

pub mod policy;

use std::collections::VecDeque;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::core::config::ModelConfig;
use crate::core::types::{GroupMap, IdentityGroup, PersonId, VenueId};
use crate::venue::Venue;

/// Participation status of a person
///
/// `PermanentlyWithdrawn` is terminal: once reached, the person is inert for
/// the rest of the run and no memory or venue state of theirs ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    TemporarilyWithdrawn,
    PermanentlyWithdrawn,
}

/// A simulated individual
#[derive(Debug, Clone)]
pub struct Person {
    pub id: PersonId,
    /// Identity group, immutable once assigned
    pub group: IdentityGroup,

    /// Personal affinity perception, row = own view of each group.
    /// Sampled once at creation; never recomputed.
    affinity_matrix: GroupMap<GroupMap<f64>>,

    /// Minimum average remembered belonging for a venue to stay acceptable
    pub threshold: f64,

    /// Remembered belonging scores per venue, oldest evicted past capacity
    memory: Vec<VecDeque<f64>>,
    memory_length: usize,

    pub status: Status,
    /// Temporary withdrawals taken so far
    pub withdrawal_attempts: u32,
    /// Rounds spent in the current withdrawal
    cooldown_counter: u32,
    /// Rounds a temporary withdrawal lasts for this person
    pub cooldown_duration: u32,

    /// Venue visited this round, if any
    pub current_venue: Option<VenueId>,

    /// Private RNG stream; all of this person's draws come from here so
    /// choice collection is independent of processing order.
    rng: ChaCha8Rng,
}

impl Person {
    pub fn new(
        id: PersonId,
        group: IdentityGroup,
        threshold: f64,
        cooldown_duration: u32,
        mut rng: ChaCha8Rng,
        cfg: &ModelConfig,
    ) -> Self {
        let affinity_matrix = generate_affinity_matrix(cfg, &mut rng);
        Self {
            id,
            group,
            affinity_matrix,
            threshold,
            memory: vec![VecDeque::new(); cfg.venues.len()],
            memory_length: cfg.memory_length,
            status: Status::Active,
            withdrawal_attempts: 0,
            cooldown_counter: 0,
            cooldown_duration,
            current_venue: None,
            rng,
        }
    }

    /// Belonging score for a venue, combining structural inclusion with
    /// peer-composition comfort
    ///
    /// `alpha` weights the venue's effective affinity for this person's
    /// group against the matrix-weighted composition of its visitors.
    /// Returns 0 unless the person is active. No side effects.
    pub fn belonging(&self, venue: &Venue, alpha: f64) -> f64 {
        if self.status != Status::Active {
            return 0.0;
        }

        let structural = venue.effective_affinity()[self.group];

        let ratios = venue.current_population_ratios();
        let social: f64 = IdentityGroup::ALL
            .iter()
            .map(|&g| self.affinity_matrix[self.group][g] * ratios[g])
            .sum();

        alpha * structural + (1.0 - alpha) * social
    }

    /// Append a belonging score to the venue's memory, evicting the oldest
    /// entry past capacity
    pub fn remember(&mut self, venue: VenueId, score: f64) {
        let scores = &mut self.memory[venue.0];
        scores.push_back(score);
        while scores.len() > self.memory_length {
            scores.pop_front();
        }
    }

    /// Average remembered belonging for a venue, `None` when nothing is
    /// remembered yet
    pub fn remembered_score(&self, venue: VenueId) -> Option<f64> {
        let scores = &self.memory[venue.0];
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Whether any venue has remembered scores
    pub fn has_any_memory(&self) -> bool {
        self.memory.iter().any(|scores| !scores.is_empty())
    }

    /// Forget all remembered scores (re-entry after withdrawal starts fresh)
    pub fn clear_memory(&mut self) {
        for scores in &mut self.memory {
            scores.clear();
        }
    }

    /// This person's perception of `other`, for population-level statistics
    pub fn perceived_affinity(&self, other: IdentityGroup) -> f64 {
        self.affinity_matrix[self.group][other]
    }

    /// The full private affinity matrix, rows indexed by perceiver group
    pub fn affinity_matrix(&self) -> &GroupMap<GroupMap<f64>> {
        &self.affinity_matrix
    }

    /// Weighted lottery over venue indices; `None` when no weight is positive
    fn weighted_pick(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }
        let mut draw = self.rng.gen_range(0.0..total);
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            if draw < w {
                return Some(i);
            }
            draw -= w;
        }
        // Floating-point underflow on the last positive weight
        weights.iter().rposition(|&w| w > 0.0)
    }

    fn uniform_pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}

/// Sample the personal affinity matrix around the configured baseline
///
/// Each ordered group pair gets `Normal(base[from][to], sigma)` clamped into
/// `[0, matrix_clamp]`. The person's private RNG stream makes the matrix
/// reproducible from the top-level seed alone.
fn generate_affinity_matrix(cfg: &ModelConfig, rng: &mut ChaCha8Rng) -> GroupMap<GroupMap<f64>> {
    GroupMap::from_fn(|from| {
        GroupMap::from_fn(|to| {
            let mean = cfg.base_affinity_matrix[from.index()][to.index()];
            let normal = Normal::new(mean, cfg.affinity_std_dev)
                .unwrap_or_else(|_| Normal::new(mean, 0.0).unwrap());
            normal.sample(rng).clamp(0.0, cfg.matrix_clamp)
        })
    })
}

/// Derive a per-person seed from the top-level seed and person index
///
/// Splitmix-style mixing keeps nearby indices statistically independent.
pub fn derive_person_seed(seed: u64, index: u32) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

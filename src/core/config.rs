//! Model configuration with documented parameters
//!
//! Every tunable of the simulation is collected here. Behavioral differences
//! between observed populations (memory depth, cooldown spread, withdrawal
//! limits) are configuration, not code branches: a `ModelConfig` with
//! `memory_length = 1` reproduces the last-score-only population, a deeper
//! memory the averaging one.

use serde::{Deserialize, Serialize};

use crate::core::types::{GroupMap, IdentityGroup};

/// Configuration of a single venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Display name used in logs and report columns
    pub name: String,
    /// Baseline cultural welcome per group, each in [0,1]. Immutable once
    /// the venue is created.
    pub fixed_affinity: GroupMap<f64>,
}

/// Full configuration of a simulation run
///
/// Consumed once at `Model::new`; the model keeps its own copy and never
/// reads mutated configuration afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    // === POPULATION ===
    /// Number of persons created at initialization
    pub population_size: usize,

    /// Relative size of each identity group. Normalized at construction,
    /// so `[2.0, 1.0, 1.0]` and `[0.5, 0.25, 0.25]` are equivalent.
    pub group_ratios: GroupMap<f64>,

    // === BELONGING ===
    /// Weight of structural inclusion (venue affinity) against peer
    /// composition in the belonging score, in [0,1]
    pub alpha: f64,

    /// Baseline affinity-perception matrix, row = own group, column =
    /// perceived group. Personal matrices are Gaussian samples around
    /// these means.
    pub base_affinity_matrix: [[f64; IdentityGroup::COUNT]; IdentityGroup::COUNT],

    /// Standard deviation of the Gaussian noise on personal matrix entries
    pub affinity_std_dev: f64,

    /// Upper clamp for personal matrix entries (lower clamp is 0).
    /// 1.0 keeps perception bounded like an affinity; 2.0 allows
    /// over-identification with one's in-group.
    pub matrix_clamp: f64,

    // === VENUES ===
    /// The venues persons choose between. At least one is required.
    pub venues: Vec<VenueConfig>,

    /// Weight of fixed vs adaptive affinity in a venue's effective
    /// affinity, in [0,1]. 1.0 freezes venue culture entirely.
    pub gamma: f64,

    /// Venue adaptation fires every this many completed rounds
    pub adaptive_update_interval: u32,

    /// Sensitivity of the adaptive affinity to visitor shares. The
    /// share-normalized update is `clamp(share * adaptive_gain, 0, 1)`,
    /// so 1.0 makes adaptive affinity track composition directly.
    pub adaptive_gain: f64,

    // === CULTURAL IDENTITY FLAG ===
    /// Group whose presence defines the venue's cultural identity
    pub flag_group: IdentityGroup,

    /// Number of most recent rounds averaged for the identity flag
    pub flag_window: usize,

    /// The flag holds while the flag group's average share over the
    /// window stays at or above this value
    pub flag_threshold: f64,

    // === CHOICE POLICY ===
    /// Rounds during which everyone chooses by venue affinity alone,
    /// before memory accumulates
    pub bootstrap_rounds: u64,

    /// Center of the per-person acceptance threshold distribution
    pub base_threshold: f64,

    /// Standard deviation of the Gaussian spread around `base_threshold`.
    /// Sampled thresholds are clamped into [0,1].
    pub threshold_spread: f64,

    /// Remembered belonging scores kept per venue; oldest evicted first.
    /// 1 reproduces the last-score-only choice rule.
    pub memory_length: usize,

    // === WITHDRAWAL ===
    /// Bounds of the per-person cooldown duration, sampled uniformly
    /// (inclusive) at creation
    pub cooldown_min: u32,
    pub cooldown_max: u32,

    /// Temporary withdrawals tolerated before the next one becomes
    /// permanent
    pub max_withdrawal_attempts: u32,

    // === REPRODUCIBILITY ===
    /// Top-level seed. The model RNG and every per-person RNG stream
    /// derive deterministically from it.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            group_ratios: GroupMap([0.4, 0.3, 0.3]),

            alpha: 0.5,
            base_affinity_matrix: [
                [1.0, 0.3, 0.3], // QueerWoman ->
                [0.8, 1.0, 0.1], // NonQueerWoman ->
                [0.8, 0.3, 1.0], // QueerNonWoman ->
            ],
            affinity_std_dev: 0.1,
            matrix_clamp: 1.0,

            venues: vec![
                VenueConfig {
                    name: "women_only_bar".into(),
                    fixed_affinity: GroupMap([1.0, 0.7, 0.2]),
                },
                VenueConfig {
                    name: "queer_friendly_bar".into(),
                    fixed_affinity: GroupMap([1.0, 0.2, 0.7]),
                },
            ],
            gamma: 0.5,
            adaptive_update_interval: 10,
            adaptive_gain: 1.0,

            flag_group: IdentityGroup::QueerWoman,
            flag_window: 10,
            flag_threshold: 0.3,

            bootstrap_rounds: 5,
            base_threshold: 0.55,
            threshold_spread: 0.15,
            memory_length: 5,

            cooldown_min: 5,
            cooldown_max: 15,
            max_withdrawal_attempts: 2,

            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Validate configuration for internal consistency
    ///
    /// Called by `Model::new`; a failing configuration never produces a
    /// model with an undefined population distribution.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size must be positive".into());
        }

        let ratio_sum = self.group_ratios.sum();
        if !(ratio_sum > 0.0) || self.group_ratios.0.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(format!(
                "group_ratios must be non-negative with a positive sum, got {:?}",
                self.group_ratios.0
            ));
        }

        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha ({}) must be in [0,1]", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma ({}) must be in [0,1]", self.gamma));
        }

        if self.venues.is_empty() {
            return Err("at least one venue is required".into());
        }
        for venue in &self.venues {
            for (group, &a) in venue.fixed_affinity.iter() {
                if !(0.0..=1.0).contains(&a) {
                    return Err(format!(
                        "venue '{}' fixed affinity for {} ({}) must be in [0,1]",
                        venue.name,
                        group.label(),
                        a
                    ));
                }
            }
        }

        if self.adaptive_update_interval == 0 {
            return Err("adaptive_update_interval must be at least 1".into());
        }
        if !(self.adaptive_gain > 0.0) {
            return Err(format!("adaptive_gain ({}) must be positive", self.adaptive_gain));
        }

        if self.flag_window == 0 {
            return Err("flag_window must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.flag_threshold) {
            return Err(format!("flag_threshold ({}) must be in [0,1]", self.flag_threshold));
        }

        if !self.threshold_spread.is_finite() || self.threshold_spread < 0.0 {
            return Err(format!(
                "threshold_spread ({}) must be finite and non-negative",
                self.threshold_spread
            ));
        }
        if !self.base_threshold.is_finite() {
            return Err(format!(
                "base_threshold ({}) must be finite",
                self.base_threshold
            ));
        }

        if self.memory_length == 0 {
            return Err("memory_length must be at least 1".into());
        }

        if self.cooldown_min == 0 || self.cooldown_min > self.cooldown_max {
            return Err(format!(
                "cooldown range [{}, {}] must be non-empty and start at 1 or above",
                self.cooldown_min, self.cooldown_max
            ));
        }
        if self.max_withdrawal_attempts == 0 {
            return Err("max_withdrawal_attempts must be at least 1".into());
        }

        if self.affinity_std_dev < 0.0 {
            return Err(format!(
                "affinity_std_dev ({}) must be non-negative",
                self.affinity_std_dev
            ));
        }
        if !(self.matrix_clamp > 0.0) {
            return Err(format!("matrix_clamp ({}) must be positive", self.matrix_clamp));
        }
        for row in &self.base_affinity_matrix {
            for &v in row {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!(
                        "base_affinity_matrix entries must be finite and non-negative, got {}",
                        v
                    ));
                }
            }
        }

        Ok(())
    }

    /// Group ratios normalized to sum to 1
    pub fn normalized_ratios(&self) -> GroupMap<f64> {
        let total = self.group_ratios.sum();
        self.group_ratios.map(|r| r / total)
    }
}

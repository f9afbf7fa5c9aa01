//! Venue state and its affinity model
//!
//! A venue's culture toward each identity group blends a fixed baseline
//! (set at creation, never mutated) with a slowly adapting component
//! recomputed from recent visitor composition. Adaptation is counter-gated:
//! it fires once every `adaptive_update_interval` completed rounds.

use crate::core::config::{ModelConfig, VenueConfig};
use crate::core::types::{GroupMap, IdentityGroup, VenueId};

/// A venue persons choose between each round
#[derive(Debug, Clone)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,

    /// Baseline cultural welcome per group, immutable
    fixed_affinity: GroupMap<f64>,
    /// Slow-moving component tracking visitor composition, each in [0,1]
    adaptive_affinity: GroupMap<f64>,
    /// Weight of fixed vs adaptive affinity in the effective blend
    gamma: f64,

    /// Per-round visitor counts, one entry per completed round, append-only
    visitor_history: Vec<GroupMap<u32>>,
    /// Visitors committed so far in the round currently in progress
    current_visitors: GroupMap<u32>,

    adaptive_update_interval: u32,
    adaptive_gain: f64,
    rounds_since_update: u32,

    // Cultural identity flag: holds while the flag group's average share
    // over the rolling window stays at or above the threshold. Re-evaluated
    // at every adaptation, so it can flip in both directions.
    flag_group: IdentityGroup,
    flag_window: usize,
    flag_threshold: f64,
    identity_flag: bool,
}

impl Venue {
    pub fn new(id: VenueId, venue_cfg: &VenueConfig, cfg: &ModelConfig) -> Self {
        // Start the adaptive component at the fixed affinity's relative
        // proportions so the blend is meaningful before any history exists.
        let fixed_sum = venue_cfg.fixed_affinity.sum();
        let adaptive_affinity = if fixed_sum > 0.0 {
            venue_cfg.fixed_affinity.map(|a| a / fixed_sum)
        } else {
            GroupMap::default()
        };

        Self {
            id,
            name: venue_cfg.name.clone(),
            fixed_affinity: venue_cfg.fixed_affinity,
            adaptive_affinity,
            gamma: cfg.gamma,
            visitor_history: Vec::new(),
            current_visitors: GroupMap::default(),
            adaptive_update_interval: cfg.adaptive_update_interval,
            adaptive_gain: cfg.adaptive_gain,
            rounds_since_update: 0,
            flag_group: cfg.flag_group,
            flag_window: cfg.flag_window,
            flag_threshold: cfg.flag_threshold,
            identity_flag: true,
        }
    }

    /// Effective affinity per group: `gamma * fixed + (1 - gamma) * adaptive`
    ///
    /// Pure function of current state, computed on demand and never stored.
    pub fn effective_affinity(&self) -> GroupMap<f64> {
        GroupMap::from_fn(|g| {
            self.gamma * self.fixed_affinity[g] + (1.0 - self.gamma) * self.adaptive_affinity[g]
        })
    }

    /// Record one committed visit for the round in progress
    pub fn record_visitor(&mut self, group: IdentityGroup) {
        self.current_visitors[group] += 1;
    }

    /// Clear the visitor buffer for a new round
    ///
    /// Called at the start of a round rather than at its end, so the last
    /// completed round's composition stays readable between steps.
    pub fn begin_round(&mut self) {
        self.current_visitors = GroupMap::default();
    }

    /// Close the round: append the buffer to history and run adaptation
    pub fn end_round(&mut self) {
        self.visitor_history.push(self.current_visitors);
        self.adapt(false);
    }

    /// Recompute the adaptive affinity and identity flag when due
    ///
    /// Increments the internal round counter; fires once the counter reaches
    /// the configured interval (or immediately with `force`), then resets it.
    /// Adaptive affinity uses the share-normalized form: each group's
    /// fraction of all visitors over the last `min(interval, history)`
    /// rounds, scaled by `adaptive_gain` and clamped to [0,1]. An empty
    /// window yields all zeros.
    pub fn adapt(&mut self, force: bool) {
        self.rounds_since_update += 1;
        if self.rounds_since_update < self.adaptive_update_interval && !force {
            return;
        }

        if !self.visitor_history.is_empty() {
            let window = (self.adaptive_update_interval as usize).min(self.visitor_history.len());
            let recent = &self.visitor_history[self.visitor_history.len() - window..];

            let mut counts = GroupMap::<u32>::default();
            let mut total = 0u32;
            for round_counts in recent {
                for g in IdentityGroup::ALL {
                    counts[g] += round_counts[g];
                }
                total += round_counts.total();
            }

            self.adaptive_affinity = GroupMap::from_fn(|g| {
                if total == 0 {
                    0.0
                } else {
                    (counts[g] as f64 / total as f64 * self.adaptive_gain).clamp(0.0, 1.0)
                }
            });

            tracing::debug!(
                venue = %self.name,
                adaptive = ?self.adaptive_affinity.0,
                window,
                "adaptive affinity updated"
            );
        }

        self.update_identity_flag();
        self.rounds_since_update = 0;
    }

    /// Re-evaluate the cultural identity flag from the rolling window
    ///
    /// Rounds with zero visitors carry no share and are skipped; until the
    /// history spans the window, the flag keeps its previous value.
    fn update_identity_flag(&mut self) {
        if self.visitor_history.len() < self.flag_window {
            return;
        }

        let recent = &self.visitor_history[self.visitor_history.len() - self.flag_window..];
        let shares: Vec<f64> = recent
            .iter()
            .filter(|counts| counts.total() > 0)
            .map(|counts| counts[self.flag_group] as f64 / counts.total() as f64)
            .collect();

        if shares.is_empty() {
            return;
        }

        let avg = shares.iter().sum::<f64>() / shares.len() as f64;
        let flagged = avg >= self.flag_threshold;
        if flagged != self.identity_flag {
            tracing::info!(
                venue = %self.name,
                group = self.flag_group.label(),
                avg_share = avg,
                flagged,
                "cultural identity flag flipped"
            );
        }
        self.identity_flag = flagged;
    }

    /// Per-group share of the current visitor buffer
    ///
    /// Sums to 1 when the buffer is non-empty, all zeros when it is empty.
    pub fn current_population_ratios(&self) -> GroupMap<f64> {
        let total = self.current_visitors.total();
        if total == 0 {
            return GroupMap::default();
        }
        self.current_visitors.map(|&c| c as f64 / total as f64)
    }

    // === Read-only accessors for reporting ===

    pub fn fixed_affinity(&self) -> GroupMap<f64> {
        self.fixed_affinity
    }

    pub fn adaptive_affinity(&self) -> GroupMap<f64> {
        self.adaptive_affinity
    }

    pub fn identity_flag(&self) -> bool {
        self.identity_flag
    }

    pub fn current_visitor_count(&self) -> u32 {
        self.current_visitors.total()
    }

    /// Per-group counts of the current visitor buffer
    pub fn current_visitors(&self) -> GroupMap<u32> {
        self.current_visitors
    }

    /// Total visitor count per completed round, oldest first
    pub fn visitor_count_history(&self) -> Vec<u32> {
        self.visitor_history.iter().map(|c| c.total()).collect()
    }

    pub fn rounds_recorded(&self) -> usize {
        self.visitor_history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;
    use crate::core::types::IdentityGroup::*;

    fn test_venue(fixed: [f64; 3], cfg: &ModelConfig) -> Venue {
        Venue::new(
            VenueId(0),
            &VenueConfig {
                name: "test_bar".into(),
                fixed_affinity: GroupMap(fixed),
            },
            cfg,
        )
    }

    #[test]
    fn effective_affinity_blends_fixed_and_adaptive() {
        let cfg = ModelConfig {
            gamma: 0.5,
            ..ModelConfig::default()
        };
        let venue = test_venue([1.0, 0.5, 0.0], &cfg);
        // Initial adaptive is the normalized fixed affinity: [2/3, 1/3, 0]
        let eff = venue.effective_affinity();
        assert!((eff[QueerWoman] - (0.5 * 1.0 + 0.5 * (2.0 / 3.0))).abs() < 1e-12);
        assert!((eff[QueerNonWoman] - 0.0).abs() < 1e-12);
        for (_, &v) in eff.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn ratios_sum_to_one_or_are_zero() {
        let cfg = ModelConfig::default();
        let mut venue = test_venue([1.0, 1.0, 1.0], &cfg);

        assert_eq!(venue.current_population_ratios(), GroupMap::default());

        venue.record_visitor(QueerWoman);
        venue.record_visitor(QueerWoman);
        venue.record_visitor(NonQueerWoman);
        let ratios = venue.current_population_ratios();
        assert!((ratios.sum() - 1.0).abs() < 1e-12);
        assert!((ratios[QueerWoman] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn adaptation_tracks_visitor_share() {
        let cfg = ModelConfig {
            adaptive_update_interval: 10,
            adaptive_gain: 1.0,
            ..ModelConfig::default()
        };
        let mut venue = test_venue([1.0, 0.7, 0.2], &cfg);
        let before = venue.adaptive_affinity()[QueerWoman];

        // Ten rounds of 100% QueerWoman visitors trigger exactly one update
        for _ in 0..10 {
            venue.begin_round();
            for _ in 0..5 {
                venue.record_visitor(QueerWoman);
            }
            venue.end_round();
        }

        let after = venue.adaptive_affinity();
        assert!(after[QueerWoman] > before);
        assert!((after[QueerWoman] - 1.0).abs() < 1e-12);
        assert_eq!(after[NonQueerWoman], 0.0);
        assert!(venue.identity_flag());
    }

    #[test]
    fn adaptive_affinity_stays_clamped() {
        let cfg = ModelConfig {
            adaptive_update_interval: 1,
            adaptive_gain: 5.0,
            ..ModelConfig::default()
        };
        let mut venue = test_venue([1.0, 0.7, 0.2], &cfg);
        for _ in 0..20 {
            venue.begin_round();
            venue.record_visitor(QueerWoman);
            venue.record_visitor(NonQueerWoman);
            venue.end_round();
            for (_, &v) in venue.adaptive_affinity().iter() {
                assert!((0.0..=1.0).contains(&v), "adaptive affinity {} out of range", v);
            }
        }
    }

    #[test]
    fn empty_history_window_yields_zero_adaptive() {
        let cfg = ModelConfig {
            adaptive_update_interval: 2,
            ..ModelConfig::default()
        };
        let mut venue = test_venue([1.0, 0.7, 0.2], &cfg);
        for _ in 0..4 {
            venue.begin_round();
            venue.end_round();
        }
        assert_eq!(venue.adaptive_affinity(), GroupMap::default());
    }

    #[test]
    fn identity_flag_flips_down_and_back_up() {
        let cfg = ModelConfig {
            adaptive_update_interval: 1,
            flag_window: 3,
            flag_threshold: 0.3,
            ..ModelConfig::default()
        };
        let mut venue = test_venue([1.0, 0.7, 0.2], &cfg);
        assert!(venue.identity_flag());

        // Three rounds with no flag-group visitors: average share 0
        for _ in 0..3 {
            venue.begin_round();
            venue.record_visitor(QueerNonWoman);
            venue.end_round();
        }
        assert!(!venue.identity_flag());

        // Three rounds of pure flag-group visitors satisfy the rule again
        for _ in 0..3 {
            venue.begin_round();
            venue.record_visitor(QueerWoman);
            venue.end_round();
        }
        assert!(venue.identity_flag());
    }

    #[test]
    fn forced_adapt_resets_counter() {
        let cfg = ModelConfig {
            adaptive_update_interval: 10,
            ..ModelConfig::default()
        };
        let mut venue = test_venue([1.0, 0.7, 0.2], &cfg);
        venue.begin_round();
        venue.record_visitor(NonQueerWoman);
        venue.visitor_history.push(venue.current_visitors);

        venue.adapt(true);
        assert!((venue.adaptive_affinity()[NonQueerWoman] - 1.0).abs() < 1e-12);
        assert_eq!(venue.rounds_since_update, 0);
    }
}

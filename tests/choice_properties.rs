//! Property tests for population construction and short simulation runs

use barscene::core::config::ModelConfig;
use barscene::simulation::population::group_counts;
use barscene::{GroupMap, IdentityGroup, Model};
use proptest::prelude::*;

proptest! {
    // Keep case counts modest; each case runs a full (short) simulation.
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn group_counts_always_sum_to_population(
        n in 1usize..500,
        r0 in 0.01f64..1.0,
        r1 in 0.01f64..1.0,
        r2 in 0.01f64..1.0,
    ) {
        let cfg = ModelConfig {
            population_size: n,
            group_ratios: GroupMap([r0, r1, r2]),
            ..ModelConfig::default()
        };
        let counts = group_counts(&cfg);
        let total: usize = IdentityGroup::ALL.iter().map(|&g| counts[g]).sum();
        prop_assert_eq!(total, n);
    }

    #[test]
    fn short_runs_hold_core_invariants(
        seed in 0u64..10_000,
        threshold in 0.0f64..1.0,
        gain in 0.1f64..3.0,
        interval in 1u32..8,
    ) {
        let cfg = ModelConfig {
            population_size: 30,
            seed,
            base_threshold: threshold,
            adaptive_gain: gain,
            adaptive_update_interval: interval,
            ..ModelConfig::default()
        };
        let max_attempts = cfg.max_withdrawal_attempts;
        let mut model = Model::new(cfg).unwrap();

        for _ in 0..25 {
            model.step();

            let counts = model.status_counts();
            prop_assert_eq!(
                counts.active + counts.temporarily_withdrawn + counts.permanently_withdrawn,
                model.people().len()
            );

            let visitors: u32 = model
                .venues()
                .iter()
                .map(|v| v.current_visitor_count())
                .sum();
            prop_assert!(visitors as usize <= model.people().len());

            for venue in model.venues() {
                for (_, &a) in venue.adaptive_affinity().iter() {
                    prop_assert!((0.0..=1.0).contains(&a));
                }
            }
        }

        for person in model.people() {
            prop_assert!(person.withdrawal_attempts <= max_attempts);
            for venue in model.venues() {
                if let Some(score) = person.remembered_score(venue.id) {
                    prop_assert!((0.0..=1.0).contains(&score));
                }
            }
        }
    }

    #[test]
    fn runs_are_reproducible_across_builds(seed in 0u64..10_000) {
        let cfg = ModelConfig {
            population_size: 25,
            seed,
            ..ModelConfig::default()
        };
        let mut a = Model::new(cfg.clone()).unwrap();
        let mut b = Model::new(cfg).unwrap();
        a.run(15);
        b.run(15);

        for (pa, pb) in a.people().iter().zip(b.people()) {
            prop_assert_eq!(pa.status, pb.status);
            prop_assert_eq!(pa.current_venue, pb.current_venue);
        }
    }

    #[test]
    fn thresholds_and_cooldowns_respect_config_bounds(
        seed in 0u64..10_000,
        cd_min in 1u32..6,
        cd_extra in 0u32..10,
    ) {
        let cfg = ModelConfig {
            population_size: 40,
            seed,
            cooldown_min: cd_min,
            cooldown_max: cd_min + cd_extra,
            ..ModelConfig::default()
        };
        let model = Model::new(cfg).unwrap();
        for person in model.people() {
            prop_assert!((0.0..=1.0).contains(&person.threshold));
            prop_assert!(person.cooldown_duration >= cd_min);
            prop_assert!(person.cooldown_duration <= cd_min + cd_extra);
        }
    }
}

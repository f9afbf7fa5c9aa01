//! Population construction
//!
//! Builds the initial person vector from the configured group ratios.
//! Group counts come from a largest-remainder apportionment so the realized
//! composition matches the ratios as closely as integer counts allow, and
//! the same config always yields the same population.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::core::config::ModelConfig;
use crate::core::types::{GroupMap, IdentityGroup, PersonId};
use crate::person::{derive_person_seed, Person};

/// Integer head-count per group for the configured population size
pub fn group_counts(cfg: &ModelConfig) -> GroupMap<usize> {
    let ratios = cfg.normalized_ratios();
    let n = cfg.population_size;

    let mut counts = GroupMap::from_fn(|g| (ratios[g] * n as f64).floor() as usize);
    let mut assigned: usize = IdentityGroup::ALL.iter().map(|&g| counts[g]).sum();

    // Hand out the leftover seats by descending fractional remainder,
    // breaking ties by canonical group order
    let mut remainders: Vec<(IdentityGroup, f64)> = IdentityGroup::ALL
        .iter()
        .map(|&g| (g, ratios[g] * n as f64 - counts[g] as f64))
        .collect();
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut i = 0;
    while assigned < n {
        counts[remainders[i % remainders.len()].0] += 1;
        assigned += 1;
        i += 1;
    }
    counts
}

/// Build the full population
///
/// Thresholds and cooldown durations are sampled from `rng` (the model-level
/// stream); each person additionally gets a private RNG derived from the
/// model seed and their index, so their later draws do not depend on
/// processing order.
pub fn build_population(cfg: &ModelConfig, rng: &mut ChaCha8Rng) -> Vec<Person> {
    let counts = group_counts(cfg);
    let threshold_dist = Normal::new(cfg.base_threshold, cfg.threshold_spread)
        .unwrap_or_else(|_| Normal::new(cfg.base_threshold, f64::EPSILON).unwrap());

    let mut people = Vec::with_capacity(cfg.population_size);
    let mut index: u32 = 0;
    for group in IdentityGroup::ALL {
        for _ in 0..counts[group] {
            let threshold = threshold_dist.sample(rng).clamp(0.0, 1.0);
            let cooldown = rng.gen_range(cfg.cooldown_min..=cfg.cooldown_max);
            let person_rng = ChaCha8Rng::seed_from_u64(derive_person_seed(cfg.seed, index));
            people.push(Person::new(
                PersonId(index),
                group,
                threshold,
                cooldown,
                person_rng,
                cfg,
            ));
            index += 1;
        }
    }

    tracing::info!(
        population = people.len(),
        qw = counts[IdentityGroup::QueerWoman],
        nqw = counts[IdentityGroup::NonQueerWoman],
        qnw = counts[IdentityGroup::QueerNonWoman],
        "population built"
    );
    people
}

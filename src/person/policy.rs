//! Venue choice and withdrawal state machine
//!
//! Called once per person per round during the decide phase. The policy
//! reads venue state finalized at the end of the previous round and the
//! person's own memory; it mutates only the person. A round with no
//! acceptable venue is ordinary control flow (temporary withdrawal), not an
//! error.

use crate::core::config::ModelConfig;
use crate::core::types::{Round, VenueId};
use crate::person::{Person, Status};
use crate::venue::Venue;

/// Result of one decide-phase call for one person
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The person visits this venue in the current round
    Visit(VenueId),
    /// Withdrawn and still inside the cooldown; no action this round
    CoolingDown,
    /// No venue met the threshold; the person withdrew this round
    Withdrew,
    /// Cooldown expired with the withdrawal limit reached; terminal
    WithdrewPermanently,
    /// Already permanently withdrawn; nothing happens
    Inert,
}

/// Advance the person's state machine and pick a venue if one is due
///
/// Every `(status, mode)` combination resolves to exactly one arm below;
/// there is no silent fallthrough.
pub fn choose_venue(
    person: &mut Person,
    venues: &[Venue],
    round: Round,
    cfg: &ModelConfig,
) -> ChoiceOutcome {
    match person.status {
        Status::PermanentlyWithdrawn => return ChoiceOutcome::Inert,
        Status::TemporarilyWithdrawn => {
            person.cooldown_counter += 1;
            if person.cooldown_counter < person.cooldown_duration {
                return ChoiceOutcome::CoolingDown;
            }
            if person.withdrawal_attempts >= cfg.max_withdrawal_attempts {
                person.status = Status::PermanentlyWithdrawn;
                person.current_venue = None;
                tracing::info!(person = person.id.0, "withdrew permanently");
                return ChoiceOutcome::WithdrewPermanently;
            }
            // Cooldown served: rejoin with a clean slate. The empty memory
            // routes this same round through the bootstrap branch below.
            person.status = Status::Active;
            person.cooldown_counter = 0;
            person.clear_memory();
            tracing::debug!(person = person.id.0, "rejoined after cooldown");
        }
        Status::Active => {}
    }

    if round < cfg.bootstrap_rounds || !person.has_any_memory() {
        bootstrap_choice(person, venues)
    } else {
        memory_choice(person, venues)
    }
}

/// Early-round choice: weighted lottery over venue affinity for the
/// person's group, so everyone samples venues before memory exists
fn bootstrap_choice(person: &mut Person, venues: &[Venue]) -> ChoiceOutcome {
    let weights: Vec<f64> = venues
        .iter()
        .map(|v| v.effective_affinity()[person.group])
        .collect();

    let idx = match person.weighted_pick(&weights) {
        Some(idx) => idx,
        // All venues indifferent to this group: uniform fallback
        None => person.uniform_pick(venues.len()),
    };
    ChoiceOutcome::Visit(venues[idx].id)
}

/// Memory-based choice: lottery over venues whose average remembered
/// belonging meets the acceptance threshold, or withdrawal if none does
fn memory_choice(person: &mut Person, venues: &[Venue]) -> ChoiceOutcome {
    let valid: Vec<(usize, f64)> = venues
        .iter()
        .enumerate()
        .filter_map(|(i, venue)| {
            let score = person.remembered_score(venue.id)?;
            (score >= person.threshold).then_some((i, score))
        })
        .collect();

    if valid.is_empty() {
        person.status = Status::TemporarilyWithdrawn;
        person.cooldown_counter = 0;
        person.withdrawal_attempts += 1;
        person.current_venue = None;
        tracing::debug!(
            person = person.id.0,
            attempts = person.withdrawal_attempts,
            "no acceptable venue, withdrawing"
        );
        return ChoiceOutcome::Withdrew;
    }

    let weights: Vec<f64> = valid.iter().map(|(_, score)| *score).collect();
    let pick = match person.weighted_pick(&weights) {
        Some(pick) => pick,
        // Acceptable venues whose scores sum to zero: uniform tie-break
        None => person.uniform_pick(valid.len()),
    };
    ChoiceOutcome::Visit(venues[valid[pick].0].id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::VenueConfig;
    use crate::core::types::IdentityGroup::{self, *};
    use crate::core::types::{GroupMap, PersonId};
    use crate::person::derive_person_seed;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_venue_config(a: [f64; 3], b: [f64; 3]) -> ModelConfig {
        ModelConfig {
            // gamma = 1 makes effective affinity equal the fixed affinity,
            // which keeps the lottery weights exact in these tests
            gamma: 1.0,
            venues: vec![
                VenueConfig {
                    name: "first".into(),
                    fixed_affinity: GroupMap(a),
                },
                VenueConfig {
                    name: "second".into(),
                    fixed_affinity: GroupMap(b),
                },
            ],
            ..ModelConfig::default()
        }
    }

    fn make_venues(cfg: &ModelConfig) -> Vec<Venue> {
        cfg.venues
            .iter()
            .enumerate()
            .map(|(i, vc)| Venue::new(VenueId(i), vc, cfg))
            .collect()
    }

    fn make_person(cfg: &ModelConfig, group: IdentityGroup, threshold: f64) -> Person {
        let rng = ChaCha8Rng::seed_from_u64(derive_person_seed(cfg.seed, 7));
        Person::new(PersonId(7), group, threshold, 3, rng, cfg)
    }

    #[test]
    fn bootstrap_never_picks_zero_affinity_venue() {
        let cfg = two_venue_config([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);

        for round in 0..5 {
            let outcome = choose_venue(&mut person, &venues, round, &cfg);
            assert_eq!(outcome, ChoiceOutcome::Visit(VenueId(0)));
        }
    }

    #[test]
    fn bootstrap_uniform_fallback_when_all_weights_zero() {
        let cfg = two_venue_config([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);

        match choose_venue(&mut person, &venues, 0, &cfg) {
            ChoiceOutcome::Visit(_) => {}
            other => panic!("expected a visit, got {:?}", other),
        }
    }

    #[test]
    fn low_remembered_score_triggers_withdrawal() {
        let cfg = two_venue_config([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);
        person.remember(VenueId(0), 0.4);

        let outcome = choose_venue(&mut person, &venues, cfg.bootstrap_rounds, &cfg);
        assert_eq!(outcome, ChoiceOutcome::Withdrew);
        assert_eq!(person.status, Status::TemporarilyWithdrawn);
        assert_eq!(person.withdrawal_attempts, 1);
        assert_eq!(person.current_venue, None);
    }

    #[test]
    fn acceptable_score_yields_a_visit() {
        let cfg = two_venue_config([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);
        person.remember(VenueId(1), 0.8);

        let outcome = choose_venue(&mut person, &venues, cfg.bootstrap_rounds, &cfg);
        assert_eq!(outcome, ChoiceOutcome::Visit(VenueId(1)));
    }

    #[test]
    fn cooldown_lasts_exactly_the_configured_duration() {
        let cfg = two_venue_config([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);
        person.remember(VenueId(0), 0.1);

        // Withdraws at round r with cooldown_duration = 3
        let r = cfg.bootstrap_rounds;
        assert_eq!(choose_venue(&mut person, &venues, r, &cfg), ChoiceOutcome::Withdrew);

        // Rounds r+1 and r+2 are spent cooling down
        assert_eq!(
            choose_venue(&mut person, &venues, r + 1, &cfg),
            ChoiceOutcome::CoolingDown
        );
        assert_eq!(
            choose_venue(&mut person, &venues, r + 2, &cfg),
            ChoiceOutcome::CoolingDown
        );

        // Exactly at r+3 the person rejoins with cleared memory and makes a
        // bootstrap choice in the same round
        match choose_venue(&mut person, &venues, r + 3, &cfg) {
            ChoiceOutcome::Visit(_) => {}
            other => panic!("expected rejoin visit, got {:?}", other),
        }
        assert_eq!(person.status, Status::Active);
        assert!(!person.has_any_memory());
    }

    #[test]
    fn withdrawal_limit_makes_the_next_expiry_permanent() {
        let cfg = ModelConfig {
            max_withdrawal_attempts: 2,
            ..two_venue_config([1.0, 1.0, 1.0], [1.0, 1.0, 1.0])
        };
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);
        person.withdrawal_attempts = 2;
        person.status = Status::TemporarilyWithdrawn;
        person.cooldown_counter = 0;

        let mut round = cfg.bootstrap_rounds;
        loop {
            match choose_venue(&mut person, &venues, round, &cfg) {
                ChoiceOutcome::CoolingDown => round += 1,
                ChoiceOutcome::WithdrewPermanently => break,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(person.status, Status::PermanentlyWithdrawn);

        // Terminal absorption: every later call is a no-op
        for _ in 0..5 {
            round += 1;
            assert_eq!(
                choose_venue(&mut person, &venues, round, &cfg),
                ChoiceOutcome::Inert
            );
            assert_eq!(person.status, Status::PermanentlyWithdrawn);
        }
    }

    #[test]
    fn empty_memory_after_bootstrap_routes_to_bootstrap_choice() {
        let cfg = two_venue_config([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        let venues = make_venues(&cfg);
        let mut person = make_person(&cfg, QueerWoman, 0.5);

        // Round index past bootstrap, but no memory yet: affinity lottery
        let outcome = choose_venue(&mut person, &venues, cfg.bootstrap_rounds + 10, &cfg);
        assert_eq!(outcome, ChoiceOutcome::Visit(VenueId(0)));
    }
}

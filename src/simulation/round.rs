//! Round protocol
//!
//! One round is four synchronized phases:
//!
//! 1. decide: every person picks a venue (or withdraws) against the venue
//!    state finalized at the end of the previous round
//! 2. commit: the collected choices are applied to the venues
//! 3. score: every visitor evaluates belonging at the venue they are in and
//!    stores the score in memory
//! 4. adapt: venues log the round's composition, update their adaptive
//!    affinities, and recheck their identity flags
//!
//! Choices are collected into a buffer before any of them is applied, so no
//! person can observe another person's same-round choice. Combined with the
//! per-person RNG streams this makes phase 1 independent of iteration
//! order; the shuffle only randomizes event ordering.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::config::ModelConfig;
use crate::core::types::{PersonId, Round, VenueId};
use crate::person::policy::{choose_venue, ChoiceOutcome};
use crate::person::Person;
use crate::venue::Venue;

/// Events generated during one simulation round
///
/// Returned by [`run_round`] for logging and run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// A person visited a venue this round
    Visited { person: PersonId, venue: VenueId },
    /// No venue met the person's threshold; they entered cooldown
    WithdrewTemporarily { person: PersonId, attempts: u32 },
    /// The person's cooldown expired with the withdrawal limit reached
    WithdrewPermanently { person: PersonId },
    /// A venue's rolling flag-group share crossed the flag threshold
    IdentityFlagChanged { venue: VenueId, raised: bool },
    /// End-of-round summary, always the last event of a round
    RoundCompleted { round: Round, visitors: u32 },
}

/// Run one full round and return the events it produced
pub fn run_round(
    people: &mut [Person],
    venues: &mut [Venue],
    round: Round,
    cfg: &ModelConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<RoundEvent> {
    for venue in venues.iter_mut() {
        venue.begin_round();
    }

    // Phase 1: decide. Shuffled order, choices buffered.
    let mut order: Vec<usize> = (0..people.len()).collect();
    order.shuffle(rng);

    let mut events = Vec::new();
    let mut choices: Vec<(usize, VenueId)> = Vec::with_capacity(people.len());
    for &idx in &order {
        let person = &mut people[idx];
        match choose_venue(person, venues, round, cfg) {
            ChoiceOutcome::Visit(venue) => {
                choices.push((idx, venue));
                events.push(RoundEvent::Visited {
                    person: person.id,
                    venue,
                });
            }
            ChoiceOutcome::Withdrew => events.push(RoundEvent::WithdrewTemporarily {
                person: person.id,
                attempts: person.withdrawal_attempts,
            }),
            ChoiceOutcome::WithdrewPermanently => {
                events.push(RoundEvent::WithdrewPermanently { person: person.id })
            }
            ChoiceOutcome::CoolingDown | ChoiceOutcome::Inert => {}
        }
    }

    // Phase 2: commit, in stable person order
    choices.sort_unstable_by_key(|&(idx, _)| idx);
    for &(idx, venue_id) in &choices {
        people[idx].current_venue = Some(venue_id);
        venues[venue_id.0].record_visitor(people[idx].group);
    }

    // Phase 3: score and remember
    for person in people.iter_mut() {
        if let Some(venue_id) = person.current_venue {
            let score = person.belonging(&venues[venue_id.0], cfg.alpha);
            person.remember(venue_id, score);
        }
    }

    // Phase 4: venue adaptation. The identity flag is re-evaluated inside
    // adaptation, so flips only surface on adaptation rounds.
    for venue in venues.iter_mut() {
        let flag_before = venue.identity_flag();
        venue.end_round();
        if venue.identity_flag() != flag_before {
            events.push(RoundEvent::IdentityFlagChanged {
                venue: venue.id,
                raised: venue.identity_flag(),
            });
        }
    }

    let visitors: u32 = venues.iter().map(|v| v.current_visitor_count()).sum();
    events.push(RoundEvent::RoundCompleted { round, visitors });
    tracing::debug!(round, visitors, "round completed");

    events
}

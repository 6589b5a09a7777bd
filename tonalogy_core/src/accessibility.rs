// The accessibility relation between functional states.
//
// Consecutive chords inside one world may only move along the cadential
// allow-list below, read over harmonic-function classes:
//
//   Tonic       -> Tonic, Subdominant, Dominant
//   Subdominant -> Dominant, Tonic
//   Dominant    -> Tonic, Dominant (prolongation)
//
// Everything unlisted is inaccessible, including any move into or out of a
// secondary dominant or a non-diatonic chord. Those chords are handled by
// the world predicates instead: `enters_secondary_world` licenses pushing a
// world for a secondary dominant, `exits_secondary_world` licenses popping
// back to the parent when the chord is diatonic there.
//
// The table is a static; the relation itself is a cheap handle that can be
// shared across threads by reference.

use crate::chord::Chord;
use crate::function::{FunctionalState, HarmonicFunction, functional_state_of};
use crate::tonality::Tonality;
use crate::world::World;

use HarmonicFunction as F;

/// Cadential allow-list over function classes.
pub static CADENTIAL_TRANSITIONS: [(HarmonicFunction, HarmonicFunction); 7] = [
    (F::Tonic, F::Tonic),
    (F::Tonic, F::Subdominant),
    (F::Tonic, F::Dominant),
    (F::Subdominant, F::Dominant),
    (F::Subdominant, F::Tonic),
    (F::Dominant, F::Tonic),
    (F::Dominant, F::Dominant),
];

#[derive(Debug, Clone, Copy)]
pub struct AccessibilityRelation {
    allowed: &'static [(HarmonicFunction, HarmonicFunction)],
}

impl AccessibilityRelation {
    pub const fn cadential() -> Self {
        AccessibilityRelation {
            allowed: &CADENTIAL_TRANSITIONS,
        }
    }

    /// Whether the class pair is on the allow-list.
    pub fn allows(&self, from: HarmonicFunction, to: HarmonicFunction) -> bool {
        self.allowed.contains(&(from, to))
    }

    /// Classes reachable from `from` in one step, in table order.
    pub fn successors(&self, from: HarmonicFunction) -> impl Iterator<Item = HarmonicFunction> + '_ {
        self.allowed
            .iter()
            .filter(move |(source, _)| *source == from)
            .map(|&(_, target)| target)
    }

    /// Whether `to` may directly follow `from` within one world.
    pub fn accessible(&self, from: FunctionalState, to: FunctionalState) -> bool {
        match (from.harmonic_function(), to.harmonic_function()) {
            (Some(from), Some(to)) => self.allows(from, to),
            _ => false,
        }
    }

    /// The tonality to push when `state` (evaluated in `tonality`) is a
    /// secondary dominant.
    pub fn enters_secondary_world(&self, state: FunctionalState, tonality: Tonality) -> Option<Tonality> {
        match state {
            FunctionalState::SecondaryDominantOf(degree) => tonality.tonicized(degree),
            _ => None,
        }
    }

    /// Whether `chord` resolves back into the parent of a secondary `world`,
    /// i.e. has a diatonic function in the parent tonality.
    pub fn exits_secondary_world(&self, world: &World, chord: &Chord) -> bool {
        match world.parent() {
            Some(parent) => functional_state_of(chord, parent).is_diatonic(),
            None => false,
        }
    }
}

impl Default for AccessibilityRelation {
    fn default() -> Self {
        Self::cadential()
    }
}

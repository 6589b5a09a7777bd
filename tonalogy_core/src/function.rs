// Harmonic function of a chord relative to a tonality.
//
// `functional_state_of` is a pure function of (chord, tonality):
// 1. Take the root's interval above the tonic and look it up in the mode's
//    degree table (tonality.rs).
// 2. If the degree exists and accepts the chord's quality, the chord is
//    diatonic and carries that degree's state.
// 3. Otherwise, a chord with the dominant pattern (major triad, dominant
//    seventh) points at the degree a fifth below its root, and a chord with
//    the leading-tone pattern (diminished shapes) at the degree a semitone
//    above. If that target is a non-tonic diatonic degree that can be
//    tonicized, the chord is `SecondaryDominantOf(target)`.
// 4. Anything else is `NonDiatonic`.
//
// Step 3 is the only route into a secondary world: the search engine pushes
// the tonality returned by `relative_tonality_for_pivot`.
//
// States also collapse to one of three cadential classes
// (`HarmonicFunction`), which is what the accessibility relation reads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::tonality::{ScaleDegree, Tonality};

/// Cadential class of a diatonic state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

impl fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonicFunction::Tonic => f.write_str("tonic"),
            HarmonicFunction::Subdominant => f.write_str("subdominant"),
            HarmonicFunction::Dominant => f.write_str("dominant"),
        }
    }
}

/// Role a chord plays in a given tonality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunctionalState {
    Tonic,
    Supertonic,
    Mediant,
    Subdominant,
    Dominant,
    Submediant,
    LeadingTone,
    SecondaryDominantOf(ScaleDegree),
    NonDiatonic,
}

impl FunctionalState {
    /// Cadential class; `None` for secondary dominants and non-diatonic chords.
    pub fn harmonic_function(self) -> Option<HarmonicFunction> {
        match self {
            FunctionalState::Tonic | FunctionalState::Mediant | FunctionalState::Submediant => {
                Some(HarmonicFunction::Tonic)
            }
            FunctionalState::Supertonic | FunctionalState::Subdominant => {
                Some(HarmonicFunction::Subdominant)
            }
            FunctionalState::Dominant | FunctionalState::LeadingTone => {
                Some(HarmonicFunction::Dominant)
            }
            FunctionalState::SecondaryDominantOf(_) | FunctionalState::NonDiatonic => None,
        }
    }

    pub fn is_diatonic(self) -> bool {
        self.harmonic_function().is_some()
    }
}

impl fmt::Display for FunctionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionalState::Tonic => f.write_str("Tonic"),
            FunctionalState::Supertonic => f.write_str("Supertonic"),
            FunctionalState::Mediant => f.write_str("Mediant"),
            FunctionalState::Subdominant => f.write_str("Subdominant"),
            FunctionalState::Dominant => f.write_str("Dominant"),
            FunctionalState::Submediant => f.write_str("Submediant"),
            FunctionalState::LeadingTone => f.write_str("Leading Tone"),
            FunctionalState::SecondaryDominantOf(degree) => {
                write!(f, "Secondary Dominant of {degree}")
            }
            FunctionalState::NonDiatonic => f.write_str("Non-Diatonic"),
        }
    }
}

/// Functional state of `chord` in `tonality`.
pub fn functional_state_of(chord: &Chord, tonality: Tonality) -> FunctionalState {
    let interval = tonality.interval_of(chord.root());
    let diatonic = tonality
        .mode
        .degree_at(interval)
        .filter(|entry| entry.accepts(chord.quality()));
    if let Some(entry) = diatonic {
        return entry.state;
    }
    match secondary_target(chord, tonality) {
        Some(degree) => FunctionalState::SecondaryDominantOf(degree),
        None => FunctionalState::NonDiatonic,
    }
}

/// The tonality in which a secondary-dominant chord is the dominant or
/// leading-tone chord. `None` unless the chord is `SecondaryDominantOf` in
/// `tonality`.
pub fn relative_tonality_for_pivot(chord: &Chord, tonality: Tonality) -> Option<Tonality> {
    match functional_state_of(chord, tonality) {
        FunctionalState::SecondaryDominantOf(degree) => tonality.tonicized(degree),
        _ => None,
    }
}

fn secondary_target(chord: &Chord, tonality: Tonality) -> Option<ScaleDegree> {
    let quality = chord.quality();
    let target_pc = if quality.has_dominant_pattern() {
        (chord.root() + 5) % 12
    } else if quality.has_leading_tone_pattern() {
        (chord.root() + 1) % 12
    } else {
        return None;
    };

    let interval = tonality.interval_of(target_pc);
    if interval == 0 {
        return None;
    }
    let entry = tonality.mode.degree_at(interval)?;
    tonality.tonicized(entry.degree).map(|_| entry.degree)
}

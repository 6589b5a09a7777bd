// Tonalities (key + mode) and their diatonic degree tables.
//
// A `Tonality` is a tonic pitch class plus a major/minor `Mode`. Its display
// name is "<Tonic> Major" / "<Tonic> Minor" with sharp spelling, e.g.
// "C Major", "D Minor", "A# Major". Names are parsed leniently (any
// accidental spelling, any case for the mode word) and printed canonically.
// The tonic letter itself must be upper case, as in chord symbols.
//
// Each mode has a fixed seven-entry degree table: the interval above the
// tonic, the scale degree, the functional state a diatonic chord on that
// degree carries, and the qualities accepted as diatonic there. The minor
// table mixes natural and harmonic minor (major V, leading-tone vii°) as
// common-practice harmony does. The first quality listed for a degree is
// its primary triad; `function.rs` uses it to decide whether a degree can
// be tonicized and in which mode.
//
// `canonical_set()` is the default candidate ordering: pitch class
// ascending, Major before Minor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordQuality};
use crate::error::{AnalysisError, Result};
use crate::function::FunctionalState;
use crate::notation::{note_name, parse_note};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Major, Mode::Minor];

    /// The seven diatonic degree entries for this mode, in degree order.
    pub fn degree_table(self) -> &'static [DegreeEntry; 7] {
        match self {
            Mode::Major => &MAJOR_DEGREES,
            Mode::Minor => &MINOR_DEGREES,
        }
    }

    /// Entry for the degree lying `interval` semitones above the tonic.
    pub fn degree_at(self, interval: u8) -> Option<&'static DegreeEntry> {
        self.degree_table()
            .iter()
            .find(|entry| entry.interval == interval % 12)
    }

    fn parse_word(word: &str) -> Option<Mode> {
        match word.to_ascii_lowercase().as_str() {
            "major" => Some(Mode::Major),
            "minor" => Some(Mode::Minor),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("Major"),
            Mode::Minor => f.write_str("Minor"),
        }
    }
}

/// Scale degree, displayed as a Roman numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScaleDegree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

impl ScaleDegree {
    pub fn roman(self) -> &'static str {
        match self {
            ScaleDegree::I => "I",
            ScaleDegree::II => "II",
            ScaleDegree::III => "III",
            ScaleDegree::IV => "IV",
            ScaleDegree::V => "V",
            ScaleDegree::VI => "VI",
            ScaleDegree::VII => "VII",
        }
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

/// One row of a mode's degree table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeEntry {
    /// Semitones above the tonic.
    pub interval: u8,
    pub degree: ScaleDegree,
    /// Functional state of a diatonic chord on this degree.
    pub state: FunctionalState,
    /// Qualities accepted as diatonic here; the first is the primary triad.
    pub qualities: &'static [ChordQuality],
}

impl DegreeEntry {
    pub fn primary_quality(&self) -> ChordQuality {
        self.qualities[0]
    }

    pub fn accepts(&self, quality: ChordQuality) -> bool {
        self.qualities.contains(&quality)
    }
}

use ChordQuality as Q;

static MAJOR_DEGREES: [DegreeEntry; 7] = [
    DegreeEntry { interval: 0, degree: ScaleDegree::I, state: FunctionalState::Tonic, qualities: &[Q::Major, Q::MajorSeventh] },
    DegreeEntry { interval: 2, degree: ScaleDegree::II, state: FunctionalState::Supertonic, qualities: &[Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 4, degree: ScaleDegree::III, state: FunctionalState::Mediant, qualities: &[Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 5, degree: ScaleDegree::IV, state: FunctionalState::Subdominant, qualities: &[Q::Major, Q::MajorSeventh] },
    DegreeEntry { interval: 7, degree: ScaleDegree::V, state: FunctionalState::Dominant, qualities: &[Q::Major, Q::DominantSeventh] },
    DegreeEntry { interval: 9, degree: ScaleDegree::VI, state: FunctionalState::Submediant, qualities: &[Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 11, degree: ScaleDegree::VII, state: FunctionalState::LeadingTone, qualities: &[Q::Diminished, Q::HalfDiminishedSeventh, Q::DiminishedSeventh] },
];

static MINOR_DEGREES: [DegreeEntry; 7] = [
    DegreeEntry { interval: 0, degree: ScaleDegree::I, state: FunctionalState::Tonic, qualities: &[Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 2, degree: ScaleDegree::II, state: FunctionalState::Supertonic, qualities: &[Q::Diminished, Q::HalfDiminishedSeventh] },
    DegreeEntry { interval: 3, degree: ScaleDegree::III, state: FunctionalState::Mediant, qualities: &[Q::Major, Q::MajorSeventh, Q::Augmented] },
    DegreeEntry { interval: 5, degree: ScaleDegree::IV, state: FunctionalState::Subdominant, qualities: &[Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 7, degree: ScaleDegree::V, state: FunctionalState::Dominant, qualities: &[Q::Major, Q::DominantSeventh, Q::Minor, Q::MinorSeventh] },
    DegreeEntry { interval: 8, degree: ScaleDegree::VI, state: FunctionalState::Submediant, qualities: &[Q::Major, Q::MajorSeventh] },
    DegreeEntry { interval: 11, degree: ScaleDegree::VII, state: FunctionalState::LeadingTone, qualities: &[Q::Diminished, Q::DiminishedSeventh, Q::HalfDiminishedSeventh] },
];

// ---------------------------------------------------------------------------
// Tonality
// ---------------------------------------------------------------------------

/// A key: tonic pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tonality {
    pub tonic: u8,
    pub mode: Mode,
}

impl Tonality {
    pub fn new(tonic: u8, mode: Mode) -> Self {
        Tonality {
            tonic: tonic % 12,
            mode,
        }
    }

    pub fn major(tonic: u8) -> Self {
        Tonality::new(tonic, Mode::Major)
    }

    pub fn minor(tonic: u8) -> Self {
        Tonality::new(tonic, Mode::Minor)
    }

    /// Display name, e.g. "C Major".
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parse "<note> <mode>", e.g. "Bb major", "F♯ Minor".
    pub fn parse(name: &str) -> Result<Tonality> {
        let invalid = || AnalysisError::InvalidTonalityName(name.to_string());
        let mut words = name.split_whitespace();
        let (Some(note), Some(mode), None) = (words.next(), words.next(), words.next()) else {
            return Err(invalid());
        };
        let tonic = parse_note(note).ok_or_else(invalid)?;
        let mode = Mode::parse_word(mode).ok_or_else(invalid)?;
        Ok(Tonality::new(tonic, mode))
    }

    /// All 24 tonalities, pitch class ascending, Major before Minor.
    pub fn canonical_set() -> Vec<Tonality> {
        (0..12u8)
            .flat_map(|pc| Mode::ALL.into_iter().map(move |mode| Tonality::new(pc, mode)))
            .collect()
    }

    /// Interval of a pitch class above this tonic.
    pub fn interval_of(&self, pc: u8) -> u8 {
        (pc % 12 + 12 - self.tonic) % 12
    }

    pub fn degree_entry(&self, degree: ScaleDegree) -> &'static DegreeEntry {
        &self.mode.degree_table()[degree as usize]
    }

    /// Pitch class of a scale degree.
    pub fn degree_pitch_class(&self, degree: ScaleDegree) -> u8 {
        (self.tonic + self.degree_entry(degree).interval) % 12
    }

    /// The tonality a chord on `degree` would establish when tonicized: rooted
    /// on the degree, in the mode of its primary triad. Degrees whose primary
    /// triad is neither major nor minor cannot be tonicized.
    pub fn tonicized(&self, degree: ScaleDegree) -> Option<Tonality> {
        let entry = self.degree_entry(degree);
        let mode = match entry.primary_quality() {
            ChordQuality::Major => Mode::Major,
            ChordQuality::Minor => Mode::Minor,
            _ => return None,
        };
        Some(Tonality::new(self.degree_pitch_class(degree), mode))
    }

    /// The diatonic chords of this tonality, one per degree (primary triad).
    pub fn harmonic_field(&self) -> Vec<FieldChord> {
        self.mode
            .degree_table()
            .iter()
            .map(|entry| FieldChord {
                degree: entry.degree,
                chord: Chord::new(self.tonic + entry.interval, entry.primary_quality()),
                state: entry.state,
            })
            .collect()
    }
}

impl fmt::Display for Tonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", note_name(self.tonic), self.mode)
    }
}

impl std::str::FromStr for Tonality {
    type Err = AnalysisError;

    fn from_str(name: &str) -> Result<Self> {
        Tonality::parse(name)
    }
}

impl TryFrom<String> for Tonality {
    type Error = AnalysisError;

    fn try_from(name: String) -> Result<Self> {
        Tonality::parse(&name)
    }
}

impl From<Tonality> for String {
    fn from(tonality: Tonality) -> String {
        tonality.to_string()
    }
}

/// One diatonic chord in a harmonic field listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChord {
    pub degree: ScaleDegree,
    pub chord: Chord,
    pub state: FunctionalState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Tonality::major(0).name(), "C Major");
        assert_eq!(Tonality::minor(2).name(), "D Minor");
        assert_eq!(Tonality::major(10).name(), "A# Major");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Tonality::parse("C Major").unwrap(), Tonality::major(0));
        assert_eq!(Tonality::parse("A minor").unwrap(), Tonality::minor(9));
        assert_eq!(Tonality::parse("Bb Major").unwrap(), Tonality::major(10));
        assert_eq!(Tonality::parse("F♯ MINOR").unwrap(), Tonality::minor(6));
        assert_eq!(Tonality::parse("  G   major ").unwrap(), Tonality::major(7));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for name in ["", "C", "C Dorian", "H Major", "C Major extra", "Cm", "c major"] {
            assert!(
                matches!(Tonality::parse(name), Err(AnalysisError::InvalidTonalityName(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_canonical_order() {
        let set = Tonality::canonical_set();
        assert_eq!(set.len(), 24);
        assert_eq!(set[0], Tonality::major(0));
        assert_eq!(set[1], Tonality::minor(0));
        assert_eq!(set[2], Tonality::major(1));
        assert_eq!(set[23], Tonality::minor(11));
        for pair in set.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_degree_tables_are_ordered() {
        for mode in Mode::ALL {
            let table = mode.degree_table();
            for (i, entry) in table.iter().enumerate() {
                assert_eq!(entry.degree as usize, i);
            }
            assert_eq!(table[0].state, FunctionalState::Tonic);
            assert_eq!(table[4].state, FunctionalState::Dominant);
        }
    }

    #[test]
    fn test_tonicized() {
        let c = Tonality::major(0);
        assert_eq!(c.tonicized(ScaleDegree::II), Some(Tonality::minor(2)));
        assert_eq!(c.tonicized(ScaleDegree::V), Some(Tonality::major(7)));
        assert_eq!(c.tonicized(ScaleDegree::VII), None);
        let a = Tonality::minor(9);
        assert_eq!(a.tonicized(ScaleDegree::III), Some(Tonality::major(0)));
        assert_eq!(a.tonicized(ScaleDegree::II), None);
    }

    #[test]
    fn test_harmonic_field() {
        let symbols: Vec<String> = Tonality::major(0)
            .harmonic_field()
            .into_iter()
            .map(|fc| fc.chord.symbol().to_string())
            .collect();
        assert_eq!(symbols, ["C", "Dm", "Em", "F", "G", "Am", "Bdim"]);

        let symbols: Vec<String> = Tonality::minor(9)
            .harmonic_field()
            .into_iter()
            .map(|fc| fc.chord.symbol().to_string())
            .collect();
        assert_eq!(symbols, ["Am", "Bdim", "C", "Dm", "E", "F", "G#dim"]);
    }

    #[test]
    fn test_serde_as_name() {
        let json = serde_json::to_string(&Tonality::minor(2)).unwrap();
        assert_eq!(json, "\"D Minor\"");
        let back: Tonality = serde_json::from_str("\"D minor\"").unwrap();
        assert_eq!(back, Tonality::minor(2));
        // Only the mode word is case-insensitive.
        assert!(serde_json::from_str::<Tonality>("\"d minor\"").is_err());
    }
}

// Chord symbols and the chord parser.
//
// A `Chord` is an immutable value: root pitch class, quality, and the
// trimmed symbol it was parsed from. Parsing splits the symbol into a root
// (letter + optional accidental, see `notation.rs`) and a quality token,
// then looks the token up in a `QualityVocabulary`. Unknown tokens are an
// `InvalidChordSymbol` error, never a silent fallback to major.
//
// The vocabulary is data rather than code so that `AnalyzerConfig` can add
// aliases (e.g. "mi" for minor) without touching the parser. The standard
// vocabulary is shared through a lazily built `ChordParser`.
//
// Chords serialize as their symbol string and deserialize by re-parsing it
// with the standard vocabulary.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::notation::{note_name, split_note_prefix, to_unicode_symbols};

/// Recognised chord qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    DominantSeventh,
    MajorSeventh,
    MinorSeventh,
    HalfDiminishedSeventh,
    DiminishedSeventh,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 9] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::DominantSeventh,
        ChordQuality::MajorSeventh,
        ChordQuality::MinorSeventh,
        ChordQuality::HalfDiminishedSeventh,
        ChordQuality::DiminishedSeventh,
    ];

    /// Semitone offsets of the chord tones above the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::DominantSeventh => &[0, 4, 7, 10],
            ChordQuality::MajorSeventh => &[0, 4, 7, 11],
            ChordQuality::MinorSeventh => &[0, 3, 7, 10],
            ChordQuality::HalfDiminishedSeventh => &[0, 3, 6, 10],
            ChordQuality::DiminishedSeventh => &[0, 3, 6, 9],
        }
    }

    /// The triad underneath a seventh chord; triads map to themselves.
    pub fn triad(self) -> ChordQuality {
        match self {
            ChordQuality::DominantSeventh | ChordQuality::MajorSeventh => ChordQuality::Major,
            ChordQuality::MinorSeventh => ChordQuality::Minor,
            ChordQuality::HalfDiminishedSeventh | ChordQuality::DiminishedSeventh => {
                ChordQuality::Diminished
            }
            triad => triad,
        }
    }

    /// Canonical suffix used when a chord is built from parts.
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::DominantSeventh => "7",
            ChordQuality::MajorSeventh => "maj7",
            ChordQuality::MinorSeventh => "m7",
            ChordQuality::HalfDiminishedSeventh => "m7b5",
            ChordQuality::DiminishedSeventh => "dim7",
        }
    }

    /// Major triad or dominant seventh: the shape of a (secondary) dominant.
    pub fn has_dominant_pattern(self) -> bool {
        matches!(self, ChordQuality::Major | ChordQuality::DominantSeventh)
    }

    /// Diminished shapes that act as a leading-tone chord.
    pub fn has_leading_tone_pattern(self) -> bool {
        matches!(
            self,
            ChordQuality::Diminished
                | ChordQuality::DiminishedSeventh
                | ChordQuality::HalfDiminishedSeventh
        )
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::DominantSeventh => "dominant seventh",
            ChordQuality::MajorSeventh => "major seventh",
            ChordQuality::MinorSeventh => "minor seventh",
            ChordQuality::HalfDiminishedSeventh => "half-diminished seventh",
            ChordQuality::DiminishedSeventh => "diminished seventh",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Chord value
// ---------------------------------------------------------------------------

/// A parsed chord symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chord {
    root: u8,
    quality: ChordQuality,
    symbol: String,
}

impl Chord {
    /// Build a chord from parts, spelling the symbol canonically ("F#m7").
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        let root = root % 12;
        Chord {
            root,
            quality,
            symbol: format!("{}{}", note_name(root), quality.suffix()),
        }
    }

    pub fn root(&self) -> u8 {
        self.root
    }

    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// The symbol as written by the caller (trimmed).
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Sorted pitch classes of the chord tones.
    pub fn pitch_classes(&self) -> Vec<u8> {
        let mut pcs: Vec<u8> = self
            .quality
            .intervals()
            .iter()
            .map(|&iv| (self.root + iv) % 12)
            .collect();
        pcs.sort_unstable();
        pcs
    }

    /// The symbol with Unicode accidentals, for display.
    pub fn display_unicode(&self) -> String {
        to_unicode_symbols(&self.symbol)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl TryFrom<String> for Chord {
    type Error = AnalysisError;

    fn try_from(symbol: String) -> Result<Self> {
        parse(&symbol)
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> String {
        chord.symbol
    }
}

impl std::str::FromStr for Chord {
    type Err = AnalysisError;

    fn from_str(symbol: &str) -> Result<Self> {
        parse(symbol)
    }
}

// ---------------------------------------------------------------------------
// Vocabulary and parser
// ---------------------------------------------------------------------------

/// Lookup table from quality token (the text after the root) to quality.
/// Tokens are case-sensitive: "M7" is major seventh, "m7" minor seventh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityVocabulary {
    tokens: BTreeMap<String, ChordQuality>,
}

impl QualityVocabulary {
    /// The built-in token table.
    pub fn standard() -> Self {
        let entries: &[(&str, ChordQuality)] = &[
            ("", ChordQuality::Major),
            ("M", ChordQuality::Major),
            ("maj", ChordQuality::Major),
            ("m", ChordQuality::Minor),
            ("min", ChordQuality::Minor),
            ("-", ChordQuality::Minor),
            ("dim", ChordQuality::Diminished),
            ("°", ChordQuality::Diminished),
            ("o", ChordQuality::Diminished),
            ("aug", ChordQuality::Augmented),
            ("+", ChordQuality::Augmented),
            ("7", ChordQuality::DominantSeventh),
            ("maj7", ChordQuality::MajorSeventh),
            ("M7", ChordQuality::MajorSeventh),
            ("Δ7", ChordQuality::MajorSeventh),
            ("Δ", ChordQuality::MajorSeventh),
            ("m7", ChordQuality::MinorSeventh),
            ("min7", ChordQuality::MinorSeventh),
            ("-7", ChordQuality::MinorSeventh),
            ("m7b5", ChordQuality::HalfDiminishedSeventh),
            ("ø", ChordQuality::HalfDiminishedSeventh),
            ("ø7", ChordQuality::HalfDiminishedSeventh),
            ("dim7", ChordQuality::DiminishedSeventh),
            ("°7", ChordQuality::DiminishedSeventh),
            ("o7", ChordQuality::DiminishedSeventh),
        ];
        QualityVocabulary {
            tokens: entries
                .iter()
                .map(|&(token, quality)| (token.to_string(), quality))
                .collect(),
        }
    }

    /// Add (or override) a token.
    pub fn insert(&mut self, token: impl Into<String>, quality: ChordQuality) {
        self.tokens.insert(token.into(), quality);
    }

    pub fn with_alias(mut self, token: impl Into<String>, quality: ChordQuality) -> Self {
        self.insert(token, quality);
        self
    }

    pub fn lookup(&self, token: &str) -> Option<ChordQuality> {
        self.tokens.get(token).copied()
    }

    /// All tokens in sorted order.
    pub fn tokens(&self) -> impl Iterator<Item = (&str, ChordQuality)> {
        self.tokens.iter().map(|(t, &q)| (t.as_str(), q))
    }
}

impl Default for QualityVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parses chord symbols against a vocabulary.
#[derive(Debug, Clone, Default)]
pub struct ChordParser {
    vocabulary: QualityVocabulary,
}

impl ChordParser {
    pub fn new(vocabulary: QualityVocabulary) -> Self {
        ChordParser { vocabulary }
    }

    pub fn vocabulary(&self) -> &QualityVocabulary {
        &self.vocabulary
    }

    pub fn parse(&self, symbol: &str) -> Result<Chord> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AnalysisError::chord(symbol, "empty symbol"));
        }
        let Some((root, token)) = split_note_prefix(symbol) else {
            return Err(AnalysisError::chord(
                symbol,
                "root must be a note letter A-G with an optional accidental",
            ));
        };
        let Some(quality) = self.vocabulary.lookup(token) else {
            return Err(AnalysisError::chord(
                symbol,
                format!("unrecognised quality token '{token}'"),
            ));
        };
        Ok(Chord {
            root,
            quality,
            symbol: symbol.to_string(),
        })
    }
}

static STANDARD_PARSER: LazyLock<ChordParser> = LazyLock::new(ChordParser::default);

/// Parse a chord symbol with the standard vocabulary.
pub fn parse(symbol: &str) -> Result<Chord> {
    STANDARD_PARSER.parse(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_letter_is_major() {
        let chord = parse("G").unwrap();
        assert_eq!(chord.root(), 7);
        assert_eq!(chord.quality(), ChordQuality::Major);
        assert_eq!(chord.symbol(), "G");
    }

    #[test]
    fn test_parse_quality_tokens() {
        let cases = [
            ("Em", 4, ChordQuality::Minor),
            ("Bdim", 11, ChordQuality::Diminished),
            ("Caug", 0, ChordQuality::Augmented),
            ("G7", 7, ChordQuality::DominantSeventh),
            ("Fmaj7", 5, ChordQuality::MajorSeventh),
            ("FM7", 5, ChordQuality::MajorSeventh),
            ("Dm7", 2, ChordQuality::MinorSeventh),
            ("Bm7b5", 11, ChordQuality::HalfDiminishedSeventh),
            ("G#dim7", 8, ChordQuality::DiminishedSeventh),
            ("Bbm", 10, ChordQuality::Minor),
            ("E♭dim", 3, ChordQuality::Diminished),
            ("C♯m", 1, ChordQuality::Minor),
        ];
        for (symbol, root, quality) in cases {
            let chord = parse(symbol).unwrap();
            assert_eq!(chord.root(), root, "{symbol}");
            assert_eq!(chord.quality(), quality, "{symbol}");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        for symbol in ["Xz9", "H", "Cfoo", "c", "", "   ", "C13"] {
            let err = parse(symbol).unwrap_err();
            assert!(
                matches!(err, AnalysisError::InvalidChordSymbol { .. }),
                "{symbol}: {err}"
            );
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse("F#m7").unwrap(), parse("F#m7").unwrap());
        // Same pitch content, different spelling: distinct values.
        assert_ne!(parse("Bb").unwrap(), parse("A#").unwrap());
        assert_eq!(
            parse("Bb").unwrap().pitch_classes(),
            parse("A#").unwrap().pitch_classes()
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse("  Am ").unwrap().symbol(), "Am");
    }

    #[test]
    fn test_pitch_classes() {
        assert_eq!(parse("C").unwrap().pitch_classes(), vec![0, 4, 7]);
        assert_eq!(parse("G7").unwrap().pitch_classes(), vec![2, 5, 7, 11]);
        assert_eq!(parse("Bb").unwrap().pitch_classes(), vec![2, 5, 10]);
    }

    #[test]
    fn test_custom_alias() {
        let parser =
            ChordParser::new(QualityVocabulary::standard().with_alias("mi", ChordQuality::Minor));
        assert_eq!(parser.parse("Dmi").unwrap().quality(), ChordQuality::Minor);
        assert!(parse("Dmi").is_err());
    }

    #[test]
    fn test_chord_new_spells_canonically() {
        assert_eq!(Chord::new(6, ChordQuality::MinorSeventh).symbol(), "F#m7");
        assert_eq!(Chord::new(14, ChordQuality::Major).symbol(), "D");
        assert_eq!(Chord::new(10, ChordQuality::Major).display_unicode(), "A♯");
    }

    #[test]
    fn test_serde_as_symbol() {
        let chord = parse("Ebmaj7").unwrap();
        let json = serde_json::to_string(&chord).unwrap();
        assert_eq!(json, "\"Ebmaj7\"");
        let back: Chord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chord);
        assert!(serde_json::from_str::<Chord>("\"Q\"").is_err());
    }

    #[test]
    fn test_triad_reduction() {
        assert_eq!(ChordQuality::DominantSeventh.triad(), ChordQuality::Major);
        assert_eq!(ChordQuality::HalfDiminishedSeventh.triad(), ChordQuality::Diminished);
        assert_eq!(ChordQuality::Augmented.triad(), ChordQuality::Augmented);
    }
}

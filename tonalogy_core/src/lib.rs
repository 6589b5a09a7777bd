// Tonalogy Core
//
// Decides whether a chord sequence is a tonal harmonic progression, names
// its key, and produces a step-by-step formal derivation. Harmonic function
// and tonicization are modelled as a walk through possible worlds (active
// tonalities) constrained by a cadential accessibility relation; a
// backtracking search over candidate tonalities finds a derivation.
//
// Architecture:
// - notation.rs: Pitch classes, note spelling, Unicode accidentals
// - chord.rs: Chord qualities, chord values, the configurable symbol parser
// - tonality.rs: Modes, scale degrees, degree tables, harmonic fields
// - function.rs: Functional state of a chord in a tonality, secondary
//   dominant detection
// - world.rs: Primary/secondary worlds and the bounded world stack
// - accessibility.rs: Cadential allow-list plus world entry/exit predicates
// - explanation.rs: Analysis steps and the checkpointing recorder
// - search.rs: Possible-worlds backtracking search for one candidate
// - analyzer.rs: Candidate iteration, failure-trace policy, `analyze`
// - config.rs: `AnalyzerConfig` (serde/JSON)
// - locale.rs: en/pt_br catalogs and the `Presentation` used by renderers
// - narrative.rs: Plain-language rendering of a result
// - report.rs: String-typed JSON report for presentation layers
// - error.rs: `AnalysisError` and the crate `Result` alias
//
// The core performs no I/O apart from `AnalyzerConfig::load`. Analyses are
// deterministic and share only read-only tables, so an `Analyzer` can serve
// concurrent callers by reference.

pub mod accessibility;
pub mod analyzer;
pub mod chord;
pub mod config;
pub mod error;
pub mod explanation;
pub mod function;
pub mod locale;
pub mod narrative;
pub mod notation;
pub mod report;
pub mod search;
pub mod tonality;
pub mod world;

pub use analyzer::{AnalysisResult, Analyzer, analyze};
pub use chord::{Chord, ChordQuality};
pub use config::{AnalyzerConfig, FailureTracePolicy};
pub use error::{AnalysisError, Result};
pub use explanation::{AnalysisStep, StepKind};
pub use function::FunctionalState;
pub use locale::{Locale, Presentation};
pub use tonality::{Mode, Tonality};

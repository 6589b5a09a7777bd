// Test-only helpers for end-to-end analysis scenarios.
//
// Wraps a real `Analyzer` (from `tonalogy_core::analyzer`) with a small
// assertion-friendly API: run a progression, then query the derivation by
// rule, kind, or chord. Everything goes through the same public entry
// points as the CLI; the helpers only add panicking conveniences and trace
// queries.
//
// See also: `tests/scenarios.rs` for the scenario suite.

use tonalogy_core::explanation::rules;
use tonalogy_core::{AnalysisResult, AnalysisStep, Analyzer, AnalyzerConfig, StepKind, Tonality};

/// An analyzer plus convenience wrappers for scenario tests.
pub struct ScenarioAnalyzer {
    analyzer: Analyzer,
}

impl ScenarioAnalyzer {
    /// Default configuration: depth 2, last-candidate failure trace.
    pub fn new() -> Self {
        Self {
            analyzer: Analyzer::default(),
        }
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            analyzer: Analyzer::new(config).expect("invalid test config"),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Analyse, panicking on input errors.
    pub fn run(&self, chords: &[&str], keys: &[&str]) -> Trace {
        let result = self
            .analyzer
            .analyze(chords, keys)
            .expect("analysis failed on valid input");
        Trace { result }
    }

    pub fn run_parallel(&self, chords: &[&str], keys: &[&str]) -> Trace {
        let result = self
            .analyzer
            .analyze_parallel(chords, keys)
            .expect("parallel analysis failed on valid input");
        Trace { result }
    }
}

impl Default for ScenarioAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished analysis with trace queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub result: AnalysisResult,
}

impl Trace {
    pub fn is_tonal(&self) -> bool {
        self.result.is_tonal_progression
    }

    pub fn tonality(&self) -> Option<Tonality> {
        self.result.identified_tonality
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.result.explanation_details
    }

    /// Index of the first step applying `rule`.
    pub fn index_of_rule(&self, rule: &str) -> Option<usize> {
        self.steps().iter().position(|s| s.formal_rule_applied == rule)
    }

    pub fn count_kind(&self, kind: StepKind) -> usize {
        self.steps().iter().filter(|s| s.kind == kind).count()
    }

    /// Steps of `kind` that processed `chord`.
    pub fn steps_for_chord(&self, kind: StepKind, chord: &str) -> Vec<&AnalysisStep> {
        self.steps()
            .iter()
            .filter(|s| s.kind == kind && s.processed_chord.as_deref() == Some(chord))
            .collect()
    }

    pub fn first(&self) -> &AnalysisStep {
        self.steps().first().expect("empty trace")
    }

    pub fn last(&self) -> &AnalysisStep {
        self.steps().last().expect("empty trace")
    }

    /// Panics unless the trace ends in confirmed closure on `expected`.
    pub fn assert_tonal_in(&self, expected: Tonality) {
        assert!(self.is_tonal(), "expected tonal progression, trace: {:#?}", self.steps());
        assert_eq!(self.tonality(), Some(expected));
        assert_eq!(self.first().formal_rule_applied, rules::ANALYSIS_START);
        assert_eq!(self.first().tonality_used_in_step, Some(expected));
        assert_eq!(self.last().formal_rule_applied, rules::CLOSURE_CONFIRMED);
    }

    /// Panics unless the result is negative and summarised.
    pub fn assert_not_tonal(&self) {
        assert!(!self.is_tonal(), "expected rejection, got {:?}", self.tonality());
        assert_eq!(self.tonality(), None);
        assert_eq!(self.last().formal_rule_applied, rules::NO_CANDIDATE_ACCEPTED);
    }
}

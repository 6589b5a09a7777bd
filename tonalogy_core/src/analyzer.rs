// Candidate tonality iterator and the public `analyze` entry point.
//
// An analysis parses every chord and resolves every requested tonality name
// up front, so malformed input fails before any step is produced. It then
// runs the search engine (search.rs) once per candidate in priority order;
// the first accepted candidate wins and its derivation is the result.
//
// When no candidate is accepted the result is negative, not an error. Its
// trace is chosen by `FailureTracePolicy`: the last candidate's deepest
// rejected branch (default), or the branch that reached furthest across all
// candidates. A closing "No Candidate Accepted" step summarises the outcome.
//
// `analyze_parallel` runs every candidate on the rayon pool and then applies
// the same in-order selection, so both paths return identical results.

use std::sync::LazyLock;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accessibility::AccessibilityRelation;
use crate::chord::{Chord, ChordParser};
use crate::config::{AnalyzerConfig, FailureTracePolicy};
use crate::error::{AnalysisError, Result};
use crate::explanation::{AnalysisStep, StepKind, rules};
use crate::search::{SearchEngine, SearchOutcome};
use crate::tonality::Tonality;

/// Outcome of analysing one progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_tonal_progression: bool,
    /// The accepted tonality; `None` for a negative result.
    pub identified_tonality: Option<Tonality>,
    pub explanation_details: Vec<AnalysisStep>,
}

impl AnalysisResult {
    /// Steps that enter or leave a secondary world.
    pub fn pivot_steps(&self) -> impl Iterator<Item = &AnalysisStep> {
        self.explanation_details.iter().filter(|step| step.is_pivot())
    }
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    parser: ChordParser,
    relation: AccessibilityRelation,
    default_candidates: Vec<Tonality>,
}

impl Analyzer {
    /// Build an analyzer from a validated configuration.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let default_candidates = config.candidate_tonalities()?;
        let parser = ChordParser::new(config.vocabulary());
        Ok(Analyzer {
            config,
            parser,
            relation: AccessibilityRelation::cadential(),
            default_candidates,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn parser(&self) -> &ChordParser {
        &self.parser
    }

    pub fn parse_chords(&self, symbols: &[&str]) -> Result<Vec<Chord>> {
        symbols.iter().map(|symbol| self.parser.parse(symbol)).collect()
    }

    /// Resolve tonality names in order; an empty list selects the default
    /// candidates.
    pub fn resolve_candidates(&self, names: &[&str]) -> Result<Vec<Tonality>> {
        if names.is_empty() {
            return Ok(self.default_candidates.clone());
        }
        names.iter().map(|name| Tonality::parse(name)).collect()
    }

    /// Analyse `chords`, trying `tonalities` in order (all defaults when
    /// empty).
    pub fn analyze(&self, chords: &[&str], tonalities: &[&str]) -> Result<AnalysisResult> {
        let (chords, candidates) = self.prepare(chords, tonalities)?;
        Ok(self.analyze_chords(&chords, &candidates))
    }

    /// Same result as `analyze`, with candidates searched concurrently.
    pub fn analyze_parallel(&self, chords: &[&str], tonalities: &[&str]) -> Result<AnalysisResult> {
        let (chords, candidates) = self.prepare(chords, tonalities)?;
        let engine = SearchEngine::new(&self.relation, &self.config);
        let outcomes: Vec<(Tonality, SearchOutcome)> = candidates
            .par_iter()
            .map(|&tonality| (tonality, engine.search(&chords, tonality)))
            .collect();
        Ok(self.conclude(outcomes, chords.len()))
    }

    /// Analyse already-parsed chords against explicit candidates.
    pub fn analyze_chords(&self, chords: &[Chord], candidates: &[Tonality]) -> AnalysisResult {
        let engine = SearchEngine::new(&self.relation, &self.config);
        let outcomes = candidates
            .iter()
            .map(|&tonality| (tonality, engine.search(chords, tonality)));
        self.conclude(outcomes, chords.len())
    }

    fn prepare(&self, chords: &[&str], tonalities: &[&str]) -> Result<(Vec<Chord>, Vec<Tonality>)> {
        if chords.is_empty() {
            return Err(AnalysisError::EmptyProgression);
        }
        let chords = self.parse_chords(chords)?;
        let candidates = self.resolve_candidates(tonalities)?;
        Ok((chords, candidates))
    }

    /// Pick the first accepted candidate, or build the negative result.
    /// `outcomes` is consumed lazily so the sequential path stops at the
    /// first acceptance.
    fn conclude<I>(&self, outcomes: I, chord_count: usize) -> AnalysisResult
    where
        I: IntoIterator<Item = (Tonality, SearchOutcome)>,
    {
        let policy = self.config.failure_trace;
        let mut tried = 0usize;
        let mut shown: Option<(usize, Tonality, Vec<AnalysisStep>)> = None;

        for (tonality, outcome) in outcomes {
            tried += 1;
            match outcome {
                SearchOutcome::Accepted { steps } => {
                    info!(%tonality, chords = chord_count, steps = steps.len(), "progression accepted");
                    return AnalysisResult {
                        is_tonal_progression: true,
                        identified_tonality: Some(tonality),
                        explanation_details: steps,
                    };
                }
                SearchOutcome::Rejected { steps, reach } => {
                    debug!(%tonality, reach, "candidate rejected");
                    let replace = match (&shown, policy) {
                        (None, _) | (Some(_), FailureTracePolicy::LastCandidate) => true,
                        (Some((best, _, _)), FailureTracePolicy::DeepestCandidate) => reach > *best,
                    };
                    if replace {
                        shown = Some((reach, tonality, steps));
                    }
                }
            }
        }

        let (mut explanation_details, summary) = match shown {
            Some((_, tonality, steps)) => {
                let which = match policy {
                    FailureTracePolicy::LastCandidate => "the last attempt",
                    FailureTracePolicy::DeepestCandidate => "the attempt that got furthest",
                };
                let summary = AnalysisStep::new(
                    StepKind::Summary,
                    rules::NO_CANDIDATE_ACCEPTED,
                    format!(
                        "None of the {tried} candidate tonalities explains the progression; \
                         the trace above shows {which}, in {tonality}."
                    ),
                )
                .tonality(tonality);
                (steps, summary)
            }
            None => (
                Vec::new(),
                AnalysisStep::new(
                    StepKind::Summary,
                    rules::NO_CANDIDATE_ACCEPTED,
                    "No candidate tonality was tested.",
                ),
            ),
        };
        explanation_details.push(summary);
        info!(tried, chords = chord_count, "progression is not tonal");

        AnalysisResult {
            is_tonal_progression: false,
            identified_tonality: None,
            explanation_details,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer {
            config: AnalyzerConfig::default(),
            parser: ChordParser::default(),
            relation: AccessibilityRelation::cadential(),
            default_candidates: Tonality::canonical_set(),
        }
    }
}

static DEFAULT_ANALYZER: LazyLock<Analyzer> = LazyLock::new(Analyzer::default);

/// Analyse with the default configuration.
pub fn analyze(chords: &[&str], tonalities: &[&str]) -> Result<AnalysisResult> {
    DEFAULT_ANALYZER.analyze(chords, tonalities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionalState;

    #[test]
    fn test_secondary_dominant_scenario() {
        let result = analyze(&["Em", "A", "Dm", "G", "C"], &[]).unwrap();
        assert!(result.is_tonal_progression);
        assert_eq!(result.identified_tonality, Some(Tonality::major(0)));

        let steps = &result.explanation_details;
        assert_eq!(steps[0].formal_rule_applied, rules::ANALYSIS_START);
        assert_eq!(steps[0].tonality_used_in_step, Some(Tonality::major(0)));

        let pivot = steps
            .iter()
            .position(|s| s.formal_rule_applied == rules::TONICIZATION_PIVOT)
            .unwrap();
        assert_eq!(steps[pivot].processed_chord.as_deref(), Some("A"));
        assert_eq!(steps[pivot].tonality_used_in_step, Some(Tonality::minor(2)));

        let ret = steps
            .iter()
            .position(|s| s.formal_rule_applied == rules::RETURN_TO_PRIMARY)
            .unwrap();
        assert!(ret > pivot);
        assert!(steps[ret].position.unwrap() <= 3);
        assert_eq!(
            steps.last().unwrap().formal_rule_applied,
            rules::CLOSURE_CONFIRMED
        );
    }

    #[test]
    fn test_invalid_chord_is_fatal() {
        assert!(matches!(
            analyze(&["Xz9"], &[]),
            Err(AnalysisError::InvalidChordSymbol { .. })
        ));
        // A bad symbol anywhere aborts, even after valid ones.
        assert!(matches!(
            analyze(&["C", "G", "H7"], &["C Major"]),
            Err(AnalysisError::InvalidChordSymbol { .. })
        ));
    }

    #[test]
    fn test_invalid_tonality_is_fatal() {
        assert!(matches!(
            analyze(&["C", "G", "C"], &["C Major", "C Lydian"]),
            Err(AnalysisError::InvalidTonalityName(_))
        ));
    }

    #[test]
    fn test_empty_progression() {
        assert!(matches!(analyze(&[], &[]), Err(AnalysisError::EmptyProgression)));
    }

    #[test]
    fn test_non_tonal_in_given_key() {
        let result = analyze(&["F#", "B", "E"], &["C Major"]).unwrap();
        assert!(!result.is_tonal_progression);
        assert_eq!(result.identified_tonality, None);
        let last = result.explanation_details.last().unwrap();
        assert_eq!(last.kind, StepKind::Summary);
        assert_eq!(last.formal_rule_applied, rules::NO_CANDIDATE_ACCEPTED);
        assert!(
            result
                .explanation_details
                .iter()
                .any(|s| s.kind == StepKind::Rejection)
        );
    }

    #[test]
    fn test_explicit_candidates_are_prioritised() {
        // "C F C" closes in C (I IV I) and in F (V I V, a half cadence), so
        // the first listed key wins.
        let chords = ["C", "F", "C"];
        let result = analyze(&chords, &["F Major", "C Major"]).unwrap();
        assert_eq!(result.identified_tonality, Some(Tonality::major(5)));
        let result = analyze(&chords, &["C Major", "F Major"]).unwrap();
        assert_eq!(result.identified_tonality, Some(Tonality::major(0)));
        let result = analyze(&["Am", "Dm", "E", "Am"], &["C Major", "A Minor"]).unwrap();
        assert_eq!(result.identified_tonality, Some(Tonality::minor(9)));
    }

    #[test]
    fn test_failure_trace_policies() {
        // B minor reads "F#" and pivots on "B" before failing on "E"; C
        // Major fails at once.
        let chords = ["F#", "B", "E"];
        let keys = ["B Minor", "C Major"];

        let last = analyze(&chords, &keys).unwrap();
        assert_eq!(
            last.explanation_details[0].tonality_used_in_step,
            Some(Tonality::major(0))
        );

        let deepest = Analyzer::new(AnalyzerConfig {
            failure_trace: FailureTracePolicy::DeepestCandidate,
            ..AnalyzerConfig::default()
        })
        .unwrap()
        .analyze(&chords, &keys)
        .unwrap();
        assert_eq!(
            deepest.explanation_details[0].tonality_used_in_step,
            Some(Tonality::minor(11))
        );
        let steps = &deepest.explanation_details;
        let rejection = &steps[steps.len() - 2];
        assert_eq!(rejection.kind, StepKind::Rejection);
        assert_eq!(rejection.processed_chord.as_deref(), Some("E"));
        assert!(steps.iter().any(|s| s.kind == StepKind::PivotEntry));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let analyzer = Analyzer::default();
        for chords in [
            vec!["Em", "A", "Dm", "G", "C"],
            vec!["F#", "B", "E"],
            vec!["Am", "Dm", "E", "Am"],
            vec!["C", "Caug", "C"],
        ] {
            assert_eq!(
                analyzer.analyze(&chords, &[]).unwrap(),
                analyzer.analyze_parallel(&chords, &[]).unwrap()
            );
        }
    }

    #[test]
    fn test_accepted_trace_covers_every_chord() {
        let chords = ["C", "F", "G7", "C"];
        let result = analyze(&chords, &[]).unwrap();
        assert!(result.explanation_details.len() >= chords.len());
        let closing = result.explanation_details.last().unwrap();
        assert_eq!(closing.kind, StepKind::Closure);
        assert_eq!(closing.evaluated_functional_state, Some(FunctionalState::Tonic));
    }

    #[test]
    fn test_configured_aliases_and_candidates() {
        let config = AnalyzerConfig::from_json(
            r#"{ "default_candidates": ["G Major"], "extra_quality_aliases": { "mi": "minor" } }"#,
        )
        .unwrap();
        let analyzer = Analyzer::new(config).unwrap();
        let result = analyzer.analyze(&["G", "Ami", "D", "G"], &[]).unwrap();
        assert_eq!(result.identified_tonality, Some(Tonality::major(7)));
        assert!(matches!(
            Analyzer::default().analyze(&["Ami"], &[]),
            Err(AnalysisError::InvalidChordSymbol { .. })
        ));
    }
}

// Explanation steps and the recorder that collects them during a search.
//
// An `AnalysisStep` is one line of the formal derivation. Besides the
// human-facing rule name and observation it keeps structured fields
// (`kind`, `world`, `position`, tonality, functional state) so that a
// renderer can tell which world was active and where pivots happen without
// parsing prose.
//
// `ExplanationRecorder` is append-only from the outside, with
// checkpoint/rollback for the backtracking search: a branch records its
// steps, and if it fails the engine rolls back to the checkpoint. Before
// rolling back a rejection, the recorder snapshots the trace if it reached
// further into the progression than any earlier rejection; that deepest
// trace is what a failed candidate reports.

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::function::FunctionalState;
use crate::tonality::Tonality;
use crate::world::World;

/// Formal rule names used in `formal_rule_applied`.
pub mod rules {
    pub const ANALYSIS_START: &str = "Analysis Start";
    pub const FUNCTIONAL_TRANSITION: &str = "Functional Transition Confirmed";
    pub const TONICIZATION_PIVOT: &str = "Tonicization Pivot Identified";
    pub const RETURN_TO_PRIMARY: &str = "Return to Primary Tonality";
    pub const TRANSITION_REJECTED: &str = "Functional Transition Rejected";
    pub const CLOSURE_CONFIRMED: &str = "Analysis End – Tonal Closure Confirmed";
    pub const CLOSURE_REJECTED: &str = "Tonal Closure Rejected";
    pub const NO_CANDIDATE_ACCEPTED: &str = "No Candidate Accepted";
}

/// What a step represents, for renderers and narrative formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Start,
    Transition,
    PivotEntry,
    PivotExit,
    Rejection,
    Closure,
    ClosureFailure,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStep {
    pub formal_rule_applied: String,
    pub observation: String,
    pub processed_chord: Option<String>,
    pub tonality_used_in_step: Option<Tonality>,
    pub evaluated_functional_state: Option<FunctionalState>,
    pub kind: StepKind,
    /// World on top of the stack after the step.
    pub world: Option<World>,
    /// Index of the processed chord in the input.
    pub position: Option<usize>,
}

impl AnalysisStep {
    pub fn new(kind: StepKind, rule: &str, observation: impl Into<String>) -> Self {
        AnalysisStep {
            formal_rule_applied: rule.to_string(),
            observation: observation.into(),
            processed_chord: None,
            tonality_used_in_step: None,
            evaluated_functional_state: None,
            kind,
            world: None,
            position: None,
        }
    }

    pub fn chord(mut self, chord: &Chord, position: usize) -> Self {
        self.processed_chord = Some(chord.symbol().to_string());
        self.position = Some(position);
        self
    }

    pub fn tonality(mut self, tonality: Tonality) -> Self {
        self.tonality_used_in_step = Some(tonality);
        self
    }

    pub fn state(mut self, state: FunctionalState) -> Self {
        self.evaluated_functional_state = Some(state);
        self
    }

    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    pub fn is_pivot(&self) -> bool {
        matches!(self.kind, StepKind::PivotEntry | StepKind::PivotExit)
    }
}

/// Position in the recorder's log to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Default)]
pub struct ExplanationRecorder {
    steps: Vec<AnalysisStep>,
    deepest_failure: Option<(usize, Vec<AnalysisStep>)>,
}

impl ExplanationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: AnalysisStep) {
        tracing::trace!(rule = %step.formal_rule_applied, observation = %step.observation, "step");
        self.steps.push(step);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.steps.len())
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.steps.truncate(checkpoint.0);
    }

    /// Record a rejection reached at chord index `reach`, keep the trace if
    /// it is the deepest so far, then drop the rejection from the live log.
    pub fn reject(&mut self, step: AnalysisStep, reach: usize) {
        let checkpoint = self.checkpoint();
        self.record(step);
        let deeper = self
            .deepest_failure
            .as_ref()
            .is_none_or(|(best, _)| reach > *best);
        if deeper {
            self.deepest_failure = Some((reach, self.steps.clone()));
        }
        self.rollback(checkpoint);
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Chord index reached by the deepest recorded rejection.
    pub fn deepest_reach(&self) -> Option<usize> {
        self.deepest_failure.as_ref().map(|(reach, _)| *reach)
    }

    pub fn into_steps(self) -> Vec<AnalysisStep> {
        self.steps
    }

    /// The deepest rejected trace, or the live log if nothing was rejected.
    pub fn into_failure_trace(self) -> Vec<AnalysisStep> {
        match self.deepest_failure {
            Some((_, trace)) => trace,
            None => self.steps,
        }
    }
}

// Possible-worlds search for one candidate tonality.
//
// The engine walks the chord sequence left to right. Its state is
// (position, world stack, previous functional state); the start state is
// the implied tonic of the candidate in a primary-only stack. At each
// position it tries, in this order:
//
// 1. Direct transition: the chord's state in the top world is accessible
//    from the previous state. Advance.
// 2. Tonicization: the chord is a secondary dominant in the top world and
//    the stack has room. Push the target world, advance with the chord's
//    (dominant) state in that world.
// 3. Return: the top world is secondary and the chord is diatonic in its
//    parent. Pop, then re-evaluate the same chord in the parent. The
//    parent-world previous state is the preceding chord read in the parent
//    when that reading is diatonic, else the state saved when the world was
//    pushed.
//
// If an alternative leads to a dead end further on, the engine rolls the
// recorder back and tries the next one. When none is left it records a
// rejection, remembers the state as refuted, and resumes the state before
// it. The refuted-state memo bounds total work by the number of distinct
// (position, stack, state) triples.
//
// The walk keeps its own stack of `Frame`s (one per open state, holding the
// next alternative to try and the checkpoint of the branch in progress)
// instead of recursing, so the progression length is bounded by memory, not
// by the thread's call stack.
//
// At the end of the sequence the candidate is accepted only if every
// secondary world has been closed and the final state is the tonic, or
// (when enabled) a dominant-shaped V standing for an implied tonic.

use std::collections::BTreeSet;

use tracing::debug;

use crate::accessibility::AccessibilityRelation;
use crate::chord::Chord;
use crate::config::AnalyzerConfig;
use crate::explanation::{AnalysisStep, Checkpoint, ExplanationRecorder, StepKind, rules};
use crate::function::{FunctionalState, functional_state_of};
use crate::tonality::Tonality;
use crate::world::{World, WorldStack};

/// Result of searching one candidate tonality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A complete derivation.
    Accepted { steps: Vec<AnalysisStep> },
    /// No derivation; `steps` is the deepest rejected branch and `reach` the
    /// chord index where it was rejected (the chord count for a failed
    /// closure).
    Rejected { steps: Vec<AnalysisStep>, reach: usize },
}

impl SearchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SearchOutcome::Accepted { .. })
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        match self {
            SearchOutcome::Accepted { steps } | SearchOutcome::Rejected { steps, .. } => steps,
        }
    }

    pub fn into_steps(self) -> Vec<AnalysisStep> {
        match self {
            SearchOutcome::Accepted { steps } | SearchOutcome::Rejected { steps, .. } => steps,
        }
    }
}

/// Search policy shared by every candidate of one analysis.
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine<'a> {
    relation: &'a AccessibilityRelation,
    max_world_depth: usize,
    dominant_closure: bool,
}

impl<'a> SearchEngine<'a> {
    pub fn new(relation: &'a AccessibilityRelation, config: &AnalyzerConfig) -> Self {
        SearchEngine {
            relation,
            max_world_depth: config.max_world_depth,
            dominant_closure: config.dominant_closure,
        }
    }

    /// Look for a derivation of `chords` grounded in `tonality`.
    pub fn search(&self, chords: &[Chord], tonality: Tonality) -> SearchOutcome {
        let primary = World::Primary(tonality);
        let mut attempt = Attempt {
            engine: self,
            chords,
            recorder: ExplanationRecorder::new(),
            refuted: BTreeSet::new(),
        };
        attempt.recorder.record(
            AnalysisStep::new(
                StepKind::Start,
                rules::ANALYSIS_START,
                format!("Testing progression in tonality '{tonality}'."),
            )
            .tonality(tonality)
            .state(FunctionalState::Tonic)
            .world(primary),
        );

        if chords.is_empty() {
            attempt.recorder.reject(
                AnalysisStep::new(
                    StepKind::ClosureFailure,
                    rules::CLOSURE_REJECTED,
                    "There are no chords to derive.",
                )
                .tonality(tonality)
                .world(primary),
                0,
            );
            return SearchOutcome::Rejected {
                steps: attempt.recorder.into_failure_trace(),
                reach: 0,
            };
        }

        let start = SearchState {
            position: 0,
            stack: WorldStack::new(tonality, self.max_world_depth),
            previous: FunctionalState::Tonic,
        };
        if attempt.explore(start) {
            SearchOutcome::Accepted {
                steps: attempt.recorder.into_steps(),
            }
        } else {
            let reach = attempt.recorder.deepest_reach().unwrap_or(0);
            SearchOutcome::Rejected {
                steps: attempt.recorder.into_failure_trace(),
                reach,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SearchState {
    position: usize,
    stack: WorldStack,
    previous: FunctionalState,
}

/// Branches tried at each position, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alternative {
    Direct,
    Tonicize,
    Return,
    Exhausted,
}

impl Alternative {
    fn following(self) -> Alternative {
        match self {
            Alternative::Direct => Alternative::Tonicize,
            Alternative::Tonicize => Alternative::Return,
            Alternative::Return | Alternative::Exhausted => Alternative::Exhausted,
        }
    }
}

/// An open state on the explicit search stack.
struct Frame {
    state: SearchState,
    next: Alternative,
    /// Branch being explored below this frame, with the recorder checkpoint
    /// to roll back to if it fails.
    pending: Option<(Checkpoint, Alternative)>,
}

impl Frame {
    fn new(state: SearchState) -> Self {
        Frame {
            state,
            next: Alternative::Direct,
            pending: None,
        }
    }
}

/// Mutable state of one candidate's search.
struct Attempt<'a> {
    engine: &'a SearchEngine<'a>,
    chords: &'a [Chord],
    recorder: ExplanationRecorder,
    refuted: BTreeSet<SearchState>,
}

impl<'a> Attempt<'a> {
    /// Depth-first walk from `start`; true once a derivation closes.
    fn explore(&mut self, start: SearchState) -> bool {
        let mut frames: Vec<Frame> = Vec::new();
        let mut entering = Some(start);
        loop {
            if let Some(state) = entering.take() {
                if state.position == self.chords.len() {
                    if self.close(&state.stack, state.previous) {
                        return true;
                    }
                } else if self.refuted.contains(&state) {
                    debug!(position = state.position, "state already refuted");
                } else {
                    frames.push(Frame::new(state));
                }
                continue;
            }

            let Some(frame) = frames.last_mut() else {
                return false;
            };
            if let Some((checkpoint, tried)) = frame.pending.take() {
                self.recorder.rollback(checkpoint);
                debug!(position = frame.state.position, ?tried, "backtracking");
            }
            match self.advance(frame) {
                Some(next) => entering = Some(next),
                None => {
                    if let Some(exhausted) = frames.pop() {
                        self.refute(exhausted.state);
                    }
                }
            }
        }
    }

    /// Take the frame's next applicable alternative, recording its step.
    /// Returns the state it leads to, or `None` when all are used up.
    fn advance(&mut self, frame: &mut Frame) -> Option<SearchState> {
        while frame.next != Alternative::Exhausted {
            let alternative = frame.next;
            frame.next = alternative.following();
            let checkpoint = self.recorder.checkpoint();
            let child = match alternative {
                Alternative::Direct => self.direct(&frame.state),
                Alternative::Tonicize => self.tonicize(&frame.state),
                Alternative::Return => self.return_to_parent(&frame.state),
                Alternative::Exhausted => None,
            };
            if child.is_some() {
                frame.pending = Some((checkpoint, alternative));
                return child;
            }
        }
        None
    }

    fn chord_at(&self, at: &SearchState) -> &'a Chord {
        let chords = self.chords;
        &chords[at.position]
    }

    fn direct(&mut self, at: &SearchState) -> Option<SearchState> {
        let chord = self.chord_at(at);
        let world = *at.stack.top();
        let tonality = world.tonality();
        let state = functional_state_of(chord, tonality);
        if !self.engine.relation.accessible(at.previous, state) {
            return None;
        }
        self.recorder.record(
            AnalysisStep::new(
                StepKind::Transition,
                rules::FUNCTIONAL_TRANSITION,
                format!(
                    "'{chord}' acts as {state} in {tonality}, reached from {}.",
                    at.previous
                ),
            )
            .chord(chord, at.position)
            .tonality(tonality)
            .state(state)
            .world(world),
        );
        Some(SearchState {
            position: at.position + 1,
            stack: at.stack.clone(),
            previous: state,
        })
    }

    fn tonicize(&mut self, at: &SearchState) -> Option<SearchState> {
        let chord = self.chord_at(at);
        let tonality = at.stack.top().tonality();
        let state = functional_state_of(chord, tonality);
        let target = self.engine.relation.enters_secondary_world(state, tonality)?;
        let mut entered = at.stack.clone();
        let Some(secondary) = entered.push_secondary(target, at.previous) else {
            debug!(position = at.position, chord = %chord, %target, "world depth bound blocks tonicization");
            return None;
        };
        let pivot_state = functional_state_of(chord, target);
        self.recorder.record(
            AnalysisStep::new(
                StepKind::PivotEntry,
                rules::TONICIZATION_PIVOT,
                format!(
                    "'{chord}' is the {state} in {tonality} and acts as \
                     {pivot_state} of {target}; entering {target}."
                ),
            )
            .chord(chord, at.position)
            .tonality(target)
            .state(pivot_state)
            .world(secondary),
        );
        Some(SearchState {
            position: at.position + 1,
            stack: entered,
            previous: pivot_state,
        })
    }

    fn return_to_parent(&mut self, at: &SearchState) -> Option<SearchState> {
        let chord = self.chord_at(at);
        let world = *at.stack.top();
        if !self.engine.relation.exits_secondary_world(&world, chord) {
            return None;
        }
        let mut parent = at.stack.clone();
        let (_, entry_state) = parent.pop_secondary()?;
        let parent_world = *parent.top();
        let parent_tonality = parent_world.tonality();
        let parent_state = functional_state_of(chord, parent_tonality);
        let resumed = at
            .position
            .checked_sub(1)
            .and_then(|before| self.chords.get(before))
            .map(|before| functional_state_of(before, parent_tonality))
            .filter(|reading| reading.is_diatonic())
            .unwrap_or(entry_state);

        self.recorder.record(
            AnalysisStep::new(
                StepKind::PivotExit,
                rules::RETURN_TO_PRIMARY,
                format!(
                    "'{chord}' resolves as {parent_state} in {parent_tonality}; \
                     leaving {} and resuming from {resumed}.",
                    world.tonality()
                ),
            )
            .chord(chord, at.position)
            .tonality(parent_tonality)
            .state(parent_state)
            .world(parent_world),
        );
        // The same chord is read again, now in the parent world.
        Some(SearchState {
            position: at.position,
            stack: parent,
            previous: resumed,
        })
    }

    /// Record that no alternative explains the chord at `at`.
    fn refute(&mut self, at: SearchState) {
        let chord = self.chord_at(&at);
        let world = *at.stack.top();
        let tonality = world.tonality();
        let state = functional_state_of(chord, tonality);
        let previous = at.previous;
        self.recorder.reject(
            AnalysisStep::new(
                StepKind::Rejection,
                rules::TRANSITION_REJECTED,
                format!(
                    "'{chord}' is {state} in {tonality} and cannot follow {previous}; \
                     no tonicization or return to a parent world explains it."
                ),
            )
            .chord(chord, at.position)
            .tonality(tonality)
            .state(state)
            .world(world),
            at.position,
        );
        debug!(position = at.position, chord = %chord, %tonality, %state, %previous, "branch rejected");
        self.refuted.insert(at);
    }

    fn close(&mut self, stack: &WorldStack, last: FunctionalState) -> bool {
        let reach = self.chords.len();
        let tonality = stack.primary();
        let world = *stack.top();

        if !stack.is_primary_only() {
            self.recorder.reject(
                AnalysisStep::new(
                    StepKind::ClosureFailure,
                    rules::CLOSURE_REJECTED,
                    format!(
                        "The progression ends inside {}; every tonicization must return to {tonality}.",
                        world.tonality()
                    ),
                )
                .tonality(world.tonality())
                .state(last)
                .world(world),
                reach,
            );
            debug!(%tonality, open = %world.tonality(), "closure rejected: secondary world still open");
            return false;
        }

        let implied_tonic = self.engine.dominant_closure
            && self
                .chords
                .last()
                .is_some_and(|chord| chord.quality().has_dominant_pattern());
        let closes = match last {
            FunctionalState::Tonic => true,
            FunctionalState::Dominant => implied_tonic,
            _ => false,
        };

        if closes {
            let observation = if last == FunctionalState::Tonic {
                format!("The progression resolves to the tonic of {tonality}.")
            } else {
                format!("The progression ends on the dominant of {tonality}, implying its tonic.")
            };
            self.recorder.record(
                AnalysisStep::new(StepKind::Closure, rules::CLOSURE_CONFIRMED, observation)
                    .tonality(tonality)
                    .state(last)
                    .world(world),
            );
            true
        } else {
            self.recorder.reject(
                AnalysisStep::new(
                    StepKind::ClosureFailure,
                    rules::CLOSURE_REJECTED,
                    format!("The progression ends on {last} in {tonality}, which does not close on the tonic."),
                )
                .tonality(tonality)
                .state(last)
                .world(world),
                reach,
            );
            debug!(%tonality, %last, "closure rejected");
            false
        }
    }
}

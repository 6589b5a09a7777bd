// Plain-language rendering of an analysis result.
//
// `narrate` reads only the structured step fields (kind, world, position,
// tonality, functional state), never the prose observations, except to
// quote the final rejection of a negative result. The text has three
// paragraphs:
//
// - introduction: the chord sequence and the verdict;
// - body: consecutive chords grouped by the world that interpreted them,
//   with cadence recognition inside each group (authentic: dominant to
//   tonic; plagal: subdominant to tonic), followed by one sentence per
//   tonicization and per return;
// - conclusion: how the progression closes, or why it was not accepted.
//
// Every sentence comes from the locale catalog (`locale.rs`); `narrate`
// is the English, ASCII-accidental rendering.

use crate::analyzer::AnalysisResult;
use crate::explanation::{AnalysisStep, StepKind};
use crate::function::{FunctionalState, HarmonicFunction};
use crate::locale::{Locale, Message, Presentation};
use crate::world::World;

/// One chord as read inside a group.
struct Reading<'a> {
    chord: &'a str,
    state: FunctionalState,
}

struct Group<'a> {
    world: World,
    readings: Vec<Reading<'a>>,
}

/// Render `result` as readable English prose with ASCII accidentals.
pub fn narrate(result: &AnalysisResult) -> String {
    narrate_with(result, &Presentation::default())
}

/// Render `result` in the presentation's locale and accidental style.
pub fn narrate_with(result: &AnalysisResult, presentation: &Presentation) -> String {
    let steps = &result.explanation_details;
    if steps.is_empty() {
        return presentation.message(Message::NoSteps, &[]);
    }

    let mut paragraphs = vec![introduction(result, presentation)];
    let body = body(steps, presentation);
    if !body.is_empty() {
        paragraphs.push(body);
    }
    paragraphs.push(conclusion(result, presentation));
    paragraphs.join("\n\n")
}

/// Chord symbols in input order, one per position reached by the trace.
fn chord_sequence(steps: &[AnalysisStep]) -> Vec<&str> {
    let mut sequence: Vec<&str> = Vec::new();
    let located = steps
        .iter()
        .filter_map(|step| Some((step.position?, step.processed_chord.as_deref()?)));
    for (position, chord) in located {
        if position == sequence.len() {
            sequence.push(chord);
        }
    }
    sequence
}

fn introduction(result: &AnalysisResult, p: &Presentation) -> String {
    let sequence = chord_sequence(&result.explanation_details)
        .into_iter()
        .map(|chord| p.chord(chord))
        .collect::<Vec<_>>()
        .join(" → ");
    match result.identified_tonality {
        Some(tonality) if result.is_tonal_progression => p.message(
            Message::IntroTonal,
            &[
                ("sequence", sequence.as_str()),
                ("tonality", p.tonality(tonality).as_str()),
            ],
        ),
        _ if sequence.is_empty() => p.message(Message::IntroRejectedEmpty, &[]),
        _ => p.message(Message::IntroRejected, &[("sequence", sequence.as_str())]),
    }
}

fn body(steps: &[AnalysisStep], p: &Presentation) -> String {
    let connectors = p.locale.connectors();
    let mut sentences: Vec<String> = Vec::new();
    for (index, group) in groups(steps).iter().enumerate() {
        let sentence = describe_group(group, p);
        match index.checked_sub(1) {
            None => sentences.push(sentence),
            Some(i) => {
                let connector = connectors[i.min(connectors.len() - 1)];
                sentences.push(format!("{connector}, {}", lowercase_first(&sentence)));
            }
        }
    }

    for step in steps {
        let Some(chord) = step.processed_chord.as_deref() else {
            continue;
        };
        let chord = p.chord(chord);
        match (step.kind, step.world) {
            (StepKind::PivotEntry, Some(World::Secondary { parent, target })) => {
                let parent = p.tonality(parent);
                let target = p.tonality(target);
                let state = step.evaluated_functional_state.map(|s| lower(s, p));
                let mut args = vec![
                    ("chord", chord.as_str()),
                    ("parent", parent.as_str()),
                    ("target", target.as_str()),
                ];
                let message = match &state {
                    Some(state) => {
                        args.push(("state", state.as_str()));
                        Message::PivotIntoAs
                    }
                    None => Message::PivotInto,
                };
                sentences.push(p.message(message, &args));
            }
            (StepKind::PivotExit, Some(world)) => {
                sentences.push(p.message(
                    Message::ReturnTo,
                    &[
                        ("chord", chord.as_str()),
                        ("tonality", p.tonality(world.tonality()).as_str()),
                    ],
                ));
            }
            _ => {}
        }
    }
    sentences.join(" ")
}

/// Consecutive transition and pivot-entry readings, grouped by world.
fn groups(steps: &[AnalysisStep]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for step in steps {
        if !matches!(step.kind, StepKind::Transition | StepKind::PivotEntry) {
            continue;
        }
        let (Some(chord), Some(state), Some(world)) = (
            step.processed_chord.as_deref(),
            step.evaluated_functional_state,
            step.world,
        ) else {
            continue;
        };
        let reading = Reading { chord, state };
        match groups.last_mut() {
            Some(group) if group.world.tonality() == world.tonality() => group.readings.push(reading),
            _ => groups.push(Group {
                world,
                readings: vec![reading],
            }),
        }
    }
    groups
}

fn describe_group(group: &Group<'_>, p: &Presentation) -> String {
    let tonality = p.tonality(group.world.tonality());
    if let [only] = group.readings.as_slice() {
        return p.message(
            Message::GroupSingle,
            &[
                ("tonality", tonality.as_str()),
                ("chord", p.chord(only.chord).as_str()),
                ("state", lower(only.state, p).as_str()),
            ],
        );
    }
    let sequence = group
        .readings
        .iter()
        .map(|r| format!("{} ({})", p.chord(r.chord), lower(r.state, p)))
        .collect::<Vec<_>>()
        .join(" → ");
    let shape = match cadence(&group.readings) {
        Some(name) => {
            let cadence = p.message(name, &[]);
            p.message(Message::FormsCadence, &[("cadence", cadence.as_str())])
        }
        None => p.message(Message::MovesThroughFunctions, &[]),
    };
    p.message(
        Message::GroupSequence,
        &[
            ("tonality", tonality.as_str()),
            ("sequence", sequence.as_str()),
            ("shape", shape.as_str()),
        ],
    )
}

/// The strongest cadence inside a group, if any.
fn cadence(readings: &[Reading<'_>]) -> Option<Message> {
    let classes: Vec<Option<HarmonicFunction>> =
        readings.iter().map(|r| r.state.harmonic_function()).collect();
    let has = |from: HarmonicFunction| {
        classes
            .windows(2)
            .any(|pair| pair[0] == Some(from) && pair[1] == Some(HarmonicFunction::Tonic))
    };
    if has(HarmonicFunction::Dominant) {
        Some(Message::AuthenticCadence)
    } else if has(HarmonicFunction::Subdominant) {
        Some(Message::PlagalCadence)
    } else {
        None
    }
}

fn conclusion(result: &AnalysisResult, p: &Presentation) -> String {
    let steps = &result.explanation_details;
    if let (true, Some(tonality)) = (result.is_tonal_progression, result.identified_tonality) {
        let closing = steps.iter().rev().find(|s| s.kind == StepKind::Closure);
        let message = match closing.and_then(|s| s.evaluated_functional_state) {
            Some(FunctionalState::Dominant) => Message::ClosureHalfCadence,
            _ => Message::ClosureTonic,
        };
        return p.message(message, &[("tonality", p.tonality(tonality).as_str())]);
    }

    let none_accepts = p.message(Message::NoneAccepts, &[]);
    let reason = steps
        .iter()
        .rev()
        .find(|s| matches!(s.kind, StepKind::Rejection | StepKind::ClosureFailure));
    match reason {
        Some(step) => format!("{none_accepts} {}", attempt_label(step, p)),
        None => none_accepts,
    }
}

fn attempt_label(step: &AnalysisStep, p: &Presentation) -> String {
    let reason = rejection_reason(step, p);
    match step.tonality_used_in_step {
        Some(tonality) => p.message(
            Message::AttemptStopped,
            &[("tonality", p.tonality(tonality).as_str()), ("reason", reason.as_str())],
        ),
        None => p.message(Message::AttemptStoppedUnnamed, &[("reason", reason.as_str())]),
    }
}

/// Observations are recorded in English, so English output quotes them and
/// other locales rebuild the reason from the step's fields.
fn rejection_reason(step: &AnalysisStep, p: &Presentation) -> String {
    let (Locale::PtBr, Some(state), Some(tonality)) = (
        p.locale,
        step.evaluated_functional_state,
        step.tonality_used_in_step,
    ) else {
        return p.text(&step.observation);
    };
    let state = p.function(state);
    let tonality = p.tonality(tonality);
    match step.processed_chord.as_deref() {
        Some(chord) if step.kind == StepKind::Rejection => p.message(
            Message::RejectionReason,
            &[
                ("chord", p.chord(chord).as_str()),
                ("state", state.as_str()),
                ("tonality", tonality.as_str()),
            ],
        ),
        _ => p.message(
            Message::ClosureFailureReason,
            &[("state", state.as_str()), ("tonality", tonality.as_str())],
        ),
    }
}

fn lower(state: FunctionalState, p: &Presentation) -> String {
    p.function(state).to_lowercase()
}

fn lowercase_first(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// End-to-end scenarios for the analysis pipeline.
//
// Each test drives the public `Analyzer` API (through ScenarioAnalyzer) on
// real chord symbols and checks the verdict plus the shape of the
// derivation: start step, pivots and returns, closure, failure summaries.
// Cross-cutting properties (determinism, candidate order, closure,
// parallel/sequential agreement) are checked over small batches.

use tonalogy_core::chord::parse;
use tonalogy_core::explanation::rules;
use tonalogy_core::narrative::{narrate, narrate_with};
use tonalogy_core::report::ProgressionReport;
use tonalogy_core::world::World;
use tonalogy_core::{
    AnalysisError, AnalyzerConfig, FunctionalState, Locale, Presentation, StepKind, Tonality,
};
use tonalogy_tests::ScenarioAnalyzer;

/// Progressions accepted in a known key with the default configuration.
const ACCEPTED: [(&[&str], &str); 6] = [
    (&["C", "F", "G", "C"], "C Major"),
    (&["Em", "A", "Dm", "G", "C"], "C Major"),
    (&["C", "Am", "Dm", "G", "C"], "C Major"),
    (&["C", "D7", "G", "C"], "C Major"),
    (&["C", "F", "G"], "C Major"),
    (&["Am", "Dm", "E", "Am"], "A Minor"),
];

/// Progressions with no accepted key: a final augmented or diminished
/// chord is never a tonic and never dominant-shaped.
const REJECTED: [&[&str]; 2] = [&["C", "Caug"], &["C", "G", "Am", "F", "Bdim"]];

// ---------------------------------------------------------------------------
// Named scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_secondary_dominant_of_ii() {
    let trace = ScenarioAnalyzer::new().run(&["Em", "A", "Dm", "G", "C"], &[]);
    trace.assert_tonal_in(Tonality::major(0));

    let pivot = trace.index_of_rule(rules::TONICIZATION_PIVOT).unwrap();
    let step = &trace.steps()[pivot];
    assert_eq!(step.processed_chord.as_deref(), Some("A"));
    assert_eq!(step.tonality_used_in_step, Some(Tonality::minor(2)));
    assert_eq!(step.evaluated_functional_state, Some(FunctionalState::Dominant));

    let ret = trace.index_of_rule(rules::RETURN_TO_PRIMARY).unwrap();
    assert!(ret > pivot);
    let g = trace.steps()[ret].position.unwrap();
    assert!(g <= 3, "return after G at position {g}");
}

#[test]
fn test_unparseable_chord_fails_before_any_step() {
    let result = ScenarioAnalyzer::new().analyzer().analyze(&["Xz9"], &[]);
    match result {
        Err(AnalysisError::InvalidChordSymbol { symbol, .. }) => assert_eq!(symbol, "Xz9"),
        other => panic!("expected InvalidChordSymbol, got {other:?}"),
    }
}

#[test]
fn test_non_diatonic_sequence_in_c_major() {
    let trace = ScenarioAnalyzer::new().run(&["F#", "B", "E"], &["C Major"]);
    trace.assert_not_tonal();
    assert_eq!(trace.first().tonality_used_in_step, Some(Tonality::major(0)));
    let rejected = trace.steps_for_chord(StepKind::Rejection, "F#");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].formal_rule_applied, rules::TRANSITION_REJECTED);
}

#[test]
fn test_same_chords_tonal_elsewhere() {
    // In E Major, F# is V/V: it pivots into B Major and returns on E.
    let trace = ScenarioAnalyzer::new().run(&["F#", "B", "E"], &["C Major", "E Major"]);
    trace.assert_tonal_in(Tonality::major(4));
    assert_eq!(trace.count_kind(StepKind::PivotEntry), 1);
}

#[test]
fn test_nested_tonicization_needs_deeper_stack() {
    let chords = ["C", "E7", "A7", "Dm", "G", "C"];
    ScenarioAnalyzer::new().run(&chords, &["C Major"]).assert_not_tonal();

    let config = AnalyzerConfig::from_json(r#"{ "max_world_depth": 3 }"#).unwrap();
    let trace = ScenarioAnalyzer::with_config(config).run(&chords, &["C Major"]);
    trace.assert_tonal_in(Tonality::major(0));
    assert_eq!(trace.count_kind(StepKind::PivotEntry), 2);
    assert_eq!(trace.count_kind(StepKind::PivotExit), 2);
    let a7 = trace.steps_for_chord(StepKind::PivotEntry, "A7");
    assert_eq!(
        a7[0].world,
        Some(World::Secondary {
            parent: Tonality::minor(9),
            target: Tonality::minor(2),
        })
    );
}

#[test]
fn test_half_cadence_can_be_disabled() {
    let chords = ["C", "F", "G"];
    ScenarioAnalyzer::new()
        .run(&chords, &["C Major"])
        .assert_tonal_in(Tonality::major(0));

    let config = AnalyzerConfig::from_json(r#"{ "dominant_closure": false }"#).unwrap();
    ScenarioAnalyzer::with_config(config)
        .run(&chords, &["C Major"])
        .assert_not_tonal();
}

#[test]
fn test_deepest_failure_policy_from_config() {
    let chords = ["F#", "B", "E"];
    let keys = ["B Minor", "C Major"];

    let last = ScenarioAnalyzer::new().run(&chords, &keys);
    assert_eq!(last.first().tonality_used_in_step, Some(Tonality::major(0)));

    let config = AnalyzerConfig::from_json(r#"{ "failure_trace": "deepest_candidate" }"#).unwrap();
    let deepest = ScenarioAnalyzer::with_config(config).run(&chords, &keys);
    deepest.assert_not_tonal();
    assert_eq!(deepest.first().tonality_used_in_step, Some(Tonality::minor(11)));
    assert!(deepest.steps().len() > last.steps().len());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_parse_is_deterministic() {
    for symbol in ["C", "F#m7", "Bb7", "Ebmaj7", "Bm7b5", "G#dim7", "D♭", "Aaug"] {
        assert_eq!(parse(symbol).unwrap(), parse(symbol).unwrap());
    }
}

#[test]
fn test_analyze_is_deterministic() {
    let scenario = ScenarioAnalyzer::new();
    for (chords, _) in ACCEPTED {
        let a = scenario.run(chords, &[]);
        let b = scenario.run(chords, &[]);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.result).unwrap(),
            serde_json::to_string(&b.result).unwrap()
        );
    }
}

#[test]
fn test_default_candidates_in_canonical_order() {
    let canonical = Tonality::canonical_set();
    assert_eq!(canonical.len(), 24);
    assert_eq!(canonical[0], Tonality::major(0));
    assert_eq!(canonical[1], Tonality::minor(0));
    assert_eq!(canonical[23], Tonality::minor(11));

    // "C F C" closes in both C and F; C comes first.
    let trace = ScenarioAnalyzer::new().run(&["C", "F", "C"], &[]);
    trace.assert_tonal_in(Tonality::major(0));

    // With no acceptance, the last-candidate trace is B Minor's.
    let trace = ScenarioAnalyzer::new().run(REJECTED[0], &[]);
    trace.assert_not_tonal();
    assert_eq!(trace.first().tonality_used_in_step, Some(Tonality::minor(11)));
    assert!(trace.last().observation.contains("24"));
}

#[test]
fn test_accepted_derivations_close() {
    let scenario = ScenarioAnalyzer::new();
    for (chords, key) in ACCEPTED {
        let trace = scenario.run(chords, &[key]);
        let tonality = Tonality::parse(key).unwrap();
        trace.assert_tonal_in(tonality);

        let closing = trace.last();
        assert_eq!(closing.kind, StepKind::Closure);
        assert_eq!(closing.world, Some(World::Primary(tonality)));
        assert!(matches!(
            closing.evaluated_functional_state,
            Some(FunctionalState::Tonic | FunctionalState::Dominant)
        ));
        assert_eq!(
            trace.count_kind(StepKind::PivotEntry),
            trace.count_kind(StepKind::PivotExit),
            "unbalanced worlds for {chords:?}"
        );
    }
}

#[test]
fn test_accepted_trace_length() {
    let scenario = ScenarioAnalyzer::new();
    for (chords, key) in ACCEPTED {
        let trace = scenario.run(chords, &[key]);
        assert!(trace.steps().len() >= chords.len());
        // Every chord is read by a transition or a pivot entry.
        for (i, chord) in chords.iter().enumerate() {
            assert!(
                trace.steps().iter().any(|s| s.position == Some(i)
                    && s.processed_chord.as_deref() == Some(*chord)
                    && matches!(s.kind, StepKind::Transition | StepKind::PivotEntry)),
                "chord {chord} at {i} not derived"
            );
        }
    }
}

#[test]
fn test_rejections_are_values_with_traces() {
    let scenario = ScenarioAnalyzer::new();
    for chords in REJECTED {
        let trace = scenario.run(chords, &[]);
        trace.assert_not_tonal();
        assert!(
            trace
                .steps()
                .iter()
                .any(|s| matches!(s.kind, StepKind::Rejection | StepKind::ClosureFailure))
        );
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let scenario = ScenarioAnalyzer::new();
    let batch = ACCEPTED
        .iter()
        .map(|(chords, _)| *chords)
        .chain(REJECTED.iter().copied());
    for chords in batch {
        assert_eq!(scenario.run(chords, &[]), scenario.run_parallel(chords, &[]));
    }
}

#[test]
fn test_long_progressions_complete() {
    let scenario = ScenarioAnalyzer::new();
    let chords = vec!["C"; 5000];
    let trace = scenario.run(&chords, &["C Major", "G Major"]);
    trace.assert_tonal_in(Tonality::major(0));
    assert_eq!(trace.steps().len(), chords.len() + 2);

    // Rayon worker threads have smaller stacks than the main test thread.
    assert_eq!(scenario.run_parallel(&chords, &["C Major", "G Major"]), trace);

    let mut rejected = ["Em", "A", "Dm", "G", "C"].repeat(800);
    rejected.push("Bdim");
    let trace = scenario.run(&rejected, &["C Major"]);
    trace.assert_not_tonal();
    assert!(trace.steps_for_chord(StepKind::PivotEntry, "A").len() >= 800);
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

#[test]
fn test_narrative_mentions_tonicization() {
    let trace = ScenarioAnalyzer::new().run(&["Em", "A", "Dm", "G", "C"], &[]);
    let text = narrate(&trace.result);
    assert!(text.contains("C Major"));
    assert!(text.contains("A pivots from C Major into D Minor"));
    assert!(text.contains("G returns the harmony to C Major."));
}

#[test]
fn test_report_json_carries_display_names() {
    let trace = ScenarioAnalyzer::new().run(&["Em", "A", "Dm", "G", "C"], &[]);
    let json = ProgressionReport::from(&trace.result).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["is_tonal_progression"], true);
    assert_eq!(value["identified_tonality"], "C Major");
    let steps = value["explanation_details"].as_array().unwrap();
    assert!(steps.iter().any(|s| s["kind"] == "pivot_entry"
        && s["tonality_used_in_step"] == "D Minor"
        && s["parent_tonality"] == "C Major"));
    assert_eq!(
        steps.last().unwrap()["formal_rule_applied"],
        rules::CLOSURE_CONFIRMED
    );
}

#[test]
fn test_portuguese_presentation() {
    let trace = ScenarioAnalyzer::new().run(&["Em", "A", "Dm", "G", "C"], &[]);
    let p = Presentation::new(Locale::PtBr);

    let report = ProgressionReport::localized(&trace.result, &p);
    assert_eq!(report.identified_tonality.as_deref(), Some("Dó Maior"));
    assert_eq!(
        report.explanation_details.last().unwrap().formal_rule_applied,
        "Fim da Análise – Fechamento Tonal Confirmado"
    );

    let text = narrate_with(&trace.result, &p);
    assert!(text.contains("A serve de pivô de Dó Maior para Ré Menor"));
    assert!(!text.contains("C Major"));
}

#[test]
fn test_unicode_presentation_converts_flats_everywhere() {
    let trace = ScenarioAnalyzer::new().run(&["Bb", "Eb", "F7", "Bb"], &["A# Major"]);
    trace.assert_tonal_in(Tonality::major(10));
    let p = Presentation::default().with_unicode(true);

    let json = ProgressionReport::localized(&trace.result, &p)
        .to_json_pretty()
        .unwrap();
    let text = narrate_with(&trace.result, &p);
    for rendered in [&json, &text] {
        assert!(!rendered.contains("Bb") && !rendered.contains("Eb"), "{rendered}");
        assert!(!rendered.contains('#'), "{rendered}");
        assert!(rendered.contains("B♭") && rendered.contains("E♭"));
    }
    assert!(text.contains("A♯ Major"));
}

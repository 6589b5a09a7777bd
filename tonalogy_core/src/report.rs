// Flat, string-typed view of an analysis result for presentation layers.
//
// `AnalysisResult` carries typed values (tonalities, functional states,
// worlds). A JSON consumer or diagram renderer wants display strings
// instead, plus enough structure to colour pivot entries and exits by
// world. `ProgressionReport` is that shape; it is built from a result and
// serialized with serde_json. Names follow a `Presentation` (locale and
// accidental style); `From<&AnalysisResult>` gives English with ASCII
// accidentals.

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisResult;
use crate::error::Result;
use crate::explanation::{AnalysisStep, StepKind};
use crate::locale::{Locale, Presentation};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionReport {
    pub is_tonal_progression: bool,
    pub identified_tonality: Option<String>,
    pub explanation_details: Vec<StepReport>,
    /// Locale of the names in this report.
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub formal_rule_applied: String,
    pub observation: String,
    pub processed_chord: Option<String>,
    pub tonality_used_in_step: Option<String>,
    pub evaluated_functional_state: Option<String>,
    pub kind: StepKind,
    /// Tonality of the world on top of the stack after the step.
    pub active_world: Option<String>,
    /// Parent tonality when the active world is secondary.
    pub parent_tonality: Option<String>,
    pub position: Option<usize>,
}

impl StepReport {
    pub fn localized(step: &AnalysisStep, p: &Presentation) -> Self {
        StepReport {
            formal_rule_applied: p.rule(&step.formal_rule_applied).to_string(),
            observation: p.text(&step.observation),
            processed_chord: step.processed_chord.as_deref().map(|c| p.chord(c)),
            tonality_used_in_step: step.tonality_used_in_step.map(|t| p.tonality(t)),
            evaluated_functional_state: step.evaluated_functional_state.map(|s| p.function(s)),
            kind: step.kind,
            active_world: step.world.map(|w| p.tonality(w.tonality())),
            parent_tonality: step.world.as_ref().and_then(World::parent).map(|t| p.tonality(t)),
            position: step.position,
        }
    }
}

impl From<&AnalysisStep> for StepReport {
    fn from(step: &AnalysisStep) -> Self {
        StepReport::localized(step, &Presentation::default())
    }
}

impl From<&AnalysisResult> for ProgressionReport {
    fn from(result: &AnalysisResult) -> Self {
        ProgressionReport::localized(result, &Presentation::default())
    }
}

impl ProgressionReport {
    /// Build a report with rule, tonality and function names in the
    /// presentation's locale. Observations stay in English; with Unicode
    /// enabled their chord symbols are converted too.
    pub fn localized(result: &AnalysisResult, p: &Presentation) -> Self {
        ProgressionReport {
            is_tonal_progression: result.is_tonal_progression,
            identified_tonality: result.identified_tonality.map(|t| p.tonality(t)),
            explanation_details: result
                .explanation_details
                .iter()
                .map(|step| StepReport::localized(step, p))
                .collect(),
            locale: p.locale,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

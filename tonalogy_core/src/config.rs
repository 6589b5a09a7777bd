// Analyzer configuration.
//
// `AnalyzerConfig` holds every tunable of the analysis: the world-depth
// bound, which trace to surface when no candidate succeeds, whether a final
// dominant counts as closure, the default candidate tonalities, and extra
// chord-quality aliases. It is plain serde data, loadable from JSON with
// every field optional (`#[serde(default)]`), so a config file only names
// what it changes.
//
// The canonical 24-tonality enumeration is not a global: when
// `default_candidates` is `None` the analyzer asks
// `Tonality::canonical_set()`, otherwise it uses the configured list.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chord::{ChordQuality, QualityVocabulary};
use crate::error::{AnalysisError, Result};
use crate::tonality::Tonality;

/// Which trace a negative result carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTracePolicy {
    /// Trace of the last candidate attempted.
    #[default]
    LastCandidate,
    /// Trace of the candidate whose search got furthest into the
    /// progression (earliest candidate on ties).
    DeepestCandidate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum world-stack depth including the primary world. 2 allows one
    /// tonicization at a time; higher values allow nesting.
    pub max_world_depth: usize,
    pub failure_trace: FailureTracePolicy,
    /// Accept a final dominant-shaped V (half cadence) as implying tonic
    /// closure.
    pub dominant_closure: bool,
    /// Candidates tried when a request names none. `None` means all 24
    /// tonalities in canonical order.
    pub default_candidates: Option<Vec<String>>,
    /// Additional quality tokens for the chord parser.
    pub extra_quality_aliases: BTreeMap<String, ChordQuality>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            max_world_depth: 2,
            failure_trace: FailureTracePolicy::LastCandidate,
            dominant_closure: true,
            default_candidates: None,
            extra_quality_aliases: BTreeMap::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_world_depth == 0 {
            return Err(AnalysisError::Config(
                "max_world_depth must be at least 1".to_string(),
            ));
        }
        if matches!(&self.default_candidates, Some(names) if names.is_empty()) {
            return Err(AnalysisError::Config(
                "default_candidates must not be empty; omit it to use all 24 tonalities"
                    .to_string(),
            ));
        }
        if self.extra_quality_aliases.contains_key("") {
            return Err(AnalysisError::Config(
                "quality aliases must be non-empty tokens".to_string(),
            ));
        }
        self.candidate_tonalities()?;
        Ok(())
    }

    /// Resolve the default candidate list.
    pub fn candidate_tonalities(&self) -> Result<Vec<Tonality>> {
        match &self.default_candidates {
            None => Ok(Tonality::canonical_set()),
            Some(names) => names.iter().map(|name| Tonality::parse(name)).collect(),
        }
    }

    /// The standard vocabulary extended with the configured aliases.
    pub fn vocabulary(&self) -> QualityVocabulary {
        let mut vocabulary = QualityVocabulary::standard();
        for (token, &quality) in &self.extra_quality_aliases {
            vocabulary.insert(token.clone(), quality);
        }
        vocabulary
    }
}

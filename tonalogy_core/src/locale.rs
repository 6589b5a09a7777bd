// Localized names and sentence templates for presentation layers.
//
// The search records its derivation in English: rule names are the
// constants in `explanation::rules` and observations are English prose.
// Renderers (`narrative.rs`, `report.rs`, the CLI) translate on the way
// out through a `Presentation`, which pairs a `Locale` with the choice of
// ASCII or Unicode accidentals.
//
// Each locale is a static `Catalog`: note names, mode words, functional
// state names, rule names, and `{placeholder}` sentence templates keyed by
// `Message`. A rule name the catalog does not know is passed through
// unchanged, so a new rule constant degrades to English rather than
// failing.
//
// Supported locales are English (`en`, the default) and Brazilian
// Portuguese (`pt_br`). `Locale::parse` accepts either separator and any
// case; `Locale::from_accept_language` picks the best supported locale
// from an HTTP-style preference list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::explanation::rules;
use crate::function::FunctionalState;
use crate::notation::{SHARP_SYMBOL, to_unicode_symbols};
use crate::tonality::{Mode, Tonality};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::PtBr];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::PtBr => "pt_br",
        }
    }

    /// Parse a locale code: "en", "en-US", "pt_BR", "pt-br", "pt".
    pub fn parse(code: &str) -> Option<Locale> {
        let code = code.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(locale) = Locale::ALL.into_iter().find(|l| l.code() == code) {
            return Some(locale);
        }
        let language = code.split('_').next()?;
        Locale::ALL
            .into_iter()
            .find(|l| l.code().split('_').next() == Some(language))
    }

    /// Best supported locale for an Accept-Language style list such as
    /// "pt-BR,pt;q=0.9,en;q=0.8". Falls back to English.
    pub fn from_accept_language(header: Option<&str>) -> Locale {
        let Some(header) = header else {
            return Locale::default();
        };
        let mut ranges: Vec<(&str, f32)> = header
            .split(',')
            .filter_map(|range| {
                let mut parts = range.split(';');
                let tag = parts.next()?.trim();
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (!tag.is_empty()).then_some((tag, quality))
            })
            .collect();
        // Stable sort keeps header order among equal weights.
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranges
            .into_iter()
            .find_map(|(tag, _)| Locale::parse(tag))
            .unwrap_or_default()
    }

    fn catalog(self) -> &'static Catalog {
        match self {
            Locale::En => &EN,
            Locale::PtBr => &PT_BR,
        }
    }

    pub fn note_name(self, pc: u8) -> &'static str {
        self.catalog().notes[(pc % 12) as usize]
    }

    pub fn mode_name(self, mode: Mode) -> &'static str {
        let catalog = self.catalog();
        match mode {
            Mode::Major => catalog.major,
            Mode::Minor => catalog.minor,
        }
    }

    /// Localized tonality name, e.g. "Dó Maior".
    pub fn tonality_name(self, tonality: Tonality) -> String {
        format!(
            "{} {}",
            self.note_name(tonality.tonic),
            self.mode_name(tonality.mode)
        )
    }

    pub fn function_name(self, state: FunctionalState) -> String {
        let names = &self.catalog().functions;
        match state {
            FunctionalState::Tonic => names[0].to_string(),
            FunctionalState::Supertonic => names[1].to_string(),
            FunctionalState::Mediant => names[2].to_string(),
            FunctionalState::Subdominant => names[3].to_string(),
            FunctionalState::Dominant => names[4].to_string(),
            FunctionalState::Submediant => names[5].to_string(),
            FunctionalState::LeadingTone => names[6].to_string(),
            FunctionalState::SecondaryDominantOf(degree) => {
                fill(self.catalog().secondary_dominant, &[("degree", degree.roman())])
            }
            FunctionalState::NonDiatonic => names[7].to_string(),
        }
    }

    /// Localized rule name; unknown rules are returned as given.
    pub fn rule_name<'a>(self, rule: &'a str) -> &'a str {
        self.catalog()
            .rules
            .iter()
            .find(|(english, _)| *english == rule)
            .map_or(rule, |&(_, localized)| localized)
    }

    /// Fill a message template with named arguments.
    pub fn message(self, message: Message, args: &[(&str, &str)]) -> String {
        fill(self.catalog().template(message), args)
    }

    /// Sentence connectors used between narrative groups, in order.
    pub fn connectors(self) -> &'static [&'static str; 3] {
        &self.catalog().connectors
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = AnalysisError;

    fn from_str(code: &str) -> Result<Self> {
        Locale::parse(code).ok_or_else(|| AnalysisError::UnsupportedLocale(code.to_string()))
    }
}

/// Sentence templates. Placeholders are written `{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    NoSteps,
    IntroTonal,
    IntroRejected,
    IntroRejectedEmpty,
    GroupSingle,
    GroupSequence,
    FormsCadence,
    MovesThroughFunctions,
    AuthenticCadence,
    PlagalCadence,
    PivotInto,
    PivotIntoAs,
    ReturnTo,
    ClosureTonic,
    ClosureHalfCadence,
    NoneAccepts,
    AttemptStopped,
    AttemptStoppedUnnamed,
    RejectionReason,
    ClosureFailureReason,
    VerdictTonal,
    VerdictNotTonal,
    StateIn,
    HarmonicField,
}

struct Catalog {
    notes: [&'static str; 12],
    major: &'static str,
    minor: &'static str,
    /// Tonic, Supertonic, Mediant, Subdominant, Dominant, Submediant,
    /// LeadingTone, NonDiatonic.
    functions: [&'static str; 8],
    secondary_dominant: &'static str,
    rules: [(&'static str, &'static str); 8],
    connectors: [&'static str; 3],
    messages: &'static [(Message, &'static str)],
}

impl Catalog {
    fn template(&self, message: Message) -> &'static str {
        self.messages
            .iter()
            .find(|(m, _)| *m == message)
            .map_or("", |&(_, text)| text)
    }
}

static EN: Catalog = Catalog {
    notes: ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"],
    major: "Major",
    minor: "Minor",
    functions: [
        "Tonic",
        "Supertonic",
        "Mediant",
        "Subdominant",
        "Dominant",
        "Submediant",
        "Leading Tone",
        "Non-Diatonic",
    ],
    secondary_dominant: "Secondary Dominant of {degree}",
    rules: [
        (rules::ANALYSIS_START, rules::ANALYSIS_START),
        (rules::FUNCTIONAL_TRANSITION, rules::FUNCTIONAL_TRANSITION),
        (rules::TONICIZATION_PIVOT, rules::TONICIZATION_PIVOT),
        (rules::RETURN_TO_PRIMARY, rules::RETURN_TO_PRIMARY),
        (rules::TRANSITION_REJECTED, rules::TRANSITION_REJECTED),
        (rules::CLOSURE_CONFIRMED, rules::CLOSURE_CONFIRMED),
        (rules::CLOSURE_REJECTED, rules::CLOSURE_REJECTED),
        (rules::NO_CANDIDATE_ACCEPTED, rules::NO_CANDIDATE_ACCEPTED),
    ],
    connectors: ["Then", "Afterwards", "Subsequently"],
    messages: &[
        (Message::NoSteps, "No analysis steps are available."),
        (Message::IntroTonal, "The progression {sequence} is a tonal progression in {tonality}."),
        (
            Message::IntroRejected,
            "The progression {sequence} could not be explained as a tonal progression in any tested tonality.",
        ),
        (
            Message::IntroRejectedEmpty,
            "The progression could not be explained as a tonal progression.",
        ),
        (Message::GroupSingle, "In {tonality}, {chord} acts as the {state}."),
        (Message::GroupSequence, "In {tonality}, {sequence} {shape}."),
        (Message::FormsCadence, "forms {cadence}"),
        (Message::MovesThroughFunctions, "moves through its functions"),
        (Message::AuthenticCadence, "an authentic cadence"),
        (Message::PlagalCadence, "a plagal cadence"),
        (Message::PivotInto, "{chord} pivots from {parent} into {target}."),
        (
            Message::PivotIntoAs,
            "{chord} pivots from {parent} into {target}, where it acts as the {state}.",
        ),
        (Message::ReturnTo, "{chord} returns the harmony to {tonality}."),
        (
            Message::ClosureTonic,
            "It resolves to the tonic, confirming tonal closure in {tonality}.",
        ),
        (
            Message::ClosureHalfCadence,
            "It ends on a half cadence whose dominant implies the tonic, confirming tonal closure in {tonality}.",
        ),
        (Message::NoneAccepts, "No tested tonality accepts it."),
        (Message::AttemptStopped, "The attempt in {tonality} stopped because: {reason}"),
        (Message::AttemptStoppedUnnamed, "The attempt stopped because: {reason}"),
        (
            Message::RejectionReason,
            "'{chord}' is {state} in {tonality} and cannot be derived at that point.",
        ),
        (
            Message::ClosureFailureReason,
            "the progression ends on {state} in {tonality} without tonal closure.",
        ),
        (Message::VerdictTonal, "Tonal progression in {tonality}"),
        (Message::VerdictNotTonal, "Not a tonal progression"),
        (Message::StateIn, "{state} in {tonality}"),
        (Message::HarmonicField, "{tonality} harmonic field"),
    ],
};

static PT_BR: Catalog = Catalog {
    notes: ["Dó", "Dó#", "Ré", "Ré#", "Mi", "Fá", "Fá#", "Sol", "Sol#", "Lá", "Lá#", "Si"],
    major: "Maior",
    minor: "Menor",
    functions: [
        "Tônica",
        "Supertônica",
        "Mediante",
        "Subdominante",
        "Dominante",
        "Submediante",
        "Sensível",
        "Não Diatônico",
    ],
    secondary_dominant: "Dominante Secundária do {degree}",
    rules: [
        (rules::ANALYSIS_START, "Início da Análise"),
        (rules::FUNCTIONAL_TRANSITION, "Transição Funcional Confirmada"),
        (rules::TONICIZATION_PIVOT, "Pivô de Tonicização Identificado"),
        (rules::RETURN_TO_PRIMARY, "Retorno à Tonalidade Primária"),
        (rules::TRANSITION_REJECTED, "Transição Funcional Rejeitada"),
        (rules::CLOSURE_CONFIRMED, "Fim da Análise – Fechamento Tonal Confirmado"),
        (rules::CLOSURE_REJECTED, "Fechamento Tonal Rejeitado"),
        (rules::NO_CANDIDATE_ACCEPTED, "Nenhuma Candidata Aceita"),
    ],
    connectors: ["Em seguida", "Depois", "Posteriormente"],
    messages: &[
        (Message::NoSteps, "Nenhum passo de análise está disponível."),
        (Message::IntroTonal, "A progressão {sequence} é uma progressão tonal em {tonality}."),
        (
            Message::IntroRejected,
            "A progressão {sequence} não pôde ser explicada como progressão tonal em nenhuma tonalidade testada.",
        ),
        (
            Message::IntroRejectedEmpty,
            "A progressão não pôde ser explicada como progressão tonal.",
        ),
        (Message::GroupSingle, "Em {tonality}, {chord} atua como {state}."),
        (Message::GroupSequence, "Em {tonality}, {sequence} {shape}."),
        (Message::FormsCadence, "forma {cadence}"),
        (Message::MovesThroughFunctions, "percorre suas funções"),
        (Message::AuthenticCadence, "uma cadência autêntica"),
        (Message::PlagalCadence, "uma cadência plagal"),
        (Message::PivotInto, "{chord} serve de pivô de {parent} para {target}."),
        (
            Message::PivotIntoAs,
            "{chord} serve de pivô de {parent} para {target}, onde atua como {state}.",
        ),
        (Message::ReturnTo, "{chord} devolve a harmonia a {tonality}."),
        (
            Message::ClosureTonic,
            "Ela resolve na tônica, confirmando o fechamento tonal em {tonality}.",
        ),
        (
            Message::ClosureHalfCadence,
            "Ela termina em uma semicadência cuja dominante implica a tônica, confirmando o fechamento tonal em {tonality}.",
        ),
        (Message::NoneAccepts, "Nenhuma tonalidade testada a aceita."),
        (Message::AttemptStopped, "A tentativa em {tonality} parou porque: {reason}"),
        (Message::AttemptStoppedUnnamed, "A tentativa parou porque: {reason}"),
        (
            Message::RejectionReason,
            "'{chord}' é {state} em {tonality} e não pode ser derivado nesse ponto.",
        ),
        (
            Message::ClosureFailureReason,
            "a progressão termina em {state} em {tonality} sem fechamento tonal.",
        ),
        (Message::VerdictTonal, "Progressão tonal em {tonality}"),
        (Message::VerdictNotTonal, "Não é uma progressão tonal"),
        (Message::StateIn, "{state} em {tonality}"),
        (Message::HarmonicField, "Campo harmônico de {tonality}"),
    ],
};

/// Replace each `{name}` in `template` with its argument. Unknown
/// placeholders are left in place.
pub fn fill(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// How a renderer spells names: which locale, and whether accidentals are
/// printed as ♯/♭.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presentation {
    pub locale: Locale,
    pub unicode: bool,
}

impl Presentation {
    pub fn new(locale: Locale) -> Self {
        Presentation {
            locale,
            unicode: false,
        }
    }

    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }

    /// A chord symbol as written, with Unicode accidentals if enabled.
    pub fn chord(&self, symbol: &str) -> String {
        self.text(symbol)
    }

    pub fn tonality(&self, tonality: Tonality) -> String {
        let name = self.locale.tonality_name(tonality);
        if self.unicode {
            name.replace('#', &SHARP_SYMBOL.to_string())
        } else {
            name
        }
    }

    pub fn function(&self, state: FunctionalState) -> String {
        self.locale.function_name(state)
    }

    pub fn rule<'a>(&self, rule: &'a str) -> &'a str {
        self.locale.rule_name(rule)
    }

    /// Free text (an observation) with symbols converted if enabled.
    pub fn text(&self, text: &str) -> String {
        if self.unicode {
            to_unicode_symbols(text)
        } else {
            text.to_string()
        }
    }

    pub fn message(&self, message: Message, args: &[(&str, &str)]) -> String {
        self.locale.message(message, args)
    }
}

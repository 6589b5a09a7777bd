// Tonalogy CLI entry point.
//
// Thin presentation layer over tonalogy_core: parses arguments, builds an
// `Analyzer` from an optional JSON config, runs the analysis, and prints the
// result as a numbered derivation, a JSON report, or prose.
//
// Usage:
//   tonalogy analyze Em A Dm G C
//   tonalogy analyze F# B E --key "C Major" --format json
//   tonalogy analyze C E7 A7 Dm G C --max-depth 3 --format narrative
//   tonalogy analyze F Bb C7 F --locale pt_br --unicode
//   tonalogy field "D Minor"
//
// Exit codes: 0 tonal, 1 not tonal, 2 invalid input or configuration.
// Logging goes to stderr; `-v` raises the level and RUST_LOG overrides it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use tonalogy_core::locale::Message;
use tonalogy_core::narrative::narrate_with;
use tonalogy_core::report::ProgressionReport;
use tonalogy_core::{
    AnalysisResult, Analyzer, AnalyzerConfig, Locale, Presentation, Result, Tonality,
};

/// Possible-worlds analysis of tonal chord progressions
#[derive(Parser, Debug)]
#[command(name = "tonalogy")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a chord progression
    Analyze {
        /// Chord symbols in order, e.g. Em A Dm G C
        #[arg(required = true)]
        chords: Vec<String>,

        /// Tonality to test, in priority order; repeatable (default: all 24)
        #[arg(short, long = "key", value_name = "TONALITY")]
        keys: Vec<String>,

        /// JSON analyzer configuration
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Override the maximum world-stack depth
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Search candidate tonalities concurrently
        #[arg(long)]
        parallel: bool,

        /// Print accidentals as ♯/♭
        #[arg(long)]
        unicode: bool,

        /// Language of rule, tonality and function names (en, pt_br)
        #[arg(long, default_value = "en")]
        locale: Locale,
    },

    /// Print the diatonic chords of a tonality
    Field {
        /// Tonality name, e.g. "Bb Major"
        tonality: String,

        /// Language of tonality and function names (en, pt_br)
        #[arg(long, default_value = "en")]
        locale: Locale,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Narrative,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Analyze {
            chords,
            keys,
            config,
            max_depth,
            format,
            parallel,
            unicode,
            locale,
        } => {
            let mut config = match config {
                Some(path) => AnalyzerConfig::load(&path)?,
                None => AnalyzerConfig::default(),
            };
            if let Some(depth) = max_depth {
                config.max_world_depth = depth;
            }
            let analyzer = Analyzer::new(config)?;
            debug!(chords = chords.len(), keys = keys.len(), parallel, "analysing");

            let chords: Vec<&str> = chords.iter().map(String::as_str).collect();
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let result = if parallel {
                analyzer.analyze_parallel(&chords, &keys)?
            } else {
                analyzer.analyze(&chords, &keys)?
            };

            let presentation = Presentation::new(locale).with_unicode(unicode);
            println!("{}", render(&result, format, &presentation)?);
            Ok(if result.is_tonal_progression {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Field { tonality, locale } => {
            let tonality = Tonality::parse(&tonality)?;
            print!("{}", render_field(tonality, &Presentation::new(locale)));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render(result: &AnalysisResult, format: OutputFormat, p: &Presentation) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => ProgressionReport::localized(result, p).to_json_pretty()?,
        OutputFormat::Text => render_text(result, p),
        OutputFormat::Narrative => narrate_with(result, p),
    })
}

/// Verdict line followed by the numbered derivation.
fn render_text(result: &AnalysisResult, p: &Presentation) -> String {
    let mut out = match result.identified_tonality {
        Some(tonality) if result.is_tonal_progression => p.message(
            Message::VerdictTonal,
            &[("tonality", p.tonality(tonality).as_str())],
        ),
        _ => p.message(Message::VerdictNotTonal, &[]),
    };
    out.push('\n');
    for (i, step) in result.explanation_details.iter().enumerate() {
        out.push_str(&format!("{:>3}. [{}]", i + 1, p.rule(&step.formal_rule_applied)));
        if let Some(chord) = &step.processed_chord {
            out.push_str(&format!(" {}", p.chord(chord)));
        }
        match (step.tonality_used_in_step, step.evaluated_functional_state) {
            (Some(tonality), Some(state)) => {
                let detail = p.message(
                    Message::StateIn,
                    &[
                        ("state", p.function(state).as_str()),
                        ("tonality", p.tonality(tonality).as_str()),
                    ],
                );
                out.push_str(&format!(" ({detail})"));
            }
            (Some(tonality), None) => out.push_str(&format!(" ({})", p.tonality(tonality))),
            _ => {}
        }
        out.push_str(&format!("\n     {}\n", p.text(&step.observation)));
    }
    out
}

fn render_field(tonality: Tonality, p: &Presentation) -> String {
    let mut out = p.message(
        Message::HarmonicField,
        &[("tonality", p.tonality(tonality).as_str())],
    );
    out.push('\n');
    for entry in tonality.harmonic_field() {
        out.push_str(&format!(
            "  {:<4} {:<6} {}\n",
            entry.degree.roman(),
            p.chord(entry.chord.symbol()),
            p.function(entry.state)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_args() {
        let cli = Cli::try_parse_from([
            "tonalogy", "-vv", "analyze", "Em", "A", "Dm", "--key", "C Major", "-k", "A Minor",
            "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Analyze {
            chords, keys, format, ..
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(chords, ["Em", "A", "Dm"]);
        assert_eq!(keys, ["C Major", "A Minor"]);
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_analyze_requires_chords() {
        assert!(Cli::try_parse_from(["tonalogy", "analyze"]).is_err());
    }

    #[test]
    fn test_parse_locale_arg() {
        let cli = Cli::try_parse_from(["tonalogy", "analyze", "C", "--locale", "pt-BR"]).unwrap();
        let Command::Analyze { locale, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(locale, Locale::PtBr);
        assert!(Cli::try_parse_from(["tonalogy", "analyze", "C", "--locale", "fr"]).is_err());
    }

    #[test]
    fn test_render_text() {
        let result = tonalogy_core::analyze(&["C", "G", "C"], &[]).unwrap();
        let text = render_text(&result, &Presentation::default());
        assert!(text.starts_with("Tonal progression in C Major\n"));
        assert!(text.contains("  1. [Analysis Start] (Tonic in C Major)"));
        assert!(text.contains("[Functional Transition Confirmed] G (Dominant in C Major)"));
    }

    #[test]
    fn test_render_json_unicode() {
        let result = tonalogy_core::analyze(&["F#", "B", "E"], &["C Major"]).unwrap();
        let p = Presentation::default().with_unicode(true);
        let json = render(&result, OutputFormat::Json, &p).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["explanation_details"][1]["processed_chord"], "F♯");
    }

    #[test]
    fn test_render_text_unicode_flats() {
        let result = tonalogy_core::analyze(&["F", "Bb", "C7", "F"], &["F Major"]).unwrap();
        let p = Presentation::default().with_unicode(true);
        let text = render(&result, OutputFormat::Text, &p).unwrap();
        assert!(text.contains("[Functional Transition Confirmed] B♭ (Subdominant in F Major)"));
        assert!(text.contains("'B♭' acts as Subdominant"));
        assert!(!text.contains("Bb"), "{text}");

        let prose = render(&result, OutputFormat::Narrative, &p).unwrap();
        assert!(!prose.contains("Bb"), "{prose}");
    }

    #[test]
    fn test_render_text_portuguese() {
        let result = tonalogy_core::analyze(&["C", "G", "C"], &[]).unwrap();
        let text = render_text(&result, &Presentation::new(Locale::PtBr));
        assert!(text.starts_with("Progressão tonal em Dó Maior\n"));
        assert!(text.contains("  1. [Início da Análise] (Tônica em Dó Maior)"));
        assert!(text.contains("[Transição Funcional Confirmada] G (Dominante em Dó Maior)"));
    }

    #[test]
    fn test_render_field() {
        let field = render_field(Tonality::minor(9), &Presentation::default());
        assert!(field.starts_with("A Minor harmonic field\n"));
        assert!(field.contains("  V    E      Dominant\n"));
        assert!(field.contains("  VII  G#dim  Leading Tone\n"));

        let field = render_field(Tonality::major(10), &Presentation::new(Locale::PtBr));
        assert!(field.starts_with("Campo harmônico de Lá# Maior\n"));
        assert!(field.contains("  IV   D#     Subdominante\n"));
    }
}

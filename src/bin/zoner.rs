//! Command-line interface for zoner
//! Splits a clinical note into labeled zones and prints them.
//!
//! Usage:
//!   zoner `<input>` [`<grammar>`] [--config `<file>`] [--format json|yaml|text]
//!         [--include-generics] [--suggest-generics] [--offsets]
//!
//! Without a grammar argument the grammar configured in `--config` or
//! `ZONER_GRAMMAR__PATH` (or the bundled grammar) is used. Bad arguments
//! print usage and exit without processing.

use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use zoner::{Grammar, LoadOptions, Zoner, ZoningOptions, ZoningResult};
use zoner_config::{Loader, ZonerConfig};

fn cli() -> Command {
    Command::new("zoner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Split clinical notes into labeled sections")
        .arg(
            Arg::new("input")
                .help("Path to the document to zone")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("grammar")
                .help("Path to a YAML or JSON grammar (defaults to the bundled grammar)")
                .index(2),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format")
                .value_parser(["text", "json", "yaml"])
                .default_value("text"),
        )
        .arg(
            Arg::new("include-generics")
                .long("include-generics")
                .help("Promote catch-all headings between known headings")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("suggest-generics")
                .long("suggest-generics")
                .help("Report catch-all headings as grammar suggestions")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offsets")
                .long("offsets")
                .help("Attach line/token coordinates to every zone")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("zoner=warn".parse().expect("static directive parses")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            // usage problems are reported but never signalled through the exit code
            let _ = err.print();
            return;
        }
    };

    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .unwrap_or_default();
    let grammar = matches.get_one::<String>("grammar").map(PathBuf::from);
    let config = matches.get_one::<String>("config").map(PathBuf::from);
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");

    let flags = Flags {
        include_generics: matches.get_flag("include-generics"),
        suggest_generics: matches.get_flag("suggest-generics"),
        offsets: matches.get_flag("offsets"),
    };

    if let Err(err) = run(&input, grammar, config, format, flags) {
        error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    include_generics: bool,
    suggest_generics: bool,
    offsets: bool,
}

fn load_config(
    grammar: Option<PathBuf>,
    config: Option<PathBuf>,
    flags: Flags,
) -> Result<ZonerConfig, Box<dyn Error>> {
    let mut loader = Loader::new();
    if let Some(path) = config {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    if let Some(path) = grammar {
        loader = loader.set_override("grammar.path", path.to_string_lossy().into_owned())?;
    }
    if flags.include_generics {
        loader = loader.set_override("zoning.include_generics", true)?;
    }
    if flags.suggest_generics {
        loader = loader.set_override("zoning.suggest_generics", true)?;
    }
    if flags.offsets {
        loader = loader.set_override("zoning.convert_offsets", true)?;
    }
    Ok(loader.build()?)
}

fn run(
    input: &Path,
    grammar: Option<PathBuf>,
    config: Option<PathBuf>,
    format: &str,
    flags: Flags,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(grammar, config, flags)?;

    let grammar = match config.grammar.grammar_path() {
        Some(path) => Arc::new(Grammar::from_path(&path, &LoadOptions::from(&config.grammar))?),
        None => Grammar::builtin()?,
    };
    debug!(
        sections = grammar.sections.len(),
        subsections = grammar.subsections.len(),
        "grammar ready"
    );

    let text = std::fs::read_to_string(input)
        .map_err(|e| format!("cannot read {}: {e}", input.display()))?;
    let result = Zoner::new(grammar).zone(&text, &ZoningOptions::from(&config))?;

    print!("{}", render(&result, format)?);
    Ok(())
}

fn render(result: &ZoningResult, format: &str) -> Result<String, Box<dyn Error>> {
    let output = match format {
        "json" => serde_json::to_string_pretty(result)? + "\n",
        "yaml" => serde_yaml::to_string(result)?,
        _ => {
            let mut text = result.to_string();
            for suggestion in &result.suggestions {
                text.push('\n');
                text.push_str(&suggestion.snippet);
            }
            text
        }
    };
    Ok(output)
}

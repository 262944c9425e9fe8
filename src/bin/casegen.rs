use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{bail, WrapErr};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use casegen::config::GeneratorConfig;
use casegen::technique::{Generator, Technique};

/// Generate black-box test cases and print the JSON response envelope.
#[derive(Parser, Debug)]
#[command(name = "casegen", version, about)]
struct Cli {
    /// Technique: EP, LVA or OA.
    technique: Technique,

    /// JSON file holding the parameter map.
    #[arg(long, conflicts_with = "json")]
    params: Option<PathBuf>,

    /// Parameter map given inline as JSON text.
    #[arg(long)]
    json: Option<String>,

    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let generator = Generator::with_config(config)?;

    let text = match (&cli.params, &cli.json) {
        (Some(path), None) => fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        _ => bail!("one of --params or --json is required"),
    };
    let parameters: serde_json::Value =
        serde_json::from_str(&text).wrap_err("parameters are not valid JSON")?;

    let report = generator.report(cli.technique, &parameters);
    let output = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{output}");

    if report.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qsol::{Configuration, QueryCompiler, output};
use std::path::PathBuf;
use termcolor::ColorChoice;

#[derive(Parser)]
#[command(name = "qsol")]
#[command(about = "Compile boolean/proximity search queries into query trees")]
struct Cli {
    /// Query text (words are joined with spaces)
    #[arg(required = true, trailing_var_arg = true)]
    query: Vec<String>,

    /// Field searched when the query names none
    #[arg(short, long, default_value = "allFields")]
    field: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the query tree as JSON
    #[arg(long)]
    json: bool,

    /// Also print the rewritten query text
    #[arg(long)]
    rewrite: bool,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Log pipeline decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "qsol=debug" } else { "qsol=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Configuration::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Configuration::default(),
    };

    let compiler = QueryCompiler::new(config).context("invalid configuration")?;
    let query = cli.query.join(" ");
    let choice = ColorChoice::from(cli.color);

    match compiler.compile(&cli.field, &query) {
        Ok(compiled) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(compiled.query())?);
            } else {
                output::print_compiled(&compiled, cli.rewrite, choice)?;
            }
            Ok(())
        }
        Err(err) => {
            output::print_error(&err, &query, choice)?;
            std::process::exit(1);
        }
    }
}

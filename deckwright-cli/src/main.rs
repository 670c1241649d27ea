use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::Path;

use deckwright::load_substitutions;
use deckwright_core::{Document, DocumentProcessor, EngineConfig, ImportOptions, ImportReport};

#[derive(Parser)]
#[command(name = "deckwright")]
#[command(about = "Import slide decks, list their template variables and export filled copies")]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a package into a document snapshot
    Import {
        /// Path to the .pptx file to import
        #[arg(short, long)]
        input: String,

        /// Output file path (if not specified, auto-generated based on input)
        #[arg(short, long)]
        output: Option<String>,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Document)]
        format: OutputFormat,

        /// Log timings of every import step
        #[arg(long)]
        profile: bool,

        /// Skip cache and force a fresh import
        #[arg(long)]
        skip_cache: bool,

        /// Directory for the import cache
        #[arg(long, default_value = "cache")]
        cache_dir: String,
    },

    /// Export a document snapshot to a package, filling in variables
    Export {
        /// Document snapshot written by `import`
        #[arg(short, long)]
        input: String,

        /// Path of the .pptx to write
        #[arg(short, long)]
        output: String,

        /// Substitution map (JSON or YAML)
        #[arg(short, long)]
        substitutions: Option<String>,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// List the variables detected in a package
    Variables {
        /// Path to the .pptx file to inspect
        #[arg(short, long)]
        input: String,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as YAML
    ShowConfig {
        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Full snapshot that `export` can read back
    Document,
    /// Slide titles, categories and variables only
    Outline,
}

impl OutputFormat {
    fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Document => "document",
            OutputFormat::Outline => "outline",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let profiling = matches!(cli.command, Command::Import { profile: true, .. });
    init_tracing(if cli.verbose {
        "debug"
    } else if profiling {
        "info"
    } else {
        "warn"
    });

    if let Err(e) = run(cli.command) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Import {
            input,
            output,
            config,
            format,
            profile,
            skip_cache,
            cache_dir,
        } => {
            let config = load_config(config.as_deref());
            let options = ImportOptions { profile, skip_cache };
            let report = import(&input, &config, Some(&cache_dir), &options)?;

            let output_path = output.unwrap_or_else(|| default_output_path(&input));
            report
                .document
                .save_with_format(&output_path, format.as_str())?;
            println!("💾 {} saved to: {}", format.as_str(), output_path);
            Ok(())
        }

        Command::Export {
            input,
            output,
            substitutions,
            config,
        } => {
            let config = load_config(config.as_deref());
            let document = Document::load_from_json(&input)?;
            let substitutions = match substitutions.as_deref() {
                Some(path) => load_substitutions(path)?,
                None => HashMap::new(),
            };

            let unknown: Vec<&String> = substitutions
                .keys()
                .filter(|name| document.variables.get(name).is_none())
                .collect();
            if !unknown.is_empty() {
                tracing::warn!(?unknown, "substitutions for variables not in the catalog");
            }

            let processor = DocumentProcessor::new_cli(&config, None)?;
            let report = processor.export_to_file(&document, &substitutions, &config, &output)?;

            println!("✅ Exported {} slides to: {}", report.slide_count, output);
            for warning in &report.warnings {
                println!("⚠️  {warning}");
            }
            Ok(())
        }

        Command::Variables {
            input,
            config,
            json,
        } => {
            let config = load_config(config.as_deref());
            let options = ImportOptions {
                profile: false,
                skip_cache: true,
            };
            let report = import(&input, &config, None, &options)?;
            let catalog = &report.document.variables;

            if json {
                println!("{}", serde_json::to_string_pretty(catalog)?);
                return Ok(());
            }

            if catalog.is_empty() {
                println!("No variables detected");
                return Ok(());
            }
            println!(
                "{:<28} {:<12} {:<10} {:>5}  {}",
                "NAME", "TYPE", "SOURCE", "COUNT", "SAMPLE"
            );
            for variable in catalog.iter() {
                println!(
                    "{:<28} {:<12} {:<10} {:>5}  {}",
                    variable.name,
                    format!("{:?}", variable.inferred_type).to_lowercase(),
                    format!("{:?}", variable.confidence).to_lowercase(),
                    variable.occurrence_count,
                    variable.sample_value
                );
            }
            Ok(())
        }

        Command::ShowConfig { config } => {
            let config = load_config(config.as_deref());
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&str>) -> EngineConfig {
    match path {
        Some(p) => tracing::info!(path = p, "loading config"),
        None => tracing::debug!("using default config"),
    }
    EngineConfig::load_with_fallback(path)
}

fn import(
    input: &str,
    config: &EngineConfig,
    cache_dir: Option<&str>,
    options: &ImportOptions,
) -> Result<ImportReport> {
    if !Path::new(input).exists() {
        return Err(anyhow!("input package not found at: {}", input));
    }

    let mut processor = DocumentProcessor::new_cli(config, cache_dir)?;
    let report = processor.import_file(input, config, options)?;

    eprintln!(
        "✅ Imported {} slides, {} variables{}",
        report.document.slides.len(),
        report.document.variables.len(),
        if report.cached { " (cached)" } else { "" }
    );
    for warning in &report.warnings {
        eprintln!("⚠️  {warning}");
    }
    Ok(report)
}

fn default_output_path(input: &str) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{input_name}_deckwright.json")
}

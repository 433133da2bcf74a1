//! TableScope CLI - table lineage for SQL scripts and embedded SQL

use tablescope_cli::cli;
use tablescope_cli::input;
use tablescope_cli::output;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tablescope_core::{Charset, LineageError, LineageSession, SessionOptions};
use tracing_subscriber::EnvFilter;

use cli::{Args, OutputFormat};
use input::SourceInput;
use output::{format_json, format_table};

/// Syntax or classification failure in one of the inputs.
const EXIT_FAILURE: u8 = 1;
/// Input or configuration error (unreadable file, unknown charset).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("tablescope: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Analyze every input with one session and write the accumulated lineage.
///
/// Returns `Ok(true)` when an input failed to analyze. Lineage gathered
/// before the failure is still written.
fn run(args: Args) -> Result<bool> {
    let charset = Charset::from_name(args.charset.as_deref()).context("Invalid --charset")?;
    let sources = input::read_input(&args.files, charset)?;

    let options = SessionOptions {
        dialect: args.dialect.into(),
        default_schema: args.default_schema.clone(),
        max_depth: args.max_depth,
    };
    let mut session = LineageSession::with_options(options);

    let failure = analyze_sources(&mut session, &sources, args.embedded);
    let has_errors = failure.is_some();
    if let Some((name, err)) = &failure {
        eprintln!("tablescope: error: {name}: {err}");
    }

    let result = session.into_result();
    let output_str = match args.format {
        OutputFormat::Json => format_json(&result, args.compact),
        OutputFormat::Table => {
            let names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
            format_table(&result, &names, args.quiet, true)
        }
    };

    write_output(&args.output, &output_str)?;

    Ok(has_errors)
}

/// Feeds the inputs to the session in order, stopping at the first failure.
fn analyze_sources<'a>(
    session: &mut LineageSession,
    sources: &'a [SourceInput],
    embedded: bool,
) -> Option<(&'a str, LineageError)> {
    for source in sources {
        let _span = tracing::info_span!("analyze_source", source = %source.name).entered();
        let outcome = if embedded {
            session.parse_embedded_code(&source.content)
        } else {
            session.parse_script_from_code(&source.content)
        };
        if let Err(err) = outcome {
            return Some((source.name.as_str(), err));
        }
    }
    None
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

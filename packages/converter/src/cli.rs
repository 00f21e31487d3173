//! Command-line interface for the converter.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{DEFAULT_OUTPUT_DIR, DEFAULT_WORKBOOK_PATH};
use crate::error::{ConverterError, Result};
use crate::extract::extract;
use crate::loader::load;
use crate::merger::{ErrorPolicy, ShapeStrategy};
use crate::orchestrator::{run as run_conversion, OutputMode, RunOptions, RunReport};
use crate::table::COLUMNS;

/// qtisheet - Flatten QTI 2.1 multiple-choice question banks into spreadsheets.
#[derive(Parser)]
#[command(name = "qtisheet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a question bank (one subdirectory per chapter) to workbooks.
    Convert {
        /// Question bank root directory
        input: PathBuf,

        /// Output workbook, or output directory with --mode independent
        /// (default: output.xlsx or output/)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output layout
        #[arg(short, long, value_enum, default_value_t = ModeArg::Single)]
        mode: ModeArg,

        /// What to do when a file or chapter cannot be converted
        #[arg(long, value_enum, default_value_t = OnErrorArg::FailFast)]
        on_error: OnErrorArg,

        /// How the answer choice markup is recognised
        #[arg(long, value_enum, default_value_t = ShapeArg::Structure)]
        shape: ShapeArg,
    },

    /// Print the rows extracted from a single question file.
    Inspect {
        /// Question file (Q<number>_<name>.xml)
        file: PathBuf,

        /// How the answer choice markup is recognised
        #[arg(long, value_enum, default_value_t = ShapeArg::Structure)]
        shape: ShapeArg,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// One workbook, one sheet per chapter
    Single,
    /// One workbook per chapter; existing files are kept
    Independent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnErrorArg {
    FailFast,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    /// Inspect the markup, fall back to the file name
    Structure,
    /// "true" in the file name means a true/false question
    FileName,
}

impl From<OnErrorArg> for ErrorPolicy {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::FailFast => Self::FailFast,
            OnErrorArg::Skip => Self::SkipAndContinue,
        }
    }
}

impl From<ShapeArg> for ShapeStrategy {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Structure => Self::Structure,
            ShapeArg::FileName => Self::FileName,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            mode,
            on_error,
            shape,
        } => convert_command(&input, output, mode, on_error.into(), shape.into()),
        Commands::Inspect { file, shape, json } => inspect_command(&file, shape.into(), json),
    }
}

/// Resolve the output mode, applying the per-mode default location.
fn output_mode(mode: ModeArg, output: Option<PathBuf>) -> OutputMode {
    match mode {
        ModeArg::Single => OutputMode::SingleWorkbook {
            path: output.unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK_PATH)),
        },
        ModeArg::Independent => OutputMode::Independent {
            dir: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        },
    }
}

/// Execute the convert command.
fn convert_command(
    input: &Path,
    output: Option<PathBuf>,
    mode: ModeArg,
    policy: ErrorPolicy,
    shape: ShapeStrategy,
) -> Result<()> {
    if !input.is_dir() {
        return Err(ConverterError::InvalidInput(format!(
            "Input is not a directory: {}",
            input.display()
        )));
    }

    let options = RunOptions::new(input, output_mode(mode, output))
        .with_error_policy(policy)
        .with_shape_strategy(shape);

    println!(
        "{} {}",
        style("Converting").bold(),
        style(input.display()).cyan()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Merging chapters...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = match run_conversion(&options) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();
    print_report(&report);

    if report.has_failures() {
        return Err(ConverterError::Incomplete {
            failures: report.failures.len(),
        });
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for chapter in &report.chapters {
        match chapter.rows {
            Some(rows) => println!("  {}: {} rows", style(&chapter.name).green(), rows),
            None => println!("  {}: {}", chapter.name, style("skipped").yellow()),
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!(
            "{} {}",
            style("Failures:").red().bold(),
            report.failures.len()
        );
        for failure in &report.failures {
            println!("  {}", style(failure).red());
        }
    }

    for path in &report.skipped {
        println!(
            "{} {}",
            style("Already exists:").yellow().bold(),
            path.display()
        );
    }

    println!();
    for path in &report.written {
        println!("{} {}", style("Saved to:").green().bold(), path.display());
    }
}

/// Execute the inspect command.
fn inspect_command(file: &Path, shape: ShapeStrategy, json: bool) -> Result<()> {
    let source = load(file)?;
    let doc = source.parse()?;
    let shape = shape.resolve(&doc, &source.file_name());
    let rows = extract(&doc, shape).map_err(|source| ConverterError::Extraction {
        file: file.to_path_buf(),
        source,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} {} ({} choices, {})",
        style("Question").bold(),
        style(source.file_name()).cyan(),
        rows.len(),
        shape.as_str()
    );
    if !source.repairs().is_empty() {
        println!(
            "  Repairs: {}",
            style(source.repairs().len()).yellow().bold()
        );
    }

    for (index, row) in rows.iter().enumerate() {
        println!();
        println!("{}", style(format!("Row {}", index + 1)).bold());
        for column in COLUMNS {
            println!("  {}: {}", column.header(), row.get(column).unwrap_or(""));
        }
    }

    Ok(())
}

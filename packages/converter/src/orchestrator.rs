//! Run orchestration: discover chapters, merge each one, write the output.
//!
//! Two output modes are supported:
//!
//! * [`OutputMode::Independent`] writes one workbook per chapter into a
//!   directory and leaves existing workbooks untouched.
//! * [`OutputMode::SingleWorkbook`] writes one workbook with a sheet per
//!   chapter, replacing the target. Every chapter is merged before the file
//!   is written.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{validate_chapter_name, WORKBOOK_EXTENSION};
use crate::error::{ConverterError, Result};
use crate::merger::{merge_chapter, ErrorPolicy, MergeOptions, ShapeStrategy};
use crate::table::Table;
use crate::writer::{write_workbook, Sheet};

/// Where and how the output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One `<chapter>.xlsx` per chapter inside `dir`.
    Independent { dir: PathBuf },
    /// One workbook at `path`, one sheet per chapter.
    SingleWorkbook { path: PathBuf },
}

/// Options for a full conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory holding one subdirectory per chapter.
    pub root: PathBuf,
    pub mode: OutputMode,
    pub merge: MergeOptions,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            root: root.into(),
            mode,
            merge: MergeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.merge.policy = policy;
        self
    }

    #[must_use]
    pub fn with_shape_strategy(mut self, shape: ShapeStrategy) -> Self {
        self.merge.shape = shape;
        self
    }
}

/// A chapter directory with its ordering number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub number: u32,
    pub name: String,
    pub path: PathBuf,
}

/// Outcome for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSummary {
    pub name: String,
    /// Rows merged; `None` when the chapter was skipped because its
    /// workbook already existed.
    pub rows: Option<usize>,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub chapters: Vec<ChapterSummary>,
    /// Workbooks created or replaced.
    pub written: Vec<PathBuf>,
    /// Existing workbooks left untouched.
    pub skipped: Vec<PathBuf>,
    /// Errors absorbed under `ErrorPolicy::SkipAndContinue`.
    pub failures: Vec<ConverterError>,
}

impl RunReport {
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.chapters.iter().filter_map(|c| c.rows).sum()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Find the chapter directories under `root`, ordered by chapter number.
///
/// Directories whose name does not carry a number are handled by `policy`.
pub fn discover_chapters(
    root: &Path,
    policy: ErrorPolicy,
    failures: &mut Vec<ConverterError>,
) -> Result<Vec<Chapter>> {
    let read_err = |source| ConverterError::ReadFile {
        path: root.to_path_buf(),
        source,
    };

    let mut chapters = Vec::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match validate_chapter_name(&name) {
            Ok(number) => chapters.push(Chapter { number, name, path }),
            Err(e) => policy.absorb(e, failures)?,
        }
    }

    if chapters.is_empty() {
        return Err(ConverterError::NoChapters {
            root: root.to_path_buf(),
        });
    }

    chapters.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.name.cmp(&b.name)));
    tracing::debug!(count = chapters.len(), "Discovered chapters");
    Ok(chapters)
}

/// Convert a whole question bank.
pub fn run(options: &RunOptions) -> Result<RunReport> {
    if !options.root.is_dir() {
        return Err(ConverterError::InvalidInput(format!(
            "Input directory does not exist: {}",
            options.root.display()
        )));
    }

    let mut report = RunReport::default();
    let chapters = discover_chapters(&options.root, options.merge.policy, &mut report.failures)?;

    match &options.mode {
        OutputMode::Independent { dir } => run_independent(&chapters, dir, options, &mut report)?,
        OutputMode::SingleWorkbook { path } => {
            run_single(&chapters, path, options, &mut report)?;
        }
    }

    tracing::info!(
        chapters = report.chapters.len(),
        rows = report.total_rows(),
        failures = report.failures.len(),
        "Conversion finished"
    );
    Ok(report)
}

fn run_independent(
    chapters: &[Chapter],
    dir: &Path,
    options: &RunOptions,
    report: &mut RunReport,
) -> Result<()> {
    fs::create_dir_all(dir)?;

    for chapter in chapters {
        let target = dir.join(format!("{}.{WORKBOOK_EXTENSION}", chapter.name));
        if target.exists() {
            tracing::warn!("File {} already exists, skipping", target.display());
            report.skipped.push(target);
            report.chapters.push(ChapterSummary {
                name: chapter.name.clone(),
                rows: None,
            });
            continue;
        }

        let Some(table) = merge_into_report(chapter, options, report)? else {
            continue;
        };
        write_workbook(&target, &[Sheet::new(&chapter.name, &table)])?;
        report.written.push(target);
    }

    Ok(())
}

fn run_single(
    chapters: &[Chapter],
    path: &Path,
    options: &RunOptions,
    report: &mut RunReport,
) -> Result<()> {
    let mut merged = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        if let Some(table) = merge_into_report(chapter, options, report)? {
            merged.push((chapter.name.as_str(), table));
        }
    }

    if merged.is_empty() {
        return Err(ConverterError::NoChapters {
            root: options.root.clone(),
        });
    }

    let sheets: Vec<_> = merged
        .iter()
        .map(|(name, table)| Sheet::new(name, table))
        .collect();
    write_workbook(path, &sheets)?;
    report.written.push(path.to_path_buf());
    Ok(())
}

/// Merge one chapter, recording its summary and absorbed failures.
///
/// Returns `None` when the chapter itself failed and the policy skips it.
fn merge_into_report(
    chapter: &Chapter,
    options: &RunOptions,
    report: &mut RunReport,
) -> Result<Option<Table>> {
    match merge_chapter(&chapter.path, &options.merge) {
        Ok(merged) => {
            report.failures.extend(merged.failures);
            report.chapters.push(ChapterSummary {
                name: chapter.name.clone(),
                rows: Some(merged.table.len()),
            });
            Ok(Some(merged.table))
        }
        Err(e) => {
            options.merge.policy.absorb(e, &mut report.failures)?;
            Ok(None)
        }
    }
}

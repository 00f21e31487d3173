//! Chapter merging: every question file of one chapter into one table.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Document;

use crate::config::{
    is_excluded_file, validate_question_file_name, MANIFEST_FILE_NAME, QUESTION_EXTENSION,
};
use crate::error::{ConverterError, Result};
use crate::extract::{detect_shape, extract};
use crate::loader::load;
use crate::table::{assemble, Table};
use crate::types::ChoiceShape;

/// What to do when a single file or chapter cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole run on the first error.
    #[default]
    FailFast,
    /// Record the error, leave the file or chapter out, and carry on.
    SkipAndContinue,
}

impl ErrorPolicy {
    /// Apply the policy to one error.
    ///
    /// # Returns
    /// * `Err(error)` under `FailFast`
    /// * `Ok(())` under `SkipAndContinue`, with the error appended to `failures`
    pub fn absorb(self, error: ConverterError, failures: &mut Vec<ConverterError>) -> Result<()> {
        match self {
            Self::FailFast => Err(error),
            Self::SkipAndContinue => {
                tracing::warn!(error = %error, "Skipping after error");
                failures.push(error);
                Ok(())
            }
        }
    }
}

/// How the markup shape of answer choices is decided for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeStrategy {
    /// Inspect the document; fall back to the file name when it is ambiguous.
    #[default]
    Structure,
    /// Use the file name only (`"true"` in the name means true/false).
    FileName,
}

impl ShapeStrategy {
    /// Decide the shape for one parsed document.
    pub fn resolve(self, doc: &Document<'_>, file_name: &str) -> ChoiceShape {
        let hinted = ChoiceShape::from_file_name(file_name);
        match self {
            Self::FileName => hinted,
            Self::Structure => match detect_shape(doc) {
                Some(detected) => {
                    if detected != hinted {
                        tracing::warn!(
                            file = file_name,
                            detected = detected.as_str(),
                            hinted = hinted.as_str(),
                            "Choice markup disagrees with file name, using markup"
                        );
                    }
                    detected
                }
                None => {
                    tracing::debug!(
                        file = file_name,
                        shape = hinted.as_str(),
                        "Choice markup ambiguous, using file name"
                    );
                    hinted
                }
            },
        }
    }
}

/// Options shared by every chapter of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub shape: ShapeStrategy,
    pub policy: ErrorPolicy,
}

impl MergeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shape(mut self, shape: ShapeStrategy) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A question file with its ordering number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFile {
    pub number: u32,
    pub path: PathBuf,
}

/// Result of scanning a chapter directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Question files in numeric order.
    pub files: Vec<QuestionFile>,
    /// Candidates that could not be ordered.
    pub rejected: Vec<ConverterError>,
}

/// Everything one chapter produced.
#[derive(Debug)]
pub struct ChapterMerge {
    /// Concatenated rows of every converted file.
    pub table: Table,
    /// Number of files that contributed to `table`.
    pub converted_files: usize,
    /// Errors absorbed under `ErrorPolicy::SkipAndContinue`.
    pub failures: Vec<ConverterError>,
}

/// Find the question files of a chapter.
///
/// Considers `*.xml` files, leaves out the manifest and essay questions, and
/// orders the rest by the number in their `Q<number>_` prefix.
pub fn discover_question_files(dir: &Path) -> Result<Discovery> {
    let read_err = |source| ConverterError::ReadFile {
        path: dir.to_path_buf(),
        source,
    };

    let mut discovery = Discovery::default();
    let mut has_manifest = false;

    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(QUESTION_EXTENSION)
        {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if is_excluded_file(&file_name) {
            has_manifest |= file_name == MANIFEST_FILE_NAME;
            tracing::debug!(file = %file_name, "Excluded from question discovery");
            continue;
        }

        match validate_question_file_name(&file_name) {
            Ok(number) => discovery.files.push(QuestionFile { number, path }),
            Err(e) => discovery.rejected.push(e),
        }
    }

    if !has_manifest {
        tracing::debug!(dir = %dir.display(), "Could not find {MANIFEST_FILE_NAME}");
    }

    discovery
        .files
        .sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));

    Ok(discovery)
}

/// Convert one question file into its table.
///
/// Load, parse, choose the choice shape, extract, assemble. Any failure is
/// returned with the file's path attached.
pub fn process_file(path: &Path, shape: ShapeStrategy) -> Result<Table> {
    let source = load(path)?;
    let doc = source.parse()?;
    let shape = shape.resolve(&doc, &source.file_name());

    let rows = extract(&doc, shape).map_err(|source| ConverterError::Extraction {
        file: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        file = %path.display(),
        shape = shape.as_str(),
        rows = rows.len(),
        "Extracted question"
    );

    assemble(&rows)
}

/// Merge every question file of a chapter into one table.
///
/// Files are concatenated in numeric order, each file's rows in document
/// order. Per-file errors go through `options.policy`.
pub fn merge_chapter(dir: &Path, options: &MergeOptions) -> Result<ChapterMerge> {
    let discovery = discover_question_files(dir)?;

    tracing::info!(
        "Processing chapter {} with {} files",
        dir.file_name().unwrap_or_default().to_string_lossy(),
        discovery.files.len()
    );

    let mut failures = Vec::new();
    for rejected in discovery.rejected {
        options.policy.absorb(rejected, &mut failures)?;
    }

    let mut table = Table::new();
    let mut converted_files = 0;
    for file in &discovery.files {
        match process_file(&file.path, options.shape) {
            Ok(file_table) => {
                table.append(file_table);
                converted_files += 1;
            }
            Err(e) => options.policy.absorb(e, &mut failures)?,
        }
    }

    Ok(ChapterMerge {
        table,
        converted_files,
        failures,
    })
}

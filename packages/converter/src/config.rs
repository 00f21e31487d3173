//! Configuration constants and naming-convention validation for the converter.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ConverterError, Result};

/// XML namespace of QTI 2.1 assessment items.
pub const QTI_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqti_v2p1";

/// Local name of the root element of a question document.
pub const ASSESSMENT_ITEM_TAG: &str = "assessmentItem";

/// Chapter manifest written by the exporting LMS; never a question.
pub const MANIFEST_FILE_NAME: &str = "imsmanifest.xml";

/// Marker for essay questions, which have no answer choices to flatten.
pub const ESSAY_MARKER: &str = "Essay";

/// Extension of question files.
pub const QUESTION_EXTENSION: &str = "xml";

/// Extension of the produced workbooks.
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Default workbook path in single-workbook mode.
pub const DEFAULT_WORKBOOK_PATH: &str = "output.xlsx";

/// Default output directory in independent-files mode.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Maximum number of character-level repairs applied to one file before
/// the markup is considered broken rather than slightly dirty.
pub const MAX_MARKUP_REPAIRS: usize = 64;

/// Excel limit on worksheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Excel limit on the characters in one cell.
pub const MAX_CELL_LEN: usize = 32_767;

/// Question file pattern: `Q<number>_<name>.xml`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUESTION_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q(\d+)_.+\.xml$").expect("valid regex"));

/// Chapter directory pattern: number in the second `_`-separated segment.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_DIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^_]*_(\d+)(?:_.*)?$").expect("valid regex"));

/// Extract the numeric prefix of a question file name.
///
/// # Examples
/// ```
/// use qtisheet_converter::config::parse_question_number;
///
/// assert_eq!(parse_question_number("Q10_Multiple_Choice.xml"), Some(10));
/// assert_eq!(parse_question_number("Q02_True_False.xml"), Some(2));
/// assert_eq!(parse_question_number("notes.xml"), None);
/// ```
pub fn parse_question_number(file_name: &str) -> Option<u32> {
    QUESTION_FILE_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract the chapter number embedded in a chapter directory name.
///
/// # Examples
/// ```
/// use qtisheet_converter::config::parse_chapter_number;
///
/// assert_eq!(parse_chapter_number("Chapter_7"), Some(7));
/// assert_eq!(parse_chapter_number("Chapter_12_Review"), Some(12));
/// assert_eq!(parse_chapter_number("Appendix"), None);
/// ```
pub fn parse_chapter_number(dir_name: &str) -> Option<u32> {
    CHAPTER_DIR_PATTERN
        .captures(dir_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Validate a question file name and return its number.
///
/// # Returns
/// * `Ok(number)` if the name follows `Q<number>_<name>.xml`
/// * `Err(ConverterError::NamingConvention)` otherwise
pub fn validate_question_file_name(file_name: &str) -> Result<u32> {
    parse_question_number(file_name).ok_or_else(|| ConverterError::NamingConvention {
        name: file_name.to_string(),
        expected: "Q<number>_<name>.xml",
    })
}

/// Validate a chapter directory name and return its number.
pub fn validate_chapter_name(dir_name: &str) -> Result<u32> {
    parse_chapter_number(dir_name).ok_or_else(|| ConverterError::NamingConvention {
        name: dir_name.to_string(),
        expected: "<name>_<number>",
    })
}

/// Whether a file name is excluded from question discovery.
pub fn is_excluded_file(file_name: &str) -> bool {
    file_name == MANIFEST_FILE_NAME || file_name.contains(ESSAY_MARKER)
}

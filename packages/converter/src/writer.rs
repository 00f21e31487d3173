//! Workbook output.
//!
//! Every sheet starts with the header row taken from the column schema.
//! Workbooks are rendered in memory and moved into place with a rename, so
//! a failed run never leaves a half-written file behind.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::config::{MAX_CELL_LEN, MAX_SHEET_NAME_LEN};
use crate::error::{ConverterError, Result};
use crate::table::{headers, Table};

/// Characters Excel does not accept in worksheet names.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// One worksheet to write.
#[derive(Debug, Clone, Copy)]
pub struct Sheet<'a> {
    pub name: &'a str,
    pub table: &'a Table,
}

impl<'a> Sheet<'a> {
    #[must_use]
    pub fn new(name: &'a str, table: &'a Table) -> Self {
        Self { name, table }
    }
}

/// Make a chapter name usable as a worksheet name.
///
/// # Examples
/// ```
/// use qtisheet_converter::writer::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("Chapter_1"), "Chapter_1");
/// assert_eq!(sanitize_sheet_name("Unit_2: Review?"), "Unit_2_ Review_");
/// assert_eq!(sanitize_sheet_name(""), "Sheet");
/// ```
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = cleaned
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    // Truncation can expose an apostrophe at the end.
    let truncated = truncated.trim_end_matches('\'').to_string();

    if truncated.is_empty() {
        "Sheet".to_string()
    } else if truncated.eq_ignore_ascii_case("history") {
        // Reserved by Excel.
        format!("{truncated}_")
    } else {
        truncated
    }
}

/// Sanitize names and make them unique, ignoring case like Excel does.
pub fn unique_sheet_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut result = Vec::new();

    for name in names {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut counter = 2;
        while !taken.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({counter})");
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
            counter += 1;
        }
        if candidate != name {
            tracing::debug!(chapter = name, sheet = %candidate, "Renamed worksheet");
        }
        result.push(candidate);
    }

    result
}

/// Write sheets into one workbook at `path`, replacing any existing file.
pub fn write_workbook(path: &Path, sheets: &[Sheet<'_>]) -> Result<()> {
    let names = unique_sheet_names(sheets.iter().map(|s| s.name));
    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();

    for (sheet, name) in sheets.iter().zip(&names) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;

        for (col, header) in headers().enumerate() {
            worksheet.write_string_with_format(0, col_index(col)?, header, &header_format)?;
        }

        for (index, cells) in sheet.table.rows().iter().enumerate() {
            let row = u32::try_from(index + 1).map_err(|_| {
                ConverterError::InvalidInput(format!("Sheet '{name}' has too many rows"))
            })?;
            for (col, cell) in cells.iter().enumerate() {
                if let Some(value) = cell {
                    let value = fit_cell(value, name, row, col);
                    worksheet.write_string(row, col_index(col)?, value.as_ref())?;
                }
            }
        }

        tracing::debug!(sheet = %name, rows = sheet.table.len(), "Wrote worksheet");
    }

    let buffer = workbook.save_to_buffer()?;
    write_atomic(path, &buffer)
}

/// Cut a value down to the Excel cell limit, warning when it was too long.
fn fit_cell<'v>(value: &'v str, sheet: &str, row: u32, col: usize) -> Cow<'v, str> {
    if value.chars().count() <= MAX_CELL_LEN {
        return Cow::Borrowed(value);
    }
    tracing::warn!(
        sheet,
        row,
        column = headers().nth(col).unwrap_or_default(),
        "Cell exceeds {MAX_CELL_LEN} characters, truncated"
    );
    Cow::Owned(value.chars().take(MAX_CELL_LEN).collect())
}

fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| ConverterError::InvalidInput(format!("Column index {col} out of range")))
}

/// Write to a temporary sibling, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| {
            ConverterError::InvalidInput(format!("Not a file path: {}", path.display()))
        })?
        .to_string_lossy();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(ConverterError::Io(e));
    }

    tracing::info!(path = %path.display(), "Saved workbook");
    Ok(())
}

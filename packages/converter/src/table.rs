//! Table assembly against the published column schema.
//!
//! [`COLUMNS`] is the only place the column order is defined. Rows are
//! turned into cells by walking it, and the workbook writer takes its header
//! from it, so header and row shape cannot drift apart.

use crate::error::{ConverterError, Result};
use crate::types::OutputRow;

/// One published output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Identifier,
    Title,
    Adaptive,
    TimeDependent,
    ResponseDeclarationIdentifier,
    ResponseDeclarationCardinality,
    ResponseDeclarationBaseType,
    CorrectResponseValue,
    OutcomeDeclarationIdentifier,
    OutcomeDeclarationCardinality,
    OutcomeDeclarationBaseType,
    ResponseIdentifier,
    Shuffle,
    MaxChoices,
    Question,
    ChoiceIdentifier,
    ChoiceText,
    ResponseIfVariableIdentifier,
    ResponseIfCorrectIdentifier,
    ResponseIfOutcomeIdentifier,
    ResponseIfBaseValue,
    ResponseIfBaseType,
    ResponseElseOutcomeIdentifier,
    ResponseElseBaseValue,
    ResponseElseBaseType,
}

/// Number of published columns.
pub const COLUMN_COUNT: usize = 25;

/// Published column order, shared by every document and chapter.
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column::Identifier,
    Column::Title,
    Column::Adaptive,
    Column::TimeDependent,
    Column::ResponseDeclarationIdentifier,
    Column::ResponseDeclarationCardinality,
    Column::ResponseDeclarationBaseType,
    Column::CorrectResponseValue,
    Column::OutcomeDeclarationIdentifier,
    Column::OutcomeDeclarationCardinality,
    Column::OutcomeDeclarationBaseType,
    Column::ResponseIdentifier,
    Column::Shuffle,
    Column::MaxChoices,
    Column::Question,
    Column::ChoiceIdentifier,
    Column::ChoiceText,
    Column::ResponseIfVariableIdentifier,
    Column::ResponseIfCorrectIdentifier,
    Column::ResponseIfOutcomeIdentifier,
    Column::ResponseIfBaseValue,
    Column::ResponseIfBaseType,
    Column::ResponseElseOutcomeIdentifier,
    Column::ResponseElseBaseValue,
    Column::ResponseElseBaseType,
];

impl Column {
    /// Header text written to the first row of every sheet.
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Title => "title",
            Self::Adaptive => "adaptive",
            Self::TimeDependent => "timeDependent",
            Self::ResponseDeclarationIdentifier => "responseDeclarationIdentifier",
            Self::ResponseDeclarationCardinality => "responseDeclarationCardinality",
            Self::ResponseDeclarationBaseType => "responseDeclarationBaseType",
            Self::CorrectResponseValue => "correctResponseValue",
            Self::OutcomeDeclarationIdentifier => "outcomeDeclarationIdentifier",
            Self::OutcomeDeclarationCardinality => "outcomeDeclarationCardinality",
            Self::OutcomeDeclarationBaseType => "outcomeDeclarationBaseType",
            Self::ResponseIdentifier => "responseIdentifier",
            Self::Shuffle => "shuffle",
            Self::MaxChoices => "maxChoices",
            Self::Question => "question",
            Self::ChoiceIdentifier => "choiceIdentifier",
            Self::ChoiceText => "choiceText",
            Self::ResponseIfVariableIdentifier => "responseIfVariableIdentifier",
            Self::ResponseIfCorrectIdentifier => "responseIfCorrectIdentifier",
            Self::ResponseIfOutcomeIdentifier => "responseIfOutcomeIdentifier",
            Self::ResponseIfBaseValue => "responseIfBaseValue",
            Self::ResponseIfBaseType => "responseIfBaseType",
            Self::ResponseElseOutcomeIdentifier => "responseElseOutcomeIdentifier",
            Self::ResponseElseBaseValue => "responseElseBaseValue",
            Self::ResponseElseBaseType => "responseElseBaseType",
        }
    }
}

/// Header row in published order.
pub fn headers() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(Column::header)
}

impl OutputRow {
    /// Value of a single column.
    #[must_use]
    pub fn get(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Identifier => &self.identifier,
            Column::Title => &self.title,
            Column::Adaptive => &self.adaptive,
            Column::TimeDependent => &self.time_dependent,
            Column::ResponseDeclarationIdentifier => &self.response_declaration_identifier,
            Column::ResponseDeclarationCardinality => &self.response_declaration_cardinality,
            Column::ResponseDeclarationBaseType => &self.response_declaration_base_type,
            Column::CorrectResponseValue => &self.correct_response_value,
            Column::OutcomeDeclarationIdentifier => &self.outcome_declaration_identifier,
            Column::OutcomeDeclarationCardinality => &self.outcome_declaration_cardinality,
            Column::OutcomeDeclarationBaseType => &self.outcome_declaration_base_type,
            Column::ResponseIdentifier => &self.response_identifier,
            Column::Shuffle => &self.shuffle,
            Column::MaxChoices => &self.max_choices,
            Column::Question => &self.question,
            Column::ChoiceIdentifier => &self.choice_identifier,
            Column::ChoiceText => &self.choice_text,
            Column::ResponseIfVariableIdentifier => &self.response_if_variable_identifier,
            Column::ResponseIfCorrectIdentifier => &self.response_if_correct_identifier,
            Column::ResponseIfOutcomeIdentifier => &self.response_if_outcome_identifier,
            Column::ResponseIfBaseValue => &self.response_if_base_value,
            Column::ResponseIfBaseType => &self.response_if_base_type,
            Column::ResponseElseOutcomeIdentifier => &self.response_else_outcome_identifier,
            Column::ResponseElseBaseValue => &self.response_else_base_value,
            Column::ResponseElseBaseType => &self.response_else_base_type,
        };
        value.as_deref()
    }

    /// Cells in published column order.
    #[must_use]
    pub fn to_cells(&self) -> Vec<Option<String>> {
        COLUMNS
            .iter()
            .map(|column| self.get(*column).map(str::to_string))
            .collect()
    }
}

/// Cells of one table row; `None` is an empty cell.
pub type Cells = Vec<Option<String>>;

/// Rows laid out in the published column order.
///
/// The row index is the position in the table; concatenation renumbers
/// implicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Cells>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, rejecting any width other than the schema's.
    pub fn push_cells(&mut self, cells: Cells) -> Result<()> {
        if cells.len() != COLUMN_COUNT {
            return Err(ConverterError::SchemaViolation {
                expected: COLUMN_COUNT,
                found: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Append all rows of another table, after the existing ones.
    pub fn append(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }

    #[must_use]
    pub fn rows(&self) -> &[Cells] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at a row and column, if the row exists and the cell is filled.
    #[must_use]
    pub fn cell(&self, row: usize, column: Column) -> Option<&str> {
        let index = COLUMNS.iter().position(|c| *c == column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }
}

/// Lay out extracted rows in the published column order.
pub fn assemble(rows: &[OutputRow]) -> Result<Table> {
    let mut table = Table::new();
    for row in rows {
        table.push_cells(row.to_cells())?;
    }
    Ok(table)
}

/// Concatenate tables in order.
pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
    let mut merged = Table::new();
    for table in tables {
        merged.append(table);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(identifier: &str, choice: &str) -> OutputRow {
        OutputRow {
            identifier: Some(identifier.to_string()),
            choice_identifier: Some(choice.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_schema_has_25_unique_headers() {
        let names: Vec<_> = headers().collect();
        assert_eq!(names.len(), 25);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 25);
        assert_eq!(names[0], "identifier");
        assert_eq!(names[24], "responseElseBaseType");
    }

    #[test]
    fn test_headers_match_serialized_row_keys() {
        let value = serde_json::to_value(OutputRow::default()).unwrap();
        let keys: HashSet<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let headers: HashSet<&str> = headers().collect();
        assert_eq!(keys, headers);
    }

    #[test]
    fn test_to_cells_follows_column_order() {
        let full = OutputRow {
            title: Some("Geography".to_string()),
            choice_text: Some("Paris".to_string()),
            ..row("Q1", "A")
        };
        let cells = full.to_cells();
        assert_eq!(cells.len(), COLUMN_COUNT);
        assert_eq!(cells[0].as_deref(), Some("Q1"));
        assert_eq!(cells[1].as_deref(), Some("Geography"));
        assert_eq!(cells[15].as_deref(), Some("A"));
        assert_eq!(cells[16].as_deref(), Some("Paris"));
        assert!(cells[2].is_none());
    }

    #[test]
    fn test_assemble_preserves_row_order() {
        let table = assemble(&[row("Q1", "A"), row("Q1", "B"), row("Q1", "C")]).unwrap();
        assert_eq!(table.len(), 3);
        let choices: Vec<_> = (0..3)
            .map(|i| table.cell(i, Column::ChoiceIdentifier))
            .collect();
        assert_eq!(choices, vec![Some("A"), Some("B"), Some("C")]);
    }

    #[test]
    fn test_push_cells_rejects_wrong_width() {
        let mut table = Table::new();
        let err = table.push_cells(vec![None; COLUMN_COUNT - 1]).unwrap_err();
        assert!(matches!(
            err,
            ConverterError::SchemaViolation {
                expected: 25,
                found: 24
            }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_concat_renumbers_rows() {
        let first = assemble(&[row("Q1", "A"), row("Q1", "B")]).unwrap();
        let second = assemble(&[row("Q2", "T")]).unwrap();
        let merged = concat([first, second]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.cell(2, Column::Identifier), Some("Q2"));
        assert_eq!(merged.cell(3, Column::Identifier), None);
    }
}

//! qtisheet - Flatten QTI 2.1 multiple-choice question banks into spreadsheets.
//!
//! A question bank is a directory with one subdirectory per chapter, each
//! holding one QTI 2.1 `assessmentItem` document per question. Every answer
//! choice becomes one spreadsheet row that repeats the question-level fields
//! next to the choice's own identifier and text.
//!
//! # Example
//!
//! ```
//! use qtisheet_converter::extract::extract;
//! use qtisheet_converter::types::ChoiceShape;
//!
//! let xml = r#"<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1" identifier="Q1">
//!   <responseDeclaration identifier="RESPONSE"><correctResponse><value>A</value></correctResponse></responseDeclaration>
//!   <outcomeDeclaration identifier="SCORE"/>
//!   <itemBody><choiceInteraction responseIdentifier="RESPONSE">
//!     <prompt><span>Capital of France?</span></prompt>
//!     <simpleChoice identifier="A"><span>Paris</span></simpleChoice>
//!     <simpleChoice identifier="B"><span>London</span></simpleChoice>
//!   </choiceInteraction></itemBody>
//!   <responseProcessing><responseCondition>
//!     <responseIf>
//!       <match><variable identifier="RESPONSE"/><correct identifier="RESPONSE"/></match>
//!       <setOutcomeValue identifier="SCORE"><baseValue baseType="float">1</baseValue></setOutcomeValue>
//!     </responseIf>
//!     <responseElse>
//!       <setOutcomeValue identifier="SCORE"><baseValue baseType="float">0</baseValue></setOutcomeValue>
//!     </responseElse>
//!   </responseCondition></responseProcessing>
//! </assessmentItem>"#;
//!
//! let doc = roxmltree::Document::parse(xml).unwrap();
//! let rows = extract(&doc, ChoiceShape::Standard).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].choice_text.as_deref(), Some("London"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and naming-convention validation
//! - [`error`]: Error types and Result alias
//! - [`xml`]: Namespace-aware XML helpers
//! - [`types`]: Question model and output rows
//! - [`loader`]: File loading with bounded markup recovery
//! - [`extract`]: Field extraction from a parsed question
//! - [`table`]: Column schema and table assembly
//! - [`merger`]: Per-chapter merging and error policy
//! - [`orchestrator`]: Chapter discovery and output modes
//! - [`writer`]: Workbook output
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod merger;
pub mod orchestrator;
pub mod table;
pub mod types;
pub mod writer;
pub mod xml;

// Re-export main functions
pub use merger::merge_chapter;
pub use orchestrator::run;

// Re-export commonly used items
pub use error::{ConverterError, ExtractError, Result};
pub use merger::{ErrorPolicy, MergeOptions, ShapeStrategy};
pub use orchestrator::{OutputMode, RunOptions, RunReport};
pub use table::{Column, Table, COLUMNS};
pub use types::{ChoiceShape, OutputRow, QuestionItem};

//! Core data types for the converter.
//!
//! A [`QuestionItem`] is the typed view of one QTI question document. It is
//! flattened into one [`OutputRow`] per [`AnswerChoice`]; attributes that
//! share a name across structural nodes (`identifier`, `cardinality`,
//! `baseType`) land in distinct, explicitly named fields.

use serde::Serialize;

/// Markup shape carrying the text of an answer choice.
///
/// The exporting tool writes true/false choices as bare text and standard
/// multiple-choice options wrapped in a `<span>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceShape {
    /// `<simpleChoice identifier="A">True</simpleChoice>`
    TrueFalse,
    /// `<simpleChoice identifier="A"><span>Paris</span></simpleChoice>`
    Standard,
}

impl ChoiceShape {
    /// Shape implied by the exporter's file naming convention.
    ///
    /// # Examples
    /// ```
    /// use qtisheet_converter::types::ChoiceShape;
    ///
    /// assert_eq!(ChoiceShape::from_file_name("Q3_True_False.xml"), ChoiceShape::TrueFalse);
    /// assert_eq!(ChoiceShape::from_file_name("Q4_Multiple_Choice.xml"), ChoiceShape::Standard);
    /// ```
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_lowercase().contains("true") {
            Self::TrueFalse
        } else {
            Self::Standard
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrueFalse => "true/false",
            Self::Standard => "standard",
        }
    }
}

/// Root-level attributes of an assessment item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub adaptive: Option<String>,
    pub time_dependent: Option<String>,
}

/// Expected shape of the learner response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDeclaration {
    pub identifier: Option<String>,
    pub cardinality: Option<String>,
    pub base_type: Option<String>,
    /// Text of `correctResponse/value`.
    pub correct_value: Option<String>,
}

/// Expected shape of the scored outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeDeclaration {
    pub identifier: Option<String>,
    pub cardinality: Option<String>,
    pub base_type: Option<String>,
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerChoice {
    pub identifier: Option<String>,
    pub text: Option<String>,
}

impl AnswerChoice {
    #[must_use]
    pub fn new(identifier: Option<String>, text: Option<String>) -> Self {
        Self { identifier, text }
    }
}

/// Prompt plus answer choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceInteraction {
    pub response_identifier: Option<String>,
    pub shuffle: Option<String>,
    pub max_choices: Option<String>,
    pub prompt: Option<String>,
    /// Choices in document order.
    pub choices: Vec<AnswerChoice>,
}

/// `<match>` clause of the `responseIf` branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchClause {
    pub variable_identifier: Option<String>,
    pub correct_identifier: Option<String>,
}

/// `<setOutcomeValue>` action of a scoring branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    pub identifier: Option<String>,
    pub base_value: Option<String>,
    pub base_type: Option<String>,
}

/// Scoring applied when the response matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseIf {
    pub condition: MatchClause,
    pub outcome: SetOutcome,
}

/// Scoring applied otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseElse {
    pub outcome: SetOutcome,
}

/// Typed view of one question document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionItem {
    pub attributes: ItemAttributes,
    pub response_declaration: ResponseDeclaration,
    pub outcome_declaration: OutcomeDeclaration,
    pub interaction: ChoiceInteraction,
    pub response_if: ResponseIf,
    pub response_else: ResponseElse,
}

impl QuestionItem {
    /// Expand into one row per answer choice, in document order.
    #[must_use]
    pub fn to_rows(&self) -> Vec<OutputRow> {
        self.interaction
            .choices
            .iter()
            .map(|choice| self.row_for(choice))
            .collect()
    }

    fn row_for(&self, choice: &AnswerChoice) -> OutputRow {
        let attrs = &self.attributes;
        let response = &self.response_declaration;
        let outcome = &self.outcome_declaration;
        let interaction = &self.interaction;
        let matched = &self.response_if.condition;
        let if_outcome = &self.response_if.outcome;
        let else_outcome = &self.response_else.outcome;

        OutputRow {
            identifier: attrs.identifier.clone(),
            title: attrs.title.clone(),
            adaptive: attrs.adaptive.clone(),
            time_dependent: attrs.time_dependent.clone(),
            response_declaration_identifier: response.identifier.clone(),
            response_declaration_cardinality: response.cardinality.clone(),
            response_declaration_base_type: response.base_type.clone(),
            correct_response_value: response.correct_value.clone(),
            outcome_declaration_identifier: outcome.identifier.clone(),
            outcome_declaration_cardinality: outcome.cardinality.clone(),
            outcome_declaration_base_type: outcome.base_type.clone(),
            response_identifier: interaction.response_identifier.clone(),
            shuffle: interaction.shuffle.clone(),
            max_choices: interaction.max_choices.clone(),
            question: interaction.prompt.clone(),
            choice_identifier: choice.identifier.clone(),
            choice_text: choice.text.clone(),
            response_if_variable_identifier: matched.variable_identifier.clone(),
            response_if_correct_identifier: matched.correct_identifier.clone(),
            response_if_outcome_identifier: if_outcome.identifier.clone(),
            response_if_base_value: if_outcome.base_value.clone(),
            response_if_base_type: if_outcome.base_type.clone(),
            response_else_outcome_identifier: else_outcome.identifier.clone(),
            response_else_base_value: else_outcome.base_value.clone(),
            response_else_base_type: else_outcome.base_type.clone(),
        }
    }
}

/// One flattened row: a question joined with one of its answer choices.
///
/// Serialized keys are identical to the published column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub adaptive: Option<String>,
    pub time_dependent: Option<String>,
    pub response_declaration_identifier: Option<String>,
    pub response_declaration_cardinality: Option<String>,
    pub response_declaration_base_type: Option<String>,
    pub correct_response_value: Option<String>,
    pub outcome_declaration_identifier: Option<String>,
    pub outcome_declaration_cardinality: Option<String>,
    pub outcome_declaration_base_type: Option<String>,
    pub response_identifier: Option<String>,
    pub shuffle: Option<String>,
    pub max_choices: Option<String>,
    pub question: Option<String>,
    pub choice_identifier: Option<String>,
    pub choice_text: Option<String>,
    pub response_if_variable_identifier: Option<String>,
    pub response_if_correct_identifier: Option<String>,
    pub response_if_outcome_identifier: Option<String>,
    pub response_if_base_value: Option<String>,
    pub response_if_base_type: Option<String>,
    pub response_else_outcome_identifier: Option<String>,
    pub response_else_base_value: Option<String>,
    pub response_else_base_type: Option<String>,
}

impl OutputRow {
    /// Copy of this row with the choice-derived fields cleared.
    ///
    /// Two rows of the same question compare equal under this projection.
    #[must_use]
    pub fn without_choice(&self) -> Self {
        Self {
            choice_identifier: None,
            choice_text: None,
            ..self.clone()
        }
    }
}

//! Field extraction: the mapping from a QTI question document to flat rows.
//!
//! The document is first read into a typed [`QuestionItem`]. Every required
//! node is resolved during that step, so a structural failure surfaces
//! before a single row exists and a document yields either all of its rows
//! or none.

use roxmltree::{Document, Node};

use crate::config::ASSESSMENT_ITEM_TAG;
use crate::error::ExtractError;
use crate::types::{
    AnswerChoice, ChoiceInteraction, ChoiceShape, ItemAttributes, MatchClause, OutcomeDeclaration,
    OutputRow, QuestionItem, ResponseDeclaration, ResponseElse, ResponseIf, SetOutcome,
};
use crate::xml::{
    element_children, find_by_path, find_child, find_children, get_attribute, get_tag_name, get_text,
    is_qti_element,
};

const RESPONSE_DECLARATION: &str = "responseDeclaration";
const CORRECT_RESPONSE_VALUE: &str = "responseDeclaration/correctResponse/value";
const OUTCOME_DECLARATION: &str = "outcomeDeclaration";
const CHOICE_INTERACTION: &str = "itemBody/choiceInteraction";
const PROMPT_TEXT: &str = "prompt/span";
const SIMPLE_CHOICE: &str = "simpleChoice";
const CHOICE_TEXT: &str = "span";
const RESPONSE_IF: &str = "responseProcessing/responseCondition/responseIf";
const RESPONSE_ELSE: &str = "responseProcessing/responseCondition/responseElse";
const MATCH_VARIABLE: &str = "match/variable";
const MATCH_CORRECT: &str = "match/correct";
const SET_OUTCOME_VALUE: &str = "setOutcomeValue";
const BASE_VALUE: &str = "baseValue";

type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Extract one row per answer choice from a question document.
///
/// # Arguments
/// * `doc` - Parsed question document
/// * `shape` - Markup shape carrying the choice texts
///
/// # Returns
/// Rows in choice order, or the first structural failure (and no rows)
pub fn extract(doc: &Document<'_>, shape: ChoiceShape) -> ExtractResult<Vec<OutputRow>> {
    Ok(parse_item(doc, shape)?.to_rows())
}

/// Read a question document into its typed form.
pub fn parse_item(doc: &Document<'_>, shape: ChoiceShape) -> ExtractResult<QuestionItem> {
    let root = item_root(doc)?;
    let at = NodePath::root(root);

    let response_node = at.require(RESPONSE_DECLARATION)?;
    let correct_node = at.require(CORRECT_RESPONSE_VALUE)?;
    let outcome_node = at.require(OUTCOME_DECLARATION)?;
    let interaction = at.descend(CHOICE_INTERACTION)?;
    let prompt_node = interaction.require(PROMPT_TEXT)?;
    let response_if = at.descend(RESPONSE_IF)?;
    let response_else = at.descend(RESPONSE_ELSE)?;

    Ok(QuestionItem {
        attributes: ItemAttributes {
            identifier: get_attribute(root, "identifier"),
            title: get_attribute(root, "title"),
            adaptive: get_attribute(root, "adaptive"),
            time_dependent: get_attribute(root, "timeDependent"),
        },
        response_declaration: ResponseDeclaration {
            identifier: get_attribute(response_node, "identifier"),
            cardinality: get_attribute(response_node, "cardinality"),
            base_type: get_attribute(response_node, "baseType"),
            correct_value: get_text(correct_node),
        },
        outcome_declaration: OutcomeDeclaration {
            identifier: get_attribute(outcome_node, "identifier"),
            cardinality: get_attribute(outcome_node, "cardinality"),
            base_type: get_attribute(outcome_node, "baseType"),
        },
        interaction: ChoiceInteraction {
            response_identifier: get_attribute(interaction.node, "responseIdentifier"),
            shuffle: get_attribute(interaction.node, "shuffle"),
            max_choices: get_attribute(interaction.node, "maxChoices"),
            prompt: get_text(prompt_node),
            choices: read_choices(&interaction, shape)?,
        },
        response_if: ResponseIf {
            condition: MatchClause {
                variable_identifier: get_attribute(
                    response_if.require(MATCH_VARIABLE)?,
                    "identifier",
                ),
                correct_identifier: get_attribute(
                    response_if.require(MATCH_CORRECT)?,
                    "identifier",
                ),
            },
            outcome: read_set_outcome(&response_if)?,
        },
        response_else: ResponseElse {
            outcome: read_set_outcome(&response_else)?,
        },
    })
}

/// Infer the choice shape from the document's own markup.
///
/// # Returns
/// * `Some(ChoiceShape::Standard)` if every choice wraps its text in a `<span>`
/// * `Some(ChoiceShape::TrueFalse)` if every choice carries bare text only
/// * `None` if there are no choices, or they disagree
pub fn detect_shape(doc: &Document<'_>) -> Option<ChoiceShape> {
    let root = item_root(doc).ok()?;
    let interaction = find_by_path(root, CHOICE_INTERACTION)?;
    let choices: Vec<_> = find_children(interaction, SIMPLE_CHOICE).collect();

    if choices.is_empty() {
        return None;
    }

    if choices.iter().all(|c| find_child(*c, CHOICE_TEXT).is_some()) {
        return Some(ChoiceShape::Standard);
    }

    let bare_text = |c: &Node<'_, '_>| {
        element_children(*c).next().is_none()
            && c.text().is_some_and(|t| !t.trim().is_empty())
    };
    if choices.iter().all(bare_text) {
        return Some(ChoiceShape::TrueFalse);
    }

    None
}

/// Validate the root element and return it.
fn item_root<'a, 'input>(doc: &'a Document<'input>) -> ExtractResult<Node<'a, 'input>> {
    let root = doc.root_element();
    if is_qti_element(root, ASSESSMENT_ITEM_TAG) {
        Ok(root)
    } else {
        Err(ExtractError::UnexpectedRoot {
            found: get_tag_name(root).to_string(),
        })
    }
}

fn read_choices(
    interaction: &NodePath<'_, '_>,
    shape: ChoiceShape,
) -> ExtractResult<Vec<AnswerChoice>> {
    find_children(interaction.node, SIMPLE_CHOICE)
        .map(|choice| -> ExtractResult<AnswerChoice> {
            let text = match shape {
                ChoiceShape::TrueFalse => get_text(choice),
                ChoiceShape::Standard => {
                    let span = find_child(choice, CHOICE_TEXT).ok_or_else(|| {
                        ExtractError::MissingElement {
                            path: format!("{}/{SIMPLE_CHOICE}/{CHOICE_TEXT}", interaction.path),
                        }
                    })?;
                    get_text(span)
                }
            };
            Ok(AnswerChoice::new(get_attribute(choice, "identifier"), text))
        })
        .collect()
}

fn read_set_outcome(branch: &NodePath<'_, '_>) -> ExtractResult<SetOutcome> {
    let action = branch.descend(SET_OUTCOME_VALUE)?;
    let value = action.require(BASE_VALUE)?;

    Ok(SetOutcome {
        identifier: get_attribute(action.node, "identifier"),
        base_value: get_text(value),
        base_type: get_attribute(value, "baseType"),
    })
}

/// A node together with its path from the document root, for error reporting.
struct NodePath<'a, 'input> {
    node: Node<'a, 'input>,
    path: String,
}

impl<'a, 'input> NodePath<'a, 'input> {
    fn root(node: Node<'a, 'input>) -> Self {
        Self {
            node,
            path: ASSESSMENT_ITEM_TAG.to_string(),
        }
    }

    /// Resolve a required relative path.
    fn require(&self, relative: &str) -> ExtractResult<Node<'a, 'input>> {
        find_by_path(self.node, relative).ok_or_else(|| ExtractError::MissingElement {
            path: format!("{}/{relative}", self.path),
        })
    }

    /// Resolve a required relative path, keeping track of where it led.
    fn descend(&self, relative: &str) -> ExtractResult<Self> {
        Ok(Self {
            node: self.require(relative)?,
            path: format!("{}/{relative}", self.path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STANDARD_ITEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"
    identifier="Q1" title="Geography" adaptive="false" timeDependent="false">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse>
      <value>A</value>
    </correctResponse>
  </responseDeclaration>
  <outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float"/>
  <itemBody>
    <choiceInteraction responseIdentifier="RESPONSE" shuffle="false" maxChoices="1">
      <prompt>
        <span>What is the capital of France?</span>
      </prompt>
      <simpleChoice identifier="A">
        <span>Paris</span>
      </simpleChoice>
      <simpleChoice identifier="B">
        <span>London</span>
      </simpleChoice>
    </choiceInteraction>
  </itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <match>
          <variable identifier="RESPONSE"/>
          <correct identifier="A"/>
        </match>
        <setOutcomeValue identifier="SCORE">
          <baseValue baseType="float">1</baseValue>
        </setOutcomeValue>
      </responseIf>
      <responseElse>
        <setOutcomeValue identifier="SCORE">
          <baseValue baseType="float">0</baseValue>
        </setOutcomeValue>
      </responseElse>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

    const TRUE_FALSE_ITEM: &str = r#"<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"
    identifier="Q2" title="Facts" adaptive="false" timeDependent="false">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse><value>T</value></correctResponse>
  </responseDeclaration>
  <outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float"/>
  <itemBody>
    <choiceInteraction responseIdentifier="RESPONSE" shuffle="false" maxChoices="1">
      <prompt><span>Water boils at 100 degrees Celsius at sea level.</span></prompt>
      <simpleChoice identifier="T">True</simpleChoice>
      <simpleChoice identifier="F">False</simpleChoice>
    </choiceInteraction>
  </itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <match><variable identifier="RESPONSE"/><correct identifier="RESPONSE"/></match>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">1</baseValue></setOutcomeValue>
      </responseIf>
      <responseElse>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">0</baseValue></setOutcomeValue>
      </responseElse>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

    fn missing_path(xml: &str, shape: ChoiceShape) -> String {
        let doc = Document::parse(xml).unwrap();
        match extract(&doc, shape).unwrap_err() {
            ExtractError::MissingElement { path } => path,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_geography_scenario() {
        let doc = Document::parse(STANDARD_ITEM).unwrap();
        let rows = extract(&doc, ChoiceShape::Standard).unwrap();

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.identifier.as_deref(), Some("Q1"));
            assert_eq!(row.title.as_deref(), Some("Geography"));
            assert_eq!(row.response_if_correct_identifier.as_deref(), Some("A"));
            assert_eq!(row.response_if_variable_identifier.as_deref(), Some("RESPONSE"));
        }
        assert_eq!(rows[0].choice_identifier.as_deref(), Some("A"));
        assert_eq!(rows[0].choice_text.as_deref(), Some("Paris"));
        assert_eq!(rows[1].choice_identifier.as_deref(), Some("B"));
        assert_eq!(rows[1].choice_text.as_deref(), Some("London"));
        assert_eq!(rows[0].without_choice(), rows[1].without_choice());
    }

    #[test]
    fn test_colliding_attributes_land_in_distinct_fields() {
        let doc = Document::parse(STANDARD_ITEM).unwrap();
        let row = extract(&doc, ChoiceShape::Standard).unwrap().remove(0);

        let expected = OutputRow {
            identifier: Some("Q1".into()),
            title: Some("Geography".into()),
            adaptive: Some("false".into()),
            time_dependent: Some("false".into()),
            response_declaration_identifier: Some("RESPONSE".into()),
            response_declaration_cardinality: Some("single".into()),
            response_declaration_base_type: Some("identifier".into()),
            correct_response_value: Some("A".into()),
            outcome_declaration_identifier: Some("SCORE".into()),
            outcome_declaration_cardinality: Some("single".into()),
            outcome_declaration_base_type: Some("float".into()),
            response_identifier: Some("RESPONSE".into()),
            shuffle: Some("false".into()),
            max_choices: Some("1".into()),
            question: Some("What is the capital of France?".into()),
            choice_identifier: Some("A".into()),
            choice_text: Some("Paris".into()),
            response_if_variable_identifier: Some("RESPONSE".into()),
            response_if_correct_identifier: Some("A".into()),
            response_if_outcome_identifier: Some("SCORE".into()),
            response_if_base_value: Some("1".into()),
            response_if_base_type: Some("float".into()),
            response_else_outcome_identifier: Some("SCORE".into()),
            response_else_base_value: Some("0".into()),
            response_else_base_type: Some("float".into()),
        };
        assert_eq!(row, expected);
    }

    #[test]
    fn test_true_false_reads_direct_text() {
        let doc = Document::parse(TRUE_FALSE_ITEM).unwrap();
        let rows = extract(&doc, ChoiceShape::TrueFalse).unwrap();

        let texts: Vec<_> = rows.iter().map(|r| r.choice_text.as_deref()).collect();
        assert_eq!(texts, vec![Some("True"), Some("False")]);
        assert_eq!(rows[0].correct_response_value.as_deref(), Some("T"));
    }

    #[test]
    fn test_shapes_are_not_interchangeable() {
        // Standard markup read as true/false yields only layout whitespace.
        let doc = Document::parse(STANDARD_ITEM).unwrap();
        let rows = extract(&doc, ChoiceShape::TrueFalse).unwrap();
        assert!(rows
            .iter()
            .all(|r| r.choice_text.as_deref().map_or(true, |t| t.trim().is_empty())));

        // True/false markup read as standard has no span to read.
        let path = missing_path(TRUE_FALSE_ITEM, ChoiceShape::Standard);
        assert_eq!(path, "assessmentItem/itemBody/choiceInteraction/simpleChoice/span");
    }

    /// Cut the first element opened by `open` and closed by `close`.
    fn remove_element(xml: &str, open: &str, close: &str) -> String {
        let start = xml.find(open).unwrap();
        let end = xml[start..].find(close).unwrap() + start + close.len();
        format!("{}{}", &xml[..start], &xml[end..])
    }

    #[test]
    fn test_missing_response_declaration() {
        let xml = remove_element(STANDARD_ITEM, "<responseDeclaration", "</responseDeclaration>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/responseDeclaration"
        );
    }

    #[test]
    fn test_missing_outcome_declaration() {
        let xml = remove_element(STANDARD_ITEM, "<outcomeDeclaration", "/>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/outcomeDeclaration"
        );
    }

    #[test]
    fn test_missing_choice_interaction() {
        let xml = remove_element(STANDARD_ITEM, "<choiceInteraction", "</choiceInteraction>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/itemBody/choiceInteraction"
        );
    }

    #[test]
    fn test_missing_prompt_span() {
        let xml = remove_element(STANDARD_ITEM, "<span>What is", "</span>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/itemBody/choiceInteraction/prompt/span"
        );
    }

    #[test]
    fn test_missing_response_if() {
        let xml = remove_element(STANDARD_ITEM, "<responseIf>", "</responseIf>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/responseProcessing/responseCondition/responseIf"
        );
    }

    #[test]
    fn test_missing_response_else() {
        let xml = remove_element(STANDARD_ITEM, "<responseElse>", "</responseElse>");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/responseProcessing/responseCondition/responseElse"
        );
    }

    #[test]
    fn test_missing_match_clause() {
        let xml = STANDARD_ITEM.replace(r#"<correct identifier="A"/>"#, "");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/responseProcessing/responseCondition/responseIf/match/correct"
        );
    }

    #[test]
    fn test_missing_base_value() {
        let xml = STANDARD_ITEM.replace(r#"<baseValue baseType="float">0</baseValue>"#, "");
        assert_eq!(
            missing_path(&xml, ChoiceShape::Standard),
            "assessmentItem/responseProcessing/responseCondition/responseElse/setOutcomeValue/baseValue"
        );
    }

    #[test]
    fn test_missing_attributes_become_empty_fields() {
        let xml = STANDARD_ITEM
            .replace(r#" adaptive="false""#, "")
            .replace(r#" shuffle="false""#, "");
        let doc = Document::parse(&xml).unwrap();
        let rows = extract(&doc, ChoiceShape::Standard).unwrap();
        assert_eq!(rows[0].adaptive, None);
        assert_eq!(rows[0].shuffle, None);
        assert_eq!(rows[0].time_dependent.as_deref(), Some("false"));
    }

    #[test]
    fn test_foreign_namespace_is_rejected() {
        let xml = STANDARD_ITEM.replace(
            "http://www.imsglobal.org/xsd/imsqti_v2p1",
            "http://www.imsglobal.org/xsd/imsqti_v2p2",
        );
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(
            extract(&doc, ChoiceShape::Standard).unwrap_err(),
            ExtractError::UnexpectedRoot {
                found: "assessmentItem".to_string()
            }
        );
    }

    #[test]
    fn test_interaction_without_choices_yields_no_rows() {
        let xml = remove_element(STANDARD_ITEM, "<simpleChoice", "</simpleChoice>");
        let xml = remove_element(&xml, "<simpleChoice", "</simpleChoice>");
        let doc = Document::parse(&xml).unwrap();
        assert!(extract(&doc, ChoiceShape::Standard).unwrap().is_empty());
    }

    #[test]
    fn test_detect_shape() {
        let standard = Document::parse(STANDARD_ITEM).unwrap();
        assert_eq!(detect_shape(&standard), Some(ChoiceShape::Standard));

        let true_false = Document::parse(TRUE_FALSE_ITEM).unwrap();
        assert_eq!(detect_shape(&true_false), Some(ChoiceShape::TrueFalse));
    }

    #[test]
    fn test_detect_shape_ambiguous() {
        let mixed = TRUE_FALSE_ITEM.replace(
            r#"<simpleChoice identifier="F">False</simpleChoice>"#,
            r#"<simpleChoice identifier="F"><span>False</span></simpleChoice>"#,
        );
        let doc = Document::parse(&mixed).unwrap();
        assert_eq!(detect_shape(&doc), None);
    }
}

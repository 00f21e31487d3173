//! Namespace-aware helpers for navigating QTI DOM trees.
//!
//! Every lookup matches both the local name and the QTI 2.1 namespace, so an
//! element from a foreign namespace never satisfies a required path.

use roxmltree::Node;

use crate::config::QTI_NAMESPACE;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use qtisheet_converter::xml::get_tag_name;
///
/// let xml = r#"<q:item xmlns:q="http://www.imsglobal.org/xsd/imsqti_v2p1"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "item");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is a QTI element with the given local name.
pub fn is_qti_element(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(QTI_NAMESPACE)
        && get_tag_name(node) == tag
}

/// Find the first QTI child element with the given local name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use qtisheet_converter::xml::find_child;
///
/// let xml = r#"<item xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"><itemBody/></item>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_child(doc.root_element(), "itemBody").is_some());
/// assert!(find_child(doc.root_element(), "missing").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_qti_element(*child, tag))
}

/// Find all QTI child elements with the given local name, in document order.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| is_qti_element(*child, tag))
}

/// Find a descendant element matching a slash-separated path of QTI tag names.
///
/// The first matching child is taken at every step.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use qtisheet_converter::xml::find_by_path;
///
/// let xml = r#"<item xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1">
///   <responseDeclaration><correctResponse><value>A</value></correctResponse></responseDeclaration>
/// </item>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let value = find_by_path(doc.root_element(), "responseDeclaration/correctResponse/value");
/// assert_eq!(value.unwrap().text(), Some("A"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/')
        .try_fold(node, |current, part| find_child(current, part))
}

/// Get the direct text of a node, verbatim.
///
/// Only the text before the first child element counts, matching how the
/// question text of a choice is laid out by the exporting tool.
pub fn get_text(node: Node<'_, '_>) -> Option<String> {
    node.text().map(str::to_string)
}

/// Get an attribute value from a node as an owned string.
pub fn get_attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// Get all element children of a node.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const NS: &str = "http://www.imsglobal.org/xsd/imsqti_v2p1";

    #[test]
    fn test_get_tag_name_with_namespace() {
        let xml = format!(r#"<ns:root xmlns:ns="{NS}"><ns:child/></ns:root>"#);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(get_tag_name(doc.root_element()), "root");
    }

    #[test]
    fn test_find_child_requires_qti_namespace() {
        let xml = format!(r#"<root xmlns="{NS}" xmlns:o="urn:other"><o:a/><b/></root>"#);
        let doc = Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert!(find_child(root, "a").is_none());
        assert!(find_child(root, "b").is_some());
    }

    #[test]
    fn test_find_child_without_namespace() {
        let xml = r#"<root><a/></root>"#;
        let doc = Document::parse(xml).unwrap();
        assert!(find_child(doc.root_element(), "a").is_none());
    }

    #[test]
    fn test_find_children_in_order() {
        let xml = format!(
            r#"<root xmlns="{NS}"><item id="1"/><other/><item id="2"/></root>"#
        );
        let doc = Document::parse(&xml).unwrap();

        let ids: Vec<_> = find_children(doc.root_element(), "item")
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_find_by_path() {
        let xml = format!(
            r#"<root xmlns="{NS}"><level1><level2><target>found</target></level2></level1></root>"#
        );
        let doc = Document::parse(&xml).unwrap();
        let root = doc.root_element();

        let target = find_by_path(root, "level1/level2/target").unwrap();
        assert_eq!(get_text(target).as_deref(), Some("found"));
        assert!(find_by_path(root, "level1/missing").is_none());
    }

    #[test]
    fn test_get_text_is_verbatim_and_direct() {
        let xml = format!(r#"<root xmlns="{NS}">  padded <span>inner</span></root>"#);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(get_text(doc.root_element()).as_deref(), Some("  padded "));

        let xml = format!(r#"<root xmlns="{NS}"><span>inner</span></root>"#);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(get_text(doc.root_element()), None);
    }

    #[test]
    fn test_get_attribute() {
        let xml = r#"<root attr="value"/>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();

        assert_eq!(get_attribute(root, "attr").as_deref(), Some("value"));
        assert_eq!(get_attribute(root, "missing"), None);
    }

    #[test]
    fn test_element_children() {
        let xml = r#"<root>text<child1/>more<child2/></root>"#;
        let doc = Document::parse(xml).unwrap();

        assert_eq!(element_children(doc.root_element()).count(), 2);
    }
}

//! Template parsing for the HTL compiler.
//!
//! Provides the minifier pre-pass, attribute-casing preservation and the
//! html5ever-backed conversion from raw markup to the `Node` tree consumed by
//! the directive compiler.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::collections::HashMap;

use crate::validate::{Attribute, CompilerError, ElementNode, Node, TextNode, ERR_PARSE};

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref INTER_TAG_WS_RE: Regex = Regex::new(r">\s+<").unwrap();

    /// Open tags, for the attribute-casing scan.
    static ref OPEN_TAG_RE: Regex = Regex::new(r"<[a-zA-Z][^>]*").unwrap();

    /// Attribute names inside an open tag, with or without a value.
    static ref ATTR_NAME_RE: Regex =
        Regex::new(r#"\s([a-zA-Z_][\w.:-]*)(?:=(?:"[^"]*"|'[^']*'|[^>\s]+))?"#).unwrap();

    /// Self-closing transparent wrappers. html5ever ignores the trailing slash
    /// on unknown elements, which would swallow following siblings as children.
    static ref SELF_CLOSING_SLY_RE: Regex = Regex::new(r"(?i)<sly\b([^>]*?)\s*/>").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// MINIFIER PRE-PASS
// ═══════════════════════════════════════════════════════════════════════════════

/// Normalize markup before parsing: strip comments, collapse the whitespace
/// runs between tags and trim the document ends. The compile pass requires its
/// input in this form.
pub fn minify(html: &str) -> String {
    let stripped = COMMENT_RE.replace_all(html, "");
    let collapsed = INTER_TAG_WS_RE.replace_all(&stripped, "><");
    collapsed.trim().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE CASING
// ═══════════════════════════════════════════════════════════════════════════════

/// html5ever lowercases attribute names, but directive identifiers are case
/// sensitive (`data-sly-use.heroModel`). Scan the raw markup for the original
/// spellings so they can be restored after parsing. First spelling wins.
fn collect_attr_casing(html: &str) -> HashMap<String, String> {
    let mut casing = HashMap::new();
    for tag in OPEN_TAG_RE.find_iter(html) {
        for caps in ATTR_NAME_RE.captures_iter(tag.as_str()) {
            let original = caps.get(1).unwrap().as_str();
            let lower = original.to_lowercase();
            if lower != original {
                casing.entry(lower).or_insert_with(|| original.to_string());
            }
        }
    }
    casing
}

fn restore_attr_case(name: &str, casing: &HashMap<String, String>) -> String {
    casing
        .get(name)
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOM CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

fn convert_dom_node(handle: &Handle, casing: &HashMap<String, String>) -> Vec<Node> {
    let node = handle;

    match &node.data {
        NodeData::Document => {
            let mut nodes = Vec::new();
            for child in node.children.borrow().iter() {
                nodes.extend(convert_dom_node(child, casing));
            }
            nodes
        }

        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                // Residual indentation must not become JSX children.
                vec![]
            } else {
                vec![Node::Text(TextNode { content: text })]
            }
        }

        NodeData::Element { name, attrs, .. } => {
            let tag_name = name.local.to_string();

            let mut attributes = Vec::new();
            for attr in attrs.borrow().iter() {
                attributes.push(Attribute {
                    name: restore_attr_case(&attr.name.local.to_string(), casing),
                    value: attr.value.to_string(),
                });
            }

            let mut children = Vec::new();
            for child in node.children.borrow().iter() {
                children.extend(convert_dom_node(child, casing));
            }

            vec![Node::Element(ElementNode {
                name: tag_name,
                attributes,
                children,
            })]
        }

        NodeData::Comment { .. } => vec![],
        NodeData::Doctype { .. } => vec![],
        NodeData::ProcessingInstruction { .. } => vec![],
    }
}

/// Collect template content while flattening the html/head/body wrappers that
/// html5ever synthesizes around fragment input. Wrappers present in the source
/// itself are kept.
fn collect_template_content(
    handle: &Handle,
    nodes: &mut Vec<Node>,
    casing: &HashMap<String, String>,
    has_html_in_src: bool,
) {
    let node = handle;
    match &node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                collect_template_content(child, nodes, casing, has_html_in_src);
            }
        }
        NodeData::Element { name, .. } => {
            let tag = name.local.to_string().to_lowercase();
            let is_wrapper = tag == "html" || tag == "head" || tag == "body";

            if (is_wrapper && !has_html_in_src) || tag == "html" {
                for child in node.children.borrow().iter() {
                    collect_template_content(child, nodes, casing, has_html_in_src);
                }
            } else {
                nodes.extend(convert_dom_node(handle, casing));
            }
        }
        NodeData::Text { .. } => {
            nodes.extend(convert_dom_node(handle, casing));
        }
        _ => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse pre-minified HTL markup into the template node tree, in document
/// order with attribute declaration order preserved.
pub fn parse_template(html: &str, file_path: &str) -> Result<Vec<Node>, CompilerError> {
    let casing = collect_attr_casing(html);

    let html_closed = SELF_CLOSING_SLY_RE.replace_all(html, "<sly$1></sly>");

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html_closed.as_bytes())
        .map_err(|e| {
            CompilerError::new(
                ERR_PARSE,
                &format!("failed to parse HTML: {}", e),
                file_path,
            )
        })?;

    let has_html_in_src = html.to_lowercase().contains("<html");

    let mut nodes = Vec::new();
    collect_template_content(&dom.document, &mut nodes, &casing, has_html_in_src);
    Ok(nodes)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_strips_comments_and_inter_tag_whitespace() {
        let html = "<div>\n  <!-- note -->\n  <span>Hi</span>\n</div>\n";
        assert_eq!(minify(html), "<div><span>Hi</span></div>");
    }

    #[test]
    fn test_minify_keeps_text_content() {
        let html = "  <p>Hello world</p>  ";
        assert_eq!(minify(html), "<p>Hello world</p>");
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let nodes = parse_template("<div><a>1</a><b>2</b></div>", "t.html").unwrap();
        assert_eq!(nodes.len(), 1);
        let Node::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.name, "div");
        assert_eq!(div.children.len(), 2);
        let Node::Element(first) = &div.children[0] else {
            panic!("expected element");
        };
        assert_eq!(first.name, "a");
    }

    #[test]
    fn test_parse_preserves_attribute_order() {
        let nodes =
            parse_template(r#"<div id="x" data-sly-test="${a}" class="c"></div>"#, "t.html")
                .unwrap();
        let Node::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        let names: Vec<&str> = div.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "data-sly-test", "class"]);
    }

    #[test]
    fn test_attribute_casing_is_restored() {
        let nodes = parse_template(
            r#"<div data-sly-use.heroModel="com.acme.Hero"></div>"#,
            "t.html",
        )
        .unwrap();
        let Node::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.attributes[0].name, "data-sly-use.heroModel");
    }

    #[test]
    fn test_implicit_wrappers_are_flattened() {
        let nodes = parse_template("<span>Hi</span>", "t.html").unwrap();
        assert_eq!(nodes.len(), 1);
        let Node::Element(span) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(span.name, "span");
    }

    #[test]
    fn test_self_closing_sly_does_not_swallow_siblings() {
        let nodes =
            parse_template(r#"<sly data-sly-use.m="a.b.M"/><div>after</div>"#, "t.html").unwrap();
        assert_eq!(nodes.len(), 2);
        let Node::Element(sly) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(sly.name, "sly");
        assert!(sly.children.is_empty());
    }

    #[test]
    fn test_whitespace_only_text_nodes_are_dropped() {
        let nodes = parse_template("<div> <span>Hi</span> </div>", "t.html").unwrap();
        let Node::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn test_dollar_expressions_survive_parsing() {
        let nodes = parse_template("<div>${entry.title}</div>", "t.html").unwrap();
        let Node::Element(div) = &nodes[0] else {
            panic!("expected element");
        };
        let Node::Text(text) = &div.children[0] else {
            panic!("expected text");
        };
        assert_eq!(text.content, "${entry.title}");
    }
}

//! A lightweight SVG markup reader.
//!
//! Builds the generic node tree from SVG text: nested elements,
//! self-closing tags, comments, CDATA, processing instructions, and the
//! predefined entities. Full XML (namespaces beyond the default, DTD
//! internal subsets) is the job of an external parser; this reader covers
//! the markup SVG documents actually contain.

use crate::node::{Document, Node, NodeKind};
use crate::DomError;
use std::rc::Rc;
use tracing::{debug, warn};

/// Parse SVG markup into a [`Document`].
pub fn parse_svg_document(text: &str) -> Result<Document, DomError> {
    let doc = Document::new();
    let bytes = text.as_bytes();
    let mut pos = 0usize;
    let mut stack = vec![doc.root().clone()];

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            if text[pos..].starts_with("<!--") {
                let end = text[pos..]
                    .find("-->")
                    .ok_or_else(|| DomError::Syntax("unterminated comment".into()))?;
                let content = &text[pos + 4..pos + end];
                let node = doc.create_node(NodeKind::Comment(content.to_string()));
                open_parent(&stack)?.append_child(node);
                pos += end + 3;
            } else if text[pos..].starts_with("<![CDATA[") {
                let end = text[pos..]
                    .find("]]>")
                    .ok_or_else(|| DomError::Syntax("unterminated CDATA section".into()))?;
                let content = &text[pos + 9..pos + end];
                let node = doc.create_node(NodeKind::Cdata(content.to_string()));
                open_parent(&stack)?.append_child(node);
                pos += end + 3;
            } else if text[pos..].starts_with("<?") {
                let end = text[pos..]
                    .find("?>")
                    .ok_or_else(|| DomError::Syntax("unterminated processing instruction".into()))?;
                let inner = &text[pos + 2..pos + end];
                let (target, data) = match inner.find(char::is_whitespace) {
                    Some(split) => (&inner[..split], inner[split..].trim_start()),
                    None => (inner, ""),
                };
                let node = doc.create_node(NodeKind::ProcessingInstruction {
                    target: target.to_string(),
                    data: data.to_string(),
                });
                open_parent(&stack)?.append_child(node);
                pos += end + 2;
            } else if text[pos..].starts_with("<!") {
                // Doctype declarations are skipped.
                let end = text[pos..]
                    .find('>')
                    .ok_or_else(|| DomError::Syntax("unterminated doctype".into()))?;
                pos += end + 1;
            } else if text[pos..].starts_with("</") {
                let end = text[pos..]
                    .find('>')
                    .ok_or_else(|| DomError::Syntax("unterminated closing tag".into()))?;
                let name = text[pos + 2..pos + end].trim();
                stack
                    .pop()
                    .filter(|node| node.tag_name() == Some(name))
                    .ok_or_else(|| {
                        DomError::Syntax(format!("mismatched closing tag '</{name}>'"))
                    })?;
                pos += end + 1;
            } else {
                let (node, consumed, self_closing) = parse_open_tag(&doc, &text[pos..])?;
                open_parent(&stack)?.append_child(node.clone());
                if !self_closing {
                    stack.push(node);
                }
                pos += consumed;
            }
        } else {
            let end = text[pos..].find('<').unwrap_or(text.len() - pos);
            let raw = &text[pos..pos + end];
            if !raw.trim().is_empty() {
                let node = doc.create_node(NodeKind::Text(decode_entities(raw)?));
                open_parent(&stack)?.append_child(node);
            }
            pos += end;
        }
    }

    if stack.len() != 1 {
        let open = stack
            .last()
            .and_then(|node| node.tag_name().map(str::to_string))
            .unwrap_or_default();
        return Err(DomError::Syntax(format!("unclosed element '<{open}>'")));
    }

    match doc.document_element() {
        Some(root) if root.tag_name() == Some("svg") => {}
        Some(root) => warn!(root = root.tag_name(), "document root is not <svg>"),
        None => return Err(DomError::Syntax("no root element".into())),
    }

    doc.index_ids();
    debug!(
        nodes = doc.root().children().len(),
        "parsed SVG document"
    );
    Ok(doc)
}

/// The innermost open element (or the document root).
fn open_parent(stack: &[Rc<Node>]) -> Result<&Rc<Node>, DomError> {
    stack
        .last()
        .ok_or_else(|| DomError::Syntax("unbalanced markup".into()))
}

/// Parse one opening tag starting at `<`. Returns the element, the byte
/// count consumed, and whether the tag was self-closing.
fn parse_open_tag(doc: &Document, text: &str) -> Result<(Rc<Node>, usize, bool), DomError> {
    let close = text
        .find('>')
        .ok_or_else(|| DomError::Syntax("unterminated tag".into()))?;
    let self_closing = text[..close].ends_with('/');
    let inner_end = if self_closing { close - 1 } else { close };
    let inner = &text[1..inner_end];

    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return Err(DomError::Syntax("empty tag name".into()));
    }

    let element = doc.create_element(name)?;

    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let (attr_name, attr_value, remainder) = parse_attribute(rest)?;
        element.set_attribute(attr_name, &decode_entities(attr_value)?)?;
        rest = remainder.trim_start();
    }

    Ok((element, close + 1, self_closing))
}

/// Parse one `name="value"` attribute, returning the remainder.
fn parse_attribute(text: &str) -> Result<(&str, &str, &str), DomError> {
    let eq = text
        .find('=')
        .ok_or_else(|| DomError::Syntax(format!("attribute without value near '{text}'")))?;
    let name = text[..eq].trim();

    let rest = text[eq + 1..].trim_start();
    let quote = rest
        .chars()
        .next()
        .filter(|&c| c == '"' || c == '\'')
        .ok_or_else(|| DomError::Syntax(format!("unquoted attribute value for '{name}'")))?;
    let value_end = rest[1..]
        .find(quote)
        .ok_or_else(|| DomError::Syntax(format!("unterminated value for '{name}'")))?;

    Ok((name, &rest[1..1 + value_end], &rest[value_end + 2..]))
}

/// Decode the predefined XML entities and numeric character references.
fn decode_entities(text: &str) -> Result<String, DomError> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail
            .find(';')
            .ok_or_else(|| DomError::Syntax(format!("unterminated entity near '{tail}'")))?;
        let entity = &tail[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                let code = u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| DomError::Syntax(format!("bad character reference '&{entity};'")))?;
                out.push(code);
            }
            _ if entity.starts_with('#') => {
                let code = entity[1..]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| DomError::Syntax(format!("bad character reference '&{entity};'")))?;
                out.push(code);
            }
            _ => {
                return Err(DomError::Syntax(format!("unknown entity '&{entity};'")));
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let doc = Document::parse_svg(
            r#"<svg viewBox="0 0 100 100">
                 <g transform="translate(10,10)">
                   <rect x="1" y="2" width="3" height="4"/>
                 </g>
               </svg>"#,
        )
        .unwrap();

        let svg = doc.document_element().unwrap();
        assert_eq!(svg.tag_name(), Some("svg"));
        assert_eq!(svg.get_attribute("viewBox").as_deref(), Some("0 0 100 100"));

        let g = svg.element_children()[0].clone();
        assert_eq!(g.tag_name(), Some("g"));
        let rect = g.element_children()[0].clone();
        assert_eq!(rect.get_attribute("width").as_deref(), Some("3"));
    }

    #[test]
    fn test_comments_cdata_and_text() {
        let doc = Document::parse_svg(
            "<svg><!-- note --><text>hi &amp; bye</text><style><![CDATA[a<b]]></style></svg>",
        )
        .unwrap();
        let svg = doc.document_element().unwrap();
        let text = doc.nodes_by_tag_name("text")[0].clone();
        assert_eq!(text.text_content(), "hi & bye");
        let style = doc.nodes_by_tag_name("style")[0].clone();
        assert_eq!(style.text_content(), "a<b");
        assert_eq!(svg.children().len(), 3);
    }

    #[test]
    fn test_prolog_and_doctype_skipped() {
        let doc = Document::parse_svg(
            "<?xml version=\"1.0\"?><!DOCTYPE svg><svg width=\"10\" height=\"10\"/>",
        )
        .unwrap();
        assert_eq!(doc.document_element().unwrap().tag_name(), Some("svg"));
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("a&#65;&#x42;").unwrap(), "aAB");
        assert!(decode_entities("&bogus;").is_err());
        assert!(decode_entities("&#xzz;").is_err());
    }

    #[test]
    fn test_mismatched_tags_rejected() {
        assert!(matches!(
            Document::parse_svg("<svg><g></svg>"),
            Err(DomError::Syntax(_))
        ));
        assert!(matches!(
            Document::parse_svg("<svg><g></g>"),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_unquoted_attribute_rejected() {
        assert!(matches!(
            Document::parse_svg("<svg width=10/>"),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_ids_indexed_after_parse() {
        let doc = Document::parse_svg(
            r##"<svg><defs><linearGradient id="fade"/></defs><rect fill="url(#fade)"/></svg>"##,
        )
        .unwrap();
        assert!(doc.get_element_by_id("fade").is_some());
    }
}

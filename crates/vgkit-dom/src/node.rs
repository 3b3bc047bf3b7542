//! The generic XML node tree underlying the SVG element layer.

use crate::DomError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::debug;
use url::Url;

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element { tag_name: String, namespace: String },
    Text(String),
    Cdata(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

/// A DOM node.
///
/// Attribute writes go through [`Node::set_attribute`], which bumps a
/// generation counter; cached parsed values stamped with an older
/// generation re-parse on next access.
#[derive(Debug)]
pub struct Node {
    /// Unique ID for this node.
    pub id: NodeId,
    /// Node type and associated data.
    pub kind: NodeKind,
    /// Raw string attributes (element nodes only).
    attributes: RefCell<HashMap<String, String>>,
    /// Bumped on every attribute change.
    attr_generation: Cell<u64>,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<Node>>>,
    /// Previous sibling.
    prev_sibling: RefCell<Option<Weak<Node>>>,
    /// Next sibling.
    next_sibling: RefCell<Option<Weak<Node>>>,
}

impl Node {
    /// Create a new node.
    pub fn new(id: NodeId, kind: NodeKind) -> Rc<Self> {
        Rc::new(Self {
            id,
            kind,
            attributes: RefCell::new(HashMap::new()),
            attr_generation: Cell::new(0),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            prev_sibling: RefCell::new(None),
            next_sibling: RefCell::new(None),
        })
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_) | NodeKind::Cdata(_))
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().contains_key(name)
    }

    /// Snapshot of all attributes.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.attributes
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Set an attribute, notifying attribute-change listeners by bumping
    /// the generation counter.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        if !self.is_element() {
            return Err(DomError::InvalidModification(
                "attributes only exist on element nodes".into(),
            ));
        }
        validate_name(name)?;
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self.handle_attribute_change(name);
        Ok(())
    }

    /// Remove an attribute; removing an absent attribute is a no-op.
    pub fn remove_attribute(&self, name: &str) {
        if self.attributes.borrow_mut().remove(name).is_some() {
            self.handle_attribute_change(name);
        }
    }

    fn handle_attribute_change(&self, name: &str) {
        self.attr_generation.set(self.attr_generation.get() + 1);
        debug!(
            node = self.id.raw(),
            attribute = name,
            generation = self.attr_generation.get(),
            "attribute changed"
        );
    }

    /// The current attribute generation; cached parsed values are stamped
    /// with this and re-parse when it moves.
    pub fn attribute_generation(&self) -> u64 {
        self.attr_generation.get()
    }

    /// Get the text content of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.kind {
            NodeKind::Text(text) | NodeKind::Cdata(text) => result.push_str(text),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    /// Get element children only.
    pub fn element_children(&self) -> Vec<Rc<Node>> {
        self.children
            .borrow()
            .iter()
            .filter(|c| c.is_element())
            .cloned()
            .collect()
    }

    /// Get first child.
    pub fn first_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().first().cloned()
    }

    /// Get last child.
    pub fn last_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().last().cloned()
    }

    /// Get previous sibling.
    pub fn previous_sibling(&self) -> Option<Rc<Node>> {
        self.prev_sibling.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get next sibling.
    pub fn next_sibling(&self) -> Option<Rc<Node>> {
        self.next_sibling.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Append a child node.
    pub fn append_child(self: &Rc<Self>, child: Rc<Node>) {
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));

        if let Some(last) = self.last_child() {
            *last.next_sibling.borrow_mut() = Some(Rc::downgrade(&child));
            *child.prev_sibling.borrow_mut() = Some(Rc::downgrade(&last));
        }

        self.children.borrow_mut().push(child);
    }
}

/// XML name validation: rejects names the serializer could not emit.
fn validate_name(name: &str) -> Result<(), DomError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(name.to_string()))
    }
}

/// A complete DOM document.
pub struct Document {
    /// Root node of the document.
    root: Rc<Node>,
    /// All nodes indexed by ID.
    nodes: RefCell<HashMap<NodeId, Rc<Node>>>,
    /// Elements indexed by ID attribute.
    elements_by_id: RefCell<HashMap<String, Rc<Node>>>,
    /// Base URL for resolving references.
    base_url: Option<Url>,
    /// Next node ID.
    next_id: Cell<usize>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        let root = Node::new(NodeId::new(0), NodeKind::Document);
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::new(0), root.clone());

        Self {
            root,
            nodes: RefCell::new(nodes),
            elements_by_id: RefCell::new(HashMap::new()),
            base_url: None,
            next_id: Cell::new(1),
        }
    }

    /// Parse SVG markup into a document.
    pub fn parse_svg(text: &str) -> Result<Self, DomError> {
        crate::reader::parse_svg_document(text)
    }

    /// The document root node.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// The outermost element (the `<svg>` root for SVG documents).
    pub fn document_element(&self) -> Option<Rc<Node>> {
        self.root
            .children()
            .into_iter()
            .find(|child| child.is_element())
    }

    fn allocate_id(&self) -> NodeId {
        let id = NodeId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        id
    }

    /// Create a new element owned by this document.
    pub fn create_element(&self, tag_name: &str) -> Result<Rc<Node>, DomError> {
        validate_name(tag_name)?;
        let node = Node::new(
            self.allocate_id(),
            NodeKind::Element {
                tag_name: tag_name.to_string(),
                namespace: "http://www.w3.org/2000/svg".to_string(),
            },
        );
        self.nodes.borrow_mut().insert(node.id, node.clone());
        Ok(node)
    }

    /// Create a text node owned by this document.
    pub fn create_text(&self, content: &str) -> Rc<Node> {
        let node = Node::new(self.allocate_id(), NodeKind::Text(content.to_string()));
        self.nodes.borrow_mut().insert(node.id, node.clone());
        node
    }

    /// Create a node of an arbitrary kind owned by this document.
    pub(crate) fn create_node(&self, kind: NodeKind) -> Rc<Node> {
        let node = Node::new(self.allocate_id(), kind);
        self.nodes.borrow_mut().insert(node.id, node.clone());
        node
    }

    /// Look a node up by its arena ID.
    pub fn get_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.nodes.borrow().get(&id).cloned()
    }

    /// Look an element up by its `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        self.elements_by_id.borrow().get(id).cloned()
    }

    /// All elements with the given tag name, in document order.
    pub fn nodes_by_tag_name(&self, tag_name: &str) -> Vec<Rc<Node>> {
        let mut out = Vec::new();
        collect_by_tag(&self.root, tag_name, &mut out);
        out
    }

    /// Rebuild the `id` attribute index by walking the tree.
    pub fn index_ids(&self) {
        let mut index = HashMap::new();
        index_ids_recursive(&self.root, &mut index);
        *self.elements_by_id.borrow_mut() = index;
    }

    /// Set the base URL used to resolve references.
    pub fn set_base_url(&mut self, base: Url) {
        self.base_url = Some(base);
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve a reference against the document base URL.
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        match &self.base_url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }

    /// Extract the local fragment of a same-document reference, from
    /// either `#id` or `url(#id)` notation.
    pub fn local_fragment(href: &str) -> Option<&str> {
        let href = href.trim();
        let href = href
            .strip_prefix("url(")
            .and_then(|rest| rest.strip_suffix(')'))
            .map(|inner| inner.trim().trim_matches(|c| c == '"' || c == '\''))
            .unwrap_or(href);
        href.strip_prefix('#')
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_by_tag(node: &Rc<Node>, tag_name: &str, out: &mut Vec<Rc<Node>>) {
    if node.tag_name() == Some(tag_name) {
        out.push(node.clone());
    }
    for child in node.children() {
        collect_by_tag(&child, tag_name, out);
    }
}

fn index_ids_recursive(node: &Rc<Node>, index: &mut HashMap<String, Rc<Node>>) {
    if node.is_element() {
        if let Some(id) = node.get_attribute("id") {
            index.entry(id).or_insert_with(|| node.clone());
        }
    }
    for child in node.children() {
        index_ids_recursive(&child, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_link() {
        let doc = Document::new();
        let svg = doc.create_element("svg").unwrap();
        let rect = doc.create_element("rect").unwrap();
        let circle = doc.create_element("circle").unwrap();

        doc.root().append_child(svg.clone());
        svg.append_child(rect.clone());
        svg.append_child(circle.clone());

        assert_eq!(doc.document_element().unwrap().tag_name(), Some("svg"));
        assert_eq!(rect.parent().unwrap().tag_name(), Some("svg"));
        assert_eq!(rect.next_sibling().unwrap().tag_name(), Some("circle"));
        assert_eq!(circle.previous_sibling().unwrap().tag_name(), Some("rect"));
    }

    #[test]
    fn test_attribute_generation_bumps() {
        let doc = Document::new();
        let rect = doc.create_element("rect").unwrap();
        let before = rect.attribute_generation();

        rect.set_attribute("width", "10").unwrap();
        assert!(rect.attribute_generation() > before);
        assert_eq!(rect.get_attribute("width").as_deref(), Some("10"));

        let mid = rect.attribute_generation();
        rect.remove_attribute("width");
        assert!(rect.attribute_generation() > mid);
        assert_eq!(rect.get_attribute("width"), None);

        // Removing an absent attribute is not a change.
        let after = rect.attribute_generation();
        rect.remove_attribute("width");
        assert_eq!(rect.attribute_generation(), after);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let doc = Document::new();
        let rect = doc.create_element("rect").unwrap();
        assert!(matches!(
            rect.set_attribute("9bad", "x"),
            Err(DomError::InvalidCharacter(_))
        ));
        assert!(matches!(
            doc.create_element("<tag>"),
            Err(DomError::InvalidCharacter(_))
        ));
        assert!(rect.set_attribute("stroke-width", "2").is_ok());
    }

    #[test]
    fn test_set_attribute_on_text_node_fails() {
        let doc = Document::new();
        let text = doc.create_text("hi");
        assert!(matches!(
            text.set_attribute("x", "1"),
            Err(DomError::InvalidModification(_))
        ));
    }

    #[test]
    fn test_id_index() {
        let doc = Document::new();
        let svg = doc.create_element("svg").unwrap();
        let grad = doc.create_element("linearGradient").unwrap();
        grad.set_attribute("id", "fade").unwrap();
        doc.root().append_child(svg.clone());
        svg.append_child(grad.clone());

        doc.index_ids();
        assert_eq!(doc.get_element_by_id("fade").unwrap().id, grad.id);
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn test_local_fragment() {
        assert_eq!(Document::local_fragment("#g"), Some("g"));
        assert_eq!(Document::local_fragment("url(#g)"), Some("g"));
        assert_eq!(Document::local_fragment("url('#g')"), Some("g"));
        assert_eq!(Document::local_fragment("http://x/#g"), None);
    }

    #[test]
    fn test_resolve_href() {
        let mut doc = Document::new();
        doc.set_base_url(Url::parse("https://example.com/art/").unwrap());
        let resolved = doc.resolve_href("paint.svg").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/art/paint.svg");
    }

    #[test]
    fn test_text_content() {
        let doc = Document::new();
        let text_el = doc.create_element("text").unwrap();
        text_el.append_child(doc.create_text("hello "));
        let span = doc.create_element("tspan").unwrap();
        span.append_child(doc.create_text("world"));
        text_el.append_child(span);
        assert_eq!(text_el.text_content(), "hello world");
    }
}

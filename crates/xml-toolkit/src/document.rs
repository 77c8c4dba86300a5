//! The mutable tree behind a session, stored in a xot arena

use log::trace;
use xot::{NameId, NamespaceId, Node, PrefixId, ValueType, Xot};

use crate::error::{Error, Result};
use crate::namespaces::{Namespaces, QName, XML_NAMESPACE};
use crate::result::FoundElement;

/// Declaration written in front of every saved document
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Tag of the synthetic element fragments are wrapped in
pub const FRAGMENT_ROOT: &str = "root";

/// Which node kinds an operation may be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// Elements only (attribute and content edits)
    Element,
    /// Anything that lives in a child list (structural edits)
    Child,
}

/// Position of a node as child indexes walked down from the document node.
///
/// Two trees parsed from the same text agree on every path, which is how
/// XPath results computed on the evaluator's copy are located in ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodePath(Vec<usize>);

impl NodePath {
    pub fn of(xot: &Xot, node: Node) -> Option<Self> {
        let mut steps = Vec::new();
        let mut current = node;
        while let Some(parent) = xot.parent(current) {
            steps.push(xot.children(parent).position(|child| child == current)?);
            current = parent;
        }
        steps.reverse();
        Some(Self(steps))
    }

    pub fn resolve(&self, xot: &Xot, root: Node) -> Option<Node> {
        self.0
            .iter()
            .try_fold(root, |node, &index| xot.children(node).nth(index))
    }
}

#[derive(Debug)]
pub(crate) struct Document {
    xot: Xot,
    root: Node,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut xot = Xot::new();
        let root = xot
            .parse(xml)
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        Ok(Self { xot, root })
    }

    pub fn xot(&self) -> &Xot {
        &self.xot
    }

    pub fn root(&self) -> Node {
        self.root
    }

    /// Serialize without declaration, exactly as stored
    pub fn to_xml(&self) -> Result<String> {
        Ok(self.xot.to_string(self.root)?)
    }

    /// Serialize for saving: declaration followed by the compact or
    /// re-indented document
    pub fn serialize(&self, pretty: bool) -> Result<String> {
        let body = if pretty {
            pretty_print(&self.to_xml()?)?
        } else {
            self.to_xml()?
        };
        Ok(format!("{}{}", XML_DECLARATION, body))
    }

    // ==================== Node kinds ====================

    pub fn is_document_element(&self, node: Node) -> bool {
        self.xot.is_element(node) && self.xot.parent(node) == Some(self.root)
    }

    pub fn accepts(&self, target: Target, node: Node) -> bool {
        match (target, self.xot.value_type(node)) {
            (_, ValueType::Element) => true,
            (
                Target::Child,
                ValueType::Text | ValueType::Comment | ValueType::ProcessingInstruction,
            ) => true,
            _ => false,
        }
    }

    /// Drop every node that has an ancestor in `nodes`
    pub fn outermost(&self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .iter()
            .copied()
            .filter(|&node| {
                !self
                    .xot
                    .ancestors(node)
                    .any(|ancestor| ancestor != node && nodes.contains(&ancestor))
            })
            .collect()
    }

    // ==================== Names ====================

    /// Name id for a tag. Unprefixed names take the default namespace in
    /// scope at `scope`; the namespace of a prefixed element is never
    /// inherited.
    pub fn element_name(&mut self, name: &QName, scope: Node) -> NameId {
        let namespace = match name.namespace() {
            Some(uri) => uri.to_string(),
            None => self.default_namespace(scope),
        };
        self.name_in(name.local(), &namespace)
    }

    /// Name id for an attribute; unprefixed attributes have no namespace
    pub fn attribute_name(&mut self, name: &QName) -> NameId {
        self.name_in(name.local(), name.namespace().unwrap_or(""))
    }

    fn name_in(&mut self, local: &str, namespace: &str) -> NameId {
        if namespace.is_empty() {
            self.xot.add_name(local)
        } else {
            let namespace = self.xot.add_namespace(namespace);
            self.xot.add_name_ns(local, namespace)
        }
    }

    /// URI bound by the nearest `xmlns="..."` at or above `scope`
    fn default_namespace(&mut self, scope: Node) -> String {
        let empty = self.xot.add_prefix("");
        std::iter::once(scope)
            .chain(self.xot.ancestors(scope))
            .filter(|&node| self.xot.is_element(node))
            .find_map(|node| self.xot.namespaces(node).get(empty).copied())
            .map(|namespace| self.xot.namespace_str(namespace).to_string())
            .unwrap_or_default()
    }

    /// Element a new wrapper around `node` is placed in; the document
    /// element wraps in place and keeps its own declarations
    pub fn wrapper_scope(&self, node: Node) -> Node {
        self.xot
            .parent(node)
            .filter(|&parent| self.xot.is_element(parent))
            .unwrap_or(node)
    }

    fn matches_name(&self, id: NameId, name: &QName) -> bool {
        let (local, namespace) = self.xot.name_ns_str(id);
        local == name.local() && namespace == name.namespace().unwrap_or("")
    }

    /// Declare the prefix of `name` on `node` unless it is already in scope
    pub fn declare_prefix(&mut self, node: Node, name: &QName) {
        let (Some(prefix), Some(uri)) = (name.prefix(), name.namespace()) else {
            return;
        };
        if uri == XML_NAMESPACE {
            return;
        }
        let prefix = self.xot.add_prefix(prefix);
        let namespace = self.xot.add_namespace(uri);
        self.declare(node, prefix, namespace);
    }

    fn declare(&mut self, node: Node, prefix: PrefixId, namespace: NamespaceId) {
        let in_scope = std::iter::once(node)
            .chain(self.xot.ancestors(node))
            .filter(|&n| self.xot.is_element(n))
            .find_map(|n| self.xot.namespaces(n).get(prefix).copied());
        if in_scope != Some(namespace) {
            self.xot.namespaces_mut(node).insert(prefix, namespace);
        }
    }

    // ==================== Attributes ====================

    pub fn attributes(&self, node: Node) -> Vec<(NameId, String)> {
        self.xot
            .attributes(node)
            .iter()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }

    fn attribute_id(&self, node: Node, name: &QName) -> Option<NameId> {
        self.attributes(node)
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| self.matches_name(id, name))
    }

    pub fn attribute(&self, node: Node, name: &QName) -> Option<String> {
        self.attributes(node)
            .into_iter()
            .find(|(id, _)| self.matches_name(*id, name))
            .map(|(_, value)| value)
    }

    pub fn set_attribute(&mut self, node: Node, name: &QName, value: String) {
        let id = self.attribute_name(name);
        trace!("set attribute {}=\"{}\"", name, value);
        self.xot.attributes_mut(node).insert(id, value);
        self.declare_prefix(node, name);
    }

    pub fn remove_attribute(&mut self, node: Node, name: &QName) -> Option<String> {
        let id = self.attribute_id(node, name)?;
        trace!("remove attribute {}", name);
        self.xot.attributes_mut(node).remove(id)
    }

    // ==================== Text ====================

    /// Concatenated text of all descendants
    pub fn text_value(&self, node: Node) -> String {
        self.xot
            .descendants(node)
            .filter_map(|n| self.xot.text_str(n))
            .collect()
    }

    pub fn has_element_children(&self, node: Node) -> bool {
        self.xot.children(node).any(|child| self.xot.is_element(child))
    }

    /// Replace all content of `node` with a single text node
    pub fn set_text(&mut self, node: Node, text: &str) -> Result<()> {
        let children: Vec<Node> = self.xot.children(node).collect();
        for child in children {
            self.xot.detach(child)?;
        }
        if !text.is_empty() {
            let text = self.xot.new_text(text);
            self.xot.append(node, text)?;
        }
        Ok(())
    }

    // ==================== Structure ====================

    pub fn rename(&mut self, node: Node, name: NameId) -> Result<()> {
        let element = self
            .xot
            .element_mut(node)
            .ok_or(Error::NotAnElement { operation: "rename" })?;
        element.set_name(name);
        Ok(())
    }

    pub fn detach(&mut self, node: Node) -> Result<()> {
        if self.is_document_element(node) {
            return Err(Error::DocumentElement { operation: "remove" });
        }
        self.xot.detach(node)?;
        Ok(())
    }

    /// Put a new `wrapper` element where `node` is and move `node` into it
    pub fn wrap(&mut self, node: Node, wrapper: NameId) -> Result<Node> {
        if self.is_document_element(node) {
            return self.wrap_document_element(node, wrapper);
        }
        let outer = self.xot.new_element(wrapper);
        self.xot.insert_before(node, outer)?;
        self.xot.detach(node)?;
        self.xot.append(outer, node)?;
        Ok(outer)
    }

    /// The document element cannot be detached, so its content moves into a
    /// copy and the original element becomes the wrapper.
    fn wrap_document_element(&mut self, node: Node, wrapper: NameId) -> Result<Node> {
        let name = self
            .xot
            .element(node)
            .map(|element| element.name())
            .ok_or(Error::NotAnElement { operation: "wrap" })?;
        let inner = self.xot.new_element(name);
        for (attribute, value) in self.attributes(node) {
            self.xot.attributes_mut(node).remove(attribute);
            self.xot.attributes_mut(inner).insert(attribute, value);
        }
        self.move_children(node, inner)?;
        self.rename(node, wrapper)?;
        self.xot.append(node, inner)?;
        Ok(node)
    }

    /// Splice the children of `node` into its parent and drop `node`
    pub fn unwrap(&mut self, node: Node) -> Result<()> {
        if self.is_document_element(node) {
            return Err(Error::DocumentElement { operation: "unwrap" });
        }
        let children: Vec<Node> = self.xot.children(node).collect();
        for child in children {
            self.xot.detach(child)?;
            self.xot.insert_before(node, child)?;
        }
        self.xot.detach(node)?;
        Ok(())
    }

    fn move_children(&mut self, from: Node, to: Node) -> Result<()> {
        let children: Vec<Node> = self.xot.children(from).collect();
        for child in children {
            self.xot.detach(child)?;
            self.xot.append(to, child)?;
        }
        Ok(())
    }

    /// Parse `fragment` and append its nodes to `node`. Registered prefixes
    /// declared on the parse holder are redeclared on each appended element
    /// that is not already in their scope.
    pub fn append_fragment(
        &mut self,
        node: Node,
        fragment: &str,
        namespaces: &Namespaces,
    ) -> Result<()> {
        let holder = parse_fragment(&mut self.xot, fragment, namespaces)?;
        let declarations: Vec<(PrefixId, NamespaceId)> = self
            .xot
            .namespaces(holder)
            .iter()
            .map(|(prefix, namespace)| (prefix, *namespace))
            .collect();
        let appended: Vec<Node> = self.xot.children(holder).collect();
        self.move_children(holder, node)?;
        for child in appended {
            if !self.xot.is_element(child) {
                continue;
            }
            for &(prefix, namespace) in &declarations {
                self.declare(child, prefix, namespace);
            }
        }
        Ok(())
    }

    // ==================== Snapshots ====================

    pub fn describe(&self, node: Node) -> Result<FoundElement> {
        let element = self
            .xot
            .element(node)
            .ok_or(Error::NotAnElement { operation: "describe" })?;
        let (name, namespace) = self.xot.name_ns_str(element.name());
        let attributes = self
            .attributes(node)
            .into_iter()
            .map(|(id, value)| (self.xot.name_ns_str(id).0.to_string(), value))
            .collect();
        Ok(FoundElement {
            name: name.to_string(),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            attributes,
            text: self.text_value(node),
            xml: self.xot.to_string(node)?,
        })
    }
}

/// Parse `fragment` under a synthetic element that declares the registered
/// namespaces, returning that element
pub(crate) fn parse_fragment(xot: &mut Xot, fragment: &str, namespaces: &Namespaces) -> Result<Node> {
    let declarations: String = namespaces
        .iter()
        .map(|(prefix, uri)| format!(" xmlns:{}=\"{}\"", prefix, escape_attribute(uri)))
        .collect();
    let wrapped = format!(
        "<{root}{declarations}>{fragment}</{root}>",
        root = FRAGMENT_ROOT,
        declarations = declarations,
        fragment = fragment
    );
    let document = xot
        .parse(&wrapped)
        .map_err(|e| Error::FragmentParse(e.to_string()))?;
    Ok(xot.document_element(document)?)
}

/// Serialized form of a node as returned by path queries
pub(crate) fn node_markup(xot: &Xot, node: Node) -> Result<String> {
    if xot.value_type(node) != ValueType::Attribute {
        return Ok(xot.to_string(node)?);
    }
    let name = xot.node_name(node).ok_or(Error::NotANode)?;
    let value = xot
        .parent(node)
        .and_then(|parent| xot.attributes(parent).get(name).cloned())
        .unwrap_or_default();
    Ok(format!(
        "{}=\"{}\"",
        xot.name_ns_str(name).0,
        escape_attribute(&value)
    ))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

/// Drop whitespace-only text between elements, then indent
fn pretty_print(xml: &str) -> Result<String> {
    let mut xot = Xot::new();
    let root = xot
        .parse(xml)
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let blanks: Vec<Node> = xot
        .descendants(root)
        .filter(|&node| {
            xot.text_str(node).is_some_and(|text| text.trim().is_empty())
                && xot
                    .parent(node)
                    .is_some_and(|parent| xot.children(parent).any(|c| xot.is_element(c)))
        })
        .collect();
    for node in blanks {
        xot.detach(node)?;
    }
    let parameters = xot::output::xml::Parameters {
        indentation: Some(Default::default()),
        ..Default::default()
    };
    Ok(xot.serialize_xml_string(parameters, root)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_round_trip() {
        let xml = "<root><a>1</a><b><c>2</c></b></root>";
        let first = Document::parse(xml).unwrap();
        let second = Document::parse(xml).unwrap();

        let c = first
            .xot()
            .descendants(first.root())
            .find(|&n| {
                first
                    .xot()
                    .element(n)
                    .is_some_and(|e| first.xot().name_ns_str(e.name()).0 == "c")
            })
            .unwrap();
        let path = NodePath::of(first.xot(), c).unwrap();
        assert_eq!(path, NodePath(vec![0, 1, 0]));

        let resolved = path.resolve(second.xot(), second.root()).unwrap();
        assert_eq!(second.xot().to_string(resolved).unwrap(), "<c>2</c>");
    }

    #[test]
    fn serialize_adds_declaration() {
        let document = Document::parse("<root><a>1</a></root>").unwrap();
        assert_eq!(
            document.serialize(false).unwrap(),
            format!("{}<root><a>1</a></root>", XML_DECLARATION)
        );
    }

    #[test]
    fn pretty_print_drops_blank_text() {
        let pretty = pretty_print("<root>\n      <a>1</a>\n  <b>2</b></root>").unwrap();
        assert!(pretty.contains("<a>1</a>"));
        assert!(pretty.contains("<b>2</b>"));
        assert!(!pretty.contains("      <a>"));
        assert!(pretty.lines().count() >= 3);
    }

    #[test]
    fn parse_fragment_uses_registered_prefixes() {
        let mut xot = Xot::new();
        let namespaces: Namespaces = [("ns", "urn:ns")].into_iter().collect();
        let holder = parse_fragment(&mut xot, "<ns:a>1</ns:a>text", &namespaces).unwrap();
        assert_eq!(xot.children(holder).count(), 2);
    }
}

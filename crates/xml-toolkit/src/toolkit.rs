//! The document session
//!
//! An [`XmlToolkit`] owns at most one loaded document together with the
//! XPath evaluator bound to it, and the namespace table shared by every
//! query. Editing operations live in `edit.rs` and `search.rs`.

use std::fs;
use std::path::Path;

use log::{debug, trace};
use xot::Node;

use crate::document::{node_markup, Document, NodePath, Target, FRAGMENT_ROOT};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::namespaces::Namespaces;
use crate::result::FoundElement;

/// A loaded document and the evaluator that sees the same tree
pub(crate) struct Loaded {
    document: Document,
    evaluator: Evaluator,
}

impl Loaded {
    fn parse(xml: &str) -> Result<Self> {
        Ok(Self {
            document: Document::parse(xml)?,
            evaluator: Evaluator::new(xml)?,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Evaluate `xpath` and locate the matches in the session tree
    pub fn select(
        &mut self,
        operation: &'static str,
        target: Target,
        xpath: &str,
        namespaces: &Namespaces,
    ) -> Result<Vec<Node>> {
        let matches = self.evaluator.select(xpath, namespaces)?;
        let mut nodes = Vec::with_capacity(matches.len());
        for found in matches {
            let node = NodePath::of(self.evaluator.xot(), found)
                .and_then(|path| path.resolve(self.document.xot(), self.document.root()))
                .ok_or(Error::NotAnElement { operation })?;
            if !self.document.accepts(target, node) {
                return Err(Error::NotAnElement { operation });
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Run an edit against the tree. On success with changes the evaluator
    /// is rebuilt; on failure the tree is restored to its previous text.
    pub fn transact<F>(&mut self, edit: F) -> Result<usize>
    where
        F: FnOnce(&mut Document) -> Result<usize>,
    {
        let snapshot = self.document.to_xml()?;
        let outcome = edit(&mut self.document).and_then(|changed| {
            if changed > 0 {
                self.rebuild()?;
            }
            Ok(changed)
        });
        if outcome.is_err() {
            self.document = Document::parse(&snapshot)?;
        }
        outcome
    }

    fn rebuild(&mut self) -> Result<()> {
        let xml = self.document.to_xml()?;
        let rebuilt = Loaded::parse(&xml).map_err(|e| Error::tree(e.to_string()))?;
        trace!("rebuilt evaluator ({} bytes)", xml.len());
        *self = rebuilt;
        Ok(())
    }
}

/// A session over one XML document at a time.
///
/// Every query and edit takes `&mut self`; use one session per thread.
#[derive(Default)]
pub struct XmlToolkit {
    namespaces: Namespaces,
    loaded: Option<Loaded>,
}

impl XmlToolkit {
    /// Create a session with no document and no namespace bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a document has been loaded successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The namespace bindings used by path expressions
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    // ==================== Load / Save ====================

    /// Load a UTF-8 XML file, replacing the current document.
    ///
    /// On failure the previous document stays loaded.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("loading {}", path.display());
        let content = fs::read_to_string(path)?;
        self.load_from_string(&content)
    }

    /// Load XML from a string, replacing the current document
    pub fn load_from_string(&mut self, xml: &str) -> Result<()> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let loaded = Loaded::parse(xml)?;
        debug!("loaded document ({} bytes)", xml.len());
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Load content that may have several top-level nodes by wrapping it in
    /// a synthetic `<root>` element
    pub fn load_from_fragment(&mut self, fragment: &str) -> Result<()> {
        self.load_from_string(&format!(
            "<{root}>{fragment}</{root}>",
            root = FRAGMENT_ROOT,
            fragment = fragment
        ))
    }

    /// Serialize the document as UTF-8 with an XML declaration
    pub fn save_to_string(&self, pretty: bool) -> Result<String> {
        self.loaded
            .as_ref()
            .ok_or(Error::NoDocument)?
            .document
            .serialize(pretty)
    }

    /// Write the serialized document to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        let xml = self.save_to_string(pretty)?;
        fs::write(path.as_ref(), xml)?;
        debug!("saved {}", path.as_ref().display());
        Ok(())
    }

    // ==================== Namespaces ====================

    /// Replace the namespace table. Bindings apply to the current document
    /// right away and to every document loaded later.
    pub fn register_namespaces<I, P, U>(&mut self, namespaces: I)
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        self.namespaces = namespaces.into_iter().collect();
        debug!("registered {} namespace(s)", self.namespaces.len());
    }

    /// Add a single binding to the namespace table
    pub fn add_namespace<P: Into<String>, U: Into<String>>(&mut self, prefix: P, uri: U) {
        self.namespaces.insert(prefix, uri);
    }

    // ==================== Path queries ====================

    /// Serialized markup of every node selected by `xpath`, in document
    /// order. No match gives an empty vector.
    pub fn query_path(&mut self, xpath: &str) -> Result<Vec<String>> {
        let (loaded, namespaces) = self.session()?;
        let nodes = loaded.evaluator.select(xpath, namespaces)?;
        nodes
            .into_iter()
            .map(|node| node_markup(loaded.evaluator.xot(), node))
            .collect()
    }

    // ==================== Internals ====================

    pub(crate) fn session(&mut self) -> Result<(&mut Loaded, &Namespaces)> {
        let Self { namespaces, loaded } = self;
        let loaded = loaded.as_mut().ok_or(Error::NoDocument)?;
        Ok((loaded, namespaces))
    }

    /// Select the nodes for an edit and apply `edit` to them as one
    /// transaction, returning the number of nodes changed
    pub(crate) fn edit<F>(
        &mut self,
        operation: &'static str,
        target: Target,
        xpath: &str,
        edit: F,
    ) -> Result<usize>
    where
        F: FnOnce(&mut Document, Vec<Node>, &Namespaces) -> Result<usize>,
    {
        let (loaded, namespaces) = self.session()?;
        let nodes = loaded.select(operation, target, xpath, namespaces)?;
        debug!("{}: {} node(s) matched {}", operation, nodes.len(), xpath);
        if nodes.is_empty() {
            return Ok(0);
        }
        loaded.transact(|document| edit(document, nodes, namespaces))
    }

    /// Elements selected by `xpath` for which `keep` holds
    pub(crate) fn find<F>(
        &mut self,
        operation: &'static str,
        xpath: &str,
        mut keep: F,
    ) -> Result<Vec<FoundElement>>
    where
        F: FnMut(&Document, Node) -> bool,
    {
        let (loaded, namespaces) = self.session()?;
        let nodes = loaded.select(operation, Target::Element, xpath, namespaces)?;
        let document = loaded.document();
        nodes
            .into_iter()
            .filter(|&node| keep(document, node))
            .map(|node| document.describe(node))
            .collect()
    }
}

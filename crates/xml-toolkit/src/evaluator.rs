//! XPath evaluation through xee

use log::debug;
use xee_xpath::context::StaticContextBuilder;
use xee_xpath::{DocumentHandle, Documents, Item, Queries, Query};
use xot::{Node, Xot};

use crate::error::{Error, Result};
use crate::namespaces::Namespaces;

/// Query evaluator bound to one version of the session document.
///
/// xee keeps its own Xot, so the evaluator holds a copy parsed from the
/// same text as the session tree and is rebuilt whenever that tree changes.
pub(crate) struct Evaluator {
    documents: Documents,
    handle: DocumentHandle,
}

impl Evaluator {
    pub fn new(xml: &str) -> Result<Self> {
        let mut documents = Documents::new();
        let handle = documents
            .add_string_without_uri(xml)
            .map_err(|e| Error::XmlParse(format!("{:?}", e)))?;
        Ok(Self { documents, handle })
    }

    /// The evaluator's copy of the tree; nodes returned by
    /// [`Evaluator::select`] belong to it
    pub fn xot(&self) -> &Xot {
        self.documents.xot()
    }

    /// Evaluate `xpath` with the document node as context item and return
    /// the selected nodes in document order
    pub fn select(&mut self, xpath: &str, namespaces: &Namespaces) -> Result<Vec<Node>> {
        let mut builder = StaticContextBuilder::default();
        for (prefix, uri) in namespaces.iter() {
            builder.add_namespace(prefix, uri);
        }
        let queries = Queries::new(builder);
        let query = queries
            .sequence(xpath)
            .map_err(|e| Error::xpath(format!("{:?}", e)))?;

        let sequence = query
            .execute(&mut self.documents, self.handle)
            .map_err(|e| Error::xpath(format!("{:?}", e)))?;

        let mut nodes = Vec::new();
        for item in sequence.iter() {
            match item {
                Item::Node(node) => nodes.push(node),
                _ => return Err(Error::NotANode),
            }
        }
        debug!("{} selected {} node(s)", xpath, nodes.len());
        Ok(nodes)
    }
}

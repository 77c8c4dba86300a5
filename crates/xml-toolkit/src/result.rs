//! Result types returned by find operations and edit scripts

use serde::{Deserialize, Serialize};

/// Snapshot of a matched element.
///
/// Node handles do not survive an edit, so find operations hand out
/// detached copies of what the caller usually needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundElement {
    /// Local tag name
    pub name: String,
    /// Namespace URI of the tag, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Attributes as (local name, value) pairs in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated descendant text
    pub text: String,
    /// Serialized markup of the element
    pub xml: String,
}

impl FoundElement {
    /// Value of the first attribute with the given local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of a single edit script step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub operation: String,
    /// Number of nodes the step changed
    pub changed: usize,
}

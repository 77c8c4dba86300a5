//! Error types for toolkit operations

/// Result type for toolkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all toolkit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// XML parsing failed while loading a document
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// A fragment passed to an append operation could not be parsed
    #[error("Fragment parsing error: {0}")]
    FragmentParse(String),

    /// XPath compilation or evaluation failed
    #[error("XPath error: {0}")]
    XPath(String),

    /// No document has been loaded into the session yet
    #[error("No document loaded")]
    NoDocument,

    /// The operation has no parent to work against
    #[error("Cannot {operation} the document element")]
    DocumentElement { operation: &'static str },

    /// A matched node has a kind the operation cannot handle
    #[error("Cannot {operation} a node that is not an element")]
    NotAnElement { operation: &'static str },

    /// An XPath expression produced an atomic value instead of nodes
    #[error("XPath expression returned a non-node item")]
    NotANode,

    /// A qualified name used a prefix that was never registered
    #[error("Unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    /// A tag or attribute name is not a valid XML name
    #[error("Invalid XML name: {0}")]
    InvalidName(String),

    /// A regular expression failed to compile
    #[error("Regular expression error: {0}")]
    Pattern(#[from] regex::Error),

    /// A delimited pattern was malformed
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The tree library refused a mutation or serialization
    #[error("Tree error: {0}")]
    Tree(String),

    /// An edit script could not be read
    #[error("Edit script error: {0}")]
    Script(#[from] serde_json::Error),

    /// A step of an edit script failed
    #[error("Step {index} ({operation}) failed: {source}")]
    Step {
        index: usize,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new XPath error
    pub fn xpath<S: Into<String>>(msg: S) -> Self {
        Error::XPath(msg.into())
    }

    /// Create a new tree error
    pub fn tree<S: Into<String>>(msg: S) -> Self {
        Error::Tree(msg.into())
    }
}

impl From<xot::Error> for Error {
    fn from(e: xot::Error) -> Self {
        Error::Tree(e.to_string())
    }
}

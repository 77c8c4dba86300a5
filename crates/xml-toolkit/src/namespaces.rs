//! Namespace prefix table and qualified-name resolution

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// URI permanently bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix to namespace URI bindings used by every XPath expression of a
/// session.
///
/// The table outlives individual documents: loading a new document keeps the
/// bindings in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaces {
    bindings: BTreeMap<String, String>,
}

impl Namespaces {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`, returning the previous binding
    pub fn insert<P: Into<String>, U: Into<String>>(&mut self, prefix: P, uri: U) -> Option<String> {
        self.bindings.insert(prefix.into(), uri.into())
    }

    /// Look up the URI bound to `prefix`
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(XML_NAMESPACE),
            _ => self.bindings.get(prefix).map(String::as_str),
        }
    }

    /// Iterate over the bindings in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Parse `name` as `local` or `prefix:local` and resolve its prefix
    /// against this table.
    pub fn qualify(&self, name: &str) -> Result<QName> {
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };
        if !is_ncname(local) || prefix.is_some_and(|p| !is_ncname(p)) {
            return Err(Error::InvalidName(name.to_string()));
        }
        let namespace = match prefix {
            Some(prefix) => Some(
                self.uri(prefix)
                    .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))?
                    .to_string(),
            ),
            None => None,
        };
        Ok(QName {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace,
        })
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for Namespaces {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        let mut namespaces = Namespaces::new();
        for (prefix, uri) in iter {
            namespaces.insert(prefix, uri);
        }
        namespaces
    }
}

/// A validated XML name with its prefix resolved to a namespace URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    prefix: Option<String>,
    local: String,
    namespace: Option<String>,
}

impl QName {
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// Namespace URI, `None` when the name was written without a prefix
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

//! Value and regular expression lookups over attributes and text

use crate::document::Target;
use crate::error::Result;
use crate::pattern::{Pattern, Replacement};
use crate::result::FoundElement;
use crate::toolkit::XmlToolkit;

/// Quote `value` as an XPath string literal
fn xpath_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

impl XmlToolkit {
    // ==================== Exact values ====================

    /// Elements whose attribute `attribute` equals `value` exactly
    pub fn find_by_attribute_value(
        &mut self,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<FoundElement>> {
        let name = self.namespaces().qualify(attribute)?;
        let xpath = format!("//*[@{}={}]", name, xpath_literal(value));
        self.find("find", &xpath, |_, _| true)
    }

    /// Set `attribute` to `new_value` wherever it currently equals
    /// `old_value`
    pub fn replace_attribute_value(
        &mut self,
        attribute: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<usize> {
        let name = self.namespaces().qualify(attribute)?;
        let xpath = format!("//*[@{}={}]", name, xpath_literal(old_value));
        self.edit("replace attribute of", Target::Element, &xpath, |document, nodes, _| {
            for &node in &nodes {
                document.set_attribute(node, &name, new_value.to_string());
            }
            Ok(nodes.len())
        })
    }

    /// Elements with a text child equal to `text`
    pub fn find_by_text_content(&mut self, text: &str) -> Result<Vec<FoundElement>> {
        let xpath = format!("//*[text()={}]", xpath_literal(text));
        self.find("find", &xpath, |_, _| true)
    }

    /// Replace the whole content of elements with a text child equal to
    /// `old_text` by the text `new_text`
    pub fn replace_text_content(&mut self, old_text: &str, new_text: &str) -> Result<usize> {
        let xpath = format!("//*[text()={}]", xpath_literal(old_text));
        self.edit("replace text of", Target::Element, &xpath, |document, nodes, _| {
            let nodes = document.outermost(nodes);
            for &node in &nodes {
                document.set_text(node, new_text)?;
            }
            Ok(nodes.len())
        })
    }

    // ==================== Regular expressions ====================

    /// Elements carrying `attribute` whose value matches `pattern`
    pub fn find_by_attribute_regex(
        &mut self,
        attribute: &str,
        pattern: &str,
    ) -> Result<Vec<FoundElement>> {
        let pattern = Pattern::new(pattern)?;
        let name = self.namespaces().qualify(attribute)?;
        let xpath = format!("//*[@{}]", name);
        self.find("find", &xpath, |document, node| {
            document
                .attribute(node, &name)
                .is_some_and(|value| pattern.is_match(&value))
        })
    }

    /// Rewrite every match of `pattern` in `attribute` values using
    /// `replacement`, which may refer to capture groups
    pub fn replace_attribute_value_regex(
        &mut self,
        attribute: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<usize> {
        let pattern = Pattern::new(pattern)?;
        let replacement = Replacement::new(replacement);
        let name = self.namespaces().qualify(attribute)?;
        let xpath = format!("//*[@{}]", name);
        self.edit("replace attribute of", Target::Element, &xpath, |document, nodes, _| {
            let mut changed = 0;
            for node in nodes {
                let Some(value) = document.attribute(node, &name) else {
                    continue;
                };
                if pattern.is_match(&value) {
                    let value = pattern.replace_all(&value, &replacement).into_owned();
                    document.set_attribute(node, &name, value);
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    /// Leaf elements whose text matches `pattern`.
    ///
    /// Elements with element children are never returned: their text is the
    /// concatenation of their descendants.
    pub fn find_by_text_regex(&mut self, pattern: &str) -> Result<Vec<FoundElement>> {
        let pattern = Pattern::new(pattern)?;
        self.find("find", "//*", |document, node| {
            !document.has_element_children(node) && pattern.is_match(&document.text_value(node))
        })
    }

    /// Rewrite every match of `pattern` in the text of leaf elements
    pub fn replace_text_regex(&mut self, pattern: &str, replacement: &str) -> Result<usize> {
        let pattern = Pattern::new(pattern)?;
        let replacement = Replacement::new(replacement);
        self.edit("replace text of", Target::Element, "//*", |document, nodes, _| {
            let mut changed = 0;
            for node in nodes {
                if document.has_element_children(node) {
                    continue;
                }
                let text = document.text_value(node);
                if pattern.is_match(&text) {
                    let text = pattern.replace_all(&text, &replacement).into_owned();
                    document.set_text(node, &text)?;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }
}

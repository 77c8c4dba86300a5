//! Path-based edits: attributes, tag names and tree structure
//!
//! Each operation returns how many nodes it changed. Matches are collected
//! before the first change and checked up front, so a failing operation
//! leaves the document as it was.

use crate::document::{parse_fragment, Target};
use crate::error::{Error, Result};
use crate::toolkit::XmlToolkit;

impl XmlToolkit {
    // ==================== Attributes ====================

    /// Give every matched element the tag `new_name`, keeping its attributes
    /// and children in order. The document element may be renamed. An
    /// unprefixed name stays in the default namespace in scope, if any.
    pub fn rename_tag(&mut self, xpath: &str, new_name: &str) -> Result<usize> {
        let name = self.namespaces().qualify(new_name)?;
        self.edit("rename", Target::Element, xpath, |document, nodes, _| {
            for &node in &nodes {
                let id = document.element_name(&name, node);
                document.rename(node, id)?;
                document.declare_prefix(node, &name);
            }
            Ok(nodes.len())
        })
    }

    /// Move the value of attribute `old_name` to `new_name` on every matched
    /// element that has it
    pub fn rename_attribute(&mut self, xpath: &str, old_name: &str, new_name: &str) -> Result<usize> {
        let old_name = self.namespaces().qualify(old_name)?;
        let new_name = self.namespaces().qualify(new_name)?;
        self.edit("rename attribute of", Target::Element, xpath, |document, nodes, _| {
            let mut changed = 0;
            for node in nodes {
                if let Some(value) = document.remove_attribute(node, &old_name) {
                    document.set_attribute(node, &new_name, value);
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    /// Set attribute `name` to `value` on every matched element
    pub fn add_attribute(&mut self, xpath: &str, name: &str, value: &str) -> Result<usize> {
        let name = self.namespaces().qualify(name)?;
        self.edit("add attribute to", Target::Element, xpath, |document, nodes, _| {
            for &node in &nodes {
                document.set_attribute(node, &name, value.to_string());
            }
            Ok(nodes.len())
        })
    }

    /// Remove attribute `name` from every matched element that has it
    pub fn remove_attribute(&mut self, xpath: &str, name: &str) -> Result<usize> {
        let name = self.namespaces().qualify(name)?;
        self.edit("remove attribute from", Target::Element, xpath, |document, nodes, _| {
            Ok(nodes
                .into_iter()
                .filter(|&node| document.remove_attribute(node, &name).is_some())
                .count())
        })
    }

    // ==================== Structure ====================

    /// Parse `fragment` and append it as the last content of every matched
    /// element.
    ///
    /// The fragment is checked before the expression is evaluated, so a
    /// malformed fragment is reported even when nothing matches.
    pub fn append_content(&mut self, xpath: &str, fragment: &str) -> Result<usize> {
        parse_fragment(&mut xot::Xot::new(), fragment, self.namespaces())?;
        self.edit("append to", Target::Element, xpath, |document, nodes, namespaces| {
            for &node in &nodes {
                document.append_fragment(node, fragment, namespaces)?;
            }
            Ok(nodes.len())
        })
    }

    /// Detach every matched node together with its subtree.
    ///
    /// Matching the document element is an error.
    pub fn remove_element(&mut self, xpath: &str) -> Result<usize> {
        self.edit("remove", Target::Child, xpath, |document, nodes, _| {
            if nodes.iter().any(|&node| document.is_document_element(node)) {
                return Err(Error::DocumentElement { operation: "remove" });
            }
            let nodes = document.outermost(nodes);
            for &node in &nodes {
                document.detach(node)?;
            }
            Ok(nodes.len())
        })
    }

    /// Move every matched node into a new `wrapper` element placed where the
    /// node was. Wrapping the document element makes the wrapper the new
    /// document element.
    pub fn wrap_element(&mut self, xpath: &str, wrapper: &str) -> Result<usize> {
        let name = self.namespaces().qualify(wrapper)?;
        self.edit("wrap", Target::Child, xpath, |document, nodes, _| {
            for &node in &nodes {
                let scope = document.wrapper_scope(node);
                let id = document.element_name(&name, scope);
                let outer = document.wrap(node, id)?;
                document.declare_prefix(outer, &name);
            }
            Ok(nodes.len())
        })
    }

    /// Replace every matched node by its children.
    ///
    /// Matching the document element is an error.
    pub fn unwrap_element(&mut self, xpath: &str) -> Result<usize> {
        self.edit("unwrap", Target::Child, xpath, |document, nodes, _| {
            if nodes.iter().any(|&node| document.is_document_element(node)) {
                return Err(Error::DocumentElement { operation: "unwrap" });
            }
            for &node in &nodes {
                document.unwrap(node)?;
            }
            Ok(nodes.len())
        })
    }
}

//! Edit scripts: an ordered list of session operations read from JSON
//!
//! ```json
//! {
//!   "namespaces": { "ns": "http://example.com/ns" },
//!   "steps": [
//!     { "op": "rename_tag", "xpath": "//ns:old", "name": "ns:new" },
//!     { "op": "add_attribute", "xpath": "//item", "name": "checked", "value": "yes" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::namespaces::Namespaces;
use crate::result::StepReport;
use crate::toolkit::XmlToolkit;

/// One session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    RenameTag {
        xpath: String,
        name: String,
    },
    RenameAttribute {
        xpath: String,
        from: String,
        to: String,
    },
    AddAttribute {
        xpath: String,
        name: String,
        value: String,
    },
    RemoveAttribute {
        xpath: String,
        name: String,
    },
    AppendContent {
        xpath: String,
        content: String,
    },
    RemoveElement {
        xpath: String,
    },
    WrapElement {
        xpath: String,
        wrapper: String,
    },
    UnwrapElement {
        xpath: String,
    },
    ReplaceAttributeValue {
        attribute: String,
        old: String,
        new: String,
    },
    ReplaceAttributeValueRegex {
        attribute: String,
        pattern: String,
        replacement: String,
    },
    ReplaceTextContent {
        old: String,
        new: String,
    },
    ReplaceTextRegex {
        pattern: String,
        replacement: String,
    },
}

impl Step {
    /// Operation name as written in scripts
    pub fn operation(&self) -> &'static str {
        match self {
            Step::RenameTag { .. } => "rename_tag",
            Step::RenameAttribute { .. } => "rename_attribute",
            Step::AddAttribute { .. } => "add_attribute",
            Step::RemoveAttribute { .. } => "remove_attribute",
            Step::AppendContent { .. } => "append_content",
            Step::RemoveElement { .. } => "remove_element",
            Step::WrapElement { .. } => "wrap_element",
            Step::UnwrapElement { .. } => "unwrap_element",
            Step::ReplaceAttributeValue { .. } => "replace_attribute_value",
            Step::ReplaceAttributeValueRegex { .. } => "replace_attribute_value_regex",
            Step::ReplaceTextContent { .. } => "replace_text_content",
            Step::ReplaceTextRegex { .. } => "replace_text_regex",
        }
    }

    /// Run the step, returning the number of nodes changed
    pub fn apply(&self, toolkit: &mut XmlToolkit) -> Result<usize> {
        match self {
            Step::RenameTag { xpath, name } => toolkit.rename_tag(xpath, name),
            Step::RenameAttribute { xpath, from, to } => toolkit.rename_attribute(xpath, from, to),
            Step::AddAttribute { xpath, name, value } => toolkit.add_attribute(xpath, name, value),
            Step::RemoveAttribute { xpath, name } => toolkit.remove_attribute(xpath, name),
            Step::AppendContent { xpath, content } => toolkit.append_content(xpath, content),
            Step::RemoveElement { xpath } => toolkit.remove_element(xpath),
            Step::WrapElement { xpath, wrapper } => toolkit.wrap_element(xpath, wrapper),
            Step::UnwrapElement { xpath } => toolkit.unwrap_element(xpath),
            Step::ReplaceAttributeValue { attribute, old, new } => {
                toolkit.replace_attribute_value(attribute, old, new)
            }
            Step::ReplaceAttributeValueRegex {
                attribute,
                pattern,
                replacement,
            } => toolkit.replace_attribute_value_regex(attribute, pattern, replacement),
            Step::ReplaceTextContent { old, new } => toolkit.replace_text_content(old, new),
            Step::ReplaceTextRegex {
                pattern,
                replacement,
            } => toolkit.replace_text_regex(pattern, replacement),
        }
    }
}

/// Namespace bindings plus the steps to run, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditScript {
    #[serde(default, skip_serializing_if = "Namespaces::is_empty")]
    pub namespaces: Namespaces,
    pub steps: Vec<Step>,
}

impl EditScript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Add the script's namespaces to the session and run every step.
    ///
    /// Stops at the first failing step; steps before it stay applied.
    pub fn apply(&self, toolkit: &mut XmlToolkit) -> Result<Vec<StepReport>> {
        for (prefix, uri) in self.namespaces.iter() {
            toolkit.add_namespace(prefix, uri);
        }
        let mut reports = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let changed = step.apply(toolkit).map_err(|source| Error::Step {
                index,
                operation: step.operation(),
                source: Box::new(source),
            })?;
            info!("step {} {}: {} node(s) changed", index, step.operation(), changed);
            reports.push(StepReport {
                index,
                operation: step.operation().to_string(),
                changed,
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "namespaces": { "ns": "http://example.com/ns" },
        "steps": [
            { "op": "rename_tag", "xpath": "//old", "name": "new" },
            { "op": "add_attribute", "xpath": "//new", "name": "seen", "value": "1" },
            { "op": "replace_text_regex", "pattern": "/a(b)/", "replacement": "$1" }
        ]
    }"#;

    #[test]
    fn parse_script() {
        let script = EditScript::from_json(SCRIPT).unwrap();
        assert_eq!(script.namespaces.uri("ns"), Some("http://example.com/ns"));
        assert_eq!(script.steps.len(), 3);
        assert_eq!(
            script.steps[0],
            Step::RenameTag {
                xpath: "//old".to_string(),
                name: "new".to_string()
            }
        );
        assert_eq!(script.steps[2].operation(), "replace_text_regex");
    }

    #[test]
    fn namespaces_are_optional() {
        let script = EditScript::from_json(r#"{"steps": [{"op": "unwrap_element", "xpath": "//w"}]}"#)
            .unwrap();
        assert!(script.namespaces.is_empty());
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = EditScript::from_json(r#"{"steps": [{"op": "explode"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Script(_)));
    }

    #[test]
    fn step_serializes_with_tag() {
        let step = Step::RemoveElement {
            xpath: "//x".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&step).unwrap(),
            r#"{"op":"remove_element","xpath":"//x"}"#
        );
    }
}

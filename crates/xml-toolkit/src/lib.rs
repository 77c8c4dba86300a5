//! xml-toolkit: load, query, edit and save XML documents
//!
//! A [`XmlToolkit`] session wraps one document at a time. Elements are
//! selected with XPath (evaluated by xee) or with regular expressions over
//! attribute values and text, and edited in place in a xot tree.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xml_toolkit::XmlToolkit;
//!
//! let mut toolkit = XmlToolkit::new();
//! toolkit.load_from_string(r#"<root><item type="special">A</item></root>"#)?;
//! toolkit.rename_attribute("//item", "type", "kind")?;
//! toolkit.wrap_element("//item", "group")?;
//! println!("{}", toolkit.save_to_string(true)?);
//! # Ok::<(), xml_toolkit::Error>(())
//! ```

pub mod error;
pub mod namespaces;
pub mod pattern;
pub mod result;
pub mod script;
pub mod toolkit;

mod document;
mod edit;
mod evaluator;
mod search;

// Re-export core types
pub use document::{FRAGMENT_ROOT, XML_DECLARATION};
pub use error::{Error, Result};
pub use namespaces::{Namespaces, QName};
pub use pattern::{Pattern, Replacement};
pub use result::{FoundElement, StepReport};
pub use script::{EditScript, Step};
pub use toolkit::XmlToolkit;

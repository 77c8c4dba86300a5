//! Regular expressions for attribute and text matching
//!
//! Patterns are accepted either bare (`^sp.*`) or delimited with trailing
//! flags (`/^sp.*/i`). Delimited flags are folded into the expression as
//! inline flags so a single [`Regex`] carries everything.

use std::borrow::Cow;

use regex::Regex;

use crate::error::{Error, Result};

/// Characters recognised as pattern delimiters
const DELIMITERS: &[char] = &['/', '#', '~', '!', '%', '@', ';', ','];

/// A compiled pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a bare or delimited pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let source = match pattern.chars().next() {
            Some(delimiter) if DELIMITERS.contains(&delimiter) => delimited(pattern, delimiter)?,
            _ => pattern.to_string(),
        };
        Ok(Self {
            regex: Regex::new(&source)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace every match in `text`
    pub fn replace_all<'t>(&self, text: &'t str, replacement: &Replacement) -> Cow<'t, str> {
        self.regex.replace_all(text, replacement.0.as_str())
    }

    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

/// Strip delimiters and translate trailing flags to an inline flag group
fn delimited(pattern: &str, delimiter: char) -> Result<String> {
    let body = &pattern[delimiter.len_utf8()..];
    let end = body
        .rfind(delimiter)
        .ok_or_else(|| Error::InvalidPattern(format!("no ending delimiter '{}' found", delimiter)))?;
    let (expression, flags) = (&body[..end], &body[end + delimiter.len_utf8()..]);

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            // regex is Unicode-aware already
            'u' => {}
            other => {
                return Err(Error::InvalidPattern(format!("unknown modifier '{}'", other)));
            }
        }
    }

    if inline.is_empty() {
        Ok(expression.to_string())
    } else {
        Ok(format!("(?{}){}", inline, expression))
    }
}

/// A replacement template with back-references in `regex` syntax.
///
/// `${1}` and `${name}` are kept; `\1` and `$1` are rewritten to `${1}` so
/// that trailing word characters are not read as part of the group name.
/// Any other `$` is literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement(String);

impl Replacement {
    pub fn new(template: &str) -> Self {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' | '$' if chars.peek().is_some_and(|n| n.is_ascii_digit()) => {
                    let mut group = String::new();
                    while let Some(digit) = chars.next_if(|n| n.is_ascii_digit()) {
                        group.push(digit);
                    }
                    out.push_str("${");
                    out.push_str(&group);
                    out.push('}');
                }
                '\\' if chars.peek() == Some(&'\\') => {
                    chars.next();
                    out.push('\\');
                }
                '$' if chars.peek() == Some(&'{') => out.push('$'),
                '$' => out.push_str("$$"),
                _ => out.push(c),
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_pattern() {
        let pattern = Pattern::new("^sp.*").unwrap();
        assert!(pattern.is_match("special"));
        assert!(!pattern.is_match("normal"));
    }

    #[test]
    fn delimited_pattern() {
        let pattern = Pattern::new("/^sp.*/").unwrap();
        assert!(pattern.is_match("sp1"));
        assert!(!pattern.is_match("xsp"));
    }

    #[test]
    fn delimited_flags() {
        let pattern = Pattern::new("#^SP#i").unwrap();
        assert!(pattern.is_match("special"));
        assert_eq!(pattern.as_regex().as_str(), "(?i)^SP");
    }

    #[test]
    fn escaped_delimiter_inside_body() {
        let pattern = Pattern::new(r"/a\/b/").unwrap();
        assert!(pattern.is_match("a/b"));
    }

    #[test]
    fn missing_end_delimiter() {
        assert!(matches!(Pattern::new("/abc"), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn unknown_modifier() {
        assert!(matches!(Pattern::new("/abc/q"), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn malformed_expression() {
        assert!(matches!(Pattern::new("/(abc/"), Err(Error::Pattern(_))));
    }

    #[test]
    fn replacement_backreferences() {
        assert_eq!(Replacement::new(r"x\1").as_str(), "x${1}");
        assert_eq!(Replacement::new("$1a").as_str(), "${1}a");
        assert_eq!(Replacement::new("${name}").as_str(), "${name}");
        assert_eq!(Replacement::new(r"a\\b").as_str(), r"a\b");
    }

    #[test]
    fn replacement_literal_dollar() {
        assert_eq!(Replacement::new("USD$each").as_str(), "USD$$each");
        assert_eq!(Replacement::new("cost: $").as_str(), "cost: $$");

        let pattern = Pattern::new(r"/^(\d+)$/").unwrap();
        let replacement = Replacement::new("$1 USD$each");
        assert_eq!(pattern.replace_all("10", &replacement), "10 USD$each");
    }

    #[test]
    fn replace_all_with_groups() {
        let pattern = Pattern::new("/(\\d+)-(\\d+)/").unwrap();
        let replacement = Replacement::new("$2-$1");
        assert_eq!(pattern.replace_all("1-2 and 3-4", &replacement), "2-1 and 4-3");
    }
}

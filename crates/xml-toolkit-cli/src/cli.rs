use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Query and edit XML documents with XPath and regular expressions.
#[derive(Parser, Debug)]
#[command(name = "xmltk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Namespace binding used by path expressions, as `prefix=uri`.
    #[arg(long = "ns", value_name = "PREFIX=URI", value_parser = parse_binding, global = true)]
    pub namespaces: Vec<(String, String)>,

    /// Treat the input as a fragment and wrap it in a `<root>` element.
    #[arg(long, global = true)]
    pub fragment: bool,

    /// Increase log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every node selected by an XPath expression.
    Query(QueryArgs),

    /// Find elements by attribute value.
    FindAttr(FindAttrArgs),

    /// Find elements by text content.
    FindText(FindTextArgs),

    /// Reserialize a document.
    Format(FormatArgs),

    /// Run a JSON edit script against a document.
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,

    /// XPath expression.
    pub xpath: String,
}

#[derive(Args, Debug)]
pub struct FindAttrArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,

    /// Attribute name, optionally prefixed.
    pub attribute: String,

    /// Value to match exactly, or a pattern with `--regex`.
    pub value: String,

    /// Match the value as a regular expression.
    #[arg(long)]
    pub regex: bool,
}

#[derive(Args, Debug)]
pub struct FindTextArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,

    /// Text to match exactly, or a pattern with `--regex`.
    pub text: String,

    /// Match the text as a regular expression.
    #[arg(long)]
    pub regex: bool,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,

    /// Keep the document's own whitespace instead of indenting.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,

    /// JSON edit script.
    pub script: PathBuf,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Indent the written document.
    #[arg(long)]
    pub pretty: bool,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((prefix, uri)) if !prefix.is_empty() && !uri.is_empty() => {
            Ok((prefix.to_string(), uri.to_string()))
        }
        _ => Err(format!("expected PREFIX=URI, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_with_namespaces() {
        let cli = Cli::try_parse_from([
            "xmltk",
            "--ns",
            "a=urn:a",
            "query",
            "doc.xml",
            "//a:item",
            "--ns",
            "b=urn:b",
            "-vv",
        ])
        .unwrap();
        assert_eq!(
            cli.namespaces,
            vec![
                ("a".to_string(), "urn:a".to_string()),
                ("b".to_string(), "urn:b".to_string())
            ]
        );
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Query(ref args) if args.xpath == "//a:item"));
    }

    #[test]
    fn binding_needs_equals() {
        assert!(parse_binding("a=urn:a").is_ok());
        assert!(parse_binding("noequals").is_err());
        assert!(parse_binding("=urn:a").is_err());
        assert!(Cli::try_parse_from(["xmltk", "--ns", "bad", "format", "-"]).is_err());
    }

    #[test]
    fn parse_apply() {
        let cli = Cli::try_parse_from([
            "xmltk", "apply", "in.xml", "edit.json", "-o", "out.xml", "--pretty",
        ])
        .unwrap();
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out.xml")));
                assert!(args.pretty);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

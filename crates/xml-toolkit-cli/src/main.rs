//! xmltk: query and edit XML documents from the command line

mod cli;
mod logger;

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use xml_toolkit::{EditScript, XmlToolkit};

use crate::cli::{ApplyArgs, Cli, Command, FindAttrArgs, FindTextArgs, FormatArgs, QueryArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut toolkit = XmlToolkit::new();
    toolkit.register_namespaces(cli.namespaces);

    let input = match &cli.command {
        Command::Query(QueryArgs { input, .. })
        | Command::FindAttr(FindAttrArgs { input, .. })
        | Command::FindText(FindTextArgs { input, .. })
        | Command::Format(FormatArgs { input, .. })
        | Command::Apply(ApplyArgs { input, .. }) => input.clone(),
    };
    load(&mut toolkit, &input, cli.fragment)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Query(args) => {
            for markup in toolkit
                .query_path(&args.xpath)
                .with_context(|| format!("evaluating {}", args.xpath))?
            {
                writeln!(out, "{}", markup)?;
            }
        }
        Command::FindAttr(args) => {
            let found = if args.regex {
                toolkit.find_by_attribute_regex(&args.attribute, &args.value)
            } else {
                toolkit.find_by_attribute_value(&args.attribute, &args.value)
            }
            .with_context(|| format!("searching attribute {}", args.attribute))?;
            serde_json::to_writer_pretty(&mut out, &found)?;
            writeln!(out)?;
        }
        Command::FindText(args) => {
            let found = if args.regex {
                toolkit.find_by_text_regex(&args.text)
            } else {
                toolkit.find_by_text_content(&args.text)
            }
            .context("searching text")?;
            serde_json::to_writer_pretty(&mut out, &found)?;
            writeln!(out)?;
        }
        Command::Format(args) => {
            out.write_all(toolkit.save_to_string(!args.compact)?.as_bytes())?;
        }
        Command::Apply(args) => {
            let script = EditScript::from_file(&args.script)
                .with_context(|| format!("reading script {}", args.script.display()))?;
            let reports = script.apply(&mut toolkit)?;
            log::info!("applied {} step(s)", reports.len());
            match args.output {
                Some(path) => toolkit
                    .save_to_file(&path, args.pretty)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => out.write_all(toolkit.save_to_string(args.pretty)?.as_bytes())?,
            }
        }
    }
    Ok(())
}

fn load(toolkit: &mut XmlToolkit, input: &Path, fragment: bool) -> Result<()> {
    let content = read_input(input, io::stdin().lock())?;
    if fragment {
        toolkit.load_from_fragment(&content)
    } else {
        toolkit.load_from_string(&content)
    }
    .with_context(|| format!("parsing {}", input.display()))
}

/// Contents of `input`, or everything on `stdin` when `input` is `-`
fn read_input<R: Read>(input: &Path, mut stdin: R) -> Result<String> {
    if input == Path::new("-") {
        let mut buffer = String::new();
        stdin
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "steps": [
            { "op": "rename_attribute", "xpath": "//item", "from": "type", "to": "kind" },
            { "op": "wrap_element", "xpath": "//item", "wrapper": "group" }
        ]
    }"#;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("xmltk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn apply_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.xml");
        let script = dir.path().join("edit.json");
        let output = dir.path().join("out.xml");
        fs::write(&input, r#"<root><item type="a">1</item></root>"#).unwrap();
        fs::write(&script, SCRIPT).unwrap();

        run(cli(&[
            "apply",
            input.to_str().unwrap(),
            script.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]))
        .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(
            written,
            format!(
                "{}<root><group><item kind=\"a\">1</item></group></root>",
                xml_toolkit::XML_DECLARATION
            )
        );
    }

    #[test]
    fn apply_reports_failing_script() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.xml");
        let script = dir.path().join("edit.json");
        fs::write(&input, "<root/>").unwrap();
        fs::write(&script, r#"{"steps": [{"op": "remove_element", "xpath": "/root"}]}"#).unwrap();

        let err = run(cli(&["apply", input.to_str().unwrap(), script.to_str().unwrap()]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("remove_element"));
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.xml");
        let err = run(cli(&["format", missing.to_str().unwrap()])).unwrap_err();
        assert!(format!("{:#}", err).contains("reading"));
    }

    #[test]
    fn dash_reads_stdin() {
        let content = read_input(Path::new("-"), "<a>1</a>".as_bytes()).unwrap();
        assert_eq!(content, "<a>1</a>");
    }

    #[test]
    fn fragment_input_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frag.xml");
        fs::write(&input, "<a>1</a><b>2</b>").unwrap();

        let mut toolkit = XmlToolkit::new();
        load(&mut toolkit, &input, true).unwrap();
        assert_eq!(toolkit.query_path("/root/*").unwrap().len(), 2);
    }
}

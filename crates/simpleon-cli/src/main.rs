//! `simpleon` CLI — parse SimpleON documents from a line stream.
//!
//! ## Usage
//!
//! ```sh
//! # Parse a document from stdin, print its canonical dump
//! echo '{ name: widget, sizes: [1 2 3] }' | simpleon
//!
//! # Pretty-printed JSON output
//! simpleon --json -i config.son
//!
//! # Multiple documents in one stream
//! printf '1\n2\n3\n' | simpleon --multi
//!
//! # Documents embedded in `#:` comments of another file
//! simpleon --extract '#:' -i build.sh
//! ```
//!
//! Input is fed line by line; parse errors are reported to stderr with their
//! line number and feeding continues best-effort. At end of input the parser
//! is sealed and every finished document is written out.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use simpleon_core::{dump, CommentExtractor, ParseOptions, Value};

#[derive(Parser)]
#[command(
    name = "simpleon",
    version,
    about = "SimpleON streaming parser: line stream in, documents out"
)]
struct Cli {
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Emit pretty-printed JSON instead of the SimpleON dump
    #[arg(long)]
    json: bool,

    /// Keep bare words as strings instead of typing them
    #[arg(long)]
    raw_strings: bool,

    /// Accept multiple top-level documents in one stream
    #[arg(long)]
    multi: bool,

    /// Only parse text following this marker on each line
    #[arg(long, value_name = "MARKER")]
    extract: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = ParseOptions {
        convert: !cli.raw_strings,
        multi: cli.multi,
    };

    let reader = open_input(cli.input.as_deref())?;
    let (documents, had_error) = match cli.extract.as_deref() {
        Some(marker) => run_extractor(reader, marker, options)?,
        None => run_parser(reader, options)?,
    };

    if documents.is_empty() && had_error {
        anyhow::bail!("no documents could be parsed");
    }

    let mut rendered = String::new();
    for doc in &documents {
        if cli.json {
            rendered.push_str(
                &serde_json::to_string_pretty(doc).context("Failed to render JSON")?,
            );
        } else {
            rendered.push_str(&dump(doc));
        }
        rendered.push('\n');
    }
    write_output(cli.output.as_deref(), &rendered)?;
    Ok(())
}

/// Feed the reader line by line, reporting errors with their line number and
/// carrying on: a bad line poisons the current parse, not the stream read.
fn run_parser(
    reader: Box<dyn BufRead>,
    options: ParseOptions,
) -> Result<(Vec<Value>, bool)> {
    let mut parser = simpleon_core::Parser::new(options);
    let mut had_error = false;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if let Err(e) = parser.feed(&line) {
            had_error = true;
            eprintln!("parse error at line {}: {}", idx + 1, e);
        }
    }
    if let Err(e) = parser.seal() {
        had_error = true;
        eprintln!("parse error at end of input: {}", e);
    }
    Ok((drain(&mut parser), had_error))
}

/// Like [`run_parser`], but only the tails of marker-bearing lines are fed.
fn run_extractor(
    reader: Box<dyn BufRead>,
    marker: &str,
    options: ParseOptions,
) -> Result<(Vec<Value>, bool)> {
    let mut extractor = CommentExtractor::new(marker, options);
    let mut had_error = false;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if let Err(e) = extractor.feed_line(&line) {
            had_error = true;
            eprintln!("parse error at line {}: {}", idx + 1, e);
        }
    }
    if let Err(e) = extractor.seal() {
        had_error = true;
        eprintln!("parse error at end of input: {}", e);
    }
    let mut documents = Vec::new();
    while let Some(doc) = extractor.extract() {
        documents.push(doc);
    }
    Ok((documents, had_error))
}

fn drain(parser: &mut simpleon_core::Parser) -> Vec<Value> {
    let mut documents = Vec::new();
    while let Some(doc) = parser.extract() {
        documents.push(doc);
    }
    documents
}

fn open_input(path: Option<&str>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open file: {}", path))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

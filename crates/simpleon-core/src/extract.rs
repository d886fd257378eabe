//! Parsing documents embedded in another file's line comments.
//!
//! A SimpleON document can ride along inside a host file — configuration
//! carried in `#:`-prefixed lines of a shell script, say. The extractor
//! scans each host line for a marker and feeds only the text after it, so
//! the host file's own content never reaches the parser.

use crate::error::Result;
use crate::parser::{ParseOptions, Parser};
use crate::value::Value;

/// Feeds a [`Parser`] from the tails of lines carrying a marker.
///
/// ```rust
/// use simpleon_core::{CommentExtractor, ParseOptions, Value};
///
/// let mut extractor = CommentExtractor::new("#:", ParseOptions { convert: true, multi: false });
/// extractor.feed_line("#!/bin/sh").unwrap();
/// extractor.feed_line("#: { retries: 3 }").unwrap();
/// extractor.feed_line("exec server").unwrap();
/// extractor.seal().unwrap();
///
/// let config = extractor.extract().expect("embedded document");
/// assert_eq!(config.as_dict().unwrap()["retries"], Value::Int(3));
/// ```
#[derive(Debug)]
pub struct CommentExtractor {
    marker: String,
    parser: Parser,
}

impl CommentExtractor {
    pub fn new(marker: impl Into<String>, options: ParseOptions) -> Self {
        Self {
            marker: marker.into(),
            parser: Parser::new(options),
        }
    }

    /// Feed one line of the host file. Lines without the marker are skipped;
    /// for matching lines, everything after the first occurrence of the
    /// marker becomes one parser fragment.
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        match line.find(&self.marker) {
            Some(at) => self.parser.feed(&line[at + self.marker.len()..]),
            None => Ok(()),
        }
    }

    /// See [`Parser::seal`].
    pub fn seal(&mut self) -> Result<()> {
        self.parser.seal()
    }

    /// See [`Parser::extract`].
    pub fn extract(&mut self) -> Option<Value> {
        self.parser.extract()
    }
}

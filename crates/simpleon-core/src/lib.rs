//! # simpleon-core
//!
//! Streaming parser and dumper for **SimpleON**, a human-friendly superset
//! of JSON: bare words, `#` line comments, `"""…"""` multi-line strings,
//! optional commas, and optional conversion of bare words into typed
//! scalars (`null`/`true`/`false`/int/float).
//!
//! Input is pushed in as fragments — typically lines — and completed
//! top-level values come out of a queue as soon as they finish, so a
//! document can be consumed while it is still arriving. Fragments need not
//! line up with tokens: quoted strings and escape sequences resume cleanly
//! across fragment boundaries.
//!
//! ## Quick start
//!
//! ```rust
//! use simpleon_core::{ParseOptions, Parser};
//!
//! let mut parser = Parser::new(ParseOptions { convert: true, multi: false });
//! parser.feed("{ name: widget, sizes: [1 2 3] }").unwrap();
//! parser.seal().unwrap();
//!
//! let doc = parser.extract().expect("one document");
//! assert_eq!(doc.as_dict().unwrap()["name"].as_str(), Some("widget"));
//! ```
//!
//! ## Modules
//!
//! - [`parser`] — the push state machine (`feed` / `extract` / `seal`)
//! - [`value`] — the [`Value`] tree and its typed accessors
//! - [`dump`] — value tree → SimpleON text
//! - [`extract`] — documents embedded in another file's line comments
//! - [`error`] — error types

pub mod dump;
pub mod error;
pub mod extract;
pub mod parser;
mod token;
pub mod value;

pub use dump::dump;
pub use error::{Result, SimpleonError};
pub use extract::CommentExtractor;
pub use parser::{ParseOptions, Parser};
pub use value::{Kind, Value};

/// Parse a complete in-memory document set: each line of `input` is fed as
/// one fragment, the parser is sealed, and every emitted value is returned
/// in order.
pub fn parse_str(input: &str, options: ParseOptions) -> Result<Vec<Value>> {
    let mut parser = Parser::new(options);
    for line in input.lines() {
        parser.feed(line)?;
    }
    parser.seal()?;
    let mut values = Vec::new();
    while let Some(value) = parser.extract() {
        values.push(value);
    }
    Ok(values)
}

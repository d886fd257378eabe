//! Error types for SimpleON parsing.

use thiserror::Error;

/// Errors surfaced synchronously out of [`crate::Parser::feed`] and
/// [`crate::Parser::seal`].
///
/// After a `Structural` or `BadEscape` error the parser is not usable for
/// further input: subsequent feeds are no-ops and the caller should discard
/// the parser or seal it. No local recovery is attempted.
#[derive(Error, Debug)]
pub enum SimpleonError {
    /// An unexpected byte in a state that has no rule for it (e.g. a missing
    /// `:` between a dict key and its value). The message names what the
    /// parser expected.
    #[error("structural error: {0}")]
    Structural(String),

    /// `\x` was not followed by two hex digits.
    #[error("bad escape sequence: {0}")]
    BadEscape(String),

    /// An internal invariant was violated; not producible by any input.
    #[error("internal parser error: {0}")]
    Internal(&'static str),
}

/// Convenience alias used throughout simpleon-core.
pub type Result<T> = std::result::Result<T, SimpleonError>;

//! The streaming push parser.
//!
//! Input arrives as arbitrary text fragments (typically lines) through
//! [`Parser::feed`]; completed top-level values queue up and are drained with
//! [`Parser::extract`]. The machine is a single stack of tagged frames, each
//! carrying the partially built value it accumulates, so the state stack,
//! value stack, and pending-key stack of a classic design collapse into one.
//!
//! Fragments have line semantics: a `#` comment runs to the end of the
//! fragment, a bare word cannot continue past a fragment boundary, and inside
//! `"""…"""` strings each boundary contributes one `\n`. Quoted `"…"` strings
//! and escape sequences, by contrast, suspend cleanly mid-fragment and resume
//! when more input arrives, so chunk boundaries inside them do not change
//! what is parsed.

use std::collections::{BTreeMap, VecDeque};

use crate::error::{Result, SimpleonError};
use crate::token::{self, Unescape};
use crate::value::Value;

/// Once the cursor has consumed this much of the buffer, the dead prefix is
/// dropped on the next feed. Steady-state memory stays bounded by the
/// threshold plus the longest in-flight token.
const COMPACT_THRESHOLD: usize = 4096;

/// Parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Convert bare words to null/bool/int/float where one of those parses.
    /// Dict keys are never converted.
    pub convert: bool,
    /// Accept multiple top-level values in one stream. When off, everything
    /// after the first value is ignored.
    pub multi: bool,
}

/// How a dict frame is progressing through its `key : value` pairs. The
/// pending key rides inside the phase between its capture and the value.
#[derive(Debug, Default)]
enum DictPhase {
    /// Awaiting a key or `}`.
    #[default]
    PreKey,
    /// A child frame is parsing the key.
    Key,
    /// Key captured, awaiting `:`.
    PostKey(String),
    /// A child frame is parsing the value for the held key.
    Value(String),
    /// Pair stored, awaiting `,`, `}`, or the next key.
    PostValue,
}

/// One entry of the parse stack, carrying the value it accumulates.
#[derive(Debug)]
enum Frame {
    /// Awaiting the start of a value.
    Element,
    /// Inside `"…"`.
    Quoted(String),
    /// Inside `"""…"""`.
    Multiline(String),
    /// Inside `[…]`.
    List(Vec<Value>),
    /// Inside `{…}`.
    Dict {
        map: BTreeMap<String, Value>,
        phase: DictPhase,
    },
}

/// Whether the machine can keep running or must wait for more input.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Suspend,
}

/// Incremental SimpleON parser.
///
/// ```rust
/// use simpleon_core::{ParseOptions, Parser, Value};
///
/// let mut parser = Parser::new(ParseOptions { convert: true, multi: true });
/// parser.feed("1 2 3").unwrap();
/// assert_eq!(parser.extract(), Some(Value::Int(1)));
/// assert_eq!(parser.extract(), Some(Value::Int(2)));
/// assert_eq!(parser.extract(), Some(Value::Int(3)));
/// assert_eq!(parser.extract(), None);
/// ```
#[derive(Debug)]
pub struct Parser {
    buf: String,
    pos: usize,
    frames: Vec<Frame>,
    ready: VecDeque<Value>,
    convert: bool,
    multi: bool,
    sealed: bool,
    poisoned: bool,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            buf: String::new(),
            pos: 0,
            frames: vec![Frame::Element],
            ready: VecDeque::new(),
            convert: options.convert,
            multi: options.multi,
            sealed: false,
            poisoned: false,
        }
    }

    /// Append a fragment and run the machine until it needs more input.
    ///
    /// A no-op once the parser is sealed, after an error, or — in
    /// single-document mode — once the document has been emitted.
    pub fn feed(&mut self, fragment: &str) -> Result<()> {
        if self.sealed || self.poisoned || self.frames.is_empty() {
            return Ok(());
        }
        if self.pos >= COMPACT_THRESHOLD {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        self.buf.push_str(fragment);
        let outcome = self.run();
        if outcome.is_err() {
            self.poisoned = true;
        }
        outcome
    }

    /// Pop the oldest finished top-level value, if any. Ownership of the
    /// value transfers to the caller.
    pub fn extract(&mut self) -> Option<Value> {
        self.ready.pop_front()
    }

    /// Declare the end of input: transient state is dropped, already-emitted
    /// values stay extractable. Idempotent; repeated calls return `Ok`.
    ///
    /// Errors if a `"…"` string was still open — unlike containers, which an
    /// input may simply never have finished, a quoted string cannot be left
    /// unterminated by well-formed input.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Ok(());
        }
        self.sealed = true;
        let outcome = if self.poisoned { Ok(()) } else { self.finalize() };
        self.buf.clear();
        self.pos = 0;
        self.frames.clear();
        outcome
    }

    /// Resolve what end-of-input means for the machine's resting state: a
    /// pending `""` (held back because a third quote could still have
    /// arrived) becomes the empty string, while an open quoted string —
    /// including a lone trailing `"` — is a structural error.
    fn finalize(&mut self) -> Result<()> {
        if matches!(self.frames.last(), Some(Frame::Element)) {
            let tail = &self.buf.as_bytes()[self.pos..];
            if tail == b"\"\"" {
                self.frames.pop();
                self.pos = self.buf.len();
                return self.complete(Value::quoted(""));
            }
            if tail == b"\"" {
                return Err(SimpleonError::Structural(
                    "unterminated quoted string at end of input".to_string(),
                ));
            }
        }
        if self
            .frames
            .iter()
            .any(|frame| matches!(frame, Frame::Quoted(_)))
        {
            return Err(SimpleonError::Structural(
                "unterminated quoted string at end of input".to_string(),
            ));
        }
        Ok(())
    }

    /// Drive the state machine until the buffer is exhausted or a state
    /// needs more input than the buffer holds.
    fn run(&mut self) -> Result<()> {
        while self.pos < self.buf.len() {
            let step = match self.frames.last() {
                None => {
                    // Single-document mode: input past the document is
                    // ignored until seal.
                    self.pos = self.buf.len();
                    Step::Suspend
                }
                Some(Frame::Element) => self.element_start()?,
                Some(Frame::Quoted(_)) => self.quoted_string()?,
                Some(Frame::Multiline(_)) => self.multiline_string()?,
                Some(Frame::List(_)) => self.list_body()?,
                Some(Frame::Dict { phase, .. }) => match phase {
                    DictPhase::PreKey => self.dict_pre_key()?,
                    DictPhase::PostKey(_) => self.dict_post_key()?,
                    DictPhase::PostValue => self.dict_post_value()?,
                    DictPhase::Key | DictPhase::Value(_) => {
                        return Err(SimpleonError::Internal(
                            "dict frame surfaced while its child is open",
                        ))
                    }
                },
            };
            if step == Step::Suspend {
                break;
            }
        }
        Ok(())
    }

    /// Route a finished value to its destination: attach it to the enclosing
    /// container, capture it as a dict key, or emit it as a top-level
    /// document. The value's own frame has already been popped.
    fn complete(&mut self, value: Value) -> Result<()> {
        match self.frames.last_mut() {
            None => {
                self.ready.push_back(value);
                if self.multi {
                    self.frames.push(Frame::Element);
                }
                Ok(())
            }
            Some(Frame::List(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Dict { map, phase }) => match std::mem::take(phase) {
                DictPhase::Key => {
                    let Value::String { value: key, .. } = value else {
                        return Err(SimpleonError::Internal(
                            "dict key completed as a non-string",
                        ));
                    };
                    *phase = DictPhase::PostKey(key);
                    Ok(())
                }
                DictPhase::Value(key) => {
                    *phase = DictPhase::PostValue;
                    // Last write wins; a replaced subtree is dropped here.
                    map.insert(key, value);
                    Ok(())
                }
                _ => Err(SimpleonError::Internal(
                    "value completed in a dict gap state",
                )),
            },
            Some(_) => Err(SimpleonError::Internal(
                "value completed under a non-container frame",
            )),
        }
    }

    /// Advance past spaces and tabs, returning the byte under the cursor or
    /// `None` at end of buffer.
    fn skip_blank(&mut self) -> Option<u8> {
        let bytes = self.buf.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\t' => self.pos += 1,
                b => return Some(b),
            }
        }
        None
    }

    /// Replace the top frame (which must be `Element`) with `frame`.
    fn become_frame(&mut self, frame: Frame) -> Result<()> {
        let Some(slot) = self.frames.last_mut() else {
            return Err(SimpleonError::Internal("no frame to transform"));
        };
        *slot = frame;
        Ok(())
    }

    fn element_start(&mut self) -> Result<Step> {
        let Some(b) = self.skip_blank() else {
            return Ok(Step::Suspend);
        };
        match b {
            b'{' => {
                self.pos += 1;
                self.become_frame(Frame::Dict {
                    map: BTreeMap::new(),
                    phase: DictPhase::PreKey,
                })?;
                Ok(Step::Continue)
            }
            b'[' => {
                self.pos += 1;
                self.become_frame(Frame::List(Vec::new()))?;
                Ok(Step::Continue)
            }
            b'"' => {
                let bytes = self.buf.as_bytes();
                let rem = bytes.len() - self.pos;
                if rem >= 3 && bytes[self.pos + 1] == b'"' && bytes[self.pos + 2] == b'"' {
                    self.pos += 3;
                    self.become_frame(Frame::Multiline(String::new()))?;
                    Ok(Step::Continue)
                } else if rem == 1 || (rem == 2 && bytes[self.pos + 1] == b'"') {
                    // Could still become a `"""` opener; wait for the byte
                    // that settles it.
                    Ok(Step::Suspend)
                } else {
                    self.pos += 1;
                    self.become_frame(Frame::Quoted(String::new()))?;
                    Ok(Step::Continue)
                }
            }
            b'#' => {
                self.pos = self.buf.len();
                Ok(Step::Continue)
            }
            b if token::is_special(b) => Err(SimpleonError::Structural(format!(
                "unexpected {:?} where a value should start",
                b as char
            ))),
            _ => {
                // Bare word: runs to the next special byte or the end of the
                // fragment buffer.
                let bytes = self.buf.as_bytes();
                let start = self.pos;
                let mut end = start;
                while end < bytes.len() && !token::is_special(bytes[end]) {
                    end += 1;
                }
                let convert = self.convert && !self.parsing_dict_key();
                let value = token::type_bare_word(&self.buf[start..end], convert);
                self.pos = end;
                self.frames.pop();
                self.complete(value)?;
                Ok(Step::Continue)
            }
        }
    }

    /// True when the element on top of the stack is producing a dict key.
    fn parsing_dict_key(&self) -> bool {
        let n = self.frames.len();
        n >= 2
            && matches!(
                self.frames[n - 2],
                Frame::Dict {
                    phase: DictPhase::Key,
                    ..
                }
            )
    }

    fn quoted_string(&mut self) -> Result<Step> {
        let len = self.buf.len();
        let mut s = self.pos;
        {
            let bytes = self.buf.as_bytes();
            while s < len && bytes[s] != b'"' && bytes[s] != b'\\' {
                s += 1;
            }
        }
        if s == len {
            // The string continues into the next fragment.
            self.append_to_string(s)?;
            self.pos = len;
            return Ok(Step::Suspend);
        }
        if self.buf.as_bytes()[s] == b'\\' {
            self.append_to_string(s)?;
            self.pos = s;
            return self.push_escape();
        }
        // Closing quote: the value is complete.
        match self.frames.pop() {
            Some(Frame::Quoted(mut text)) => {
                text.push_str(&self.buf[self.pos..s]);
                self.pos = s + 1;
                self.complete(Value::String {
                    value: text,
                    quoted: true,
                })?;
                Ok(Step::Continue)
            }
            _ => Err(SimpleonError::Internal("quoted-string frame missing")),
        }
    }

    fn multiline_string(&mut self) -> Result<Step> {
        let len = self.buf.len();
        let mut s = self.pos;
        {
            let bytes = self.buf.as_bytes();
            while s < len && bytes[s] != b'"' && bytes[s] != b'\\' {
                s += 1;
            }
        }
        if s == len {
            // Fragment exhausted: the boundary stands for a newline in the
            // reconstructed text.
            self.append_to_string(s)?;
            self.append_char('\n')?;
            self.pos = len;
            return Ok(Step::Suspend);
        }
        if self.buf.as_bytes()[s] == b'\\' {
            self.append_to_string(s)?;
            self.pos = s;
            return self.push_escape();
        }
        // A quote: only `"""` terminates.
        if s + 2 < len {
            let bytes = self.buf.as_bytes();
            if bytes[s + 1] == b'"' && bytes[s + 2] == b'"' {
                match self.frames.pop() {
                    Some(Frame::Multiline(mut text)) => {
                        text.push_str(&self.buf[self.pos..s]);
                        self.pos = s + 3;
                        self.complete(Value::String {
                            value: text,
                            quoted: true,
                        })?;
                        return Ok(Step::Continue);
                    }
                    _ => return Err(SimpleonError::Internal("multiline-string frame missing")),
                }
            }
            // Lone quote inside the string body.
            self.append_to_string(s)?;
            self.append_char('"')?;
            self.pos = s + 1;
            return Ok(Step::Continue);
        }
        let rem = len - s;
        if rem == 2 && self.buf.as_bytes()[s + 1] != b'"' {
            self.append_to_string(s)?;
            self.append_char('"')?;
            self.pos = s + 1;
            return Ok(Step::Continue);
        }
        // Trailing `"` or `""`: cannot yet tell whether this is the
        // terminator. Hold position until more input arrives. No boundary
        // newline is recorded; the quotes themselves mark the position.
        self.append_to_string(s)?;
        self.pos = s;
        Ok(Step::Suspend)
    }

    /// Append `buf[pos..upto]` to the string frame on top of the stack.
    fn append_to_string(&mut self, upto: usize) -> Result<()> {
        let Some(Frame::Quoted(acc) | Frame::Multiline(acc)) = self.frames.last_mut() else {
            return Err(SimpleonError::Internal("string frame missing"));
        };
        acc.push_str(&self.buf[self.pos..upto]);
        Ok(())
    }

    /// Append one character to the string frame on top of the stack.
    fn append_char(&mut self, ch: char) -> Result<()> {
        let Some(Frame::Quoted(acc) | Frame::Multiline(acc)) = self.frames.last_mut() else {
            return Err(SimpleonError::Internal("string frame missing"));
        };
        acc.push(ch);
        Ok(())
    }

    /// Decode the escape at the cursor, which sits on a backslash, into the
    /// string frame on top of the stack. When the sequence runs past the end
    /// of the buffer the cursor stays on the backslash and the machine
    /// suspends, so a split escape resumes intact on the next feed.
    fn push_escape(&mut self) -> Result<Step> {
        let outcome = token::decode_escape(&self.buf.as_bytes()[self.pos + 1..])?;
        match outcome {
            Unescape::Incomplete => Ok(Step::Suspend),
            Unescape::Decoded { ch, consumed } => {
                self.append_char(ch)?;
                self.pos += 1 + consumed;
                Ok(Step::Continue)
            }
            Unescape::Bare => {
                // The backslash stands for itself; the selector byte is left
                // for normal text handling.
                self.append_char('\\')?;
                self.pos += 1;
                Ok(Step::Continue)
            }
        }
    }

    fn dict_pre_key(&mut self) -> Result<Step> {
        let Some(b) = self.skip_blank() else {
            return Ok(Step::Suspend);
        };
        match b {
            b'}' => {
                self.pos += 1;
                self.finish_dict()
            }
            b'#' => {
                self.pos = self.buf.len();
                Ok(Step::Continue)
            }
            b'"' => self.start_dict_key(),
            b if !token::is_special(b) => self.start_dict_key(),
            _ => Err(SimpleonError::Structural(format!(
                "expected dict key or '}}', found {:?}",
                b as char
            ))),
        }
    }

    fn start_dict_key(&mut self) -> Result<Step> {
        self.set_dict_phase(DictPhase::Key)?;
        self.frames.push(Frame::Element);
        Ok(Step::Continue)
    }

    fn dict_post_key(&mut self) -> Result<Step> {
        let Some(b) = self.skip_blank() else {
            return Ok(Step::Suspend);
        };
        match b {
            b':' => {
                self.pos += 1;
                let Some(Frame::Dict { phase, .. }) = self.frames.last_mut() else {
                    return Err(SimpleonError::Internal("dict state without its frame"));
                };
                let DictPhase::PostKey(key) = std::mem::take(phase) else {
                    return Err(SimpleonError::Internal("post-key dispatch without a key"));
                };
                *phase = DictPhase::Value(key);
                self.frames.push(Frame::Element);
                Ok(Step::Continue)
            }
            b'#' => {
                self.pos = self.buf.len();
                Ok(Step::Continue)
            }
            _ => Err(SimpleonError::Structural(format!(
                "expected ':' after dict key, found {:?}",
                b as char
            ))),
        }
    }

    fn dict_post_value(&mut self) -> Result<Step> {
        let Some(b) = self.skip_blank() else {
            return Ok(Step::Suspend);
        };
        match b {
            b',' => {
                self.pos += 1;
                self.set_dict_phase(DictPhase::PreKey)?;
                Ok(Step::Continue)
            }
            b'}' => {
                self.pos += 1;
                self.finish_dict()
            }
            b'#' => {
                self.pos = self.buf.len();
                Ok(Step::Continue)
            }
            // Commas between pairs are optional: a key start in value
            // position implicitly opens the next pair.
            b'"' => {
                self.set_dict_phase(DictPhase::PreKey)?;
                Ok(Step::Continue)
            }
            b if !token::is_special(b) => {
                self.set_dict_phase(DictPhase::PreKey)?;
                Ok(Step::Continue)
            }
            _ => Err(SimpleonError::Structural(format!(
                "expected ',', '}}', or the next dict key, found {:?}",
                b as char
            ))),
        }
    }

    fn set_dict_phase(&mut self, phase: DictPhase) -> Result<()> {
        let Some(Frame::Dict { phase: slot, .. }) = self.frames.last_mut() else {
            return Err(SimpleonError::Internal("dict state without its frame"));
        };
        *slot = phase;
        Ok(())
    }

    fn finish_dict(&mut self) -> Result<Step> {
        match self.frames.pop() {
            Some(Frame::Dict { map, .. }) => {
                self.complete(Value::Dict(map))?;
                Ok(Step::Continue)
            }
            _ => Err(SimpleonError::Internal("dict state without its frame")),
        }
    }

    fn list_body(&mut self) -> Result<Step> {
        let Some(b) = self.skip_blank() else {
            return Ok(Step::Suspend);
        };
        match b {
            b']' => {
                self.pos += 1;
                match self.frames.pop() {
                    Some(Frame::List(items)) => {
                        self.complete(Value::List(items))?;
                        Ok(Step::Continue)
                    }
                    _ => Err(SimpleonError::Internal("list state without its frame")),
                }
            }
            b',' => {
                self.pos += 1;
                self.frames.push(Frame::Element);
                Ok(Step::Continue)
            }
            b'#' => {
                self.pos = self.buf.len();
                Ok(Step::Continue)
            }
            // Commas between elements are optional: anything else starts the
            // next element in place, and the element state rejects what it
            // cannot begin with.
            _ => {
                self.frames.push(Frame::Element);
                Ok(Step::Continue)
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

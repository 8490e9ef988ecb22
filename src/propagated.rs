//! Data that propagates hierarchically during encoding and decoding.
use serde_json::Value;

use crate::error::CodecError;
use crate::settings::CodecSettings;
use crate::std::{
    string::{String, ToString},
    vec::Vec,
};

/// Step from a value into one of its parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PathSegment {
    Field(String),
    Position(usize),
    Variant(String),
}

/// Type descent, with the data position it started at.
#[derive(Clone, Copy, Debug)]
struct Descent {
    /// Data position (decoding) or output length (encoding) at descent.
    mark: usize,

    /// Number of descents in a row, this one included, made at the same mark.
    stalled: usize,
}

/// Current location in the value and recursion depth, with the settings
/// all the way down.
///
/// Segments are pushed on the way down and popped on the way up. On error
/// the whole thing is dropped, so nothing needs to be popped then.
#[derive(Debug)]
pub(crate) struct Propagated<'a> {
    pub(crate) settings: &'a CodecSettings,
    path: Vec<PathSegment>,
    descents: Vec<Descent>,
}

impl<'a> Propagated<'a> {
    pub(crate) fn new(settings: &'a CodecSettings) -> Self {
        Self {
            settings,
            path: Vec::new(),
            descents: Vec::new(),
        }
    }

    /// Location of the current value, printed.
    pub(crate) fn path(&self) -> String {
        let mut out = String::from("$");
        for segment in self.path.iter() {
            match segment {
                PathSegment::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                PathSegment::Position(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
                PathSegment::Variant(name) => {
                    out.push_str("::");
                    out.push_str(name);
                }
            }
        }
        out
    }

    /// Go one type deeper, with data processed so far up to `mark`.
    ///
    /// Descents that process no data in between are limited by `max_depth`,
    /// all nested descents together are limited by `max_nesting`.
    pub(crate) fn descend(&mut self, mark: usize) -> Result<(), CodecError> {
        let stalled = match self.descents.last() {
            Some(previous) if previous.mark == mark => previous.stalled + 1,
            _ => 1,
        };
        if stalled > self.settings.max_depth {
            return Err(CodecError::RecursionLimit {
                path: self.path(),
                limit: self.settings.max_depth,
            });
        }
        if self.descents.len() >= self.settings.max_nesting {
            return Err(CodecError::RecursionLimit {
                path: self.path(),
                limit: self.settings.max_nesting,
            });
        }
        self.descents.push(Descent { mark, stalled });
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.descents.pop();
    }

    pub(crate) fn enter(&mut self, segment: PathSegment) {
        self.path.push(segment)
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    pub(crate) fn mismatch(&self, expected: &str, found: &Value) -> CodecError {
        CodecError::TypeMismatch {
            path: self.path(),
            expected: expected.to_string(),
            found: value_kind(found),
        }
    }

    pub(crate) fn truncated(&self, position: usize, needed: usize, available: usize) -> CodecError {
        CodecError::Truncated {
            path: self.path(),
            position,
            needed,
            available,
        }
    }
}

/// Short description of the JSON value kind, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Field-level validation errors and the envelope that carries them.
//!
//! # Wire shape
//!
//! An envelope serializes as a JSON array. Every entry has exactly five keys:
//!
//! ```json
//! [
//!   {
//!     "type": "int_parsing",
//!     "loc": ["path", "item_id"],
//!     "msg": "Input should be a valid integer, unable to parse string as an integer",
//!     "input": "foo",
//!     "url": "https://errors.pydantic.dev/2.10/v/int_parsing"
//!   }
//! ]
//! ```
//!
//! `loc` segments are strings for field names and integers for list indices.
//! `input` is `null` when the field was absent.

use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::value::RawValue;

const ERROR_URL_BASE: &str = "https://errors.pydantic.dev/2.10/v/";

/// The kind of a field-level failure, serialized as the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Missing,
    IntParsing,
    FloatParsing,
    BoolParsing,
    Enum,
    StringTooShort,
    StringTooLong,
    TooShort,
    TooLong,
    StringPatternMismatch,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    DictType,
    ListType,
    StringType,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing               => "missing",
            Self::IntParsing            => "int_parsing",
            Self::FloatParsing          => "float_parsing",
            Self::BoolParsing           => "bool_parsing",
            Self::Enum                  => "enum",
            Self::StringTooShort        => "string_too_short",
            Self::StringTooLong         => "string_too_long",
            Self::TooShort              => "too_short",
            Self::TooLong               => "too_long",
            Self::StringPatternMismatch => "string_pattern_mismatch",
            Self::GreaterThan           => "greater_than",
            Self::GreaterThanEqual      => "greater_than_equal",
            Self::LessThan              => "less_than",
            Self::LessThanEqual         => "less_than_equal",
            Self::DictType              => "dict_type",
            Self::ListType              => "list_type",
            Self::StringType            => "string_type",
        }
    }

    /// Stable documentation link for this kind.
    pub fn url(self) -> String {
        format!("{ERROR_URL_BASE}{}", self.as_str())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of an error location: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for LocSegment {
    fn from(s: &str) -> Self {
        Self::Key(s.to_owned())
    }
}

impl From<String> for LocSegment {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for LocSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// An ordered location such as `["query", "address", "zip_code"]`.
pub type Loc = Vec<LocSegment>;

/// Extends `loc` by one segment without touching the original.
pub(crate) fn child(loc: &[LocSegment], seg: impl Into<LocSegment>) -> Loc {
    let mut next = loc.to_vec();
    next.push(seg.into());
    next
}

/// One field-level failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub loc: Loc,
    pub msg: String,
    pub input: Option<RawValue>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, loc: Loc, msg: impl Into<String>, input: Option<RawValue>) -> Self {
        Self { kind, loc, msg: msg.into(), input }
    }

    pub(crate) fn missing(loc: Loc) -> Self {
        Self::new(ErrorKind::Missing, loc, "Field required", None)
    }

    pub fn url(&self) -> String {
        self.kind.url()
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ValidationError", 5)?;
        s.serialize_field("type", self.kind.as_str())?;
        s.serialize_field("loc", &self.loc)?;
        s.serialize_field("msg", &self.msg)?;
        s.serialize_field("input", &self.input)?;
        s.serialize_field("url", &self.url())?;
        s.end()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc: Vec<String> = self
            .loc
            .iter()
            .map(|seg| match seg {
                LocSegment::Key(k) => k.clone(),
                LocSegment::Index(i) => i.to_string(),
            })
            .collect();
        write!(f, "{}: {} [type={}]", loc.join("."), self.msg, self.kind)
    }
}

/// Every validation failure for one request, in evaluation order.
///
/// Never empty: [`ErrorEnvelope::from_errors`] returns `None` for an empty
/// list, and a request without errors produces a bound request instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorEnvelope(Vec<ValidationError>);

impl ErrorEnvelope {
    pub fn from_errors(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() { None } else { Some(Self(errors)) }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ErrorEnvelope {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.len();
        write!(f, "{n} validation error{}", if n == 1 { "" } else { "s" })?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_list_is_not_an_envelope() {
        assert!(ErrorEnvelope::from_errors(Vec::new()).is_none());
    }

    #[test]
    fn serializes_exactly_five_keys() {
        let err = ValidationError::new(
            ErrorKind::IntParsing,
            vec!["query".into(), "tags".into(), LocSegment::Index(1)],
            "Input should be a valid integer, unable to parse string as an integer",
            Some(RawValue::text("x")),
        );
        let envelope = ErrorEnvelope::from_errors(vec![err, ValidationError::missing(vec!["query".into(), "q".into()])]).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json[0]["type"], "int_parsing");
        assert_eq!(json[0]["loc"], serde_json::json!(["query", "tags", 1]));
        assert_eq!(json[0]["input"], "x");
        assert_eq!(json[0]["url"], "https://errors.pydantic.dev/2.10/v/int_parsing");
        assert_eq!(json[0].as_object().unwrap().len(), 5);
        assert_eq!(json[1]["input"], serde_json::Value::Null);
        assert_eq!(json[1]["msg"], "Field required");
    }

    #[test]
    fn display_lists_every_error() {
        let envelope = ErrorEnvelope::from_errors(vec![ValidationError::missing(vec!["query".into(), "b_name".into()])]).unwrap();
        assert_eq!(envelope.to_string(), "1 validation error\n  query.b_name: Field required [type=missing]");
    }
}

//! Route pattern syntax and segment-wise matching.
//!
//! ```text
//! /users/{user_id}/items/{item_id}     typed parameters
//! /models/{model_name}                 enum-constrained once the schema says so
//! /files/{file_path:path}              path capture, final segment only
//! ```
//!
//! Patterns are parsed once at registration. Matching walks the pattern and
//! the request path side by side and bails on the first mismatch; there is no
//! backtracking.

use std::collections::HashSet;
use std::fmt;

use crate::error::Error;

const PATH_CONVERTOR: &str = "path";

/// One component of a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Byte-exact text.
    Literal(String),
    /// Any single non-empty segment.
    Param(String),
    /// Any single non-empty segment; membership is checked by the validator.
    Enum { name: String, allowed: Vec<String> },
    /// The rest of the path, separators included.
    Capture(String),
}

impl Segment {
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Param(name) | Self::Enum { name, .. } | Self::Capture(name) => Some(name),
        }
    }
}

/// A parsed, immutable route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let Some(body) = pattern.strip_prefix('/') else {
            return Err(Error::pattern(pattern, "must start with `/`"));
        };

        let parts: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names = HashSet::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = parse_segment(pattern, part)?;
            if let Some(name) = segment.param_name() {
                if !names.insert(name.to_owned()) {
                    return Err(Error::pattern(pattern, format!("parameter `{name}` appears twice")));
                }
            }
            if matches!(segment, Segment::Capture(_)) && i + 1 != parts.len() {
                return Err(Error::pattern(pattern, "a `:path` parameter must be the final segment"));
            }
            segments.push(segment);
        }

        Ok(Self { source: pattern.to_owned(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.param_names().any(|n| n == name)
    }

    /// Turns the `{name}` segment into an enum-constrained one.
    pub(crate) fn constrain(&mut self, name: &str, allowed: &[String]) -> Result<(), Error> {
        if allowed.is_empty() {
            return Err(Error::pattern(&self.source, format!("enum parameter `{name}` has no allowed values")));
        }
        for seg in &mut self.segments {
            if matches!(seg, Segment::Param(n) if n == name) {
                *seg = Segment::Enum { name: name.to_owned(), allowed: allowed.to_vec() };
            }
        }
        Ok(())
    }

    /// Matches pre-split path segments, returning `(name, decoded value)`
    /// pairs in pattern order.
    pub fn captures<'p>(&'p self, path: &[&str]) -> Option<Vec<(&'p str, String)>> {
        let mut captured = Vec::new();

        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Capture(name) => {
                    let rest = path.get(i..).filter(|rest| !rest.is_empty())?;
                    captured.push((name.as_str(), percent_decode(&rest.join("/"))));
                    return Some(captured);
                }
                Segment::Literal(text) => {
                    if *path.get(i)? != text.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) | Segment::Enum { name, .. } => {
                    let part = path.get(i).filter(|p| !p.is_empty())?;
                    captured.push((name.as_str(), percent_decode(part)));
                }
            }
        }

        (path.len() == self.segments.len()).then_some(captured)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Splits a request path into segments. The leading `/` is dropped, so `/`
/// yields a single empty segment and `/items/` ends with one.
pub fn split_path(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

fn parse_segment(pattern: &str, part: &str) -> Result<Segment, Error> {
    if !part.contains(['{', '}']) {
        return Ok(Segment::Literal(part.to_owned()));
    }

    let inner = part
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|s| !s.contains(['{', '}']))
        .ok_or_else(|| Error::pattern(pattern, format!("`{part}` must be a whole `{{name}}` segment")))?;

    let (name, convertor) = match inner.split_once(':') {
        Some((name, conv)) => (name, Some(conv)),
        None => (inner, None),
    };

    if !is_identifier(name) {
        return Err(Error::pattern(pattern, format!("`{name}` is not a valid parameter name")));
    }

    match convertor {
        None => Ok(Segment::Param(name.to_owned())),
        Some(PATH_CONVERTOR) => Ok(Segment::Capture(name.to_owned())),
        Some(other) => Err(Error::pattern(pattern, format!("unknown convertor `{other}`"))),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Percent-decodes `raw`. Byte sequences that are not UTF-8 after decoding
/// become U+FFFD rather than passing through still encoded.
pub(crate) fn percent_decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        let p = RoutePattern::parse(pattern).unwrap();
        p.captures(&split_path(path))
            .map(|c| c.into_iter().map(|(n, v)| (n.to_owned(), v)).collect())
    }

    #[test]
    fn parses_segment_kinds() {
        let p = RoutePattern::parse("/users/{user_id}/files/{rest:path}").unwrap();
        assert_eq!(
            p.segments(),
            [
                Segment::Literal("users".into()),
                Segment::Param("user_id".into()),
                Segment::Literal("files".into()),
                Segment::Capture("rest".into()),
            ]
        );
        assert_eq!(p.param_names().collect::<Vec<_>>(), ["user_id", "rest"]);
    }

    #[test]
    fn rejects_malformed_patterns() {
        for bad in [
            "items",
            "/files/{p:path}/tail",
            "/a/{x}/{x}",
            "/a/{}",
            "/a/{1x}",
            "/a/file.{ext}",
            "/a/{id:int}",
            "/a/{id",
        ] {
            assert!(
                matches!(RoutePattern::parse(bad), Err(Error::InvalidPattern { .. })),
                "pattern {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn literal_and_param_segments() {
        assert_eq!(capture("/items/{item_id}", "/items/3"), Some(vec![("item_id".into(), "3".into())]));
        assert_eq!(capture("/items/{item_id}", "/items/"), None);
        assert_eq!(capture("/items/{item_id}", "/items/3/extra"), None);
        assert_eq!(capture("/items/{item_id}", "/Items/3"), None);
        assert_eq!(capture("/", "/"), Some(vec![]));
        assert_eq!(capture("/items/", "/items"), None);
    }

    #[test]
    fn path_capture_keeps_separators() {
        assert_eq!(
            capture("/files/{file_path:path}", "/files/home/johndoe/myfile.txt"),
            Some(vec![("file_path".into(), "home/johndoe/myfile.txt".into())])
        );
        assert_eq!(capture("/files/{file_path:path}", "/files/"), Some(vec![("file_path".into(), String::new())]));
        assert_eq!(capture("/files/{file_path:path}", "/files"), None);
    }

    #[test]
    fn captured_values_are_percent_decoded() {
        assert_eq!(capture("/items/{name}", "/items/hello%20world"), Some(vec![("name".into(), "hello world".into())]));
        assert_eq!(capture("/items/{name}", "/items/%FF"), Some(vec![("name".into(), "\u{FFFD}".into())]));
        assert_eq!(capture("/items/{name}", "/items/caf%C3%A9"), Some(vec![("name".into(), "café".into())]));
    }

    #[test]
    fn constrain_requires_allowed_values() {
        let mut p = RoutePattern::parse("/models/{model_name}").unwrap();
        assert!(p.constrain("model_name", &[]).is_err());
        p.constrain("model_name", &["alexnet".into()]).unwrap();
        assert!(matches!(&p.segments()[1], Segment::Enum { name, .. } if name == "model_name"));
    }
}

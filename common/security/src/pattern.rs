use std::fmt;

use crate::error::{SecurityError, SecurityResult};

/// Ant-style URL path pattern.
///
/// `?` matches one character and `*` any run of characters inside a single
/// segment; a whole `**` segment matches zero or more segments.
#[derive(Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    AnyDepth,
    Glob(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> SecurityResult<Self> {
        let trimmed = pattern.trim();
        if !trimmed.starts_with('/') {
            return Err(SecurityError::InvalidPattern(pattern.to_string()));
        }

        let segments = split_segments(trimmed)
            .into_iter()
            .map(|segment| match segment {
                "**" => Segment::AnyDepth,
                other => Segment::Glob(other.to_string()),
            })
            .collect();

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        match_segments(&self.segments, &split_segments(path))
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => {
                glob_match(glob.as_bytes(), head.as_bytes()) && match_segments(rest, tail)
            }
            None => false,
        },
    }
}

fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((b'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((expected, rest)) => {
            text.first() == Some(expected) && glob_match(rest, &text[1..])
        }
    }
}

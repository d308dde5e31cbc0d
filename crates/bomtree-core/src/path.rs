//! Materialized path handling.
//!
//! A materialized path encodes a node's full ancestry as `/`-delimited
//! segments, e.g. `"1/4/12"`. The parent of a path is the same path with the
//! last segment dropped; roots have exactly one segment.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Segment delimiter used by the backend.
pub const SEPARATOR: char = '/';

/// Why a raw path string could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathDefect {
    /// The path string is empty.
    Empty,
    /// The path starts or ends with a separator.
    DanglingSeparator,
    /// Two separators with nothing in between.
    EmptySegment,
}

impl fmt::Display for PathDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "path is empty",
            Self::DanglingSeparator => "path starts or ends with a separator",
            Self::EmptySegment => "path contains an empty segment",
        };
        write!(f, "{}", s)
    }
}

/// A validated materialized path.
///
/// Holds the raw string plus the byte offset of the last separator so that
/// parent lookups do not need to re-split the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaterializedPath {
    raw: String,
    segments: usize,
    last_separator: Option<usize>,
}

impl MaterializedPath {
    /// Parses and validates a raw path string.
    pub fn parse(raw: &str) -> Result<Self, PathDefect> {
        if raw.is_empty() {
            return Err(PathDefect::Empty);
        }
        if raw.starts_with(SEPARATOR) || raw.ends_with(SEPARATOR) {
            return Err(PathDefect::DanglingSeparator);
        }

        let mut segments = 0;
        for segment in raw.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(PathDefect::EmptySegment);
            }
            segments += 1;
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            last_separator: raw.rfind(SEPARATOR),
        })
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments (a root path has one).
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// The depth this path implies: segment count minus one.
    pub fn implied_depth(&self) -> usize {
        self.segments - 1
    }

    /// Returns true for single-segment paths.
    pub fn is_root(&self) -> bool {
        self.last_separator.is_none()
    }

    /// The parent path string, or `None` for a root path.
    pub fn parent(&self) -> Option<&str> {
        self.last_separator.map(|idx| &self.raw[..idx])
    }

    /// The last segment of the path.
    pub fn last_segment(&self) -> &str {
        match self.last_separator {
            Some(idx) => &self.raw[idx + 1..],
            None => &self.raw,
        }
    }

    /// Iterates over the segments from root to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split(SEPARATOR)
    }

    /// Returns true if `other` is a direct child of this path.
    pub fn is_parent_of(&self, other: &MaterializedPath) -> bool {
        other.parent() == Some(self.raw.as_str())
    }

    /// Iterates over all proper prefixes of this path, nearest first.
    ///
    /// For `"1/4/12"` this yields `"1/4"` then `"1"`.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        let raw = self.raw.as_str();
        raw.char_indices()
            .rev()
            .filter(|(_, c)| *c == SEPARATOR)
            .map(move |(idx, _)| &raw[..idx])
    }
}

impl fmt::Display for MaterializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for MaterializedPath {
    type Error = PathDefect;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MaterializedPath> for String {
    fn from(path: MaterializedPath) -> Self {
        path.raw
    }
}

/// Compares two strings so that embedded digit runs sort numerically.
///
/// `"R2"` sorts before `"R10"`, and `"C1"` before `"C1A"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trim = l_run.trim_start_matches('0');
                let r_trim = r_run.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim))
                    .then_with(|| l_run.len().cmp(&r_run.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

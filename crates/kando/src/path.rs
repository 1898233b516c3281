//! Type path and segment parsing.
//!
//! A type path is `<medium>.<segment>(.<segment>)*`, for example
//! `local.user.profile.name` or `session.cart.items[2].qty`. The first segment
//! after the medium names the root key: the medium entry that holds the whole
//! namespace tree. For an indexed first segment (`list[2]`) the root key is
//! its base (`list`).
//!
//! Segments are split on `.` with no escaping, so keys containing `.` cannot
//! be addressed. A segment may carry a single trailing index group,
//! `name[3]`; chained groups such as `a[0][1]` are not supported and parse as
//! the base `a[0]` indexed by `1`.

use crate::error::{KandoError, KandoResult};
use std::fmt;

/// The storage medium named by a type path.
///
/// Names other than `local` and `session` are accepted and always resolve to
/// the in-memory fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediumKind {
    Local,
    Session,
    Other(String),
}

impl MediumKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "local" => Self::Local,
            "session" => Self::Session,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
            Self::Other(name) => name,
        }
    }

    /// Whether expiration records apply to this medium.
    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session)
    }
}

impl fmt::Display for MediumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `<medium>.<path>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePath {
    medium: MediumKind,
    path: String,
}

impl TypePath {
    /// Split at the first `.` into medium and path.
    ///
    /// Everything after the first `.` is kept verbatim as the path.
    pub fn parse(type_path: &str) -> KandoResult<Self> {
        let (medium, path) = type_path
            .split_once('.')
            .ok_or_else(|| KandoError::invalid_path(type_path, "missing '.' after medium"))?;

        if path.is_empty() {
            return Err(KandoError::invalid_path(
                type_path,
                "missing path after medium",
            ));
        }

        Ok(Self {
            medium: MediumKind::parse(medium),
            path: path.to_string(),
        })
    }

    pub fn medium(&self) -> &MediumKind {
        &self.medium
    }

    /// The path including the root key, without the medium.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root_key(&self) -> &str {
        root_key(&self.path)
    }

    /// Whether the path names the namespace root itself.
    pub fn is_root(&self) -> bool {
        self.path == self.root_key()
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.medium, self.path)
    }
}

/// One `.`-delimited unit of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain object key.
    Key(&'a str),
    /// `base[index]`: element `index` of the container under `base`.
    Indexed { base: &'a str, index: usize },
}

impl<'a> Segment<'a> {
    /// Parse a single segment.
    ///
    /// `base[digits]` with a non-empty base becomes [`Segment::Indexed`];
    /// anything else, including an index too large for `usize`, is a plain key.
    pub fn parse(segment: &'a str) -> Self {
        let Some(body) = segment.strip_suffix(']') else {
            return Self::Key(segment);
        };
        let Some(open) = body.rfind('[') else {
            return Self::Key(segment);
        };

        let (base, digits) = (&body[..open], &body[open + 1..]);
        if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Key(segment);
        }

        match digits.parse() {
            Ok(index) => Self::Indexed { base, index },
            Err(_) => Self::Key(segment),
        }
    }
}

/// The medium key holding the namespace of `path`: the first segment, or
/// its base when the segment is indexed.
pub fn root_key(path: &str) -> &str {
    let first = path.split_once('.').map_or(path, |(first, _)| first);
    match Segment::parse(first) {
        Segment::Key(key) => key,
        Segment::Indexed { base, .. } => base,
    }
}

/// Iterate the parsed segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    path.split('.').map(Segment::parse)
}

/// Every ancestor path of `path`, shortest first, ending with the path
/// itself. Both `.` and the `[` of an index group start a new level.
///
/// `"a.b[0].c"` yields `"a"`, `"a.b"`, `"a.b[0]"`, `"a.b[0].c"`.
pub fn prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(['.', '['])
        .map(move |(end, _)| &path[..end])
        .filter(|prefix| !prefix.is_empty() && !prefix.ends_with('.'))
        .chain(std::iter::once(path))
}

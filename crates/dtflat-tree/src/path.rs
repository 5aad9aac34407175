//! Node paths for addressing within a tree
//!
//! Provides [`NodePath`], the absolute `/`-separated address of a node.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Absolute path of a node in a [`ConfigTree`](crate::ConfigTree)
///
/// Paths are derived from a node's position and are never stored on the
/// node itself. The root is `/`.
///
/// # Examples
/// - `["soc@0", "usb@a6f8800"]` → `/soc@0/usb@a6f8800`
/// - `[]` → `/`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Root path (`/`)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get depth (number of segments)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this is the root path
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get node name (last segment, if not root)
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.0 {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PathError::NotAbsolute(s.to_string()))?;

        if rest.is_empty() {
            return Ok(Self::root());
        }

        let segments = rest
            .split('/')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to node paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path does not start with `/`
    #[error("path '{0}' is not absolute")]
    NotAbsolute(String),

    /// Empty segment in path (`//` or trailing `/`)
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}

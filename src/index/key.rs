//! Category keys: the directory path a category lives at, relative to the
//! dataset root, held as explicit segments.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::VocsortError;

/// Separator used when a key is displayed or parsed from text.
pub const KEY_SEPARATOR: char = '/';

/// An ordered, non-empty list of directory names.
///
/// Flat datasets have single-segment keys (`"scratch"`). Recursive datasets
/// and classification results have deeper keys (`"difficult/scratch"`,
/// `"scratch/dent"`). Keys order lexicographically segment by segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey(Vec<String>);

impl CategoryKey {
    /// Builds a key from segments, rejecting empty keys and segments that
    /// would escape or alias a directory (`""`, `"."`, `".."`, separators).
    pub fn new<I, S>(segments: I) -> Result<Self, VocsortError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let raw = segments.join("/");

        if segments.is_empty() {
            return Err(invalid(&raw, "key has no segments"));
        }
        for segment in &segments {
            validate_segment(segment).map_err(|message| invalid(&raw, message))?;
        }

        Ok(Self(segments))
    }

    /// A single-segment key.
    pub fn single(name: impl Into<String>) -> Result<Self, VocsortError> {
        Self::new([name.into()])
    }

    /// Builds a key from a directory path relative to the dataset root.
    pub fn from_relative_path(rel: &Path) -> Result<Self, VocsortError> {
        let raw = rel.to_string_lossy().to_string();
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| invalid(&raw, "segment is not valid UTF-8"))?;
                    segments.push(name.to_string());
                }
                Component::CurDir => {}
                _ => return Err(invalid(&raw, "path is not relative to the dataset root")),
            }
        }
        Self::new(segments)
    }

    /// The segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The last segment: the category name this directory stands for.
    pub fn label(&self) -> &str {
        // `new` guarantees at least one segment.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// The segment before the label, if any.
    pub fn parent_label(&self) -> Option<&str> {
        self.0.len().checked_sub(2).map(|i| self.0[i].as_str())
    }

    /// The directory this key names under `root`.
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        dir.extend(&self.0);
        dir
    }
}

impl fmt::Debug for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryKey({self})")
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{KEY_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for CategoryKey {
    type Err = VocsortError;

    /// Parses `a/b/c`; backslashes are accepted as separators too.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::new(raw.split(['/', '\\']))
    }
}

impl Serialize for CategoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check that `name` can be used as one directory name.
pub(crate) fn validate_segment(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty segment");
    }
    if name == "." || name == ".." {
        return Err("segment may not be '.' or '..'");
    }
    if name.contains(['/', '\\']) {
        return Err("segment may not contain a path separator");
    }
    Ok(())
}

fn invalid(raw: &str, message: &str) -> VocsortError {
    VocsortError::InvalidCategoryKey {
        raw: raw.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_multi_segment_keys() {
        let key: CategoryKey = "gt\\pred".parse().expect("parse key");
        assert_eq!(key.segments(), ["gt", "pred"]);
        assert_eq!(key.to_string(), "gt/pred");
        assert_eq!(key.label(), "pred");
        assert_eq!(key.parent_label(), Some("gt"));
    }

    #[test]
    fn single_segment_has_no_parent() {
        let key = CategoryKey::single("scratch").expect("key");
        assert_eq!(key.depth(), 1);
        assert_eq!(key.parent_label(), None);
    }

    #[test]
    fn rejects_escaping_segments() {
        assert!("a/../b".parse::<CategoryKey>().is_err());
        assert!("".parse::<CategoryKey>().is_err());
        assert!("a//b".parse::<CategoryKey>().is_err());
        assert!(CategoryKey::single("a/b").is_err());
    }

    #[test]
    fn builds_from_relative_path() {
        let key = CategoryKey::from_relative_path(Path::new("difficult/scratch")).expect("key");
        assert_eq!(key.to_string(), "difficult/scratch");
        assert_eq!(
            key.dir_under(Path::new("/data")),
            Path::new("/data/difficult/scratch")
        );
        assert!(CategoryKey::from_relative_path(Path::new("")).is_err());
    }

    #[test]
    fn orders_by_segments() {
        let a: CategoryKey = "a/z".parse().expect("key");
        let b: CategoryKey = "ab".parse().expect("key");
        assert!(a < b);
    }
}

//! Report shared by the curation operations.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::index::CategoryKey;

/// Outcome of one curation operation.
///
/// `total` counts what the operation acts on: deleted sidecars, relocated
/// files, isolated samples, relabeled or reset objects, or merged samples.
#[derive(Clone, Debug, Serialize)]
pub struct CurateReport {
    pub operation: &'static str,
    /// Tree that received moved files, if the operation moves files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    pub total: usize,
    /// Annotation files rewritten in place.
    pub files_rewritten: usize,
    pub per_category: BTreeMap<CategoryKey, usize>,
    /// Non-fatal notes, such as merge sources that were skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl CurateReport {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            destination: None,
            total: 0,
            files_rewritten: 0,
            per_category: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    pub(crate) fn count(&mut self, key: &CategoryKey, n: usize) {
        if n == 0 {
            return;
        }
        *self.per_category.entry(key.clone()).or_insert(0) += n;
        self.total += n;
    }
}

impl fmt::Display for CurateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            writeln!(f, "{}: nothing to do", self.operation)?;
        } else {
            writeln!(f, "{}: {} in total", self.operation, self.total)?;
        }
        if let Some(destination) = &self.destination {
            writeln!(f, "  destination: {}", destination.display())?;
        }
        if self.files_rewritten > 0 {
            writeln!(f, "  {} annotation file(s) rewritten", self.files_rewritten)?;
        }
        for (category, count) in &self.per_category {
            writeln!(f, "  {category}: {count}")?;
        }
        for note in &self.notes {
            writeln!(f, "  note: {note}")?;
        }
        Ok(())
    }
}

//! Reclassification report.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What a reclassification run did.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReclassifyReport {
    /// Root of the reorganized tree.
    pub destination: PathBuf,
    /// Samples copied.
    pub copied: usize,
    /// Samples copied under the `difficult/` bucket.
    pub difficult: usize,
    /// Samples whose annotated category differs from their source folder.
    pub relabeled: usize,
    /// Samples skipped because their annotation has no objects.
    pub skipped_empty: usize,
    /// Samples that landed on a destination already written in this run.
    pub collisions: usize,
    /// Samples per destination directory, relative to `destination`.
    pub per_destination: BTreeMap<String, usize>,
}

impl fmt::Display for ReclassifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reclassified into {}", self.destination.display())?;
        writeln!(
            f,
            "  {} copied ({} difficult), {} relabeled, {} skipped empty",
            self.copied, self.difficult, self.relabeled, self.skipped_empty
        )?;
        if self.collisions > 0 {
            writeln!(
                f,
                "  {} sample(s) overwrote an earlier sample with the same name",
                self.collisions
            )?;
        }
        for (dir, count) in &self.per_destination {
            writeln!(f, "  {dir}: {count}")?;
        }
        Ok(())
    }
}

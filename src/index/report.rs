//! Index summary report.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::CategoryKey;

/// Per-category sample count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: CategoryKey,
    pub count: usize,
}

/// Counts produced by building an index.
#[derive(Clone, Debug, Serialize)]
pub struct IndexReport {
    pub root: PathBuf,
    pub total: usize,
    pub categories: Vec<CategoryCount>,
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {}", self.root.display())?;
        writeln!(
            f,
            "  {} valid sample(s) in {} categor{}",
            self.total,
            self.categories.len(),
            if self.categories.len() == 1 { "y" } else { "ies" }
        )?;

        let width = self
            .categories
            .iter()
            .map(|row| row.category.to_string().len())
            .max()
            .unwrap_or(0);
        for row in &self.categories {
            writeln!(
                f,
                "  {:<width$}  {:>6}",
                row.category.to_string(),
                row.count,
                width = width
            )?;
        }
        Ok(())
    }
}

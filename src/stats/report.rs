//! Stats report types and terminal formatting.

use serde::Serialize;
use std::fmt;

use crate::annotation::BBox;
use crate::index::CategoryKey;

/// The result of computing dataset statistics.
#[derive(Clone, Debug, Serialize)]
pub struct StatsReport {
    pub summary: SummarySection,
    /// Per-category sample and object counts, in key order.
    pub categories: Vec<CategoryStats>,
    /// Object labels sorted by count descending.
    pub labels: Vec<LabelCount>,
    /// Absent when the dataset holds no samples.
    pub image_sizes: Option<ImageSizeStats>,
    pub bboxes: BBoxStats,
}

/// Summary counts for the dataset.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub categories: usize,
    pub samples: usize,
    pub objects: usize,
    /// Samples whose annotation holds no objects.
    pub empty_annotations: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryStats {
    pub category: CategoryKey,
    pub samples: usize,
    pub objects: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Spread of the image sizes declared in the annotations.
#[derive(Clone, Debug, Serialize)]
pub struct ImageSizeStats {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl ImageSizeStats {
    /// True when every annotation declares the same size.
    pub fn is_constant(&self) -> bool {
        self.min_width == self.max_width && self.min_height == self.max_height
    }
}

/// Bounding box statistics over every object.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BBoxStats {
    pub total: usize,
    /// Boxes with non-positive width or height.
    pub degenerate: usize,
    /// Smallest box holding every corner seen.
    pub extent: Option<BBox>,
    pub min_area: Option<i64>,
    pub max_area: Option<i64>,
    pub mean_area: Option<f64>,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_categories(f)?;
        writeln!(f)?;
        self.fmt_labels(f)?;
        writeln!(f)?;
        self.fmt_image_sizes(f)?;
        writeln!(f)?;
        self.fmt_bboxes(f)
    }
}

impl StatsReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "┌─ Summary")?;
        writeln!(f, "│  Categories:         {:>8}", s.categories)?;
        writeln!(f, "│  Samples:            {:>8}", s.samples)?;
        writeln!(f, "│  Objects:            {:>8}", s.objects)?;
        writeln!(f, "│  Empty annotations:  {:>8}", s.empty_annotations)?;
        writeln!(f, "└─")
    }

    fn fmt_categories(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Categories")?;
        let width = self
            .categories
            .iter()
            .map(|row| row.category.to_string().len())
            .max()
            .unwrap_or(0);
        for row in &self.categories {
            writeln!(
                f,
                "│  {:<width$}  {:>6} samples  {:>6} objects",
                row.category.to_string(),
                row.samples,
                row.objects,
            )?;
        }
        writeln!(f, "└─")
    }

    fn fmt_labels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Object labels")?;
        if self.labels.is_empty() {
            writeln!(f, "│  (none)")?;
        }
        for entry in &self.labels {
            writeln!(f, "│  {:<24} {:>8}", entry.label, entry.count)?;
        }
        writeln!(f, "└─")
    }

    fn fmt_image_sizes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Image sizes")?;
        match &self.image_sizes {
            None => writeln!(f, "│  (no samples)")?,
            Some(sizes) if sizes.is_constant() => {
                writeln!(f, "│  all {}x{}", sizes.min_width, sizes.min_height)?
            }
            Some(sizes) => {
                writeln!(f, "│  width:  {} .. {}", sizes.min_width, sizes.max_width)?;
                writeln!(f, "│  height: {} .. {}", sizes.min_height, sizes.max_height)?;
            }
        }
        writeln!(f, "└─")
    }

    fn fmt_bboxes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bboxes;
        writeln!(f, "┌─ Bounding boxes")?;
        writeln!(f, "│  Total:       {:>8}", b.total)?;
        writeln!(f, "│  Degenerate:  {:>8}", b.degenerate)?;
        if let Some(extent) = &b.extent {
            writeln!(
                f,
                "│  Extent:      ({}, {}) .. ({}, {})",
                extent.xmin, extent.ymin, extent.xmax, extent.ymax
            )?;
        }
        if let (Some(min), Some(max), Some(mean)) = (b.min_area, b.max_area, b.mean_area) {
            writeln!(f, "│  Area:        min {min}, max {max}, mean {mean:.1}")?;
        }
        writeln!(f, "└─")
    }
}

//! Dataset statistics.
//!
//! Statistics are computed from the annotations of an indexed dataset and
//! returned as a [`StatsReport`] that renders as text or serializes as JSON.

mod report;

pub use report::{
    BBoxStats, CategoryStats, ImageSizeStats, LabelCount, StatsReport, SummarySection,
};

use std::collections::HashMap;

use crate::annotation::{read_annotation, AnnotationRecord, BBox};
use crate::error::VocsortError;
use crate::index::{CategoryKey, SampleIndex};

/// Read every annotation of `index` and compute its statistics.
pub fn stats_dataset(index: &SampleIndex) -> Result<StatsReport, VocsortError> {
    index.ensure_annotations("computing statistics")?;

    let mut records: Vec<(&CategoryKey, AnnotationRecord)> = Vec::new();
    for (key, entries) in index.categories() {
        for entry in entries {
            records.push((key, read_annotation(&index.annotation_path(entry))?));
        }
    }

    let mut report = stats_records(records.iter().map(|(key, record)| (*key, record)));

    // Categories with no samples still get a row.
    for key in index.keys() {
        if !report.categories.iter().any(|row| row.category == key) {
            report.categories.push(CategoryStats {
                category: key,
                samples: 0,
                objects: 0,
            });
        }
    }
    report.categories.sort_by(|a, b| a.category.cmp(&b.category));
    report.summary.categories = report.categories.len();
    Ok(report)
}

/// Compute statistics over already-parsed records.
pub fn stats_records<'a, I>(records: I) -> StatsReport
where
    I: IntoIterator<Item = (&'a CategoryKey, &'a AnnotationRecord)>,
{
    let mut summary = SummarySection::default();
    let mut categories: Vec<CategoryStats> = Vec::new();
    let mut label_counts: HashMap<String, usize> = HashMap::new();
    let mut image_sizes: Option<ImageSizeStats> = None;
    let mut bboxes = BBoxStats::default();
    let mut area_sum: i128 = 0;

    for (key, record) in records {
        summary.samples += 1;
        summary.objects += record.object_count();
        if record.is_empty() {
            summary.empty_annotations += 1;
        }

        match categories.iter_mut().find(|row| row.category == *key) {
            Some(row) => {
                row.samples += 1;
                row.objects += record.object_count();
            }
            None => categories.push(CategoryStats {
                category: key.clone(),
                samples: 1,
                objects: record.object_count(),
            }),
        }

        let (w, h) = (record.size.width, record.size.height);
        image_sizes = Some(match image_sizes {
            None => ImageSizeStats {
                min_width: w,
                max_width: w,
                min_height: h,
                max_height: h,
            },
            Some(s) => ImageSizeStats {
                min_width: s.min_width.min(w),
                max_width: s.max_width.max(w),
                min_height: s.min_height.min(h),
                max_height: s.max_height.max(h),
            },
        });

        for object in &record.objects {
            *label_counts.entry(object.name.clone()).or_insert(0) += 1;
            accumulate_bbox(&mut bboxes, &mut area_sum, object.bbox);
        }
    }

    if bboxes.total > 0 {
        bboxes.mean_area = Some(area_sum as f64 / bboxes.total as f64);
    }

    let mut labels: Vec<LabelCount> = label_counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    categories.sort_by(|a, b| a.category.cmp(&b.category));
    summary.categories = categories.len();

    StatsReport {
        summary,
        categories,
        labels,
        image_sizes,
        bboxes,
    }
}

fn accumulate_bbox(stats: &mut BBoxStats, area_sum: &mut i128, bbox: BBox) {
    stats.total += 1;
    if bbox.width() <= 0 || bbox.height() <= 0 {
        stats.degenerate += 1;
    }

    stats.extent = Some(match stats.extent {
        None => bbox,
        Some(e) => BBox::new(
            e.xmin.min(bbox.xmin),
            e.ymin.min(bbox.ymin),
            e.xmax.max(bbox.xmax),
            e.ymax.max(bbox.ymax),
        ),
    });

    let area = bbox.area();
    *area_sum += i128::from(area);
    stats.min_area = Some(stats.min_area.map_or(area, |m| m.min(area)));
    stats.max_area = Some(stats.max_area.map_or(area, |m| m.max(area)));
}

//! Dataset curation operations built on the sample index.
//!
//! Operations that move or delete files update the index they are given.
//! Operations that rewrite annotations read every affected file first and
//! only start writing once all of them parsed and passed their checks.

mod report;

pub use report::CurateReport;

use std::collections::HashSet;
use std::fs;
use std::str::FromStr;

use tracing::{info, warn};

use crate::annotation::{read_annotation, write_annotation, AnnotationRecord, BBox};
use crate::error::VocsortError;
use crate::fsops;
use crate::index::{
    file_stem_string, sorted_entries, validate_segment, CategoryKey, SampleEntry, SampleIndex,
};

/// Suffix of the tree that receives files without a complete pair.
pub const LACK_INFO_SUFFIX: &str = "lack_info";
/// Suffix of the tree that receives samples with foreign objects.
pub const MULTI_DEFECT_SUFFIX: &str = "multiDefect";

/// One merge instruction: fold `sources` into `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeSpec {
    pub target: CategoryKey,
    pub sources: Vec<CategoryKey>,
}

impl FromStr for MergeSpec {
    type Err = VocsortError;

    /// Parses `NEW=OLD1,OLD2`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (target, sources) = raw.split_once('=').ok_or_else(|| {
            VocsortError::precondition(format!("merge '{raw}' must look like NEW=OLD1,OLD2"))
        })?;

        let sources = sources
            .split(',')
            .map(str::trim)
            .filter(|source| !source.is_empty())
            .map(CategoryKey::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MergeSpec {
            target: target.trim().parse()?,
            sources,
        })
    }
}

/// Union the samples of each spec's sources into its target.
///
/// Source keys are removed from the index. A source that does not exist, or
/// that names the target itself, is skipped with a note. The target is
/// created even if nothing ends up merged into it.
pub fn merge_categories(index: &mut SampleIndex, specs: &[MergeSpec]) -> CurateReport {
    let mut report = CurateReport::new("merge categories");

    for spec in specs {
        index.category_mut(spec.target.clone());

        for source in &spec.sources {
            if *source == spec.target {
                let note = format!("skipped merging '{source}' into itself");
                warn!("{note}");
                report.notes.push(note);
                continue;
            }
            let Some(entries) = index.remove_category(source) else {
                let note = format!("skipped merging '{source}': it does not exist");
                warn!("{note}");
                report.notes.push(note);
                continue;
            };

            report.count(&spec.target, entries.len());
            index.category_mut(spec.target.clone()).extend(entries);
        }
    }

    report
}

/// Delete the annotation of every sample that has no objects and drop the
/// sample from the index. The image is left in place.
pub fn delete_empty_annotations(index: &mut SampleIndex) -> Result<CurateReport, VocsortError> {
    index.ensure_annotations("deleting empty annotations")?;
    let mut report = CurateReport::new("delete empty annotations");

    let mut removals: Vec<(CategoryKey, String)> = Vec::new();
    for (key, entries) in index.categories() {
        for entry in entries {
            let xml_path = index.annotation_path(entry);
            if read_annotation(&xml_path)?.is_empty() {
                fs::remove_file(&xml_path).map_err(VocsortError::Io)?;
                info!("[DELETE] {}", xml_path.display());
                removals.push((key.clone(), entry.id.clone()));
            }
        }
    }

    for (key, id) in removals {
        index.remove_sample(&key, &id);
        report.count(&key, 1);
    }

    if report.total == 0 {
        info!("no empty annotations found");
    }
    Ok(report)
}

/// Move every file whose stem was not admitted in its directory into the
/// mirrored `<root>_lack_info` tree.
pub fn relocate_incomplete(index: &SampleIndex) -> Result<CurateReport, VocsortError> {
    let dest = fsops::sibling_root(index.root(), LACK_INFO_SUFFIX)?;
    let mut report = CurateReport::new("relocate incomplete samples");
    report.destination = Some(dest.clone());

    for dir_key in index.scanned_dirs() {
        let dir = dir_key.dir_under(index.root());
        if !dir.is_dir() {
            continue;
        }

        let admitted: HashSet<&str> = index
            .categories()
            .flat_map(|(_, entries)| entries.iter())
            .filter(|entry| entry.dir == *dir_key)
            .map(|entry| entry.id.as_str())
            .collect();

        let dest_dir = dir_key.dir_under(&dest);
        for file in sorted_entries(&dir)? {
            if !file.is_file() {
                continue;
            }
            let is_admitted = file_stem_string(&file)
                .is_some_and(|stem| admitted.contains(stem.as_str()));
            if is_admitted {
                continue;
            }
            let moved = fsops::move_into(&file, &dest_dir)?;
            info!("[MOVE] {} -> {}", file.display(), moved.display());
            report.count(dir_key, 1);
        }
    }

    Ok(report)
}

/// Move samples holding any object labelled differently from their folder
/// into `<root>_multiDefect/<folder>/` and drop them from the index.
pub fn isolate_mismatched(index: &mut SampleIndex) -> Result<CurateReport, VocsortError> {
    index.ensure_annotations("isolating mismatched samples")?;
    let dest = fsops::sibling_root(index.root(), MULTI_DEFECT_SUFFIX)?;
    let mut report = CurateReport::new("isolate mismatched samples");
    report.destination = Some(dest.clone());

    let mut removals: Vec<(CategoryKey, SampleEntry)> = Vec::new();
    for (key, entries) in index.categories() {
        for entry in entries {
            let record = read_annotation(&index.annotation_path(entry))?;
            let folder = entry.dir.label();
            if let Some(foreign) = record.objects.iter().find(|object| object.name != folder) {
                info!(
                    "[MOVE] {} holds '{}' in folder '{}'",
                    entry.id, foreign.name, folder
                );
                removals.push((key.clone(), entry.clone()));
            }
        }
    }

    for (key, entry) in removals {
        let dest_dir = entry.dir.dir_under(&dest);
        fsops::move_into(&index.annotation_path(&entry), &dest_dir)?;
        fsops::move_into(&index.image_path(&entry), &dest_dir)?;
        index.remove_sample(&key, &entry.id);
        report.count(&key, 1);
    }

    Ok(report)
}

/// Rename every object labelled `category` to `replacement` in the
/// annotations of that category's samples.
pub fn correct_label(
    index: &SampleIndex,
    category: &CategoryKey,
    replacement: &str,
) -> Result<CurateReport, VocsortError> {
    index.ensure_annotations("correcting labels")?;
    validate_segment(replacement).map_err(|reason| {
        VocsortError::precondition(format!("replacement label '{replacement}': {reason}"))
    })?;
    let entries = index.require_category(category)?;
    let mut report = CurateReport::new("correct labels");

    let from = category.label();
    let updates = load_updates(index, entries, |record| {
        let mut changed = 0;
        for object in record.objects.iter_mut().filter(|object| object.name == from) {
            object.name = replacement.to_string();
            changed += 1;
        }
        Ok(changed)
    })?;

    for (entry, record, changed) in updates {
        write_annotation(&index.annotation_path(entry), &record)?;
        info!("[CORRECT] {}: {changed} object(s)", entry.id);
        report.files_rewritten += 1;
        report.count(category, changed);
    }

    Ok(report)
}

/// Stretch the single object of every sample in `category` over the whole
/// frame, `(1, 1, width, height)`.
///
/// Fails before writing anything if any sample has other than exactly one
/// object.
pub fn normalize_full_frame(
    index: &SampleIndex,
    category: &CategoryKey,
) -> Result<CurateReport, VocsortError> {
    index.ensure_annotations("normalizing bounding boxes")?;
    let entries = index.require_category(category)?;
    let mut report = CurateReport::new("normalize bounding boxes to full frame");

    let updates = load_updates_checked(index, entries, |record, entry| {
        if record.object_count() != 1 {
            return Err(VocsortError::precondition(format!(
                "{} has {} objects; full-frame normalization expects exactly one",
                index.annotation_path(entry).display(),
                record.object_count()
            )));
        }
        let full = BBox::full_frame(record.size.width, record.size.height);
        let object = &mut record.objects[0];
        if object.bbox == full {
            return Ok(0);
        }
        object.bbox = full;
        Ok(1)
    })?;

    for (entry, record, _) in updates {
        write_annotation(&index.annotation_path(entry), &record)?;
        info!("[MODIFY] bounding box of {}", entry.id);
        report.files_rewritten += 1;
        report.count(category, 1);
    }

    Ok(report)
}

/// Clear every `difficult` flag in the dataset.
pub fn reset_difficult(index: &SampleIndex) -> Result<CurateReport, VocsortError> {
    index.ensure_annotations("resetting difficult flags")?;
    let mut report = CurateReport::new("reset difficult flags");

    let mut planned = Vec::new();
    for (key, entries) in index.categories() {
        let updates = load_updates(index, entries, |record| {
            let mut changed = 0;
            for object in record.objects.iter_mut().filter(|object| object.difficult) {
                object.difficult = false;
                changed += 1;
            }
            Ok(changed)
        })?;
        planned.push((key, updates));
    }

    for (key, updates) in planned {
        for (entry, record, changed) in updates {
            write_annotation(&index.annotation_path(entry), &record)?;
            report.files_rewritten += 1;
            report.count(key, changed);
        }
    }

    info!("reset {} difficult flag(s)", report.total);
    Ok(report)
}

type Update<'a> = (&'a SampleEntry, AnnotationRecord, usize);

/// Read and edit every entry's annotation, keeping those the edit changed.
fn load_updates<'a, F>(
    index: &SampleIndex,
    entries: &'a [SampleEntry],
    mut edit: F,
) -> Result<Vec<Update<'a>>, VocsortError>
where
    F: FnMut(&mut AnnotationRecord) -> Result<usize, VocsortError>,
{
    load_updates_checked(index, entries, |record, _| edit(record))
}

fn load_updates_checked<'a, F>(
    index: &SampleIndex,
    entries: &'a [SampleEntry],
    mut edit: F,
) -> Result<Vec<Update<'a>>, VocsortError>
where
    F: FnMut(&mut AnnotationRecord, &SampleEntry) -> Result<usize, VocsortError>,
{
    let mut updates = Vec::new();
    for entry in entries {
        let mut record = read_annotation(&index.annotation_path(entry))?;
        let changed = edit(&mut record, entry)?;
        if changed > 0 {
            updates.push((entry, record, changed));
        }
    }
    Ok(updates)
}

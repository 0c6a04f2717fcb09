//! Re-derive each sample's category from its annotation content.
//!
//! The category of a sample is the label of its largest object, measured by
//! inclusive pixel area; when several objects share the largest area the one
//! listed first in the annotation wins. Independently of that, a sample is
//! difficult if any of its objects is flagged `difficult`, even one that did
//! not win. Difficult samples go under `<dest>/difficult/<category>/`, all
//! others under `<dest>/<category>/`.
//!
//! The source tree is never modified: files are copied, and existing copies
//! at the destination are overwritten, so re-running on an unchanged tree
//! yields the same destination tree.

mod report;

pub use report::ReclassifyReport;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::annotation::{read_annotation, AnnotatedObject, AnnotationRecord};
use crate::error::VocsortError;
use crate::fsops;
use crate::index::{validate_segment, SampleEntry, SampleIndex};

/// Bucket directory for samples with at least one difficult object.
pub const DIFFICULT_DIR: &str = "difficult";

/// Suffix of the default destination, `<root>_correct`.
pub const CORRECT_SUFFIX: &str = "correct";

/// What to do with an annotation that has no objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyAnnotationPolicy {
    /// Abort the run with a precondition error.
    #[default]
    Fail,
    /// Leave the sample out and count it.
    Skip,
}

/// Options for [`reclassify`].
#[derive(Clone, Debug, Default)]
pub struct ReclassifyOptions {
    /// Destination root. Defaults to `<root>_correct`.
    pub dest: Option<PathBuf>,
    pub on_empty: EmptyAnnotationPolicy,
}

/// Where one sample belongs according to its annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReclassificationDecision {
    pub category: String,
    pub difficult: bool,
}

impl ReclassificationDecision {
    /// Derive the decision for `record`; `None` when it has no objects.
    pub fn from_record(record: &AnnotationRecord) -> Option<Self> {
        let winner = dominant_object(&record.objects)?;
        Some(Self {
            category: winner.name.clone(),
            difficult: any_difficult(&record.objects),
        })
    }

    /// Destination directory of the sample under `new_root`.
    pub fn destination_dir(&self, new_root: &Path) -> PathBuf {
        if self.difficult {
            new_root.join(DIFFICULT_DIR).join(&self.category)
        } else {
            new_root.join(&self.category)
        }
    }

    fn destination_label(&self) -> String {
        if self.difficult {
            format!("{DIFFICULT_DIR}/{}", self.category)
        } else {
            self.category.clone()
        }
    }
}

/// The object with the largest inclusive area; the earliest one on ties.
pub fn dominant_object(objects: &[AnnotatedObject]) -> Option<&AnnotatedObject> {
    let mut best: Option<&AnnotatedObject> = None;
    for object in objects {
        match best {
            Some(current) if object.bbox.area() <= current.bbox.area() => {}
            _ => best = Some(object),
        }
    }
    best
}

/// True if any object is flagged difficult.
pub fn any_difficult(objects: &[AnnotatedObject]) -> bool {
    objects.iter().any(|object| object.difficult)
}

struct PlannedCopy<'a> {
    entry: &'a SampleEntry,
    decision: ReclassificationDecision,
}

/// Copy every indexed sample into the directory its annotation implies.
///
/// All annotations are read and checked before the first file is copied, so
/// a malformed annotation (or an empty one under
/// [`EmptyAnnotationPolicy::Fail`]) aborts the run with the destination
/// untouched.
pub fn reclassify(
    index: &SampleIndex,
    opts: &ReclassifyOptions,
) -> Result<ReclassifyReport, VocsortError> {
    index.ensure_annotations("reclassification")?;

    let dest = match &opts.dest {
        Some(dest) => dest.clone(),
        None => fsops::sibling_root(index.root(), CORRECT_SUFFIX)?,
    };

    let mut report = ReclassifyReport {
        destination: dest.clone(),
        ..Default::default()
    };

    let mut plan = Vec::with_capacity(index.total_samples());
    for (key, entries) in index.categories() {
        for entry in entries {
            let xml_path = index.annotation_path(entry);
            let record = read_annotation(&xml_path)?;

            let Some(decision) = ReclassificationDecision::from_record(&record) else {
                match opts.on_empty {
                    EmptyAnnotationPolicy::Fail => {
                        return Err(VocsortError::precondition(format!(
                            "{} has no objects; delete empty annotations before reclassifying",
                            xml_path.display()
                        )));
                    }
                    EmptyAnnotationPolicy::Skip => {
                        warn!("skipping {}: annotation has no objects", xml_path.display());
                        report.skipped_empty += 1;
                        continue;
                    }
                }
            };

            validate_segment(&decision.category).map_err(|reason| {
                VocsortError::precondition(format!(
                    "label '{}' in {} cannot be used as a directory name: {reason}",
                    decision.category,
                    xml_path.display()
                ))
            })?;

            if decision.category != key.label() {
                report.relabeled += 1;
            }
            plan.push(PlannedCopy { entry, decision });
        }
    }

    let mut written: HashSet<PathBuf> = HashSet::new();
    for PlannedCopy { entry, decision } in plan {
        let dest_dir = decision.destination_dir(&dest);

        let image_dest = dest_dir.join(index.image_file_name(&entry.id));
        if !written.insert(image_dest.clone()) {
            warn!(
                "{} was already written in this run; sample {} overwrites it",
                image_dest.display(),
                entry.id
            );
            report.collisions += 1;
        }

        fsops::copy_into(&index.annotation_path(entry), &dest_dir)?;
        fsops::copy_into(&index.image_path(entry), &dest_dir)?;

        report.copied += 1;
        if decision.difficult {
            report.difficult += 1;
        }
        *report
            .per_destination
            .entry(decision.destination_label())
            .or_insert(0) += 1;
    }

    info!(
        "reclassified {} sample(s) into {}",
        report.copied,
        dest.display()
    );
    Ok(report)
}

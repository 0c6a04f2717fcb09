//! Reconcile a classifier's output tree against ground truth.
//!
//! A classifier writes each image to `<root>/<ground_truth>/<predicted>/`.
//! Indexing that tree recursively in image-only mode yields category keys
//! whose last two segments are the ground truth and the prediction. No
//! annotation is read here: everything follows from the key.

mod report;

pub use report::{ConfusionCell, ReconcileReport};

use std::path::Path;

use tracing::info;

use crate::error::VocsortError;
use crate::fsops;
use crate::index::{CategoryKey, IndexOptions, Layout, SampleIndex};
use crate::reclassify::CORRECT_SUFFIX;

/// Suffix of the tree that receives wrong predictions.
pub const INCORRECT_SUFFIX: &str = "incorrect";

/// Index a classification result tree.
pub fn build_result_index(root: &Path, image_ext: &str) -> Result<SampleIndex, VocsortError> {
    SampleIndex::build(
        root,
        &IndexOptions {
            image_ext: image_ext.to_string(),
            require_annotation: false,
            layout: Layout::Recursive,
        },
    )
}

/// `(ground_truth, predicted)` from the last two segments of `key`.
pub fn prediction_of(key: &CategoryKey) -> Result<(&str, &str), VocsortError> {
    match key.parent_label() {
        Some(ground_truth) => Ok((ground_truth, key.label())),
        None => Err(VocsortError::precondition(format!(
            "result directory '{key}' is not shaped <ground_truth>/<predicted>"
        ))),
    }
}

/// True when the prediction matches the ground truth.
pub fn is_correct(key: &CategoryKey) -> Result<bool, VocsortError> {
    let (ground_truth, predicted) = prediction_of(key)?;
    Ok(ground_truth == predicted)
}

/// Drop correct predictions from the index.
///
/// Every key is checked before anything is removed.
pub fn filter_correct(index: &mut SampleIndex) -> Result<ReconcileReport, VocsortError> {
    let mut correct_keys = Vec::new();
    for key in index.keys() {
        if is_correct(&key)? {
            correct_keys.push(key);
        }
    }

    let mut report = ReconcileReport::default();
    for key in correct_keys {
        if let Some(entries) = index.remove_category(&key) {
            report.correct += entries.len();
        }
    }

    report.incorrect = index.total_samples();
    report.cells = confusion_cells(index)?;
    info!("The quantity of incorrect predictions is {}", report.incorrect);
    Ok(report)
}

/// Copy wrong predictions into `<root>_incorrect/<ground_truth>/<predicted>/`.
///
/// Correct predictions are filtered out of `index` first.
pub fn merge_incorrect(index: &mut SampleIndex) -> Result<ReconcileReport, VocsortError> {
    let mut report = filter_correct(index)?;
    let incorrect_root = fsops::sibling_root(index.root(), INCORRECT_SUFFIX)?;

    for (key, entries) in index.categories() {
        let (ground_truth, predicted) = prediction_of(key)?;
        let dest_dir = incorrect_root.join(ground_truth).join(predicted);
        index.copy_samples_into(entries, &dest_dir)?;
    }

    report.incorrect_root = Some(incorrect_root);
    Ok(report)
}

/// Copy every prediction into either `<root>_correct/<predicted>/` or
/// `<root>_incorrect/<ground_truth>/<predicted>/`.
pub fn reconstruct_result(index: &SampleIndex) -> Result<ReconcileReport, VocsortError> {
    let correct_root = fsops::sibling_root(index.root(), CORRECT_SUFFIX)?;
    let incorrect_root = fsops::sibling_root(index.root(), INCORRECT_SUFFIX)?;

    let mut report = ReconcileReport {
        cells: confusion_cells(index)?,
        ..Default::default()
    };

    for (key, entries) in index.categories() {
        let (ground_truth, predicted) = prediction_of(key)?;
        let dest_dir = if ground_truth == predicted {
            report.correct += entries.len();
            correct_root.join(predicted)
        } else {
            report.incorrect += entries.len();
            incorrect_root.join(ground_truth).join(predicted)
        };
        index.copy_samples_into(entries, &dest_dir)?;
    }

    report.correct_root = Some(correct_root);
    report.incorrect_root = Some(incorrect_root);
    info!(
        "reconstructed {} correct and {} incorrect prediction(s)",
        report.correct, report.incorrect
    );
    Ok(report)
}

fn confusion_cells(index: &SampleIndex) -> Result<Vec<ConfusionCell>, VocsortError> {
    index
        .categories()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(key, entries)| {
            let (ground_truth, predicted) = prediction_of(key)?;
            Ok(ConfusionCell {
                ground_truth: ground_truth.to_string(),
                predicted: predicted.to_string(),
                count: entries.len(),
            })
        })
        .collect()
}

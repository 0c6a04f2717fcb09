//! Bulk file transfers between dataset trees.
//!
//! - [`gather_all`] flattens every sample into `<root>_gather/all`.
//! - [`convert_image_extension`] renames image extensions in place.
//! - [`extract_listed`] pulls the samples listed in one tree out of another.
//! - [`redistribute`] sorts a flat pool into category folders.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::curate::CurateReport;
use crate::error::VocsortError;
use crate::fsops;
use crate::index::{
    annotation_file_name, file_stem_string, normalize_extension, sorted_entries, CategoryKey,
    SampleIndex,
};

pub const GATHER_SUFFIX: &str = "gather";
pub const GATHER_DIR: &str = "all";
pub const DIFFICULT_SUFFIX: &str = "difficult";
pub const REDISTRIBUTED_SUFFIX: &str = "new";

/// Copy every indexed sample into the single directory `<root>_gather/all`.
///
/// Fails before copying if `<root>_gather` exists or if two categories hold
/// samples with the same id.
pub fn gather_all(index: &SampleIndex) -> Result<CurateReport, VocsortError> {
    let gather_root = fsops::sibling_root(index.root(), GATHER_SUFFIX)?;
    fsops::ensure_absent(&gather_root)?;

    let mut owners: HashMap<&str, &CategoryKey> = HashMap::new();
    for (key, entries) in index.categories() {
        for entry in entries {
            if let Some(previous) = owners.insert(entry.id.as_str(), key) {
                return Err(VocsortError::precondition(format!(
                    "sample '{}' exists in both '{previous}' and '{key}'; gathering would overwrite one",
                    entry.id
                )));
            }
        }
    }

    let dest = gather_root.join(GATHER_DIR);
    let mut report = CurateReport::new("gather");
    report.destination = Some(dest.clone());
    for (key, entries) in index.categories() {
        index.copy_samples_into(entries, &dest)?;
        report.count(key, entries.len());
    }

    info!("gathered {} sample(s) into {}", report.total, dest.display());
    Ok(report)
}

/// Rename files under `root` whose extension is one of `from` to `to`.
///
/// Extensions compare exactly, so `.JPG` -> `.jpg` is a real rename. All
/// renames are planned first; if any target name is already taken, or two
/// files would end up with the same name, nothing is renamed.
pub fn convert_image_extension(
    root: &Path,
    from: &[String],
    to: &str,
) -> Result<CurateReport, VocsortError> {
    let to = normalize_extension(to);
    let from: HashSet<String> = from
        .iter()
        .map(|ext| normalize_extension(ext))
        .filter(|ext| *ext != to)
        .collect();

    let mut renames: Vec<(PathBuf, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| VocsortError::Traversal {
            path: root.to_path_buf(),
            message: source.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if from.contains(&format!(".{ext}")) {
            renames.push((path.to_path_buf(), path.with_extension(&to[1..])));
        }
    }

    let mut targets: HashSet<&Path> = HashSet::new();
    for (source, target) in &renames {
        if !targets.insert(target.as_path()) {
            return Err(VocsortError::precondition(format!(
                "cannot convert extension: {} and another file would both become {}",
                source.display(),
                target.display()
            )));
        }
        if target.exists() {
            return Err(VocsortError::precondition(format!(
                "cannot convert extension: {} already exists",
                target.display()
            )));
        }
    }

    let mut report = CurateReport::new("convert image extension");
    for (source, target) in renames {
        fsops::move_file(&source, &target)?;
        report.total += 1;
    }

    info!("[FINISH] converted {} image extension(s)", report.total);
    Ok(report)
}

/// Move files of `target_root/<category>/` whose stem is listed under the
/// same category in `index` into `<target_root>_difficult/<category>/`.
///
/// Categories of `index` that `target_root` lacks are skipped.
pub fn extract_listed(
    index: &SampleIndex,
    target_root: &Path,
) -> Result<CurateReport, VocsortError> {
    let dest = fsops::sibling_root(target_root, DIFFICULT_SUFFIX)?;
    let mut report = CurateReport::new("extract listed samples");
    report.destination = Some(dest.clone());

    for (key, entries) in index.categories() {
        let dir = key.dir_under(target_root);
        if !dir.is_dir() {
            continue;
        }
        let listed: HashSet<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();

        let dest_dir = key.dir_under(&dest);
        for file in sorted_entries(&dir)? {
            if !file.is_file() {
                continue;
            }
            let is_listed =
                file_stem_string(&file).is_some_and(|stem| listed.contains(stem.as_str()));
            if is_listed {
                fsops::move_into(&file, &dest_dir)?;
                report.count(key, 1);
            }
        }
    }

    Ok(report)
}

/// Move `pool/<id><ext>` and `pool/<id>.xml` into
/// `<pool>_new/<category>/` for every sample of `index` that has both files
/// in the flat `pool` directory.
pub fn redistribute(index: &SampleIndex, pool: &Path) -> Result<CurateReport, VocsortError> {
    if !pool.is_dir() {
        return Err(VocsortError::precondition(format!(
            "pool {} is not a directory",
            pool.display()
        )));
    }
    let dest = fsops::sibling_root(pool, REDISTRIBUTED_SUFFIX)?;
    let mut report = CurateReport::new("redistribute pool");
    report.destination = Some(dest.clone());

    let mut missing: BTreeMap<CategoryKey, usize> = BTreeMap::new();
    for (key, entries) in index.categories() {
        let dest_dir = key.dir_under(&dest);
        for entry in entries {
            let image = pool.join(index.image_file_name(&entry.id));
            let xml = pool.join(annotation_file_name(&entry.id));
            if !(image.is_file() && xml.is_file()) {
                *missing.entry(key.clone()).or_insert(0) += 1;
                continue;
            }
            fsops::move_into(&image, &dest_dir)?;
            fsops::move_into(&xml, &dest_dir)?;
            report.count(key, 1);
        }
    }

    for (key, count) in missing {
        report
            .notes
            .push(format!("{count} sample(s) of '{key}' not found in the pool"));
    }
    Ok(report)
}

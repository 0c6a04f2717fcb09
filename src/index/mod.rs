//! Sample index: which (category, sample) pairs a dataset tree holds.
//!
//! The index is built by walking the dataset root and grouping the files in
//! each category directory by stem. A stem is admitted only when every file
//! the current mode requires exists next to it:
//!
//! - with annotations required: `<stem><image_ext>` and `<stem>.xml`
//! - image-only: `<stem><image_ext>`
//!
//! Rejected stems are not an error. They simply stay out of the index, and
//! [`crate::curate::relocate_incomplete`] is how they are recovered.
//!
//! The index is a cache of the filesystem. Operations that move or delete
//! files update the index they were given; any other copy goes stale.

mod key;
mod report;

pub use key::{CategoryKey, KEY_SEPARATOR};
pub use report::{CategoryCount, IndexReport};

pub(crate) use key::validate_segment;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::annotation::ANNOTATION_EXTENSION;
use crate::error::VocsortError;
use crate::fsops;

/// Default image extension, including the dot.
pub const DEFAULT_IMAGE_EXT: &str = ".jpg";

/// How categories are laid out under the dataset root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Each immediate subdirectory of the root is one category.
    #[default]
    Flat,
    /// Every directory below the root that holds files is a category keyed
    /// by its relative path.
    Recursive,
}

/// Options for building an index.
#[derive(Clone, Debug)]
pub struct IndexOptions {
    /// Image extension, with or without the leading dot. Matched exactly.
    pub image_ext: String,
    /// Require `<stem>.xml` next to every admitted image.
    pub require_annotation: bool,
    pub layout: Layout,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            image_ext: DEFAULT_IMAGE_EXT.to_string(),
            require_annotation: true,
            layout: Layout::Flat,
        }
    }
}

/// One admitted sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleEntry {
    /// File stem shared by the image and its annotation.
    pub id: String,
    /// Directory the files live in. Equal to the category key unless
    /// categories have been merged.
    pub dir: CategoryKey,
}

impl SampleEntry {
    pub fn new(id: impl Into<String>, dir: CategoryKey) -> Self {
        Self { id: id.into(), dir }
    }
}

/// Mapping from category to the samples admitted under it.
#[derive(Clone, Debug)]
pub struct SampleIndex {
    root: PathBuf,
    image_ext: String,
    require_annotation: bool,
    layout: Layout,
    categories: BTreeMap<CategoryKey, Vec<SampleEntry>>,
    scanned_dirs: Vec<CategoryKey>,
}

impl SampleIndex {
    /// Walk `root` and build a fresh index.
    pub fn build(root: &Path, opts: &IndexOptions) -> Result<Self, VocsortError> {
        if !root.is_dir() {
            return Err(VocsortError::precondition(format!(
                "dataset root {} is not a directory",
                root.display()
            )));
        }

        let image_ext = normalize_extension(&opts.image_ext);
        let mut index = SampleIndex {
            root: root.to_path_buf(),
            image_ext,
            require_annotation: opts.require_annotation,
            layout: opts.layout,
            categories: BTreeMap::new(),
            scanned_dirs: Vec::new(),
        };

        match opts.layout {
            Layout::Flat => index.scan_flat()?,
            Layout::Recursive => index.scan_recursive()?,
        }

        info!(
            "The quantity of all valid samples under {} is {}",
            root.display(),
            index.total_samples()
        );
        Ok(index)
    }

    fn scan_flat(&mut self) -> Result<(), VocsortError> {
        for dir in sorted_entries(&self.root)? {
            if !dir.is_dir() {
                debug!("skipping {} at the dataset root", dir.display());
                continue;
            }
            let rel = dir.strip_prefix(&self.root).unwrap_or(&dir);
            let key = CategoryKey::from_relative_path(rel)?;
            let files: Vec<PathBuf> = sorted_entries(&dir)?
                .into_iter()
                .filter(|path| path.is_file())
                .collect();

            let admitted = self.admit(&dir, &key, &files);
            self.scanned_dirs.push(key.clone());
            self.categories.insert(key, admitted);
        }
        Ok(())
    }

    fn scan_recursive(&mut self) -> Result<(), VocsortError> {
        let mut files_by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| VocsortError::Traversal {
                path: self.root.clone(),
                message: source.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(parent) = entry.path().parent() else {
                continue;
            };
            if parent == self.root {
                debug!("skipping {} at the dataset root", entry.path().display());
                continue;
            }
            files_by_dir
                .entry(parent.to_path_buf())
                .or_default()
                .push(entry.path().to_path_buf());
        }

        for (dir, files) in files_by_dir {
            let rel = dir.strip_prefix(&self.root).unwrap_or(&dir);
            let key = CategoryKey::from_relative_path(rel)?;
            let admitted = self.admit(&dir, &key, &files);
            self.scanned_dirs.push(key.clone());
            if !admitted.is_empty() {
                self.categories.insert(key, admitted);
            }
        }
        Ok(())
    }

    /// Apply the admission rule to the files of one directory.
    fn admit(&self, dir: &Path, key: &CategoryKey, files: &[PathBuf]) -> Vec<SampleEntry> {
        let mut seen = HashSet::new();
        let mut admitted = Vec::new();

        for file in files {
            let Some(stem) = file_stem_string(file) else {
                continue;
            };
            if !seen.insert(stem.clone()) {
                continue;
            }
            if self.has_required_files(dir, &stem) {
                admitted.push(SampleEntry::new(stem, key.clone()));
            }
        }

        admitted
    }

    fn has_required_files(&self, dir: &Path, stem: &str) -> bool {
        let image = dir.join(format!("{stem}{}", self.image_ext));
        if !image.is_file() {
            return false;
        }
        !self.require_annotation || dir.join(annotation_file_name(stem)).is_file()
    }

    /// Dataset root the index was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Image extension including the leading dot.
    pub fn image_ext(&self) -> &str {
        &self.image_ext
    }

    pub fn requires_annotation(&self) -> bool {
        self.require_annotation
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Fail unless the index was built with annotations required.
    pub fn ensure_annotations(&self, operation: &str) -> Result<(), VocsortError> {
        if self.require_annotation {
            Ok(())
        } else {
            Err(VocsortError::precondition(format!(
                "{operation} needs annotations, but the index was built image-only"
            )))
        }
    }

    /// Iterate categories in key order.
    pub fn categories(&self) -> impl Iterator<Item = (&CategoryKey, &[SampleEntry])> {
        self.categories
            .iter()
            .map(|(key, entries)| (key, entries.as_slice()))
    }

    /// Snapshot of the category keys, safe to hold while mutating the index.
    pub fn keys(&self) -> Vec<CategoryKey> {
        self.categories.keys().cloned().collect()
    }

    pub fn contains_category(&self, key: &CategoryKey) -> bool {
        self.categories.contains_key(key)
    }

    pub fn entries(&self, key: &CategoryKey) -> Option<&[SampleEntry]> {
        self.categories.get(key).map(Vec::as_slice)
    }

    /// Entries of `key`, or a precondition error naming the missing category.
    pub fn require_category(&self, key: &CategoryKey) -> Result<&[SampleEntry], VocsortError> {
        self.entries(key).ok_or_else(|| {
            VocsortError::precondition(format!("category '{key}' does not exist in the index"))
        })
    }

    /// Sample ids of `key` in index order.
    pub fn ids(&self, key: &CategoryKey) -> Option<Vec<&str>> {
        self.categories
            .get(key)
            .map(|entries| entries.iter().map(|entry| entry.id.as_str()).collect())
    }

    pub fn contains(&self, key: &CategoryKey, id: &str) -> bool {
        self.categories
            .get(key)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }

    /// Total admitted samples over all categories.
    pub fn total_samples(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Directories visited while building, including ones where nothing was
    /// admitted.
    pub fn scanned_dirs(&self) -> &[CategoryKey] {
        &self.scanned_dirs
    }

    /// Remove one sample, returning it if it was present.
    pub fn remove_sample(&mut self, key: &CategoryKey, id: &str) -> Option<SampleEntry> {
        let entries = self.categories.get_mut(key)?;
        let position = entries.iter().position(|entry| entry.id == id)?;
        Some(entries.remove(position))
    }

    pub(crate) fn remove_category(&mut self, key: &CategoryKey) -> Option<Vec<SampleEntry>> {
        self.categories.remove(key)
    }

    pub(crate) fn category_mut(&mut self, key: CategoryKey) -> &mut Vec<SampleEntry> {
        self.categories.entry(key).or_default()
    }

    /// Directory holding `entry`'s files.
    pub fn dir_of(&self, entry: &SampleEntry) -> PathBuf {
        entry.dir.dir_under(&self.root)
    }

    pub fn image_path(&self, entry: &SampleEntry) -> PathBuf {
        self.dir_of(entry).join(self.image_file_name(&entry.id))
    }

    pub fn annotation_path(&self, entry: &SampleEntry) -> PathBuf {
        self.dir_of(entry).join(annotation_file_name(&entry.id))
    }

    pub fn image_file_name(&self, id: &str) -> String {
        format!("{id}{}", self.image_ext)
    }

    /// File names that make up a sample in the current mode.
    pub fn sample_file_names(&self, id: &str) -> Vec<String> {
        let mut names = vec![self.image_file_name(id)];
        if self.require_annotation {
            names.push(annotation_file_name(id));
        }
        names
    }

    /// Copy the files of `entries` into `dest_dir`, overwriting.
    pub fn copy_samples_into(
        &self,
        entries: &[SampleEntry],
        dest_dir: &Path,
    ) -> Result<(), VocsortError> {
        for entry in entries {
            let src_dir = self.dir_of(entry);
            for name in self.sample_file_names(&entry.id) {
                fsops::copy_into(&src_dir.join(name), dest_dir)?;
            }
        }
        Ok(())
    }

    /// Summary of per-category counts.
    pub fn report(&self) -> IndexReport {
        IndexReport {
            root: self.root.clone(),
            total: self.total_samples(),
            categories: self
                .categories
                .iter()
                .map(|(key, entries)| CategoryCount {
                    category: key.clone(),
                    count: entries.len(),
                })
                .collect(),
        }
    }
}

/// `jpg` and `.jpg` both become `.jpg`.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

pub fn annotation_file_name(id: &str) -> String {
    format!("{id}.{ANNOTATION_EXTENSION}")
}

/// File name minus its last extension, as a UTF-8 string.
pub fn file_stem_string(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
}

/// Directory entries sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, VocsortError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(VocsortError::Io)? {
        let entry = entry.map_err(VocsortError::Io)?;
        paths.push(entry.path());
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

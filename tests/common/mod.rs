#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use vocsort::annotation::{write_annotation, AnnotatedObject, AnnotationRecord, BBox};

/// Fake image content, unique per sample so copies can be told apart.
pub fn image_bytes(id: &str) -> Vec<u8> {
    format!("JPEG:{id}").into_bytes()
}

pub fn write_image(path: &Path, id: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, image_bytes(id)).expect("write image file");
}

pub fn record(width: u32, height: u32, objects: &[(&str, bool, (i64, i64, i64, i64))]) -> AnnotationRecord {
    objects
        .iter()
        .fold(AnnotationRecord::new(width, height), |record, (name, difficult, b)| {
            record.with_object(AnnotatedObject::new(
                *name,
                *difficult,
                BBox::new(b.0, b.1, b.2, b.3),
            ))
        })
}

/// Write `<dir>/<id>.jpg` and `<dir>/<id>.xml`.
pub fn write_sample(dir: &Path, id: &str, record: &AnnotationRecord) {
    write_image(&dir.join(format!("{id}.jpg")), id);
    write_annotation(&dir.join(format!("{id}.xml")), record).expect("write annotation");
}

/// Write a sample whose single object is labelled like its folder.
pub fn write_plain_sample(dir: &Path, id: &str, label: &str) {
    write_sample(dir, id, &record(64, 48, &[(label, false, (1, 1, 20, 20))]));
}

/// Every file under `root`, keyed by relative path, with its content.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.expect("walk entry"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("relative path")
                .to_path_buf();
            let bytes = fs::read(entry.path()).expect("read file");
            (rel, bytes)
        })
        .collect()
}

/// Relative paths of every file under `root`, with `/` separators.
pub fn file_list(root: &Path) -> Vec<String> {
    snapshot(root)
        .into_keys()
        .map(|path| {
            path.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

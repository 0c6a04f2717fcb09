//! Integration tests for the curation operations.

use std::fs;

use vocsort::annotation::{read_annotation, BBox};
use vocsort::curate::{
    correct_label, delete_empty_annotations, isolate_mismatched, merge_categories,
    normalize_full_frame, relocate_incomplete, reset_difficult, MergeSpec,
};
use vocsort::index::{CategoryKey, IndexOptions, Layout, SampleIndex};
use vocsort::VocsortError;

mod common;

fn key(raw: &str) -> CategoryKey {
    raw.parse().expect("key")
}

fn build(root: &std::path::Path) -> SampleIndex {
    SampleIndex::build(root, &IndexOptions::default()).expect("build index")
}

#[test]
fn delete_empty_removes_sidecar_and_index_entry() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_sample(&root.join("A"), "empty", &common::record(8, 8, &[]));
    common::write_plain_sample(&root.join("A"), "full", "A");

    let mut index = build(&root);
    let report = delete_empty_annotations(&mut index).expect("delete empty");

    assert_eq!(report.total, 1);
    assert!(!root.join("A/empty.xml").exists());
    assert!(root.join("A/empty.jpg").exists());
    assert_eq!(index.ids(&key("A")), Some(vec!["full"]));

    let again = delete_empty_annotations(&mut index).expect("delete empty again");
    assert_eq!(again.total, 0);
}

#[test]
fn merge_unions_sources_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("A"), "s1", "A");
    common::write_plain_sample(&root.join("A"), "s2", "A");
    common::write_plain_sample(&root.join("B"), "s3", "B");

    let mut index = build(&root);
    let spec: MergeSpec = "AB=A,B".parse().expect("merge spec");
    let report = merge_categories(&mut index, &[spec]);

    assert_eq!(report.total, 3);
    assert_eq!(index.keys(), vec![key("AB")]);
    assert_eq!(index.ids(&key("AB")), Some(vec!["s1", "s2", "s3"]));

    // Merged entries still point at their original folders.
    let entries = index.entries(&key("AB")).expect("entries");
    assert_eq!(index.image_path(&entries[2]), root.join("B/s3.jpg"));
}

#[test]
fn merge_skips_missing_and_self_sources() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("A"), "s1", "A");

    let mut index = build(&root);
    let spec: MergeSpec = "A=A,ghost".parse().expect("merge spec");
    let report = merge_categories(&mut index, &[spec]);

    assert_eq!(report.total, 0);
    assert_eq!(report.notes.len(), 2);
    assert_eq!(index.ids(&key("A")), Some(vec!["s1"]));
}

#[test]
fn reset_difficult_counts_and_clears_flags() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    let dir = root.join("A");
    common::write_sample(
        &dir,
        "s1",
        &common::record(20, 20, &[("A", true, (1, 1, 4, 4)), ("A", false, (5, 5, 9, 9))]),
    );
    common::write_sample(
        &dir,
        "s2",
        &common::record(20, 20, &[("A", true, (1, 1, 4, 4)), ("B", true, (2, 2, 3, 3))]),
    );
    common::write_sample(&dir, "s3", &common::record(20, 20, &[("A", false, (1, 1, 4, 4))]));

    let index = build(&root);
    let report = reset_difficult(&index).expect("reset difficult");

    assert_eq!(report.total, 3);
    assert_eq!(report.files_rewritten, 2);
    assert_eq!(report.per_category.get(&key("A")), Some(&3));
    for id in ["s1", "s2", "s3"] {
        let record = read_annotation(&dir.join(format!("{id}.xml"))).expect("read annotation");
        assert!(record.objects.iter().all(|object| !object.difficult));
    }
}

#[test]
fn reset_difficult_writes_nothing_when_a_later_category_is_malformed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_sample(
        &root.join("A"),
        "a1",
        &common::record(20, 20, &[("A", true, (1, 1, 4, 4))]),
    );
    common::write_image(&root.join("B/b1.jpg"), "b1");
    fs::write(
        root.join("B/b1.xml"),
        "<annotation><size><width>4</width></size></annotation>",
    )
    .expect("write xml");
    let before = common::snapshot(&root);

    let index = build(&root);
    assert!(matches!(
        reset_difficult(&index),
        Err(VocsortError::MalformedAnnotation { .. })
    ));

    assert_eq!(common::snapshot(&root), before);
    let record = read_annotation(&root.join("A/a1.xml")).expect("read annotation");
    assert!(record.objects[0].difficult);
}

#[test]
fn relocate_incomplete_moves_unpaired_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("A"), "ok", "A");
    common::write_image(&root.join("A/no_xml.jpg"), "no_xml");
    fs::write(root.join("A/no_image.xml"), "<annotation/>").expect("write xml");
    common::write_image(&root.join("B/only.jpg"), "only");

    let index = build(&root);
    let report = relocate_incomplete(&index).expect("relocate");

    let lack = temp.path().join("data_lack_info");
    assert_eq!(report.total, 3);
    assert_eq!(
        common::file_list(&lack),
        vec!["A/no_image.xml", "A/no_xml.jpg", "B/only.jpg"]
    );
    assert_eq!(common::file_list(&root), vec!["A/ok.jpg", "A/ok.xml"]);
}

#[test]
fn isolate_mismatched_moves_samples_with_foreign_objects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("A"), "clean", "A");
    common::write_sample(
        &root.join("A"),
        "mixed",
        &common::record(20, 20, &[("A", false, (1, 1, 9, 9)), ("C", false, (2, 2, 3, 3))]),
    );

    let mut index = build(&root);
    let report = isolate_mismatched(&mut index).expect("isolate");

    assert_eq!(report.total, 1);
    assert_eq!(index.ids(&key("A")), Some(vec!["clean"]));
    assert_eq!(
        common::file_list(&temp.path().join("data_multiDefect")),
        vec!["A/mixed.jpg", "A/mixed.xml"]
    );
}

#[test]
fn correct_label_rewrites_matching_objects_only() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_sample(
        &root.join("old"),
        "s1",
        &common::record(20, 20, &[("old", false, (1, 1, 9, 9)), ("other", false, (2, 2, 3, 3))]),
    );

    let index = build(&root);
    let report = correct_label(&index, &key("old"), "new").expect("correct label");

    assert_eq!(report.total, 1);
    let record = read_annotation(&root.join("old/s1.xml")).expect("read annotation");
    let names: Vec<&str> = record.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["new", "other"]);
}

#[test]
fn full_frame_sets_box_from_size() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_sample(
        &root.join("A"),
        "s1",
        &common::record(640, 480, &[("A", false, (10, 10, 20, 20))]),
    );

    let index = build(&root);
    let report = normalize_full_frame(&index, &key("A")).expect("full frame");

    assert_eq!(report.files_rewritten, 1);
    let record = read_annotation(&root.join("A/s1.xml")).expect("read annotation");
    assert_eq!(record.objects[0].bbox, BBox::new(1, 1, 640, 480));
}

#[test]
fn full_frame_refuses_multi_object_samples_before_writing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_sample(
        &root.join("A"),
        "a_single",
        &common::record(64, 64, &[("A", false, (10, 10, 20, 20))]),
    );
    common::write_sample(
        &root.join("A"),
        "b_multi",
        &common::record(64, 64, &[("A", false, (1, 1, 2, 2)), ("A", false, (3, 3, 4, 4))]),
    );
    let before = common::snapshot(&root);

    let index = build(&root);
    let result = normalize_full_frame(&index, &key("A"));

    assert!(matches!(
        result,
        Err(VocsortError::PreconditionViolation { .. })
    ));
    assert_eq!(common::snapshot(&root), before);
}

#[test]
fn unknown_category_is_a_precondition_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("A"), "s1", "A");

    let index = build(&root);
    assert!(matches!(
        correct_label(&index, &key("Z"), "Y"),
        Err(VocsortError::PreconditionViolation { .. })
    ));
}

#[test]
fn relocate_incomplete_revisits_nested_dirs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("data");
    common::write_plain_sample(&root.join("difficult/A"), "ok", "A");
    common::write_image(&root.join("difficult/B/lost.jpg"), "lost");

    let opts = IndexOptions {
        layout: Layout::Recursive,
        ..Default::default()
    };
    let index = SampleIndex::build(&root, &opts).expect("build index");
    let report = relocate_incomplete(&index).expect("relocate");

    assert_eq!(report.total, 1);
    assert!(temp
        .path()
        .join("data_lack_info/difficult/B/lost.jpg")
        .is_file());
}

#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use vocsort::annotation::{AnnotatedObject, AnnotationRecord, BBox};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_label() -> BoxedStrategy<String> {
    prop::sample::select(vec!["dent", "scratch", "stain", "crack", "A", "B"])
        .prop_map(str::to_string)
        .boxed()
}

/// Boxes inside a 1..=640 frame with `min <= max`.
pub fn arb_bbox() -> BoxedStrategy<BBox> {
    (1i64..=640, 1i64..=640, 0i64..200, 0i64..200)
        .prop_map(|(x, y, w, h)| BBox::new(x, y, x + w, y + h))
        .boxed()
}

pub fn arb_object() -> BoxedStrategy<AnnotatedObject> {
    (arb_label(), any::<bool>(), arb_bbox())
        .prop_map(|(name, difficult, bbox)| AnnotatedObject::new(name, difficult, bbox))
        .boxed()
}

pub fn arb_record(max_objects: usize) -> BoxedStrategy<AnnotationRecord> {
    (
        1u32..=4096,
        1u32..=4096,
        prop::collection::vec(arb_object(), 0..=max_objects),
    )
        .prop_map(|(width, height, objects)| {
            objects
                .into_iter()
                .fold(AnnotationRecord::new(width, height), AnnotationRecord::with_object)
        })
        .boxed()
}

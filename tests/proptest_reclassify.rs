use proptest::prelude::*;

use vocsort::annotation::{
    io_xml::{parse_annotation_str, to_annotation_string},
    AnnotatedObject, BBox,
};
use vocsort::reclassify::{any_difficult, dominant_object, ReclassificationDecision};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn winner_has_maximal_area_and_is_first_among_ties(
        objects in prop::collection::vec(proptest_helpers::arb_object(), 1..12)
    ) {
        let winner = dominant_object(&objects).expect("non-empty input has a winner");
        let max_area = objects.iter().map(|o| o.bbox.area()).max().expect("max");
        let first_max = objects
            .iter()
            .position(|o| o.bbox.area() == max_area)
            .expect("position");

        prop_assert_eq!(winner.bbox.area(), max_area);
        prop_assert!(std::ptr::eq(winner, &objects[first_max]));
    }

    #[test]
    fn equal_area_tie_goes_to_first_listed(
        first in proptest_helpers::arb_label(),
        second in proptest_helpers::arb_label(),
        size in 0i64..100,
        offset in 1i64..500,
    ) {
        let objects = vec![
            AnnotatedObject::new(first.clone(), false, BBox::new(1, 1, 1 + size, 1 + size)),
            AnnotatedObject::new(second, false, BBox::new(offset, offset, offset + size, offset + size)),
        ];
        prop_assert_eq!(&dominant_object(&objects).expect("winner").name, &first);
    }

    #[test]
    fn difficult_iff_any_object_is_difficult(record in proptest_helpers::arb_record(8)) {
        let expected = record.objects.iter().any(|o| o.difficult);
        prop_assert_eq!(any_difficult(&record.objects), expected);

        match ReclassificationDecision::from_record(&record) {
            Some(decision) => prop_assert_eq!(decision.difficult, expected),
            None => prop_assert!(record.objects.is_empty()),
        }
    }

    #[test]
    fn decision_survives_write_and_reparse(record in proptest_helpers::arb_record(6)) {
        let xml = to_annotation_string(&record);
        let reparsed = parse_annotation_str(&xml, std::path::Path::new("prop.xml"))
            .expect("reparse written annotation");

        prop_assert_eq!(
            ReclassificationDecision::from_record(&reparsed),
            ReclassificationDecision::from_record(&record)
        );
    }
}

//! Fuzz target for annotation XML parsing.
//!
//! Parsed records are written back out and reparsed; the second parse must
//! keep every object and box.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use vocsort::annotation::io_xml::{parse_annotation_slice, parse_annotation_str, to_annotation_string};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(record) = parse_annotation_slice(data) {
        let xml = to_annotation_string(&record);
        let reparsed = parse_annotation_str(&xml, Path::new("fuzz.xml"))
            .expect("written annotation must parse");
        assert_eq!(record.size, reparsed.size);
        assert_eq!(record.objects.len(), reparsed.objects.len());
        for (a, b) in record.objects.iter().zip(&reparsed.objects) {
            assert_eq!((a.bbox, a.difficult), (b.bbox, b.difficult));
        }
    }
});

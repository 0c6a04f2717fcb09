//! Annotation accessor: the sidecar XML that travels with every image.
//!
//! A sample is an image plus a Pascal VOC XML file sharing its stem. The
//! accessor parses that file into an [`AnnotationRecord`], enforcing the
//! cardinality of the fields the curation logic relies on, and writes
//! mutated records back in place.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use vocsort::annotation::{io_xml::parse_annotation_str, BBox};
//!
//! let xml = "<annotation>\
//!   <size><width>32</width><height>32</height></size>\
//!   <object><name>scratch</name><difficult>0</difficult>\
//!     <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>4</xmax><ymax>4</ymax></bndbox>\
//!   </object></annotation>";
//!
//! let record = parse_annotation_str(xml, Path::new("a.xml")).unwrap();
//! assert_eq!(record.objects[0].bbox, BBox::new(1, 1, 4, 4));
//! assert_eq!(record.objects[0].bbox.area(), 16);
//! ```

mod bbox;
pub mod io_xml;
mod model;

pub use bbox::BBox;
pub use io_xml::{object_count, read_annotation, write_annotation, ANNOTATION_EXTENSION};
pub use model::{AnnotatedObject, AnnotationRecord, ImageSize};

//! Pascal VOC XML reader and writer for a single sidecar file.
//!
//! Every field the curation operations depend on (`size/width`,
//! `size/height`, and per object `name`, `difficult`, `bndbox` with its four
//! coordinates) must appear exactly once under its parent. A missing element
//! or a repeated one is reported as [`VocsortError::MalformedAnnotation`];
//! nothing is defaulted.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use super::{AnnotatedObject, AnnotationRecord, BBox, ImageSize};
use crate::error::VocsortError;

/// File extension of annotation sidecars (without the dot).
pub const ANNOTATION_EXTENSION: &str = "xml";

/// Read and parse the annotation at `path`.
pub fn read_annotation(path: &Path) -> Result<AnnotationRecord, VocsortError> {
    let xml = fs::read_to_string(path).map_err(VocsortError::Io)?;
    parse_annotation_str(&xml, path)
}

/// Serialize `record` over the file at `path`.
///
/// The file is rewritten in place; an interrupted write can leave a
/// truncated sidecar behind.
pub fn write_annotation(path: &Path, record: &AnnotationRecord) -> Result<(), VocsortError> {
    fs::write(path, to_annotation_string(record)).map_err(VocsortError::Io)
}

/// Number of objects in the annotation at `path`.
pub fn object_count(path: &Path) -> Result<usize, VocsortError> {
    Ok(read_annotation(path)?.object_count())
}

/// Parse annotation XML from bytes.
///
/// The input must be valid UTF-8.
pub fn parse_annotation_slice(bytes: &[u8]) -> Result<AnnotationRecord, VocsortError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| VocsortError::MalformedAnnotation {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_annotation_str(xml, Path::new("<memory>"))
}

/// Parse annotation XML already held in memory. `path` is only used in
/// error messages.
pub fn parse_annotation_str(xml: &str, path: &Path) -> Result<AnnotationRecord, VocsortError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| malformed(path, source.to_string()))?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(malformed(path, "missing <annotation> root element"));
    }

    let size = exactly_one(annotation, "size", path, "<annotation>")?;
    let width = parse_required::<u32>(size, "width", path, "<size>", "u32")?;
    let height = parse_required::<u32>(size, "height", path, "<size>", "u32")?;
    let depth = optional_child_text(size, "depth")
        .map(|raw| {
            raw.parse::<u32>().map_err(|_| {
                malformed(
                    path,
                    format!("invalid <depth> value '{raw}' in <size>; expected u32"),
                )
            })
        })
        .transpose()?;

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| is_element_named(node, "object"))
    {
        let name = required_text(object, "name", path, "<object>")?;
        let difficult = parse_difficult(object, path)?;

        let bndbox = exactly_one(object, "bndbox", path, "<object>")?;
        let bbox = BBox::new(
            parse_required::<i64>(bndbox, "xmin", path, "<bndbox>", "integer")?,
            parse_required::<i64>(bndbox, "ymin", path, "<bndbox>", "integer")?,
            parse_required::<i64>(bndbox, "xmax", path, "<bndbox>", "integer")?,
            parse_required::<i64>(bndbox, "ymax", path, "<bndbox>", "integer")?,
        );

        objects.push(AnnotatedObject {
            name,
            pose: optional_child_text(object, "pose"),
            truncated: optional_child_text(object, "truncated"),
            difficult,
            bbox,
        });
    }

    Ok(AnnotationRecord {
        folder: optional_child_text(annotation, "folder"),
        filename: optional_child_text(annotation, "filename"),
        path: optional_child_text(annotation, "path"),
        size: ImageSize {
            width,
            height,
            depth,
        },
        objects,
    })
}

/// Render `record` as a VOC XML document.
pub fn to_annotation_string(record: &AnnotationRecord) -> String {
    VocDocument(record).to_string()
}

fn parse_difficult(object: Node<'_, '_>, path: &Path) -> Result<bool, VocsortError> {
    let raw = required_text(object, "difficult", path, "<object>")?;
    match raw.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(malformed(
            path,
            format!("invalid <difficult> value '{other}' in <object>; expected 0 or 1"),
        )),
    }
}

fn is_element_named(node: &Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && node.tag_name().name() == tag
}

fn exactly_one<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, VocsortError> {
    let mut matches = node.children().filter(|child| is_element_named(child, tag));
    let first = matches
        .next()
        .ok_or_else(|| malformed(path, format!("missing <{tag}> in {context}")))?;

    let extra = matches.count();
    if extra > 0 {
        return Err(malformed(
            path,
            format!(
                "expected exactly one <{tag}> in {context}, found {}",
                extra + 1
            ),
        ));
    }

    Ok(first)
}

fn required_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, VocsortError> {
    let element = exactly_one(node, tag, path, context)?;
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| malformed(path, format!("empty <{tag}> in {context}")))
}

fn parse_required<T: std::str::FromStr>(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
    expected: &str,
) -> Result<T, VocsortError> {
    let raw = required_text(node, tag, path, context)?;
    raw.parse::<T>().map_err(|_| {
        malformed(
            path,
            format!("invalid <{tag}> value '{raw}' in {context}; expected {expected}"),
        )
    })
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| is_element_named(child, tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn malformed(path: &Path, message: impl Into<String>) -> VocsortError {
    VocsortError::MalformedAnnotation {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

struct VocDocument<'a>(&'a AnnotationRecord);

impl fmt::Display for VocDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;

        writeln!(f, "<annotation>")?;
        if let Some(folder) = &record.folder {
            writeln!(f, "\t<folder>{}</folder>", xml_escape(folder))?;
        }
        if let Some(filename) = &record.filename {
            writeln!(f, "\t<filename>{}</filename>", xml_escape(filename))?;
        }
        if let Some(path) = &record.path {
            writeln!(f, "\t<path>{}</path>", xml_escape(path))?;
        }

        writeln!(f, "\t<size>")?;
        writeln!(f, "\t\t<width>{}</width>", record.size.width)?;
        writeln!(f, "\t\t<height>{}</height>", record.size.height)?;
        if let Some(depth) = record.size.depth {
            writeln!(f, "\t\t<depth>{depth}</depth>")?;
        }
        writeln!(f, "\t</size>")?;

        for object in &record.objects {
            writeln!(f, "\t<object>")?;
            writeln!(f, "\t\t<name>{}</name>", xml_escape(&object.name))?;
            if let Some(pose) = &object.pose {
                writeln!(f, "\t\t<pose>{}</pose>", xml_escape(pose))?;
            }
            if let Some(truncated) = &object.truncated {
                writeln!(f, "\t\t<truncated>{}</truncated>", xml_escape(truncated))?;
            }
            writeln!(f, "\t\t<difficult>{}</difficult>", u8::from(object.difficult))?;
            writeln!(f, "\t\t<bndbox>")?;
            writeln!(f, "\t\t\t<xmin>{}</xmin>", object.bbox.xmin)?;
            writeln!(f, "\t\t\t<ymin>{}</ymin>", object.bbox.ymin)?;
            writeln!(f, "\t\t\t<xmax>{}</xmax>", object.bbox.xmax)?;
            writeln!(f, "\t\t\t<ymax>{}</ymax>", object.bbox.ymax)?;
            writeln!(f, "\t\t</bndbox>")?;
            writeln!(f, "\t</object>")?;
        }

        writeln!(f, "</annotation>")
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <folder>A</folder>
  <filename>s1.jpg</filename>
  <size>
    <width>64</width>
    <height>48</height>
    <depth>3</depth>
  </size>
  <segmented>0</segmented>
  <object>
    <name>A</name>
    <pose>Unspecified</pose>
    <truncated>0</truncated>
    <difficult>0</difficult>
    <bndbox>
      <xmin>1</xmin>
      <ymin>1</ymin>
      <xmax>10</xmax>
      <ymax>10</ymax>
    </bndbox>
  </object>
  <object>
    <name>B</name>
    <difficult>1</difficult>
    <bndbox>
      <xmin>1</xmin>
      <ymin>1</ymin>
      <xmax>5</xmax>
      <ymax>5</ymax>
    </bndbox>
  </object>
</annotation>"#;

    fn parse(xml: &str) -> Result<AnnotationRecord, VocsortError> {
        parse_annotation_str(xml, Path::new("sample.xml"))
    }

    fn assert_malformed(xml: &str, needle: &str) {
        match parse(xml) {
            Err(VocsortError::MalformedAnnotation { message, .. }) => {
                assert!(message.contains(needle), "unexpected message: {message}")
            }
            other => panic!("expected MalformedAnnotation, got {other:?}"),
        }
    }

    #[test]
    fn parses_objects_in_document_order() {
        let record = parse(TWO_OBJECTS).expect("parse xml");
        assert_eq!(record.folder.as_deref(), Some("A"));
        assert_eq!(record.size.width, 64);
        assert_eq!(record.size.height, 48);
        assert_eq!(record.size.depth, Some(3));
        assert_eq!(record.object_count(), 2);
        assert_eq!(record.objects[0].name, "A");
        assert!(!record.objects[0].difficult);
        assert_eq!(record.objects[0].pose.as_deref(), Some("Unspecified"));
        assert_eq!(record.objects[1].name, "B");
        assert!(record.objects[1].difficult);
        assert_eq!(record.objects[1].bbox, BBox::new(1, 1, 5, 5));
    }

    #[test]
    fn record_without_objects_is_empty() {
        let record = parse(
            "<annotation><size><width>4</width><height>4</height></size></annotation>",
        )
        .expect("parse xml");
        assert!(record.is_empty());
        assert_eq!(record.object_count(), 0);
    }

    #[test]
    fn missing_size_is_rejected() {
        assert_malformed("<annotation></annotation>", "missing <size>");
    }

    #[test]
    fn repeated_size_is_rejected() {
        assert_malformed(
            "<annotation>\
               <size><width>4</width><height>4</height></size>\
               <size><width>4</width><height>4</height></size>\
             </annotation>",
            "expected exactly one <size>",
        );
    }

    #[test]
    fn missing_difficult_is_rejected() {
        assert_malformed(
            "<annotation><size><width>4</width><height>4</height></size>\
               <object><name>A</name>\
                 <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>\
               </object></annotation>",
            "missing <difficult>",
        );
    }

    #[test]
    fn repeated_name_is_rejected() {
        assert_malformed(
            "<annotation><size><width>4</width><height>4</height></size>\
               <object><name>A</name><name>B</name><difficult>0</difficult>\
                 <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>\
               </object></annotation>",
            "expected exactly one <name>",
        );
    }

    #[test]
    fn non_integer_coordinate_is_rejected() {
        assert_malformed(
            "<annotation><size><width>4</width><height>4</height></size>\
               <object><name>A</name><difficult>0</difficult>\
                 <bndbox><xmin>1.5</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>\
               </object></annotation>",
            "invalid <xmin>",
        );
    }

    #[test]
    fn difficult_outside_zero_one_is_rejected() {
        assert_malformed(
            "<annotation><size><width>4</width><height>4</height></size>\
               <object><name>A</name><difficult>yes</difficult>\
                 <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>\
               </object></annotation>",
            "invalid <difficult>",
        );
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert_malformed("<doc/>", "missing <annotation>");
    }

    #[test]
    fn written_document_parses_back() {
        let record = parse(TWO_OBJECTS).expect("parse xml");
        let xml = to_annotation_string(&record);
        let again = parse(&xml).expect("reparse xml");
        assert_eq!(record, again);
    }

    #[test]
    fn labels_are_escaped_on_write() {
        let record = AnnotationRecord::new(10, 10).with_object(AnnotatedObject::new(
            "a<b&c",
            false,
            BBox::new(1, 1, 2, 2),
        ));
        let xml = to_annotation_string(&record);
        assert!(xml.contains("<name>a&lt;b&amp;c</name>"));
        assert_eq!(parse(&xml).expect("reparse").objects[0].name, "a<b&c");
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert!(matches!(
            parse_annotation_slice(&[0xff, 0xfe, 0x00]),
            Err(VocsortError::MalformedAnnotation { .. })
        ));
    }
}

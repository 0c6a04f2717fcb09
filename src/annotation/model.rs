//! In-memory form of one sample's sidecar annotation.

use serde::Serialize;

use super::bbox::BBox;

/// The structured content of a single VOC annotation file.
///
/// Only the fields below survive a read/write cycle. Elements outside this
/// set (segmentation masks, custom tags) are dropped on write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub size: ImageSize,
    /// Objects in document order. Order matters: it breaks area ties.
    pub objects: Vec<AnnotatedObject>,
}

impl AnnotationRecord {
    /// Creates a record with no objects.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: ImageSize {
                width,
                height,
                depth: None,
            },
            ..Default::default()
        }
    }

    /// Builder-style helper that appends an object.
    pub fn with_object(mut self, object: AnnotatedObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Number of `<object>` elements.
    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// A record without objects is a deletion candidate.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The `<size>` element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

/// One labelled `<object>` element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedObject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<String>,
    pub difficult: bool,
    pub bbox: BBox,
}

impl AnnotatedObject {
    pub fn new(name: impl Into<String>, difficult: bool, bbox: BBox) -> Self {
        Self {
            name: name.into(),
            pose: None,
            truncated: None,
            difficult,
            bbox,
        }
    }
}

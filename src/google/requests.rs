//! Typed `presentations.batchUpdate` requests.
//!
//! Only the three operations the deck needs are modelled. They serialise to
//! the exact JSON the Slides API expects, e.g.
//!
//! ```json
//! {"createSlide": {"objectId": "slide_page_0",
//!                  "slideLayoutReference": {"predefinedLayout": "BLANK"}}}
//! ```
//!
//! [`SlideBatch`] accumulates per-page requests; [`SlideBatch::finish`] is
//! the only way to obtain a [`BatchUpdate`] and it always appends the
//! default-slide delete last, so the delete can never precede creation.

use crate::config::SlideGeometry;
use serde::Serialize;

/// One structural edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    CreateSlide(CreateSlide),
    CreateImage(CreateImage),
    DeleteObject(DeleteObject),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlide {
    pub object_id: String,
    pub slide_layout_reference: LayoutReference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReference {
    pub predefined_layout: PredefinedLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredefinedLayout {
    Blank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImage {
    pub url: String,
    pub element_properties: ElementProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProperties {
    pub page_object_id: String,
    pub size: Size,
    pub transform: AffineTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Size {
    pub width: Dimension,
    pub height: Dimension,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "PT")]
    Pt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub unit: Unit,
}

impl AffineTransform {
    /// Unit scale at the slide origin.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            unit: Unit::Pt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObject {
    pub object_id: String,
}

/// Body of `presentations.batchUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchUpdate {
    pub requests: Vec<Request>,
}

impl BatchUpdate {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Object ids of the slides this batch creates, in order.
    pub fn created_slide_ids(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::CreateSlide(s) => Some(s.object_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Object id of the slide created for 0-based page `index`.
pub fn slide_object_id(index: usize) -> String {
    format!("slide_page_{index}")
}

/// Accumulates slide-creation requests page by page.
#[derive(Debug, Clone)]
pub struct SlideBatch {
    geometry: SlideGeometry,
    requests: Vec<Request>,
}

impl SlideBatch {
    pub fn new(geometry: SlideGeometry) -> Self {
        Self {
            geometry,
            requests: Vec::new(),
        }
    }

    /// Queue a blank slide for page `index` holding the image at `image_url`.
    /// Returns the new slide's object id.
    pub fn push_image_slide(&mut self, index: usize, image_url: &str) -> String {
        let slide_id = slide_object_id(index);
        self.requests.push(Request::CreateSlide(CreateSlide {
            object_id: slide_id.clone(),
            slide_layout_reference: LayoutReference {
                predefined_layout: PredefinedLayout::Blank,
            },
        }));
        self.requests.push(Request::CreateImage(CreateImage {
            url: image_url.to_string(),
            element_properties: ElementProperties {
                page_object_id: slide_id.clone(),
                size: Size {
                    width: Dimension {
                        magnitude: self.geometry.width_pt,
                        unit: Unit::Pt,
                    },
                    height: Dimension {
                        magnitude: self.geometry.height_pt,
                        unit: Unit::Pt,
                    },
                },
                transform: AffineTransform::identity(),
            },
        }));
        slide_id
    }

    /// Number of requests queued so far.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Close the batch: delete the presentation's default slide, last.
    pub fn finish(mut self, default_slide_id: &str) -> BatchUpdate {
        self.requests.push(Request::DeleteObject(DeleteObject {
            object_id: default_slide_id.to_string(),
        }));
        BatchUpdate {
            requests: self.requests,
        }
    }
}

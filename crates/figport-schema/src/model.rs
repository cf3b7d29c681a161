//! Design tree data model.
//!
//! A [`Document`] owns an ordered list of root frames; every [`Node`] owns its
//! children exclusively, so the tree is acyclic by construction.
//! Geometry is already resolved to absolute bounding boxes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A complete design document, ready for export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub root_frames: Vec<Node>,
    /// Design tokens, carried through to the serialized schema untouched.
    #[serde(default)]
    pub tokens: BTreeMap<String, serde_json::Value>,
}

impl Document {
    pub fn new(name: impl Into<String>, root_frames: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            root_frames,
            tokens: BTreeMap::new(),
        }
    }

    /// Decode a document from its serialized JSON form.
    pub fn from_json(source: &str) -> Result<Self, crate::SchemaError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Visit every node of every root frame in pre-order.
    pub fn walk_mut<F: FnMut(&mut Node)>(&mut self, mut visit: F) {
        for frame in &mut self.root_frames {
            frame.walk_mut(&mut visit);
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One element of the design tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
    /// Remote image URL, or a local asset path once resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<CornerRadius>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a bare node with no visual attributes.
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            name: kind.as_str().to_string(),
            id,
            kind,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounds = Some(Bounds {
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Visit this node and all descendants in pre-order.
    pub fn walk_mut<F: FnMut(&mut Node)>(&mut self, visit: &mut F) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}

/// Node classification.
///
/// Kinds outside the known set are kept verbatim in [`NodeKind::Other`] so
/// they survive a serialize/deserialize cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Frame,
    Text,
    Ellipse,
    Rectangle,
    #[default]
    Group,
    Component,
    Instance,
    Vector,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Frame => "FRAME",
            NodeKind::Text => "TEXT",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Group => "GROUP",
            NodeKind::Component => "COMPONENT",
            NodeKind::Instance => "INSTANCE",
            NodeKind::Vector => "VECTOR",
            NodeKind::Other(name) => name,
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FRAME" => NodeKind::Frame,
            "TEXT" => NodeKind::Text,
            "ELLIPSE" => NodeKind::Ellipse,
            "RECTANGLE" => NodeKind::Rectangle,
            "GROUP" => NodeKind::Group,
            "COMPONENT" => NodeKind::Component,
            "INSTANCE" => NodeKind::Instance,
            "VECTOR" => NodeKind::Vector,
            _ => NodeKind::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Absolute bounding box, relative to the containing frame's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

/// A gradient paint. Stop order is significant and kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
    #[serde(default = "default_angle")]
    pub angle_degrees: f64,
}

fn default_angle() -> f64 {
    180.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Drop,
    Inner,
}

/// A drop or inner shadow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default)]
    pub blur_radius: f64,
    #[serde(default)]
    pub spread_radius: f64,
    pub color: Color,
}

/// Typographic hints. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

/// Corner radii as delivered by the source.
///
/// Source data may carry both a uniform value and per-corner values; the
/// uniform value wins when both are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerRadius {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_left: Option<f64>,
}

impl CornerRadius {
    pub fn uniform(radius: f64) -> Self {
        Self {
            uniform: Some(radius),
            ..Self::default()
        }
    }

    pub fn corners(top_left: f64, top_right: f64, bottom_right: f64, bottom_left: f64) -> Self {
        Self {
            uniform: None,
            top_left: Some(top_left),
            top_right: Some(top_right),
            bottom_right: Some(bottom_right),
            bottom_left: Some(bottom_left),
        }
    }
}

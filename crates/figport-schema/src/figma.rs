//! Design-file importer.
//!
//! Converts an already-fetched design-tool file (public REST JSON shape) into
//! a [`Document`]. Image fills are resolved through a node-id → URL lookup
//! table obtained separately from the image-render endpoint.
//!
//! ```text
//! file JSON + image URLs → import() → Document
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::{
    Bounds, Color, CornerRadius, Document, Effect, EffectKind, Gradient, GradientKind,
    GradientStop, Node, NodeKind, TextStyle,
};
use crate::SchemaError;

/// The subset of a design file the importer understands.
#[derive(Debug, Deserialize)]
pub struct DesignFile {
    #[serde(default)]
    pub name: Option<String>,
    pub document: Option<RawNode>,
}

/// A node as delivered by the design tool.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub absolute_bounding_box: Option<Bounds>,
    pub fills: Vec<RawPaint>,
    pub strokes: Vec<RawPaint>,
    pub stroke_weight: Option<f64>,
    pub corner_radius: Option<f64>,
    pub rectangle_corner_radii: Option<[f64; 4]>,
    pub opacity: Option<f64>,
    pub characters: Option<String>,
    pub style: Option<RawTextStyle>,
    pub effects: Vec<RawEffect>,
    pub children: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "visible")]
    pub visible: bool,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub gradient_stops: Vec<GradientStop>,
    #[serde(default)]
    pub gradient_transform: Option<[[f64; 3]; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTextStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    pub line_height_px: Option<f64>,
    pub letter_spacing: Option<f64>,
    pub text_align_horizontal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEffect {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "visible")]
    pub visible: bool,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub offset: Option<RawVector>,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub spread: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVector {
    pub x: f64,
    pub y: f64,
}

fn visible() -> bool {
    true
}

/// Decode a design file from JSON text.
pub fn parse_file(source: &str) -> Result<DesignFile, SchemaError> {
    Ok(serde_json::from_str(source)?)
}

/// Import a design file into a [`Document`].
///
/// Every `FRAME` or `COMPONENT` found under a page becomes a root frame.
/// Frames nested inside an exported frame stay part of their parent.
pub fn import(file: &DesignFile, image_urls: &HashMap<String, String>) -> Result<Document, SchemaError> {
    let root = file.document.as_ref().ok_or(SchemaError::MissingDocument)?;

    let mut root_frames = Vec::new();
    for page in &root.children {
        if matches!(page.kind.as_deref(), Some("CANVAS" | "PAGE")) {
            gather_frames(page, image_urls, &mut root_frames);
        }
    }

    let name = file.name.clone().unwrap_or_else(|| "Untitled".to_string());
    Ok(Document::new(name, root_frames))
}

/// Ids of nodes carrying an `IMAGE` fill, in pre-order.
///
/// These are the ids to request from the image-render endpoint.
pub fn collect_image_node_ids(file: &DesignFile) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(root) = &file.document {
        collect_image_ids(root, &mut ids);
    }
    ids
}

fn collect_image_ids(node: &RawNode, out: &mut Vec<String>) {
    if !node.id.is_empty() && node.fills.iter().any(|p| p.visible && p.kind == "IMAGE") {
        out.push(node.id.clone());
    }
    for child in &node.children {
        collect_image_ids(child, out);
    }
}

fn gather_frames(node: &RawNode, image_urls: &HashMap<String, String>, out: &mut Vec<Node>) {
    for child in &node.children {
        if matches!(child.kind.as_deref(), Some("FRAME" | "COMPONENT")) {
            out.push(convert(child, (0.0, 0.0), image_urls));
        } else {
            gather_frames(child, image_urls, out);
        }
    }
}

// =========================================================================
// Node conversion
// =========================================================================

/// `origin` is the parent's page-absolute position; bounds are stored
/// relative to it. Root frames pass the page origin.
fn convert(raw: &RawNode, origin: (f64, f64), image_urls: &HashMap<String, String>) -> Node {
    let kind = NodeKind::from(raw.kind.clone().unwrap_or_else(|| "GROUP".to_string()));
    let name = raw.name.clone().unwrap_or_else(|| kind.as_str().to_string());

    let mut node = Node {
        id: raw.id.clone(),
        name,
        bounds: raw.absolute_bounding_box.map(|b| Bounds {
            x: b.x - origin.0,
            y: b.y - origin.1,
            ..b
        }),
        opacity: raw.opacity,
        text: raw.characters.clone(),
        effects: raw.effects.iter().filter_map(convert_effect).collect(),
        corner_radius: convert_corners(raw),
        ..Node::default()
    };

    // The first visible paint decides the background
    if let Some(paint) = raw.fills.iter().find(|p| p.visible) {
        match paint.kind.as_str() {
            "SOLID" => node.fill = solid_color(paint),
            "GRADIENT_LINEAR" | "GRADIENT_RADIAL" => node.gradient = convert_gradient(paint),
            "IMAGE" => node.image_ref = image_urls.get(&raw.id).cloned(),
            _ => {}
        }
    }

    if let Some(paint) = raw.strokes.iter().find(|p| p.visible) {
        node.stroke = solid_color(paint);
        node.stroke_width = raw.stroke_weight;
    }

    if kind == NodeKind::Text {
        node.text_style = raw.style.as_ref().map(convert_text_style);
    }

    // Children without a box of their own inherit the parent's origin
    let child_origin = raw.absolute_bounding_box.map_or(origin, |b| (b.x, b.y));
    node.kind = kind;
    node.children = raw
        .children
        .iter()
        .map(|child| convert(child, child_origin, image_urls))
        .collect();
    node
}

fn solid_color(paint: &RawPaint) -> Option<Color> {
    if paint.kind != "SOLID" {
        return None;
    }
    let color = paint.color.unwrap_or(Color::rgb(0.0, 0.0, 0.0));
    Some(Color {
        a: color.a * paint.opacity.unwrap_or(1.0),
        ..color
    })
}

fn convert_gradient(paint: &RawPaint) -> Option<Gradient> {
    if paint.gradient_stops.is_empty() {
        return None;
    }

    let (kind, angle_degrees) = if paint.kind == "GRADIENT_RADIAL" {
        (GradientKind::Radial, 180.0)
    } else {
        let angle = paint
            .gradient_transform
            .map(|t| t[0][1].atan2(t[0][0]).to_degrees().rem_euclid(360.0))
            .unwrap_or(180.0);
        (GradientKind::Linear, angle)
    };

    Some(Gradient {
        kind,
        stops: paint.gradient_stops.clone(),
        angle_degrees,
    })
}

fn convert_effect(raw: &RawEffect) -> Option<Effect> {
    if !raw.visible {
        return None;
    }
    let kind = match raw.kind.as_str() {
        "DROP_SHADOW" => EffectKind::Drop,
        "INNER_SHADOW" => EffectKind::Inner,
        _ => return None,
    };
    let offset = raw.offset.as_ref();
    Some(Effect {
        kind,
        offset_x: offset.map_or(0.0, |o| o.x),
        offset_y: offset.map_or(0.0, |o| o.y),
        blur_radius: raw.radius,
        spread_radius: raw.spread,
        color: raw.color.unwrap_or(Color::rgb(0.0, 0.0, 0.0)),
    })
}

fn convert_corners(raw: &RawNode) -> Option<CornerRadius> {
    if let Some([tl, tr, br, bl]) = raw.rectangle_corner_radii {
        return Some(CornerRadius::corners(tl, tr, br, bl));
    }
    match raw.corner_radius {
        Some(r) if r != 0.0 => Some(CornerRadius::uniform(r)),
        _ => None,
    }
}

fn convert_text_style(raw: &RawTextStyle) -> TextStyle {
    TextStyle {
        font_family: raw.font_family.clone(),
        font_size: raw.font_size,
        font_weight: raw.font_weight.map(|w| w as u32),
        line_height: raw.line_height_px,
        letter_spacing: raw.letter_spacing,
        text_align: raw.text_align_horizontal.clone(),
    }
}

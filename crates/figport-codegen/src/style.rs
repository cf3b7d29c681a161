//! Style compiler.
//!
//! Resolves one node's geometry, paint, stroke, corner, text and shadow
//! attributes into a [`StyleRecord`]. Pure and total: missing attributes
//! produce no declaration, missing geometry degrades to zeros.

use std::fmt;

use figport_schema::{Color, CornerRadius, Effect, EffectKind, Gradient, GradientKind, Node, NodeKind};

use crate::format_number;

/// Border radius emitted for ellipses, regardless of configured corners.
pub const FULL_ROUND: &str = "9999px";

/// Fully resolved, renderer-ready visual properties of one node.
///
/// Position is always absolute. Every optional field maps to one or more CSS
/// declarations; `None` (or an empty shadow list) emits nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRecord {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    pub background: Option<Background>,
    pub border: Option<Border>,
    pub radius: Option<Radius>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u32>,
    pub line_height: Option<f64>,
    pub letter_spacing: Option<f64>,
    pub text_align: Option<String>,
    pub box_shadow: Vec<Shadow>,
}

/// The single background a node resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// A rendered `linear-gradient(...)` or `radial-gradient(...)` value.
    Gradient(String),
    Solid(Rgba),
    /// Image path or URL, drawn with cover sizing.
    Image(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    /// Ellipse: always fully rounded.
    Full,
    Uniform(f64),
    Corners {
        top_left: Option<f64>,
        top_right: Option<f64>,
        bottom_right: Option<f64>,
        bottom_left: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: Rgba,
    pub inset: bool,
}

/// CSS color with integer channels.
///
/// Channels are `channel * 255` truncated toward zero, not rounded, so
/// `0.999` maps to `254`. Downstream visual parity depends on this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: i64,
    pub g: i64,
    pub b: i64,
    pub a: f64,
}

impl From<&Color> for Rgba {
    fn from(color: &Color) -> Self {
        Self {
            r: truncate_channel(color.r),
            g: truncate_channel(color.g),
            b: truncate_channel(color.b),
            a: color.a,
        }
    }
}

fn truncate_channel(value: f64) -> i64 {
    (value * 255.0) as i64
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({},{},{},{})",
            self.r,
            self.g,
            self.b,
            format_number(self.a)
        )
    }
}

impl fmt::Display for Shadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px {}",
            format_number(self.offset_x),
            format_number(self.offset_y),
            format_number(self.blur),
            format_number(self.spread),
            self.color
        )?;
        if self.inset {
            f.write_str(" inset")?;
        }
        Ok(())
    }
}

// =========================================================================
// Compilation
// =========================================================================

/// Compile a node into its style record.
pub fn compile_style(node: &Node) -> StyleRecord {
    let bounds = node.bounds.unwrap_or_default();
    let text = node.text_style.clone().unwrap_or_default();

    StyleRecord {
        left: bounds.x,
        top: bounds.y,
        width: bounds.width,
        height: bounds.height,
        opacity: node.opacity.unwrap_or(1.0),
        background: background(node),
        border: border(node),
        radius: radius(node),
        font_family: text.font_family,
        font_size: text.font_size,
        font_weight: text.font_weight,
        line_height: text.line_height,
        letter_spacing: text.letter_spacing,
        text_align: text.text_align.map(|align| align.to_lowercase()),
        box_shadow: node.effects.iter().map(shadow).collect(),
    }
}

/// Background source candidates, in precedence order.
enum Paint<'a> {
    Gradient(&'a Gradient),
    Solid(&'a Color),
    Image(&'a str),
    None,
}

fn paint(node: &Node) -> Paint<'_> {
    match (&node.gradient, &node.fill, &node.image_ref) {
        (Some(gradient), _, _) if !gradient.stops.is_empty() => Paint::Gradient(gradient),
        (_, Some(fill), _) => Paint::Solid(fill),
        (_, _, Some(image)) => Paint::Image(image),
        _ => Paint::None,
    }
}

fn background(node: &Node) -> Option<Background> {
    match paint(node) {
        Paint::Gradient(gradient) => Some(Background::Gradient(gradient_css(gradient))),
        Paint::Solid(color) => Some(Background::Solid(Rgba::from(color))),
        Paint::Image(path) => Some(Background::Image(path.to_string())),
        Paint::None => None,
    }
}

/// Render a gradient as a CSS image value.
/// Stop positions are percentages rounded to two decimals.
pub fn gradient_css(gradient: &Gradient) -> String {
    let stops: Vec<String> = gradient
        .stops
        .iter()
        .map(|stop| {
            format!(
                "{} {}%",
                Rgba::from(&stop.color),
                format_number(round2(stop.position * 100.0))
            )
        })
        .collect();

    match gradient.kind {
        GradientKind::Radial => format!("radial-gradient(circle, {})", stops.join(", ")),
        GradientKind::Linear => format!(
            "linear-gradient({}deg, {})",
            format_number(round2(gradient.angle_degrees)),
            stops.join(", ")
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn border(node: &Node) -> Option<Border> {
    match (&node.stroke, node.stroke_width) {
        (Some(stroke), Some(width)) if width > 0.0 => Some(Border {
            width,
            color: Rgba::from(stroke),
        }),
        _ => None,
    }
}

fn radius(node: &Node) -> Option<Radius> {
    if node.kind == NodeKind::Ellipse {
        return Some(Radius::Full);
    }
    let corners: CornerRadius = node.corner_radius?;
    if let Some(uniform) = corners.uniform {
        return Some(Radius::Uniform(uniform));
    }
    let any_corner = corners.top_left.is_some()
        || corners.top_right.is_some()
        || corners.bottom_right.is_some()
        || corners.bottom_left.is_some();
    any_corner.then_some(Radius::Corners {
        top_left: corners.top_left,
        top_right: corners.top_right,
        bottom_right: corners.bottom_right,
        bottom_left: corners.bottom_left,
    })
}

fn shadow(effect: &Effect) -> Shadow {
    Shadow {
        offset_x: effect.offset_x,
        offset_y: effect.offset_y,
        blur: effect.blur_radius,
        spread: effect.spread_radius,
        color: Rgba::from(&effect.color),
        inset: effect.kind == EffectKind::Inner,
    }
}

// =========================================================================
// Emission
// =========================================================================

impl StyleRecord {
    /// CSS declarations in their fixed emission order.
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut decls = vec![
            ("position", "absolute".to_string()),
            ("left", px(self.left)),
            ("top", px(self.top)),
            ("width", px(self.width)),
            ("height", px(self.height)),
            ("opacity", format_number(self.opacity)),
        ];

        match &self.background {
            Some(Background::Gradient(value)) => decls.push(("background", value.clone())),
            Some(Background::Solid(color)) => decls.push(("background", color.to_string())),
            Some(Background::Image(path)) => {
                let url = format!("url('{}')", escape_css_string(path));
                decls.push(("background-image", url));
                decls.push(("background-size", "cover".into()));
                decls.push(("background-position", "center center".into()));
                decls.push(("background-repeat", "no-repeat".into()));
            }
            None => {}
        }

        if let Some(border) = &self.border {
            decls.push(("border", format!("{} solid {}", px(border.width), border.color)));
        }

        match self.radius {
            Some(Radius::Full) => decls.push(("border-radius", FULL_ROUND.into())),
            Some(Radius::Uniform(r)) => decls.push(("border-radius", px(r))),
            Some(Radius::Corners {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            }) => {
                let corners = [
                    ("border-top-left-radius", top_left),
                    ("border-top-right-radius", top_right),
                    ("border-bottom-right-radius", bottom_right),
                    ("border-bottom-left-radius", bottom_left),
                ];
                for (name, value) in corners {
                    if let Some(value) = value {
                        decls.push((name, px(value)));
                    }
                }
            }
            None => {}
        }

        if let Some(family) = &self.font_family {
            decls.push(("font-family", family.clone()));
        }
        if let Some(size) = self.font_size {
            decls.push(("font-size", px(size)));
        }
        if let Some(weight) = self.font_weight {
            decls.push(("font-weight", weight.to_string()));
        }
        if let Some(height) = self.line_height {
            decls.push(("line-height", px(height)));
        }
        if let Some(spacing) = self.letter_spacing {
            decls.push(("letter-spacing", px(spacing)));
        }
        if let Some(align) = &self.text_align {
            decls.push(("text-align", align.clone()));
        }

        if !self.box_shadow.is_empty() {
            let shadows: Vec<String> = self.box_shadow.iter().map(Shadow::to_string).collect();
            decls.push(("box-shadow", shadows.join(", ")));
        }

        decls
    }

    /// Value of a single property, if emitted.
    pub fn get(&self, property: &str) -> Option<String> {
        self.declarations()
            .into_iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    /// Inline `style` attribute text: `name: value` pairs joined by `; `.
    pub fn to_inline(&self) -> String {
        self.declarations()
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Escape a value for a single-quoted CSS string.
fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn px(value: f64) -> String {
    format!("{}px", format_number(value))
}

//! React (TSX) code generator.
//!
//! Emits one component per root frame plus an `App` that mounts them in
//! document order. Node styles come from [`compile_style`] and are written
//! as inline style objects with camelCase property names.

use figport_schema::{Document, Node};

use crate::format_number;
use crate::html::{DEFAULT_FRAME_SIZE, EMPTY_NOTICE};
use crate::style::{compile_style, StyleRecord};

/// A generated frame component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component name, `Frame{n}` with `n` starting at 1.
    pub name: String,
    pub source: String,
}

impl Component {
    pub fn file_name(&self) -> String {
        format!("{}.tsx", self.name)
    }
}

/// The React sources for a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactOutput {
    /// `App.tsx`.
    pub app: String,
    /// Frame components, importable from `./components/{name}`.
    pub components: Vec<Component>,
}

/// Generate the `App` and one component per root frame.
pub fn generate(doc: &Document) -> ReactOutput {
    let components: Vec<Component> = doc
        .root_frames
        .iter()
        .enumerate()
        .map(|(index, frame)| generate_component(frame, index + 1))
        .collect();

    ReactOutput {
        app: generate_app(&components),
        components,
    }
}

fn generate_app(components: &[Component]) -> String {
    let mut app = String::from("import React from \"react\";\n");
    for component in components {
        app.push_str(&format!(
            "import {name} from \"./components/{name}\";\n",
            name = component.name
        ));
    }

    app.push_str("\nexport default function App() {\n  return (\n    <main className=\"page\">\n");
    if components.is_empty() {
        app.push_str(&format!("      <div className=\"empty\">{EMPTY_NOTICE}</div>\n"));
    }
    for component in components {
        app.push_str(&format!("      <{} />\n", component.name));
    }
    app.push_str("    </main>\n  );\n}\n");
    app
}

/// Render a root frame as a component module.
pub fn generate_component(frame: &Node, index: usize) -> Component {
    let name = format!("Frame{index}");
    let (width, height) = frame
        .bounds
        .map_or(DEFAULT_FRAME_SIZE, |b| (b.width, b.height));

    let mut source = String::from("import React from \"react\";\n\n");
    source.push_str(&format!("export default function {name}() {{\n  return (\n"));
    source.push_str(&format!(
        "    <section className=\"frame\" style={{{{ width: '{}px', height: '{}px' }}}}>\n",
        format_number(width),
        format_number(height),
    ));
    for child in &frame.children {
        render_node(child, &mut source, 3);
    }
    source.push_str("    </section>\n  );\n}\n");

    Component { name, source }
}

/// Render a node and its subtree as JSX.
pub fn render_node(node: &Node, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let style = style_object(&compile_style(node));

    if node.is_text() {
        let text = js_string(node.text.as_deref().unwrap_or_default());
        out.push_str(&format!(
            "{indent}<div className=\"node text\" style={{{style}}}>{{{text}}}</div>\n"
        ));
        return;
    }

    let class = node.kind.as_str().to_lowercase();
    out.push_str(&format!(
        "{indent}<div className=\"node {class}\" style={{{style}}}>"
    ));

    if node.children.is_empty() {
        out.push_str("</div>\n");
        return;
    }

    out.push('\n');
    for child in &node.children {
        render_node(child, out, depth + 1);
    }
    out.push_str(&indent);
    out.push_str("</div>\n");
}

/// Style record as a JS object literal, in declaration order.
pub fn style_object(style: &StyleRecord) -> String {
    let entries: Vec<String> = style
        .declarations()
        .into_iter()
        .map(|(property, value)| format!("{}: {}", camel_case(property), js_string(&value)))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

/// `border-top-left-radius` → `borderTopLeftRadius`.
fn camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut upper = false;
    for c in property.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Single-quoted JS string literal.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

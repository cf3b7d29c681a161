//! HTML code generator.
//!
//! Walks the design tree and emits nested, absolutely positioned containers.
//! Styles are compiled per node on demand and written inline. Child order
//! follows the tree, and markup nesting depth equals tree depth.

use figport_schema::{Document, Node};

use crate::format_number;
use crate::style::{compile_style, StyleRecord};

/// Frame size used when a root frame carries no bounds.
pub const DEFAULT_FRAME_SIZE: (f64, f64) = (1200.0, 800.0);

/// Message shown when a document has no root frames.
pub const EMPTY_NOTICE: &str = "No frames detected.";

/// Hrefs the page uses to load its companion files.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLinks {
    pub stylesheet: String,
    pub script: String,
}

impl Default for PageLinks {
    fn default() -> Self {
        Self {
            stylesheet: "./styles.css".into(),
            script: "./script.js".into(),
        }
    }
}

/// Generate the complete HTML page for a document.
pub fn generate(doc: &Document, links: &PageLinks) -> String {
    let title = if doc.name.is_empty() {
        "Export".to_string()
    } else {
        escape_text(&doc.name)
    };

    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\"/>\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n");
    html.push_str(&format!("  <title>{title}</title>\n"));
    html.push_str(&format!(
        "  <link rel=\"stylesheet\" href=\"{}\"/>\n",
        escape_attr(&links.stylesheet)
    ));
    html.push_str("</head>\n<body>\n  <main>\n");
    html.push_str(&generate_body(doc));
    html.push_str("  </main>\n");
    html.push_str(&format!(
        "  <script src=\"{}\"></script>\n",
        escape_attr(&links.script)
    ));
    html.push_str("</body>\n</html>\n");
    html
}

/// Generate the frame sections only, one per root frame in document order.
pub fn generate_body(doc: &Document) -> String {
    let mut out = String::new();

    if doc.root_frames.is_empty() {
        render_placeholder(&mut out, 2);
        return out;
    }

    for (index, frame) in doc.root_frames.iter().enumerate() {
        render_frame(frame, index + 1, &mut out, 2);
    }

    out
}

fn render_placeholder(out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let (width, height) = DEFAULT_FRAME_SIZE;
    out.push_str(&format!(
        "{indent}<section class=\"frame\" style=\"width:{}px; height:{}px;\">\
         <div class=\"node text\" style=\"position: absolute; left: 40px; top: 40px\">{EMPTY_NOTICE}</div>\
         </section>\n",
        format_number(width),
        format_number(height),
    ));
}

/// Render a root frame as a sized section wrapping its children.
/// The frame's own paint is not applied; the section supplies the canvas.
pub fn render_frame(frame: &Node, index: usize, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let (width, height) = frame
        .bounds
        .map_or(DEFAULT_FRAME_SIZE, |b| (b.width, b.height));

    out.push_str(&format!(
        "{indent}<section class=\"frame\" id=\"frame-{index}\" style=\"width:{}px; height:{}px;\">\n",
        format_number(width),
        format_number(height),
    ));
    for child in &frame.children {
        render_node(child, out, depth + 1);
    }
    out.push_str(&indent);
    out.push_str("</section>\n");
}

/// Render a node and its subtree.
pub fn render_node(node: &Node, out: &mut String, depth: usize) {
    let style = compile_style(node);
    render_with_style(node, &style, out, depth);
}

/// Render a node whose style has already been compiled.
/// Descendants are compiled on demand.
pub fn render_with_style(node: &Node, style: &StyleRecord, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let style_attr = escape_attr(&style.to_inline());

    // Text nodes are leaves
    if node.is_text() {
        let text = escape_text(node.text.as_deref().unwrap_or_default());
        out.push_str(&format!(
            "{indent}<div class=\"node text\" style=\"{style_attr}\">{text}</div>\n"
        ));
        return;
    }

    let class = escape_attr(&node.kind.as_str().to_lowercase());
    out.push_str(&format!(
        "{indent}<div class=\"node {class}\" style=\"{style_attr}\">"
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

/// Escape text content: `&`, `<` and `>`.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a double-quoted attribute value.
fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figport_schema::{Color, NodeKind, TextStyle};
    use pretty_assertions::assert_eq;

    fn render(node: &Node) -> String {
        let mut out = String::new();
        render_node(node, &mut out, 0);
        out
    }

    fn text(id: &str, content: &str) -> Node {
        let mut node = Node::new(id, NodeKind::Text);
        node.text = Some(content.into());
        node
    }

    // =========================================================================
    // Basic containers
    // =========================================================================

    #[test]
    fn test_empty_container() {
        let html = render(&Node::new("1", NodeKind::Rectangle));
        assert_eq!(
            html,
            "<div class=\"node rectangle\" style=\"position: absolute; left: 0px; top: 0px; width: 0px; height: 0px; opacity: 1\"></div>\n"
        );
    }

    #[test]
    fn test_text_leaf() {
        let html = render(&text("1", "Hello"));
        assert_eq!(
            html,
            "<div class=\"node text\" style=\"position: absolute; left: 0px; top: 0px; width: 0px; height: 0px; opacity: 1\">Hello</div>\n"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render(&text("1", "a < b && c > d"));
        assert!(html.contains(">a &lt; b &amp;&amp; c &gt; d</div>"));
    }

    #[test]
    fn test_text_children_are_ignored() {
        let node = text("1", "Label").with_children(vec![text("2", "hidden")]);
        let html = render(&node);
        assert!(!html.contains("hidden"));
    }

    #[test]
    fn test_text_without_content() {
        let html = render(&Node::new("1", NodeKind::Text));
        assert!(html.ends_with("opacity: 1\"></div>\n"));
    }

    #[test]
    fn test_style_attribute_quotes_are_escaped() {
        let mut node = text("1", "x");
        node.text_style = Some(TextStyle {
            font_family: Some("\"Open Sans\"".into()),
            ..TextStyle::default()
        });
        let html = render(&node);
        assert!(html.contains("font-family: &quot;Open Sans&quot;"));
    }

    // =========================================================================
    // Nesting
    // =========================================================================

    #[test]
    fn test_children_in_order_and_nested() {
        let group = Node::new("g", NodeKind::Group).with_children(vec![
            text("a", "A"),
            Node::new("r", NodeKind::Ellipse),
            text("b", "B"),
        ]);
        let html = render(&group);
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("<div class=\"node group\""));
        assert!(lines[1].starts_with("  <div class=\"node text\"") && lines[1].ends_with(">A</div>"));
        assert!(lines[2].starts_with("  <div class=\"node ellipse\""));
        assert!(lines[2].contains("border-radius: 9999px"));
        assert!(lines[3].ends_with(">B</div>"));
        assert_eq!(lines[4], "</div>");
    }

    #[test]
    fn test_deep_nesting_follows_tree_depth() {
        let tree = Node::new("1", NodeKind::Frame).with_children(vec![Node::new(
            "2",
            NodeKind::Group,
        )
        .with_children(vec![text("3", "deep")])]);
        let html = render(&tree);
        let lines: Vec<&str> = html.lines().collect();
        assert!(lines[2].starts_with("    <div class=\"node text\""));
        assert_eq!(lines[3], "  </div>");
        assert_eq!(lines[4], "</div>");
    }

    #[test]
    fn test_unknown_kind_class() {
        let html = render(&Node::new("1", NodeKind::Other("BOOLEAN_OPERATION".into())));
        assert!(html.starts_with("<div class=\"node boolean_operation\""));
    }

    // =========================================================================
    // Frames and pages
    // =========================================================================

    #[test]
    fn test_frame_section_size() {
        let mut frame = Node::new("f", NodeKind::Frame).with_bounds(100.0, 50.0, 1440.0, 900.0);
        frame.fill = Some(Color::rgb(1.0, 1.0, 1.0));
        frame.children = vec![text("t", "Hi")];
        let mut out = String::new();
        render_frame(&frame, 3, &mut out, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "<section class=\"frame\" id=\"frame-3\" style=\"width:1440px; height:900px;\">"
        );
        assert!(lines[1].starts_with("  <div class=\"node text\""));
        assert_eq!(lines[2], "</section>");
    }

    #[test]
    fn test_frame_default_size() {
        let mut out = String::new();
        render_frame(&Node::new("f", NodeKind::Frame), 1, &mut out, 0);
        assert!(out.starts_with("<section class=\"frame\" id=\"frame-1\" style=\"width:1200px; height:800px;\">"));
    }

    #[test]
    fn test_empty_document_placeholder() {
        let body = generate_body(&Document::new("Empty", Vec::new()));
        assert_eq!(body.lines().count(), 1);
        assert!(body.contains(EMPTY_NOTICE));
        assert!(body.contains("width:1200px; height:800px;"));
    }

    #[test]
    fn test_frames_in_document_order() {
        let doc = Document::new(
            "Two",
            vec![Node::new("a", NodeKind::Frame), Node::new("b", NodeKind::Frame)],
        );
        let body = generate_body(&doc);
        let first = body.find("frame-1").unwrap();
        let second = body.find("frame-2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_page_shell() {
        let doc = Document::new("Home & <Away>", vec![Node::new("a", NodeKind::Frame)]);
        let html = generate(&doc, &PageLinks::default());
        assert!(html.starts_with("<!doctype html>\n"));
        assert!(html.contains("<title>Home &amp; &lt;Away&gt;</title>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"./styles.css\"/>"));
        assert!(html.contains("<script src=\"./script.js\"></script>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_untitled_page() {
        let html = generate(&Document::default(), &PageLinks::default());
        assert!(html.contains("<title>Export</title>"));
    }
}

//! figport code generator
//!
//! Compiles a design [`Document`] into three outputs: the HTML page, the
//! base stylesheet, and a script stub. Every node's style is compiled by
//! [`style::compile_style`] and emitted inline by the HTML generator.
//!
//! ```text
//! Document → compile() → CompilerOutput { html, css, js }
//! ```
//!
//! [`react::generate`] renders the same tree as TSX components instead.
//!
//! Code generation is total: sparse or empty documents still produce output.

pub mod css;
pub mod html;
pub mod js;
pub mod react;
pub mod style;

use figport_schema::Document;

pub use html::PageLinks;
pub use style::{compile_style, StyleRecord};

/// The compiled output for a design document.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOutput {
    pub html: String,
    pub css: String,
    pub js: String,
}

/// Compile a document with the default companion file links.
pub fn compile(doc: &Document) -> CompilerOutput {
    compile_with(doc, &PageLinks::default())
}

/// Compile a document, linking the page to the given stylesheet and script.
pub fn compile_with(doc: &Document, links: &PageLinks) -> CompilerOutput {
    CompilerOutput {
        html: html::generate(doc, links),
        css: css::generate(),
        js: js::generate(),
    }
}

/// Format a number, removing `.0` for integers.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&n) {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

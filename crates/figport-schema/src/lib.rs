//! figport schema
//!
//! The design tree consumed by the export pipeline: documents, nodes and
//! their paint, stroke, corner, text and effect attributes.
//! Also hosts the importer that turns a design-tool file into a [`Document`].
//!
//! # Example
//!
//! ```
//! use figport_schema::Document;
//!
//! let doc = Document::from_json(r#"{"name": "Landing", "root_frames": []}"#).unwrap();
//! assert!(doc.root_frames.is_empty());
//! ```

pub mod figma;
pub mod model;

pub use model::{
    Bounds, Color, CornerRadius, Document, Effect, EffectKind, Gradient, GradientKind,
    GradientStop, Node, NodeKind, TextStyle,
};

/// Error raised when a schema or design file cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Design file has no document root")]
    MissingDocument,
}

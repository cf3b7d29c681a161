//! figport export
//!
//! Writes a design document out as a static web artifact:
//!
//! ```text
//! out/
//!   index.html       one sized section per root frame
//!   styles.css       static base rules
//!   script.js        runtime hook stub
//!   ui-schema.json   the document after asset resolution
//!   assets/          one file per materialized image URL
//! ```
//!
//! [`Exporter::export_react`] writes `src/App.tsx` and
//! `src/components/Frame{n}.tsx` in place of the three page files.
//!
//! The export either succeeds, possibly with some images missing, or fails
//! on a structural fault such as an unwritable output directory. Soft
//! problems are returned as [`Diagnostic`]s in the [`ExportReport`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use figport_assets::{
    write_atomic, AssetEntry, AssetError, AssetResolver, FetchConfig, HttpFetcher, ImageFetcher,
};
use figport_codegen::PageLinks;
use figport_schema::Document;
use tracing::{debug, info, warn};

/// Export error. Every variant aborts the export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot create output directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Cannot serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// A non-fatal condition noticed during export.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The document has no root frames; a placeholder page was written.
    NoFrames,
    /// A node's image could not be fetched and renders without it.
    AssetUnavailable {
        node_id: String,
        url: String,
        reason: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoFrames => write!(
                f,
                "No frames detected. Ensure the design is inside at least one frame."
            ),
            Diagnostic::AssetUnavailable {
                node_id,
                url,
                reason,
            } => write!(f, "Asset fetch failed for node {node_id} ({url}): {reason}"),
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Generated files, excluding assets.
    pub files: Vec<PathBuf>,
    /// Materialized images in first-reference order.
    pub assets: Vec<AssetEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Output file names, relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub html: String,
    pub stylesheet: String,
    pub script: String,
    pub schema: String,
    pub assets_dir: String,
    /// Source root for [`Exporter::export_react`]; components go in
    /// `{react_src}/components`.
    pub react_src: String,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            html: "index.html".into(),
            stylesheet: "styles.css".into(),
            script: "script.js".into(),
            schema: "ui-schema.json".into(),
            assets_dir: "assets".into(),
            react_src: "src".into(),
        }
    }
}

impl ExportLayout {
    fn page_links(&self) -> PageLinks {
        PageLinks {
            stylesheet: format!("./{}", self.stylesheet),
            script: format!("./{}", self.script),
        }
    }
}

/// Runs exports with a given image fetcher and output layout.
pub struct Exporter<F> {
    fetcher: F,
    layout: ExportLayout,
}

impl Exporter<HttpFetcher> {
    /// Exporter that downloads images over HTTP.
    pub fn http(config: &FetchConfig) -> Self {
        Self::new(HttpFetcher::new(config))
    }
}

impl<F: ImageFetcher> Exporter<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            layout: ExportLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: ExportLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &ExportLayout {
        &self.layout
    }

    /// Export `doc` into `out_dir`.
    ///
    /// Remote image references in `doc` are rewritten to local asset paths
    /// (or cleared when the fetch fails) before anything is rendered.
    pub fn export(&self, doc: &mut Document, out_dir: &Path) -> Result<ExportReport, ExportError> {
        let (assets, diagnostics) = self.prepare(doc, out_dir)?;

        let output = figport_codegen::compile_with(doc, &self.layout.page_links());
        let schema = doc.to_json_pretty()?;

        let outputs = vec![
            (out_dir.join(&self.layout.html), output.html),
            (out_dir.join(&self.layout.stylesheet), output.css),
            (out_dir.join(&self.layout.script), output.js),
            (out_dir.join(&self.layout.schema), schema),
        ];
        let files = write_all(outputs)?;

        Ok(finish(doc, out_dir, files, assets, diagnostics))
    }

    /// Export `doc` as React sources: `App.tsx` plus one `Frame{n}.tsx`
    /// component per root frame, alongside `ui-schema.json` and the assets.
    pub fn export_react(
        &self,
        doc: &mut Document,
        out_dir: &Path,
    ) -> Result<ExportReport, ExportError> {
        let (assets, diagnostics) = self.prepare(doc, out_dir)?;

        let src = out_dir.join(&self.layout.react_src);
        let components_dir = src.join("components");
        create_dir(&components_dir)?;

        let output = figport_codegen::react::generate(doc);
        let schema = doc.to_json_pretty()?;

        let mut outputs = vec![(src.join("App.tsx"), output.app)];
        for component in output.components {
            outputs.push((components_dir.join(component.file_name()), component.source));
        }
        outputs.push((out_dir.join(&self.layout.schema), schema));
        let files = write_all(outputs)?;

        Ok(finish(doc, out_dir, files, assets, diagnostics))
    }

    /// Create the output directories and run the asset resolution pass.
    fn prepare(
        &self,
        doc: &mut Document,
        out_dir: &Path,
    ) -> Result<(Vec<AssetEntry>, Vec<Diagnostic>), ExportError> {
        let assets_dir = out_dir.join(&self.layout.assets_dir);
        create_dir(out_dir)?;
        create_dir(&assets_dir)?;

        let mut diagnostics = Vec::new();
        if doc.root_frames.is_empty() {
            diagnostics.push(Diagnostic::NoFrames);
        }

        // Single mutation pass; rendering only reads the tree afterwards
        let mut resolver = AssetResolver::new(
            &self.fetcher,
            assets_dir,
            format!("./{}", self.layout.assets_dir),
        );
        let failures = resolver.resolve_document(doc)?;
        diagnostics.extend(failures.into_iter().map(|f| Diagnostic::AssetUnavailable {
            node_id: f.node_id,
            url: f.url,
            reason: f.reason,
        }));

        Ok((resolver.into_manifest(), diagnostics))
    }
}

fn write_all(outputs: Vec<(PathBuf, String)>) -> Result<Vec<PathBuf>, ExportError> {
    let mut files = Vec::with_capacity(outputs.len());
    for (path, contents) in outputs {
        write_atomic(&path, contents.as_bytes()).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        files.push(path);
    }
    Ok(files)
}

fn finish(
    doc: &Document,
    out_dir: &Path,
    files: Vec<PathBuf>,
    assets: Vec<AssetEntry>,
    diagnostics: Vec<Diagnostic>,
) -> ExportReport {
    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }
    info!(
        out_dir = %out_dir.display(),
        frames = doc.root_frames.len(),
        assets = assets.len(),
        diagnostics = diagnostics.len(),
        "export complete"
    );
    ExportReport {
        files,
        assets,
        diagnostics,
    }
}

/// Export with the default HTTP fetcher and layout.
pub fn export(doc: &mut Document, out_dir: &Path) -> Result<ExportReport, ExportError> {
    Exporter::http(&FetchConfig::default()).export(doc, out_dir)
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(path).map_err(|source| ExportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

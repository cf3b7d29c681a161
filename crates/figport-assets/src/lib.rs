//! figport assets
//!
//! Materializes remote images referenced by design nodes into a local,
//! de-duplicated asset directory. One [`AssetResolver`] covers one export
//! run: each distinct URL is fetched at most once, and every later node that
//! references it reuses the first outcome, success or failure.
//!
//! Fetch failures are soft. The node loses its image and the failure is
//! reported back to the caller; only local I/O faults are errors.

pub mod fetch;

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use figport_schema::{Document, Node};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

pub use fetch::{FetchConfig, FetchError, HttpFetcher, ImageFetcher};

/// Extension used when the URL does not name a known image type.
pub const DEFAULT_EXTENSION: &str = ".png";

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|webp)(?:\?|$)").expect("extension pattern is valid")
});

/// Structural failure while storing an asset.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write asset {}: {source}", path.display())]
pub struct AssetError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// Outcome of resolving one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Stored locally; the value is the path to reference from markup.
    Local(String),
    /// Could not be fetched; the value is the reason.
    Unavailable(String),
}

/// A successfully materialized asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetEntry {
    pub url: String,
    /// The first node that referenced the URL; it names the file.
    pub node_id: String,
    pub path: String,
}

/// A node whose image could not be materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFailure {
    pub node_id: String,
    pub url: String,
    pub reason: String,
}

/// Per-run URL → local path resolver.
pub struct AssetResolver<F> {
    fetcher: F,
    assets_dir: PathBuf,
    public_prefix: String,
    cache: HashMap<String, Resolution>,
    /// File names already claimed in this run.
    claimed: HashSet<String>,
    manifest: Vec<AssetEntry>,
}

impl<F: ImageFetcher> AssetResolver<F> {
    /// Files are stored in `assets_dir` and referenced as `{public_prefix}/{file}`.
    pub fn new(fetcher: F, assets_dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            fetcher,
            assets_dir: assets_dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            cache: HashMap::new(),
            claimed: HashSet::new(),
            manifest: Vec::new(),
        }
    }

    /// Resolve one URL on behalf of `node_id`.
    ///
    /// The cache is consulted before any fetch, so the first referencing node
    /// names the file and every URL is attempted at most once.
    pub fn resolve(&mut self, url: &str, node_id: &str) -> Result<Resolution, AssetError> {
        if let Some(hit) = self.cache.get(url) {
            debug!(url, node_id, "asset cache hit");
            return Ok(hit.clone());
        }

        debug!(url, node_id, "fetching image");
        let resolution = match self.fetcher.fetch(url) {
            Ok(bytes) => {
                let file_name = self.claim_file_name(node_id, url);
                let path = self.assets_dir.join(&file_name);
                write_atomic(&path, &bytes).map_err(|source| AssetError {
                    path: path.clone(),
                    source,
                })?;
                debug!(url, path = %path.display(), bytes = bytes.len(), "stored asset");

                let public = format!("{}/{file_name}", self.public_prefix);
                self.manifest.push(AssetEntry {
                    url: url.to_string(),
                    node_id: node_id.to_string(),
                    path: public.clone(),
                });
                Resolution::Local(public)
            }
            Err(e) => {
                warn!(url, node_id, error = %e, "image fetch failed");
                Resolution::Unavailable(e.to_string())
            }
        };

        self.cache.insert(url.to_string(), resolution.clone());
        Ok(resolution)
    }

    /// Distinct ids can sanitize to the same name (`1:2`, `1;2`). Later
    /// claimants get a numeric suffix: `node-1-2-2.png`.
    fn claim_file_name(&mut self, node_id: &str, url: &str) -> String {
        let mut file_name = asset_file_name(node_id, url);
        let mut n = 2;
        while self.claimed.contains(&file_name) {
            file_name = asset_file_name(&format!("{node_id}-{n}"), url);
            n += 1;
        }
        self.claimed.insert(file_name.clone());
        file_name
    }

    /// Rewrite every remote image reference in the document, pre-order.
    pub fn resolve_document(&mut self, doc: &mut Document) -> Result<Vec<AssetFailure>, AssetError> {
        let mut failures = Vec::new();
        let mut fault = None;
        doc.walk_mut(|node| {
            if fault.is_none() {
                fault = self.resolve_ref(node, &mut failures).err();
            }
        });
        match fault {
            Some(e) => Err(e),
            None => Ok(failures),
        }
    }

    /// Rewrite remote image references in a subtree, pre-order.
    ///
    /// Successful references become local paths. Failed ones are cleared so
    /// the node renders without an image. Local paths are left untouched.
    /// Stops at the first write fault.
    pub fn resolve_node(
        &mut self,
        node: &mut Node,
        failures: &mut Vec<AssetFailure>,
    ) -> Result<(), AssetError> {
        let mut fault = None;
        node.walk_mut(&mut |n: &mut Node| {
            if fault.is_none() {
                fault = self.resolve_ref(n, failures).err();
            }
        });
        fault.map_or(Ok(()), Err)
    }

    fn resolve_ref(
        &mut self,
        node: &mut Node,
        failures: &mut Vec<AssetFailure>,
    ) -> Result<(), AssetError> {
        let Some(url) = node.image_ref.clone().filter(|r| is_remote(r)) else {
            return Ok(());
        };
        match self.resolve(&url, &node.id)? {
            Resolution::Local(path) => node.image_ref = Some(path),
            Resolution::Unavailable(reason) => {
                node.image_ref = None;
                failures.push(AssetFailure {
                    node_id: node.id.clone(),
                    url,
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Materialized assets in first-reference order.
    pub fn manifest(&self) -> &[AssetEntry] {
        &self.manifest
    }

    pub fn into_manifest(self) -> Vec<AssetEntry> {
        self.manifest
    }
}

/// Whether an image reference still points at the network.
pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Deterministic file name for an asset: `node-{id}{ext}`.
/// Characters outside `[A-Za-z0-9_-]` in the id become `-`.
pub fn asset_file_name(node_id: &str, url: &str) -> String {
    let id: String = node_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("node-{id}{}", sniff_extension(url))
}

/// Image extension named by the URL, lower-cased, or [`DEFAULT_EXTENSION`].
pub fn sniff_extension(url: &str) -> String {
    EXTENSION
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map_or_else(
            || DEFAULT_EXTENSION.to_string(),
            |ext| format!(".{}", ext.as_str().to_lowercase()),
        )
}

/// Write a file in full or not at all.
///
/// Contents go to a temporary file in the target directory, which is then
/// renamed over the destination.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figport_schema::NodeKind;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// In-memory fetcher that records every request.
    struct FakeFetcher {
        images: HashMap<String, Vec<u8>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(images: &[(&str, &str)]) -> Self {
            Self {
                images: images
                    .iter()
                    .map(|(url, bytes)| (url.to_string(), bytes.as_bytes().to_vec()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl ImageFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            self.images.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    fn image_node(id: &str, url: &str) -> Node {
        let mut node = Node::new(id, NodeKind::Rectangle);
        node.image_ref = Some(url.into());
        node
    }

    const HERO: &str = "https://cdn.example.com/hero.JPG?v=2";
    const MISSING: &str = "https://cdn.example.com/missing";

    // =========================================================================
    // File naming
    // =========================================================================

    #[test]
    fn test_sniff_extension() {
        assert_eq!(sniff_extension("https://x/a.png"), ".png");
        assert_eq!(sniff_extension("https://x/a.JPEG?size=2"), ".jpeg");
        assert_eq!(sniff_extension("https://x/a.webp"), ".webp");
        assert_eq!(sniff_extension("https://x/render/1234"), DEFAULT_EXTENSION);
        assert_eq!(sniff_extension("https://x/a.gif"), DEFAULT_EXTENSION);
        assert_eq!(sniff_extension("https://x/a.png.html"), DEFAULT_EXTENSION);
    }

    #[test]
    fn test_asset_file_name() {
        assert_eq!(asset_file_name("12:34", HERO), "node-12-34.jpg");
        assert_eq!(asset_file_name("I5;6_a-b", "https://x/y"), "node-I5-6_a-b.png");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/a.png"));
        assert!(is_remote("http://cdn.example.com/a.png"));
        assert!(!is_remote("./assets/node-1.png"));
        assert!(!is_remote("httpfoo"));
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn test_resolve_stores_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path(), "./assets/");

        let resolution = resolver.resolve(HERO, "1:2").unwrap();
        assert_eq!(resolution, Resolution::Local("./assets/node-1-2.jpg".into()));
        assert_eq!(
            std::fs::read(dir.path().join("node-1-2.jpg")).unwrap(),
            b"jpeg-bytes"
        );
        assert_eq!(
            resolver.manifest(),
            &[AssetEntry {
                url: HERO.into(),
                node_id: "1:2".into(),
                path: "./assets/node-1-2.jpg".into(),
            }]
        );
    }

    #[test]
    fn test_shared_url_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path(), "./assets");

        let first = resolver.resolve(HERO, "1:1").unwrap();
        let second = resolver.resolve(HERO, "9:9").unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), vec![HERO.to_string()]);
        assert!(!dir.path().join("node-9-9.jpg").exists());
        assert_eq!(resolver.manifest().len(), 1);
    }

    #[test]
    fn test_colliding_ids_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = "https://x/a.png";
        let b = "https://x/b.png";
        let fetcher = FakeFetcher::new(&[(a, "a-bytes"), (b, "b-bytes")]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path(), "./assets");

        let first = resolver.resolve(a, "1:2").unwrap();
        let second = resolver.resolve(b, "1;2").unwrap();
        assert_eq!(first, Resolution::Local("./assets/node-1-2.png".into()));
        assert_eq!(second, Resolution::Local("./assets/node-1-2-2.png".into()));
        assert_eq!(std::fs::read(dir.path().join("node-1-2.png")).unwrap(), b"a-bytes");
        assert_eq!(std::fs::read(dir.path().join("node-1-2-2.png")).unwrap(), b"b-bytes");

        let paths: Vec<&str> = resolver.manifest().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["./assets/node-1-2.png", "./assets/node-1-2-2.png"]);
    }

    #[test]
    fn test_failure_is_soft_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path(), "./assets");

        let first = resolver.resolve(MISSING, "1").unwrap();
        let second = resolver.resolve(MISSING, "2").unwrap();
        assert_eq!(
            first,
            Resolution::Unavailable("server responded with status 404".into())
        );
        assert_eq!(first, second);
        assert_eq!(fetcher.calls().len(), 1);
        assert!(resolver.manifest().is_empty());
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let missing_dir = dir.path().join("does-not-exist");
        let mut resolver = AssetResolver::new(&fetcher, &missing_dir, "./assets");

        let err = resolver.resolve(HERO, "1").unwrap_err();
        assert_eq!(err.path, missing_dir.join("node-1.jpg"));
    }

    // =========================================================================
    // Tree pass
    // =========================================================================

    #[test]
    fn test_resolve_document_rewrites_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path(), "./assets");

        let frame = Node::new("f", NodeKind::Frame).with_children(vec![
            image_node("a", HERO),
            Node::new("g", NodeKind::Group).with_children(vec![
                image_node("b", MISSING),
                image_node("c", HERO),
                image_node("d", MISSING),
            ]),
            image_node("e", "./assets/already-local.png"),
        ]);
        let mut doc = Document::new("Doc", vec![frame]);

        let failures = resolver.resolve_document(&mut doc).unwrap();

        let frame = &doc.root_frames[0];
        let group = &frame.children[1];
        assert_eq!(frame.children[0].image_ref.as_deref(), Some("./assets/node-a.jpg"));
        assert_eq!(group.children[1].image_ref.as_deref(), Some("./assets/node-a.jpg"));
        assert_eq!(group.children[0].image_ref, None);
        assert_eq!(group.children[2].image_ref, None);
        assert_eq!(
            frame.children[2].image_ref.as_deref(),
            Some("./assets/already-local.png")
        );

        assert_eq!(fetcher.calls(), vec![HERO.to_string(), MISSING.to_string()]);
        let failed: Vec<&str> = failures.iter().map(|f| f.node_id.as_str()).collect();
        assert_eq!(failed, vec!["b", "d"]);
        assert!(failures.iter().all(|f| f.url == MISSING));
    }

    #[test]
    fn test_resolve_node_stops_at_write_fault() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let mut resolver = AssetResolver::new(&fetcher, dir.path().join("gone"), "./assets");

        let mut group = Node::new("g", NodeKind::Group)
            .with_children(vec![image_node("a", HERO), image_node("b", MISSING)]);
        let mut failures = Vec::new();

        assert!(resolver.resolve_node(&mut group, &mut failures).is_err());
        assert_eq!(fetcher.calls(), vec![HERO.to_string()]);
        assert_eq!(group.children[0].image_ref.as_deref(), Some(HERO));
        assert_eq!(group.children[1].image_ref.as_deref(), Some(MISSING));
        assert!(failures.is_empty());
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(&[(HERO, "jpeg-bytes")]);
        let mut doc = Document::new("Doc", vec![image_node("a", HERO)]);

        AssetResolver::new(&fetcher, dir.path(), "./assets")
            .resolve_document(&mut doc)
            .unwrap();
        let resolved = doc.clone();
        let failures = AssetResolver::new(&fetcher, dir.path(), "./assets")
            .resolve_document(&mut doc)
            .unwrap();

        assert!(failures.is_empty());
        assert_eq!(doc, resolved);
        assert_eq!(fetcher.calls().len(), 1);
    }

    // =========================================================================
    // Atomic writes
    // =========================================================================

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

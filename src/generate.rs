//! HTML site generation.
//!
//! Stage 2 of the build pipeline. Takes the scan manifest, renders every page
//! against the partial registry, and writes the final static site.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── .sitefold-cache.json                  # Output cache (see `cache`)
//! ├── index.html
//! ├── about.html                            # from pages/about.md
//! ├── blog/2018/01/16/support-multiple-oses/
//! │   └── index.html
//! └── css/main.css                          # copied from static/
//! ```
//!
//! ## Failure Isolation
//!
//! Each page renders independently. A page that fails to render is reported in
//! the [`GenerateReport`] and nothing is written for it; every other page is
//! still written. Only I/O problems abort the stage.
//!
//! ## Parallel Rendering
//!
//! Pages are rendered in parallel with [rayon](https://docs.rs/rayon). Renders
//! share the registry by reference; writing happens afterwards on the calling
//! thread, in source-path order.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::partials::{PartialError, PartialRegistry};
use crate::render::{RenderError, render_page};
use crate::scan::{self, Manifest, ScanError};
use crate::types::{Page, SkippedPage};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ScanError),
    #[error("Partial error: {0}")]
    Partials(#[from] PartialError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Written,
    /// Output already matched; file left untouched.
    Unchanged,
    Failed(RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub source_path: String,
    pub output_path: String,
    pub title: String,
    pub status: PageStatus,
}

/// Result of the generate stage.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// One entry per manifest page, in source-path order.
    pub pages: Vec<PageOutcome>,
    /// Carried over from the scan manifest.
    pub skipped: Vec<SkippedPage>,
    /// Static files copied to the output directory.
    pub assets_copied: usize,
    /// Static files not copied because a page renders to the same path.
    pub assets_shadowed: Vec<String>,
    pub cache_stats: CacheStats,
}

impl GenerateReport {
    pub fn failures(&self) -> impl Iterator<Item = (&PageOutcome, &RenderError)> {
        self.pages.iter().filter_map(|p| match &p.status {
            PageStatus::Failed(e) => Some((p, e)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Read the manifest at `manifest_path` and generate the site.
pub fn generate(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateReport, GenerateError> {
    let manifest = scan::load_manifest(manifest_path)?;
    generate_manifest(&manifest, source_root, output_dir, use_cache)
}

/// Generate the site from an in-memory manifest.
pub fn generate_manifest(
    manifest: &Manifest,
    source_root: &Path,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateReport, GenerateError> {
    let config = &manifest.config;
    let registry = PartialRegistry::load(&source_root.join(&config.build.partials_dir), config)?;

    let rendered: Vec<(&Page, Result<String, RenderError>)> = manifest
        .pages
        .par_iter()
        .map(|page| (page, render_page(page, &registry)))
        .collect();

    fs::create_dir_all(output_dir)?;
    let mut cache_manifest = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };

    let mut report = GenerateReport {
        skipped: manifest.skipped.clone(),
        ..GenerateReport::default()
    };

    for (page, result) in rendered {
        let status = match result {
            Ok(html) => {
                let hash = cache::hash_bytes(html.as_bytes());
                if cache_manifest.is_current(&page.output_path, &hash, output_dir) {
                    report.cache_stats.hit();
                    PageStatus::Unchanged
                } else {
                    let dest = output_dir.join(&page.output_path);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&dest, html)?;
                    cache_manifest.insert(page.output_path.clone(), hash);
                    report.cache_stats.miss();
                    PageStatus::Written
                }
            }
            Err(error) => {
                // Output from an earlier successful build is now stale.
                let dest = output_dir.join(&page.output_path);
                if dest.is_file() {
                    fs::remove_file(&dest)?;
                }
                cache_manifest.remove(&page.output_path);
                PageStatus::Failed(error)
            }
        };
        report.pages.push(PageOutcome {
            source_path: page.source_path.clone(),
            output_path: page.output_path.clone(),
            title: page.meta.title.clone(),
            status,
        });
    }

    cache_manifest.save(output_dir)?;

    let page_outputs: HashSet<&str> = manifest
        .pages
        .iter()
        .map(|p| p.output_path.as_str())
        .collect();
    let static_dir = source_root.join(&config.build.static_dir);
    if static_dir.is_dir() {
        let (copied, shadowed) = copy_static(&static_dir, output_dir, &page_outputs)?;
        report.assets_copied = copied;
        report.assets_shadowed = shadowed;
    }

    Ok(report)
}

/// Copy every file under `static_dir` into `output_dir`, skipping paths a
/// page renders to. Returns (copied count, shadowed paths).
fn copy_static(
    static_dir: &Path,
    output_dir: &Path,
    page_outputs: &HashSet<&str>,
) -> Result<(usize, Vec<String>), GenerateError> {
    let mut copied = 0;
    let mut shadowed = Vec::new();
    for entry in WalkDir::new(static_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(static_dir).unwrap_or(entry.path());
        let rel_slash = scan::relative_slash_path(static_dir, entry.path());
        if page_outputs.contains(rel_slash.as_str()) {
            shadowed.push(rel_slash);
            continue;
        }
        let dest = output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied += 1;
    }
    Ok((copied, shadowed))
}

//! Content scanning and manifest generation.
//!
//! Stage 1 of the build pipeline. Walks the pages directory, loads every page
//! source, and produces a [`Manifest`] that the generate stage consumes.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                                  # Content root
//! ├── config.toml                           # Site configuration (optional)
//! ├── partials/                             # User partials (optional)
//! │   └── sidebar.html                      # → {% include sidebar %}
//! ├── pages/
//! │   ├── index.html                        # → dist/index.html
//! │   ├── about.md                          # → dist/about.html
//! │   └── blog/2018/01/16/support-multiple-oses/
//! │       └── index.html                    # → dist/blog/2018/.../index.html
//! └── static/                               # Copied to dist/ as-is
//!     └── css/main.css
//! ```
//!
//! ## Skipped Pages
//!
//! A page that can't be loaded doesn't fail the scan. It is recorded in
//! [`Manifest::skipped`] with the reason, alongside drafts and pages whose
//! output path is already taken, so one broken page never blocks the rest of
//! the site. The scan itself only fails on I/O and config errors.

use crate::config::{self, SiteConfig};
use crate::page;
use crate::template::Template;
use crate::types::{Page, SkipReason, SkippedPage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name of the manifest within the temp directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Pages directory not found: {0}")]
    MissingPagesDir(PathBuf),
}

/// Manifest output from the scan stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Loaded pages, sorted by source path.
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPage>,
    /// Partial names referenced by page bodies, sorted. Layout partials
    /// are not included.
    #[serde(default)]
    pub partials: Vec<String>,
    pub config: SiteConfig,
}

impl Manifest {
    /// Skipped pages that indicate broken content (not drafts).
    pub fn invalid_pages(&self) -> impl Iterator<Item = &SkippedPage> {
        self.skipped.iter().filter(|s| s.reason.is_error())
    }
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    let config = config::load_config(root)?;
    let pages_dir = root.join(&config.build.pages_dir);
    if !pages_dir.is_dir() {
        return Err(ScanError::MissingPagesDir(pages_dir));
    }

    let mut pages = Vec::new();
    let mut skipped = Vec::new();
    let mut outputs: HashMap<String, String> = HashMap::new();

    let walker = WalkDir::new(&pages_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(format) = page::source_format(entry.path()) else {
            continue;
        };
        let source_path = relative_slash_path(&pages_dir, entry.path());
        let source = match fs::read_to_string(entry.path()) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                skipped.push(SkippedPage {
                    source_path,
                    reason: SkipReason::Invalid("source is not valid UTF-8".to_string()),
                });
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let reason = match page::parse_page(&source_path, format, &source) {
            Ok(page) if page.meta.draft => SkipReason::Draft,
            Ok(page) => match outputs.get(&page.output_path) {
                Some(owner) => SkipReason::DuplicateOutput(owner.clone()),
                None => {
                    outputs.insert(page.output_path.clone(), source_path.clone());
                    pages.push(page);
                    continue;
                }
            },
            Err(e) => SkipReason::Invalid(e.to_string()),
        };
        skipped.push(SkippedPage {
            source_path,
            reason,
        });
    }

    pages.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    let partials = referenced_partials(&pages);

    Ok(Manifest {
        pages,
        skipped,
        partials,
        config,
    })
}

/// Write the manifest as pretty JSON into `temp_dir`, returning its path.
pub fn save_manifest(manifest: &Manifest, temp_dir: &Path) -> Result<PathBuf, ScanError> {
    fs::create_dir_all(temp_dir)?;
    let path = temp_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ScanError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Names from every parseable page body. Malformed bodies are left for the
/// generate and check stages to report.
fn referenced_partials(pages: &[Page]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for page in pages {
        if let Ok(template) = Template::parse(&page.body) {
            names.extend(template.references().into_iter().map(str::to_string));
        }
    }
    names.into_iter().collect()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// `path` relative to `base`, joined with `/` regardless of platform.
pub(crate) fn relative_slash_path(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

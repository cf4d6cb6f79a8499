//! Shared test utilities for the sitefold test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//!
//! let article = find_page(&manifest, "How to Support Multiple OSes with One Mac");
//! assert_eq!(article.meta.section.as_deref(), Some("blog"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::Manifest;
use crate::types::{Page, SkippedPage};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Manifest lookups (panic with the available names on miss)
// =========================================================================

/// Find a page by title. Panics if not found.
pub fn find_page<'a>(manifest: &'a Manifest, title: &str) -> &'a Page {
    manifest
        .pages
        .iter()
        .find(|p| p.meta.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = manifest.pages.iter().map(|p| p.meta.title.as_str()).collect();
            panic!("page '{title}' not found. Available: {titles:?}")
        })
}

/// Find a skipped page by source path. Panics if not found.
pub fn find_skipped<'a>(manifest: &'a Manifest, source_path: &str) -> &'a SkippedPage {
    manifest
        .skipped
        .iter()
        .find(|s| s.source_path == source_path)
        .unwrap_or_else(|| {
            let paths: Vec<&str> = manifest.skipped.iter().map(|s| s.source_path.as_str()).collect();
            panic!("skipped page '{source_path}' not found. Skipped: {paths:?}")
        })
}

/// Source paths of all loaded pages, in manifest order.
pub fn source_paths(manifest: &Manifest) -> Vec<&str> {
    manifest.pages.iter().map(|p| p.source_path.as_str()).collect()
}

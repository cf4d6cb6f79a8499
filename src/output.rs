//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every page is shown
//! by its positional index and title first, with the source path as indented
//! context. This makes the output readable as a content inventory while still
//! letting users trace a line back to a specific file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 How to Support Multiple OSes with One Mac (16 Jan 2018)
//!     Source: blog/2018/01/16/support-multiple-oses/index.html
//! 002 Blog (16 Jan 2018)
//!     Source: blog/index.md
//!
//! Partials
//!     footer, head, navbar, related
//!
//! Skipped
//!     drafts/unfinished.md: draft
//!
//! Config
//!     config.toml
//!     partials/
//!     static/
//! ```
//!
//! ## Generate
//!
//! ```text
//! 001 How to Support Multiple OSes with One Mac → blog/2018/.../index.html
//! 002 Blog → blog/index.html (unchanged)
//! 003 Broken → FAILED: Unknown partial: sidebar
//!
//! Generated 2 pages (1 unchanged, 1 written (2 total)), 1 failed
//! Copied 1 static file
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure,
//! apart from `format_scan_output` checking which optional inputs exist.

use crate::check::CheckReport;
use crate::generate::{GenerateReport, PageStatus};
use crate::scan::Manifest;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 About (16 Jan 2018)
/// 001 About
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!("{} {} ({})", format_index(index), title, d),
        _ => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing the discovered pages.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];

    for (i, page) in manifest.pages.iter().enumerate() {
        lines.push(entity_header(i + 1, &page.meta.title, Some(page.meta.date.as_str())));
        lines.push(format!("{}Source: {}", indent(1), page.source_path));
        if let Some(desc) = &page.meta.description {
            let truncated = truncate_desc(desc.trim(), 60);
            if !truncated.is_empty() {
                lines.push(format!("{}{}", indent(1), truncated));
            }
        }
    }

    if !manifest.partials.is_empty() {
        lines.push(String::new());
        lines.push("Partials".to_string());
        lines.push(format!("{}{}", indent(1), manifest.partials.join(", ")));
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &manifest.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                skipped.source_path,
                skipped.reason
            ));
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push(format!("{}config.toml", indent(1)));
    }
    let build = &manifest.config.build;
    for dir in [&build.partials_dir, &build.static_dir] {
        if source_root.join(dir).is_dir() {
            lines.push(format!("{}{}/", indent(1), dir));
        }
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: one line per page, then totals.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, page) in report.pages.iter().enumerate() {
        let header = entity_header(i + 1, &page.title, None);
        let line = match &page.status {
            PageStatus::Written => format!("{} \u{2192} {}", header, page.output_path),
            PageStatus::Unchanged => {
                format!("{} \u{2192} {} (unchanged)", header, page.output_path)
            }
            PageStatus::Failed(e) => format!("{} \u{2192} FAILED: {}", header, e),
        };
        lines.push(line);
        if matches!(page.status, PageStatus::Failed(_)) {
            lines.push(format!("{}Source: {}", indent(1), page.source_path));
        }
    }

    let invalid: Vec<_> = report.skipped.iter().filter(|s| s.reason.is_error()).collect();
    if !invalid.is_empty() {
        lines.push(String::new());
        lines.push("Not built".to_string());
        for skipped in invalid {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                skipped.source_path,
                skipped.reason
            ));
        }
    }

    if !report.assets_shadowed.is_empty() {
        lines.push(String::new());
        lines.push("Static files replaced by pages".to_string());
        for path in &report.assets_shadowed {
            lines.push(format!("{}{}", indent(1), path));
        }
    }

    let failed = report.failures().count();
    let built = report.pages.len() - failed;
    lines.push(String::new());
    let mut summary = format!("Generated {} ({})", plural(built, "page"), report.cache_stats);
    if failed > 0 {
        summary.push_str(&format!(", {} failed", failed));
    }
    lines.push(summary);
    lines.push(format!(
        "Copied {}",
        plural(report.assets_copied, "static file")
    ));

    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the result of `check`: every problem, then unused partials.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!("Checked {}", plural(report.pages_checked, "page"))];

    if !report.problems.is_empty() {
        lines.push(String::new());
        lines.push("Problems".to_string());
        for problem in &report.problems {
            lines.push(format!("{}{}", indent(1), problem));
        }
    }

    if !report.unused_partials.is_empty() {
        lines.push(String::new());
        lines.push("Unused partials".to_string());
        for name in &report.unused_partials {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    lines.push(String::new());
    if report.is_ok() {
        lines.push("No problems found".to_string());
    } else {
        lines.push(format!("Found {}", plural(report.problems.len(), "problem")));
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

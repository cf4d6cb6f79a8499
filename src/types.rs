//! Shared types serialized between the scan and generate stages.
//!
//! The build manifest is written as JSON after scanning and read back by the
//! generate stage, so these types must round-trip through serde unchanged.

use serde::{Deserialize, Serialize};

/// How the page body is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Html,
    Markdown,
}

/// How the rendered body becomes a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Body is wrapped in the standard article shell (head, navbar, header, footer).
    #[default]
    Article,
    /// Body is already a complete document; only its markers are substituted.
    Raw,
}

/// Page metadata from the `+++` front matter block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontMatter {
    pub title: String,
    /// Publication date, kept as written (e.g. `16 Jan 2018`).
    pub date: String,
    /// Falls back to `site.author` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Navbar section marked active. Falls back to `nav.default_section`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
}

/// A single page: metadata plus its unrendered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Path of the source file relative to the pages directory, `/`-separated.
    pub source_path: String,
    /// Path of the generated file relative to the output directory.
    pub output_path: String,
    pub format: SourceFormat,
    pub meta: FrontMatter,
    /// Body markup, markers still in place.
    pub body: String,
}

/// A page source the scan left out of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub source_path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `draft = true` in front matter.
    Draft,
    /// The source could not be loaded; holds the error message.
    Invalid(String),
    /// Another page already renders to the same output path.
    DuplicateOutput(String),
}

impl SkipReason {
    /// Whether this skip is a content problem rather than a choice.
    pub fn is_error(&self) -> bool {
        !matches!(self, SkipReason::Draft)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Draft => write!(f, "draft"),
            SkipReason::Invalid(message) => write!(f, "{message}"),
            SkipReason::DuplicateOutput(other) => write!(f, "output path already produced by {other}"),
        }
    }
}

//! Page source loading.
//!
//! A page source is a `+++`-delimited TOML front matter block followed by the
//! body:
//!
//! ```text
//! +++
//! title = "How to Support Multiple OSes with One Mac"
//! date = "16 Jan 2018"
//! section = "blog"
//! +++
//! <p>Making operating-system specific packages of your project ...</p>
//! ```
//!
//! `.html`/`.htm` bodies are HTML; `.md`/`.markdown` bodies are Markdown.
//! Either may contain `{% include ... %}` markers. Every page renders to a
//! `.html` file at the same relative path.

use crate::render::RenderError;
use crate::types::{FrontMatter, Page, SourceFormat};
use std::path::Path;
use thiserror::Error;

const DELIMITER: &str = "+++";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Missing front matter: page must start with a `+++` line")]
    MissingFrontMatter,
    #[error(transparent)]
    Malformed(#[from] RenderError),
    #[error("Invalid front matter: {0}")]
    FrontMatter(#[from] toml::de::Error),
}

/// Source format implied by a file's extension, or `None` if it isn't a page.
pub fn source_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => Some(SourceFormat::Html),
        "md" | "markdown" => Some(SourceFormat::Markdown),
        _ => None,
    }
}

/// Output path for a `/`-separated source path: the extension becomes `.html`.
pub fn output_path_for(source_path: &str) -> String {
    let (dir, file) = match source_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, source_path),
    };
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
    match dir {
        Some(dir) => format!("{dir}/{stem}.html"),
        None => format!("{stem}.html"),
    }
}

/// Parse a page source into a [`Page`].
pub fn parse_page(
    source_path: &str,
    format: SourceFormat,
    source: &str,
) -> Result<Page, PageError> {
    let (front_matter, body) = split_front_matter(source)?;
    let meta: FrontMatter = toml::from_str(front_matter)?;
    Ok(Page {
        source_path: source_path.to_string(),
        output_path: output_path_for(source_path),
        format,
        meta,
        body: body.to_string(),
    })
}

/// Split `source` into (front matter, body).
fn split_front_matter(source: &str) -> Result<(&str, &str), PageError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');
    let first = lines.next().unwrap_or_default();
    if first.trim_end() != DELIMITER {
        return Err(PageError::MissingFrontMatter);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Ok((&source[start..offset], &source[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(RenderError::MalformedContent {
        line: 1,
        message: "front matter opened with `+++` is never closed".to_string(),
    }
    .into())
}

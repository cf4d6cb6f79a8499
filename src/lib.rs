//! # Sitefold
//!
//! A static site generator for hand-written HTML and Markdown pages that share
//! a handful of common fragments. Instead of a server pulling a header and a
//! navbar into every page on each request, pages carry include markers that
//! are resolved once at build time:
//!
//! ```text
//! {% include head %}
//! {% include navbar "blog" %}
//! <article>…</article>
//! {% include footer %}
//! ```
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/  →  manifest.json    (page sources → structured data)
//! 2. Generate  manifest  →  dist/            (rendered HTML + static files)
//! ```
//!
//! The manifest is human-readable JSON, so a failed build can be debugged by
//! reading what the scan stage saw. `check` runs the scan and validates every
//! marker without writing anything, and `serve` previews the output directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the pages directory, parses front matter, produces the manifest |
//! | [`generate`] | Stage 2: renders every page in parallel and writes the site |
//! | [`render`] | Marker substitution and the article document shell |
//! | [`template`] | Parser for `{% include NAME ARG... %}` markers |
//! | [`partials`] | The immutable partial registry: built-ins plus user fragments |
//! | [`page`] | Page source loading: front matter, source format, output path |
//! | [`check`] | Whole-site validation of partial references |
//! | [`cache`] | Content-hash output cache so unchanged pages aren't rewritten |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Types serialized into the manifest (`Page`, `FrontMatter`) |
//! | [`serve`] | Static HTTP server for previewing the output |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## An Explicit Registry
//!
//! Partials live in a [`partials::PartialRegistry`] that is built once and
//! then only read. Rendering takes the registry by reference, which keeps
//! renders pure and lets the generate stage share one registry across rayon
//! worker threads with no locking.
//!
//! ## Maud for Built-ins
//!
//! The built-in partials and the article shell are written with
//! [Maud](https://maud.lambda.xyz/). Config values interpolated into them are
//! escaped automatically; user fragments are trusted HTML and inserted as-is.
//!
//! ## One Broken Page Never Blocks the Site
//!
//! A page that fails to load or render is reported with its reason and every
//! other page is still written. The process exits non-zero so CI notices.

pub mod cache;
pub mod check;
pub mod config;
pub mod generate;
pub mod output;
pub mod page;
pub mod partials;
pub mod render;
pub mod scan;
pub mod serve;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

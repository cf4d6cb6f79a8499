//! The partial registry.
//!
//! A [`PartialRegistry`] maps partial names to fragments. It is built once per
//! build, never mutated afterwards, and shared by reference across every page
//! render, so parallel renders need no locking.
//!
//! ## Built-in Partials
//!
//! | Name | Arguments | Output |
//! |------|-----------|--------|
//! | `head` | none | charset, viewport, author meta, favicon, stylesheet links |
//! | `navbar` | active section | brand link plus one entry per `[[nav.sections]]` |
//! | `footer` | none | copyright line from `[site]` |
//!
//! ## User Partials
//!
//! Every `*.html` file in the partials directory is registered under its file
//! stem (`partials/sidebar.html` → `sidebar`). A user file with a built-in's
//! name replaces the built-in. User fragments take no arguments and are
//! inserted as-is: markers inside a fragment are not expanded.

use crate::config::{HeadConfig, NavConfig, SiteConfig, SiteInfo};
use crate::render::RenderError;
use crate::template::Include;
use maud::{Markup, PreEscaped, html};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Partial {0} is not valid UTF-8")]
    Encoding(PathBuf),
}

/// A registered partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partial {
    /// Literal markup from a user file.
    Fragment(String),
    Head,
    Navbar,
    Footer,
}

impl Partial {
    /// Number of arguments the partial takes.
    pub fn arity(&self) -> usize {
        match self {
            Partial::Navbar => 1,
            Partial::Fragment(_) | Partial::Head | Partial::Footer => 0,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Partial::Fragment(_))
    }
}

/// Immutable name → partial map plus the config the built-ins render from.
#[derive(Debug, Clone)]
pub struct PartialRegistry {
    partials: BTreeMap<String, Partial>,
    config: SiteConfig,
}

impl PartialRegistry {
    /// Registry with only the built-in partials.
    pub fn builtin(config: &SiteConfig) -> Self {
        let partials = [
            ("head", Partial::Head),
            ("navbar", Partial::Navbar),
            ("footer", Partial::Footer),
        ]
        .into_iter()
        .map(|(name, partial)| (name.to_string(), partial))
        .collect();
        Self {
            partials,
            config: config.clone(),
        }
    }

    /// Built-ins plus every `*.html` file in `dir`. A missing directory
    /// yields just the built-ins.
    pub fn load(dir: &Path, config: &SiteConfig) -> Result<Self, PartialError> {
        let mut partials = Self::builtin(config).partials;
        if dir.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .map(|e| e.eq_ignore_ascii_case("html"))
                            .unwrap_or(false)
                })
                .collect();
            files.sort();

            for path in files {
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    return Err(PartialError::Encoding(path));
                };
                let content = fs::read_to_string(&path)?;
                partials.insert(
                    name.to_string(),
                    Partial::Fragment(content.trim_end_matches(['\r', '\n']).to_string()),
                );
            }
        }
        Ok(Self {
            partials,
            config: config.clone(),
        })
    }

    /// Builder-style registration, mainly for tests and embedding.
    pub fn with_partial(mut self, name: &str, partial: Partial) -> Self {
        self.partials.insert(name.to_string(), partial);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn get(&self, name: &str) -> Option<&Partial> {
        self.partials.get(name)
    }

    /// Registered partials in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Partial)> {
        self.partials.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Resolve an include without rendering it.
    pub fn check(&self, include: &Include) -> Result<&Partial, RenderError> {
        let partial = self
            .partials
            .get(&include.name)
            .ok_or_else(|| RenderError::UnknownPartial(include.name.clone()))?;
        let expected = partial.arity();
        if include.args.len() != expected {
            return Err(RenderError::InvalidArguments {
                partial: include.name.clone(),
                expected,
                found: include.args.len(),
            });
        }
        Ok(partial)
    }

    /// Render the partial an include names.
    pub fn render(&self, include: &Include) -> Result<Markup, RenderError> {
        Ok(match self.check(include)? {
            Partial::Fragment(markup) => PreEscaped(markup.clone()),
            Partial::Head => render_head(&self.config.site, &self.config.head),
            Partial::Navbar => render_navbar(&self.config.site, &self.config.nav, &include.args[0]),
            Partial::Footer => render_footer(&self.config.site),
        })
    }
}

// ============================================================================
// Built-in partials
// ============================================================================

fn render_head(site: &SiteInfo, head: &HeadConfig) -> Markup {
    html! {
        meta charset="utf-8";
        meta name="viewport" content="width=device-width, initial-scale=1";
        meta name="author" content=(site.author);
        @if let Some(icon) = &head.favicon {
            link rel="icon" href=(icon);
        }
        @for href in &head.stylesheets {
            link rel="stylesheet" href=(href);
        }
    }
}

/// Renders the navigation bar with `active` highlighted.
///
/// An `active` name that matches no section renders with nothing highlighted.
fn render_navbar(site: &SiteInfo, nav: &NavConfig, active: &str) -> Markup {
    html! {
        nav.navbar {
            a.navbar-brand href=(nav.home) { (site.title) }
            ul.navbar-nav {
                @for section in &nav.sections {
                    @let is_active = section.name == active;
                    li.nav-item.active[is_active] {
                        a.nav-link href=(section.href) aria-current=[is_active.then_some("page")] {
                            (section.title)
                        }
                    }
                }
            }
        }
    }
}

fn render_footer(site: &SiteInfo) -> Markup {
    html! {
        footer.small {
            p {
                "Copyright © "
                @if let Some(year) = site.copyright_year {
                    (year) " "
                }
                (site.author)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> PartialRegistry {
        PartialRegistry::builtin(&SiteConfig::default())
    }

    /// The `<li>` element containing `label`.
    fn nav_item<'a>(html: &'a str, label: &str) -> &'a str {
        let label_at = html.find(label).expect("label in navbar");
        let start = html[..label_at].rfind("<li").unwrap();
        let end = label_at + html[label_at..].find("</li>").unwrap();
        &html[start..end]
    }

    #[test]
    fn builtin_registry_has_three_partials() {
        let reg = registry();
        let names: Vec<&str> = reg.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["footer", "head", "navbar"]);
    }

    #[test]
    fn unknown_partial_is_reported_by_name() {
        let err = registry().render(&Include::new("sidebar", &[])).unwrap_err();
        assert_eq!(err, RenderError::UnknownPartial("sidebar".into()));
    }

    #[test]
    fn navbar_marks_active_section() {
        let html = registry()
            .render(&Include::new("navbar", &["blog"]))
            .unwrap()
            .into_string();
        let blog = nav_item(&html, "Blog");
        assert!(blog.contains(r#"class="nav-item active""#));
        assert!(blog.contains(r#"aria-current="page""#));
        assert!(blog.contains(r#"href="/blog/""#));
        let home = nav_item(&html, "Home");
        assert!(!home.contains("active"));
        assert!(!home.contains("aria-current"));
    }

    #[test]
    fn navbar_with_unknown_section_highlights_nothing() {
        let html = registry()
            .render(&Include::new("navbar", &["projects"]))
            .unwrap()
            .into_string();
        assert!(!html.contains("active"));
        assert!(html.contains("Home"));
    }

    #[test]
    fn navbar_requires_exactly_one_argument() {
        let err = registry().render(&Include::new("navbar", &[])).unwrap_err();
        assert_eq!(
            err,
            RenderError::InvalidArguments {
                partial: "navbar".into(),
                expected: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn head_takes_no_arguments() {
        let err = registry().render(&Include::new("head", &["x"])).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArguments { expected: 0, found: 1, .. }));
    }

    #[test]
    fn head_links_stylesheets_in_order() {
        let mut config = SiteConfig::default();
        config.head.stylesheets = vec!["/a.css".into(), "/b.css".into()];
        config.head.favicon = Some("/favicon.ico".into());
        let html = PartialRegistry::builtin(&config)
            .render(&Include::new("head", &[]))
            .unwrap()
            .into_string();
        let a = html.find("/a.css").unwrap();
        let b = html.find("/b.css").unwrap();
        assert!(a < b);
        assert!(html.contains(r#"<meta charset="utf-8">"#));
        assert!(html.contains(r#"href="/favicon.ico""#));
    }

    #[test]
    fn footer_includes_year_when_configured() {
        let mut config = SiteConfig::default();
        config.site.author = "C. Dylan Shearer".into();
        config.site.copyright_year = Some(2018);
        let html = PartialRegistry::builtin(&config)
            .render(&Include::new("footer", &[]))
            .unwrap()
            .into_string();
        assert!(html.contains("Copyright © 2018 C. Dylan Shearer"));
    }

    #[test]
    fn footer_without_year() {
        let html = registry()
            .render(&Include::new("footer", &[]))
            .unwrap()
            .into_string();
        assert!(html.contains("Copyright © Anonymous"));
    }

    #[test]
    fn builtin_output_escapes_config_text() {
        let mut config = SiteConfig::default();
        config.site.title = "<Mine>".into();
        let html = PartialRegistry::builtin(&config)
            .render(&Include::new("navbar", &["home"]))
            .unwrap()
            .into_string();
        assert!(html.contains("&lt;Mine&gt;"));
    }

    #[test]
    fn load_without_directory_is_builtin_only() {
        let tmp = TempDir::new().unwrap();
        let reg = PartialRegistry::load(&tmp.path().join("partials"), &SiteConfig::default())
            .unwrap();
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn load_registers_fragments_by_stem() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("sidebar.html"), "<aside>links</aside>\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        let reg = PartialRegistry::load(tmp.path(), &SiteConfig::default()).unwrap();

        assert_eq!(reg.len(), 4);
        assert!(reg.get("notes").is_none());
        let html = reg.render(&Include::new("sidebar", &[])).unwrap().into_string();
        assert_eq!(html, "<aside>links</aside>");
    }

    #[test]
    fn user_fragment_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("footer.html"), "<footer>custom</footer>").unwrap();
        let reg = PartialRegistry::load(tmp.path(), &SiteConfig::default()).unwrap();

        let footer = reg.get("footer").unwrap();
        assert!(!footer.is_builtin());
        let html = reg.render(&Include::new("footer", &[])).unwrap().into_string();
        assert_eq!(html, "<footer>custom</footer>");
    }

    #[test]
    fn fragment_markers_are_not_expanded() {
        let reg = registry().with_partial(
            "wrapper",
            Partial::Fragment("<div>{% include footer %}</div>".into()),
        );
        let html = reg.render(&Include::new("wrapper", &[])).unwrap().into_string();
        assert_eq!(html, "<div>{% include footer %}</div>");
    }
}

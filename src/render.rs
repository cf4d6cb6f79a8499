//! The page renderer.
//!
//! Turns a [`Page`] into a complete HTML document by replacing each
//! `{% include ... %}` marker with the partial it names. Everything outside a
//! marker passes through untouched. Rendering is pure: the same page and the
//! same registry always produce the same bytes.
//!
//! Substitution is a single, non-recursive pass. Markers are always parsed
//! from the body as written, Markdown included, so diagnostics point at source
//! lines. Article pages are then wrapped in the document shell, whose own
//! `head`, `navbar` and `footer` come from the same registry and fail the
//! same way as markers in the body.
//!
//! ## Markdown bodies
//!
//! Each marker is swapped for a placeholder, the Markdown is converted, and
//! the rendered partials are put back. A marker alone in its own paragraph
//! replaces the whole `<p>`, so block partials such as the navbar are not
//! nested inside one.

use crate::partials::PartialRegistry;
use crate::template::{Include, Segment, Template};
use crate::types::{Layout, Page, SourceFormat};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unknown partial: {0}")]
    UnknownPartial(String),
    /// `line` is 1-based and counted from the start of the page body.
    #[error("Malformed content at line {line}: {message}")]
    MalformedContent { line: usize, message: String },
    #[error("Partial '{partial}' takes {expected} argument(s), got {found}")]
    InvalidArguments {
        partial: String,
        expected: usize,
        found: usize,
    },
}

/// Render a page to a complete HTML document.
pub fn render_page(page: &Page, registry: &PartialRegistry) -> Result<String, RenderError> {
    let body = render_body(page, registry)?;
    match page.meta.layout {
        Layout::Raw => Ok(body),
        Layout::Article => Ok(article_document(page, &body, registry)?.into_string()),
    }
}

/// Replace every marker in `source` with its rendered partial.
pub fn substitute(source: &str, registry: &PartialRegistry) -> Result<String, RenderError> {
    let template = Template::parse(source)?;
    let mut out = String::with_capacity(source.len());
    for segment in template.segments() {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Include(include) => out.push_str(&registry.render(include)?.into_string()),
        }
    }
    Ok(out)
}

/// The page body as HTML with every marker replaced.
pub fn render_body(page: &Page, registry: &PartialRegistry) -> Result<String, RenderError> {
    match page.format {
        SourceFormat::Html => substitute(&page.body, registry),
        SourceFormat::Markdown => substitute_markdown(&page.body, registry),
    }
}

fn substitute_markdown(source: &str, registry: &PartialRegistry) -> Result<String, RenderError> {
    let template = Template::parse(source)?;
    let mut marked = String::with_capacity(source.len());
    let mut partials = Vec::new();
    for segment in template.segments() {
        match segment {
            Segment::Text(text) => marked.push_str(text),
            Segment::Include(include) => {
                marked.push_str(&placeholder(partials.len()));
                partials.push(registry.render(include)?.into_string());
            }
        }
    }

    let mut html = markdown_to_html(&marked);
    for (index, partial) in partials.iter().enumerate() {
        let key = placeholder(index);
        html = html
            .replace(&format!("<p>{key}</p>"), partial)
            .replace(&key, partial);
    }
    Ok(html)
}

/// Private-use code points, which pulldown-cmark passes through untouched.
fn placeholder(index: usize) -> String {
    format!("\u{E000}{index}\u{E001}")
}

/// Partials the layout itself pulls in, with the arguments it passes.
pub fn shell_includes(page: &Page, registry: &PartialRegistry) -> Vec<Include> {
    match page.meta.layout {
        Layout::Raw => Vec::new(),
        Layout::Article => article_shell(page, registry).to_vec(),
    }
}

/// `head`, `navbar` and `footer` for the article layout. A navbar replaced by
/// a user fragment is included without the section argument.
fn article_shell(page: &Page, registry: &PartialRegistry) -> [Include; 3] {
    let section = page
        .meta
        .section
        .as_deref()
        .or(registry.config().nav.default_section.as_deref())
        .unwrap_or("");
    let navbar = match registry.get("navbar") {
        Some(partial) if partial.arity() == 0 => Include::new("navbar", &[]),
        _ => Include::new("navbar", &[section]),
    };
    [Include::new("head", &[]), navbar, Include::new("footer", &[])]
}

fn markdown_to_html(markdown: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_HEADING_ATTRIBUTES;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

fn article_document(
    page: &Page,
    body: &str,
    registry: &PartialRegistry,
) -> Result<Markup, RenderError> {
    let config = registry.config();
    let [head, navbar, footer] = article_shell(page, registry).map(|i| registry.render(&i));
    let (head, navbar, footer) = (head?, navbar?, footer?);

    let author = page.meta.author.as_deref().unwrap_or(&config.site.author);
    let description = page
        .meta
        .description
        .as_deref()
        .or(config.site.description.as_deref());

    Ok(html! {
        (DOCTYPE)
        html lang=(config.site.language) {
            head {
                (head)
                @if let Some(desc) = description {
                    meta name="description" content=(desc);
                }
                title { (page.meta.title) }
            }
            body {
                (navbar)
                main.container {
                    article {
                        header {
                            h1 { (page.meta.title) }
                            p {
                                small { (author) " | " (page.meta.date) }
                            }
                        }
                        (PreEscaped(body))
                    }
                }
                (footer)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::partials::Partial;
    use crate::types::FrontMatter;

    fn page(body: &str) -> Page {
        Page {
            source_path: "blog/2018/01/16/support-multiple-oses/index.html".into(),
            output_path: "blog/2018/01/16/support-multiple-oses/index.html".into(),
            format: SourceFormat::Html,
            meta: FrontMatter {
                title: "How to Support Multiple OSes with One Mac".into(),
                date: "16 Jan 2018".into(),
                author: Some("C. Dylan Shearer".into()),
                section: Some("blog".into()),
                description: None,
                layout: Layout::Article,
                draft: false,
            },
            body: body.into(),
        }
    }

    fn registry() -> PartialRegistry {
        PartialRegistry::builtin(&SiteConfig::default())
    }

    #[test]
    fn article_renders_title_and_active_navbar() {
        let html = render_page(&page("<p>Making packages is a pain.</p>"), &registry()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>How to Support Multiple OSes with One Mac</title>"));
        assert!(html.contains("<h1>How to Support Multiple OSes with One Mac</h1>"));
        assert!(html.contains("<small>C. Dylan Shearer | 16 Jan 2018</small>"));
        assert!(html.contains(r#"class="nav-item active""#));
        assert!(html.contains("<p>Making packages is a pain.</p>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let p = page("<p>a</p>{% include footer %}");
        let reg = registry();
        assert_eq!(render_page(&p, &reg).unwrap(), render_page(&p, &reg).unwrap());
    }

    #[test]
    fn unknown_partial_in_body_fails() {
        let err = render_page(&page("<p>x</p>{% include sidebar %}"), &registry()).unwrap_err();
        assert_eq!(err, RenderError::UnknownPartial("sidebar".into()));
    }

    #[test]
    fn navbar_fragment_is_used_without_section() {
        let reg = registry().with_partial("navbar", Partial::Fragment("<nav>static</nav>".into()));
        let html = render_page(&page("<p>x</p>"), &reg).unwrap();
        assert!(html.contains("<body><nav>static</nav><main"));
    }

    #[test]
    fn body_navbar_with_section_fails_for_fragment_navbar() {
        let reg = registry().with_partial("navbar", Partial::Fragment("<nav>static</nav>".into()));
        let err = render_page(&page("{% include navbar \"blog\" %}"), &reg).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArguments { ref partial, .. } if partial == "navbar"));
    }

    #[test]
    fn malformed_body_fails() {
        let err = render_page(&page("<p>\n{% include head"), &registry()).unwrap_err();
        assert!(matches!(err, RenderError::MalformedContent { line: 2, .. }));
    }

    #[test]
    fn raw_layout_only_substitutes_markers() {
        let mut p = page(
            "<!DOCTYPE html>\n<html><head>{% include head %}<title>T</title></head>\
             <body>{% include navbar \"blog\" %}</body></html>",
        );
        p.meta.layout = Layout::Raw;
        let html = render_page(&p, &registry()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">"));
        assert!(html.contains("<title>T</title>"));
        assert!(!html.contains("{%"));
        assert!(!html.contains("<main"));
    }

    #[test]
    fn text_outside_markers_passes_through_verbatim() {
        let source = "<pre><code>cd \"${SRC_ROOT}\" &amp;&amp; make</code></pre>\n";
        assert_eq!(substitute(source, &registry()).unwrap(), source);
    }

    #[test]
    fn section_falls_back_to_default() {
        let mut p = page("");
        p.meta.section = None;
        let html = render_page(&p, &registry()).unwrap();
        let active = html.find(r#"class="nav-item active""#).unwrap();
        let active_item = &html[active..active + html[active..].find("</li>").unwrap()];
        assert!(active_item.contains(r#"href="/""#));
        assert!(active_item.contains(">Home<"));
    }

    #[test]
    fn author_falls_back_to_site_author() {
        let mut p = page("");
        p.meta.author = None;
        let html = render_page(&p, &registry()).unwrap();
        assert!(html.contains("<small>Anonymous | 16 Jan 2018</small>"));
    }

    #[test]
    fn page_description_overrides_site_description() {
        let mut config = SiteConfig::default();
        config.site.description = Some("site".into());
        let reg = PartialRegistry::builtin(&config);

        let html = render_page(&page(""), &reg).unwrap();
        assert!(html.contains(r#"<meta name="description" content="site">"#));

        let mut p = page("");
        p.meta.description = Some("page".into());
        let html = render_page(&p, &reg).unwrap();
        assert!(html.contains(r#"<meta name="description" content="page">"#));
        assert!(!html.contains(r#"content="site""#));
    }

    fn markdown(body: &str) -> Page {
        let mut p = page(body);
        p.format = SourceFormat::Markdown;
        p.meta.layout = Layout::Raw;
        p
    }

    #[test]
    fn markdown_body_is_converted_and_substituted() {
        let p = markdown("## Prereqs\n\n- GNU Make\n- Vagrant\n\n{% include footer %}\n");
        let html = render_page(&p, &registry()).unwrap();
        assert!(html.contains("<h2>Prereqs</h2>"));
        assert!(html.contains("<li>GNU Make</li>"));
        assert!(html.contains("<footer class=\"small\">"));
    }

    #[test]
    fn markdown_block_partial_is_not_wrapped_in_paragraph() {
        let p = markdown("Intro\n\n{% include navbar \"blog\" %}\n\nMore\n");
        let html = render_page(&p, &registry()).unwrap();
        assert!(html.starts_with("<p>Intro</p>\n<nav class=\"navbar\">"));
        assert!(!html.contains("<p><nav"));
        assert!(html.contains(r#"class="nav-item active""#));
        assert!(html.ends_with("<p>More</p>\n"));
    }

    #[test]
    fn markdown_inline_partial_stays_in_its_paragraph() {
        let reg = registry().with_partial("name", Partial::Fragment("<b>Dylan</b>".into()));
        let html = render_page(&markdown("Written by {% include name %} in 2018.\n"), &reg).unwrap();
        assert_eq!(html, "<p>Written by <b>Dylan</b> in 2018.</p>\n");
    }

    #[test]
    fn markdown_malformed_line_counts_source_lines() {
        let body = "# Title\n\nOne.\n\n- a\n- b\n\n{% include footer\n";
        let err = render_page(&markdown(body), &registry()).unwrap_err();
        assert!(matches!(err, RenderError::MalformedContent { line: 8, .. }));
    }

    #[test]
    fn escaped_marker_renders_literally() {
        let html = substitute("<code>{%% include head %}</code>", &registry()).unwrap();
        assert_eq!(html, "<code>{% include head %}</code>");
    }

    #[test]
    fn shell_includes_empty_for_raw_pages() {
        let mut p = page("");
        p.meta.layout = Layout::Raw;
        assert!(shell_includes(&p, &registry()).is_empty());
    }
}

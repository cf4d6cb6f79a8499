//! Include-marker parsing.
//!
//! Page markup is plain HTML with partial inclusions written as
//!
//! ```text
//! {% include head %}
//! {% include navbar "blog" %}
//! ```
//!
//! The first word is the directive (only `include` exists), the second is the
//! partial name, and anything after it is passed to the partial as arguments.
//! Arguments are bare words or double-quoted strings; quotes have no escapes.
//!
//! A literal `{%` is written `{%%`, which renders as `{%` and opens no marker.
//! This applies inside Markdown code spans too.
//!
//! Parsing is a single left-to-right pass that splits the source into text
//! and include segments. Text segments borrow from the source, so rendering
//! passes everything outside a marker through byte for byte.

use crate::render::RenderError;

const OPEN: &str = "{%";
const CLOSE: &str = "%}";
const ESCAPE: &str = "{%%";

/// A parsed `{% include ... %}` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub name: String,
    pub args: Vec<String>,
    /// 1-based line of the opening `{%`.
    pub line: usize,
}

impl Include {
    /// An include with no source position, for markers the renderer adds itself.
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            line: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Include(Include),
}

/// Page markup split into text and include segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    pub fn parse(source: &'a str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut line = 1;

        while let Some(start) = rest.find(OPEN) {
            if rest[start..].starts_with(ESCAPE) {
                let text = &rest[..start + OPEN.len()];
                segments.push(Segment::Text(text));
                line += count_newlines(text);
                rest = &rest[start + ESCAPE.len()..];
                continue;
            }
            let text = &rest[..start];
            if !text.is_empty() {
                segments.push(Segment::Text(text));
            }
            line += count_newlines(text);

            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                return Err(malformed(line, "unclosed `{%` marker"));
            };
            let inner = &after_open[..end];
            if inner.contains(OPEN) {
                return Err(malformed(line, "`{%` inside another marker"));
            }
            segments.push(Segment::Include(parse_marker(inner, line)?));

            line += count_newlines(inner);
            rest = &after_open[end + CLOSE.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// All include markers, in source order.
    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Include(include) => Some(include),
            Segment::Text(_) => None,
        })
    }

    /// Referenced partial names, deduplicated, in first-use order.
    pub fn references(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for include in self.includes() {
            if !names.contains(&include.name.as_str()) {
                names.push(&include.name);
            }
        }
        names
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

fn malformed(line: usize, message: &str) -> RenderError {
    RenderError::MalformedContent {
        line,
        message: message.to_string(),
    }
}

fn parse_marker(inner: &str, line: usize) -> Result<Include, RenderError> {
    let mut tokens = tokenize(inner, line)?.into_iter();
    match tokens.next().as_deref() {
        None => Err(malformed(line, "empty marker")),
        Some("include") => {
            let name = tokens
                .next()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| malformed(line, "`include` needs a partial name"))?;
            Ok(Include {
                name,
                args: tokens.collect(),
                line,
            })
        }
        Some(other) => Err(malformed(line, &format!("unknown directive `{other}`"))),
    }
}

fn tokenize(inner: &str, line: usize) -> Result<Vec<String>, RenderError> {
    let mut tokens = Vec::new();
    let mut chars = inner.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let closing = chars.by_ref().find(|&(_, c)| c == '"');
            let Some((end, _)) = closing else {
                return Err(malformed(line, "unterminated quoted argument"));
            };
            tokens.push(inner[i + 1..end].to_string());
        } else {
            let mut end = inner.len();
            while let Some(&(j, c)) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    end = j;
                    break;
                }
                chars.next();
            }
            tokens.push(inner[i..end].to_string());
        }
    }
    Ok(tokens)
}

//! HTML preview rendering.
//!
//! Renders the shared block sequence to an HTML fragment suitable for
//! injecting into the page. Block elements are concatenated without
//! separators; consecutive list items share one `<ul>`.

use crate::markdown::{Block, HeadingLevel, Inline, escape_html, parse};

/// Render blocks to an HTML fragment.
///
/// # Examples
///
/// ```
/// use gijiroku::markdown::parse;
/// use gijiroku::preview::render;
///
/// let html = render(&parse("- a\n- b\n\nc"));
/// assert_eq!(html, "<ul><li>a</li><li>b</li></ul><br><p>c</p>");
/// ```
pub fn render(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut in_list = false;

    for block in blocks {
        if in_list && !block.is_list_item() {
            out.push_str("</ul>");
            in_list = false;
        }

        match block {
            Block::Heading { level, .. } => {
                let tag = match level {
                    HeadingLevel::H2 => "h2",
                    HeadingLevel::H3 => "h3",
                };
                write_element(&mut out, tag, &block.inlines());
            }
            Block::ListItem { .. } => {
                if !in_list {
                    out.push_str("<ul>");
                    in_list = true;
                }
                write_element(&mut out, "li", &block.inlines());
            }
            Block::Blank => out.push_str("<br>"),
            Block::Paragraph { .. } => write_element(&mut out, "p", &block.inlines()),
        }
    }

    if in_list {
        out.push_str("</ul>");
    }

    out
}

/// Parse and render in one step.
pub fn render_markdown(markdown: &str) -> String {
    render(&parse(markdown))
}

fn write_element(out: &mut String, tag: &str, runs: &[Inline]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_inlines(out, runs);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_inlines(out: &mut String, runs: &[Inline]) {
    for run in runs {
        match run {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Bold(children) => write_element(out, "strong", children),
            Inline::Italic(children) => write_element(out, "em", children),
            Inline::Code(children) => write_element(out, "code", children),
            Inline::Link { href, children } => {
                out.push_str("<a href=\"");
                out.push_str(&escape_html(href));
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                write_inlines(out, children);
                out.push_str("</a>");
            }
        }
    }
}

/// Memoizing preview: re-rendering unchanged source returns the cached fragment.
#[derive(Debug, Default)]
pub struct Preview {
    last: Option<(String, String)>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `markdown`, reusing the previous fragment when the source is unchanged.
    pub fn render(&mut self, markdown: &str) -> &str {
        let stale = !matches!(&self.last, Some((source, _)) if source == markdown);
        if stale {
            tracing::debug!(len = markdown.len(), "re-rendering preview");
            self.last = Some((markdown.to_string(), render_markdown(markdown)));
        }
        self.last.as_ref().map(|(_, html)| html.as_str()).unwrap_or_default()
    }
}

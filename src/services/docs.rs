// SPDX-License-Identifier: MIT

//! Documentation rendering.
//!
//! The documentation page is a static markdown file rendered to HTML once at
//! startup. Headings h1-h3 get slugified anchor ids and feed the table of
//! contents shown next to the content.

use anyhow::Context;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::path::Path;

/// One table-of-contents entry (headings h1-h3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Pre-rendered documentation content.
#[derive(Debug, Clone, Default)]
pub struct DocsService {
    html: String,
    toc: Vec<TocEntry>,
}

impl DocsService {
    /// Load and render a markdown file.
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let markdown = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read documentation file {}", path.display()))?;
        Ok(Self::from_markdown(&markdown))
    }

    /// Render markdown to HTML, injecting heading anchors and collecting the
    /// table of contents.
    pub fn from_markdown(markdown: &str) -> Self {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let mut parser = Parser::new_ext(markdown, options);

        let mut events = Vec::new();
        let mut toc = Vec::new();

        while let Some(event) = parser.next() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    // Buffer the heading body to derive its anchor id.
                    let mut inner = Vec::new();
                    let mut text = String::new();
                    for event in parser.by_ref() {
                        match event {
                            Event::End(TagEnd::Heading(_)) => break,
                            Event::Text(t) => {
                                text.push_str(&t);
                                inner.push(Event::Text(t));
                            }
                            Event::Code(t) => {
                                text.push_str(&t);
                                inner.push(Event::Code(t));
                            }
                            other => inner.push(other),
                        }
                    }

                    let id = slugify(&text);
                    events.push(Event::Html(format!("<{} id=\"{}\">", level, id).into()));
                    events.extend(inner);
                    events.push(Event::Html(format!("</{}>", level).into()));

                    if heading_rank(level) <= 3 {
                        toc.push(TocEntry {
                            id,
                            text,
                            level: heading_rank(level),
                        });
                    }
                }
                other => events.push(other),
            }
        }

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        Self { html, toc }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Derive an anchor id from heading text: lowercase, non-alphanumerics
/// dropped, whitespace collapsed to single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // Other punctuation is dropped entirely.
    }
    slug
}

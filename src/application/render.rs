//! Content rendering for reply entries.
//!
//! Feed assembly only needs two things from a renderer: a display title for
//! a topic and HTML for marked-up message bodies. Both sit behind
//! [`ContentRenderer`] so assembly can run against a stub in tests.

use comrak::{markdown_to_html, Options};
use thiserror::Error;

pub const UNTITLED: &str = "(no title)";
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markup source of {size} bytes exceeds the {limit} byte limit")]
    SourceTooLarge { size: usize, limit: usize },
}

pub trait ContentRenderer: Send + Sync {
    /// Display form of a topic title.
    fn normalize_title(&self, raw: Option<&str>) -> String {
        make_title(raw)
    }

    /// Render marked-up message text to sanitized HTML.
    fn render_markup(&self, source: &str) -> Result<String, RenderError>;
}

/// Collapse whitespace in a title, substituting a placeholder for blank ones.
pub fn make_title(raw: Option<&str>) -> String {
    let collapsed = raw
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() {
        UNTITLED.to_string()
    } else {
        collapsed
    }
}

/// Markdown renderer backed by Comrak with Ammonia sanitisation.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: ammonia::Builder<'static>,
    max_source_bytes: usize,
}

impl MarkdownRenderer {
    pub fn new(max_source_bytes: usize) -> Self {
        let mut options = Options::default();
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.table = true;
        options.render.hardbreaks = true;

        Self {
            options,
            sanitizer: ammonia::Builder::default(),
            max_source_bytes,
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SOURCE_BYTES)
    }
}

impl ContentRenderer for MarkdownRenderer {
    fn render_markup(&self, source: &str) -> Result<String, RenderError> {
        if source.len() > self.max_source_bytes {
            return Err(RenderError::SourceTooLarge {
                size: source.len(),
                limit: self.max_source_bytes,
            });
        }

        let html = markdown_to_html(source, &self.options);
        Ok(self.sanitizer.clean(&html).to_string())
    }
}

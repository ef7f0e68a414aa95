//! Markdown to Confluence storage format renderer.
//!
//! [`render`] converts a markdown page body to Confluence XHTML storage
//! format:
//! - `ac:structured-macro` code blocks with CDATA bodies
//! - Info panel macro for blockquotes
//! - `ac:image` with `ri:url` or `ri:attachment` for images
//!
//! Local images are referenced as page attachments by file name. Use
//! [`attachment_paths`] to find the files that must be uploaded alongside
//! the page.
//!
//! # Example
//!
//! ```
//! let markup = docsync_renderer::render("# Intro\n\n![Flow](img/flow.png)");
//! assert!(markup.contains(r#"<ri:attachment ri:filename="flow.png" />"#));
//!
//! let files = docsync_renderer::attachment_paths("![Flow](img/flow.png)");
//! assert_eq!(files, ["img/flow.png"]);
//! ```

mod references;
mod storage;

pub use references::{attachment_paths, rewrite_file_images};
pub use storage::StorageRenderer;

use pulldown_cmark::{Options, Parser};

/// Markdown extensions enabled for every render.
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render markdown to Confluence storage format.
///
/// Raw `<img src="file://...">` tags pass through the parser untouched and
/// are rewritten to attachment images afterwards. Malformed markdown
/// produces best-effort output.
#[must_use]
pub fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let markup = StorageRenderer::new().render(parser);
    rewrite_file_images(&markup).into_owned()
}

/// Escape special characters for XHTML text and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

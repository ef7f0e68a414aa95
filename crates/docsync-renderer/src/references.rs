//! Local file references in page bodies.

use std::borrow::Cow;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

use crate::{escape_html, parser_options};

/// Raw `<img>` tags pointing at local files through a `file://` URL.
static FILE_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img\s[^>]*?src="file://([^"]+)"[^>]*>"#).expect("invalid file image regex")
});

/// Docs-relative paths of local files embedded as images, in order of
/// first appearance.
///
/// Includes markdown images that aren't remote (`http://`, `https://`,
/// `data:`) and raw `<img src="file://...">` tags. Markdown paths are
/// normalized by dropping `.` and `..` segments and leading separators, so
/// `../img/a.png` and `./img/a.png` both yield `img/a.png`. `file://` paths
/// are kept as written.
#[must_use]
pub fn attachment_paths(markdown: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let mut push = |path: String| {
        if !path.is_empty() && !paths.contains(&path) {
            paths.push(path);
        }
    };

    // Block HTML arrives one line per event; tags may span lines.
    let mut html = String::new();
    for event in Parser::new_ext(markdown, parser_options()) {
        if let Event::Html(chunk) | Event::InlineHtml(chunk) = &event {
            html.push_str(chunk);
            continue;
        }
        flush_file_images(&mut html, &mut push);
        if let Event::Start(Tag::Image { dest_url, .. }) = event
            && let Some(path) = local_image_path(&dest_url)
        {
            push(path);
        }
    }
    flush_file_images(&mut html, &mut push);
    paths
}

/// Replace raw `<img src="file://...">` tags with attachment images.
///
/// The attachment is referenced by the file's base name, matching how it is
/// uploaded.
#[must_use]
pub fn rewrite_file_images(markup: &str) -> Cow<'_, str> {
    FILE_IMAGE_PATTERN.replace_all(markup, |caps: &Captures<'_>| {
        let filename = caps[1].rsplit('/').next().unwrap_or(&caps[1]);
        format!(
            r#"<ac:image ac:height="350"><ri:attachment ri:filename="{}" /></ac:image>"#,
            escape_html(filename)
        )
    })
}

fn flush_file_images(html: &mut String, push: &mut impl FnMut(String)) {
    for caps in FILE_IMAGE_PATTERN.captures_iter(html.as_str()) {
        push(caps[1].to_owned());
    }
    html.clear();
}

fn local_image_path(dest: &str) -> Option<String> {
    let remote = ["http://", "https://", "data:", "file:"];
    if remote.iter().any(|scheme| dest.starts_with(scheme)) {
        return None;
    }
    let path = dest
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/");
    Some(path)
}

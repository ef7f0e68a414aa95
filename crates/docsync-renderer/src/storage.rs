//! Confluence storage format renderer.

use std::fmt::Write;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Tag, TagEnd};

use crate::escape_html;

/// Streaming renderer from markdown events to Confluence storage format.
///
/// Headings are rendered as-is (no title extraction); the page title comes
/// from navigation, not from the body.
#[derive(Debug, Default)]
pub struct StorageRenderer {
    output: String,
    /// Language and accumulated content of the open code block.
    code: Option<(Option<String>, String)>,
    /// Image source and accumulated alt text of the open image.
    image: Option<(String, String)>,
    table_alignments: Vec<Alignment>,
    table_cell: usize,
    in_table_head: bool,
}

impl StorageRenderer {
    /// Create a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            ..Self::default()
        }
    }

    /// Render markdown events and return the storage markup.
    pub fn render<'a, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.output
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                write!(self.output, "<code>{}</code>", escape_html(&code)).unwrap();
            }
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.output.push_str("<br />"),
            Event::Rule => self.output.push_str("<hr />"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                write!(self.output, "<h{}>", heading_level(level)).unwrap();
            }
            Tag::BlockQuote(_) => self.output.push_str(
                r#"<ac:structured-macro ac:name="info" ac:schema-version="1"><ac:rich-text-body>"#,
            ),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((lang, String::new()));
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => write!(self.output, r#"<ol start="{start}">"#).unwrap(),
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_cell = 0;
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table_cell = 0;
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                let align = match self.table_alignments.get(self.table_cell) {
                    Some(Alignment::Left) => r#" style="text-align:left""#,
                    Some(Alignment::Center) => r#" style="text-align:center""#,
                    Some(Alignment::Right) => r#" style="text-align:right""#,
                    Some(Alignment::None) | None => "",
                };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.output.push_str("<em>"),
            Tag::Strong => self.output.push_str("<strong>"),
            Tag::Strikethrough => self.output.push_str("<s>"),
            Tag::Link { dest_url, .. } => {
                write!(self.output, r#"<a href="{}">"#, escape_html(&dest_url)).unwrap();
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some((dest_url.into_string(), String::new()));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(level) => {
                write!(self.output, "</h{}>", heading_level(level)).unwrap();
            }
            TagEnd::BlockQuote(_) => self
                .output
                .push_str("</ac:rich-text-body></ac:structured-macro>"),
            TagEnd::CodeBlock => {
                if let Some((lang, content)) = self.code.take() {
                    self.code_block(lang.as_deref(), &content);
                }
            }
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.output.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.in_table_head { "</th>" } else { "</td>" });
                self.table_cell += 1;
            }
            TagEnd::Emphasis => self.output.push_str("</em>"),
            TagEnd::Strong => self.output.push_str("</strong>"),
            TagEnd::Strikethrough => self.output.push_str("</s>"),
            TagEnd::Link => self.output.push_str("</a>"),
            TagEnd::Image => {
                if let Some((src, _alt)) = self.image.take() {
                    self.image_tag(&src);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, content)) = self.code.as_mut() {
            content.push_str(text);
        } else if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(text);
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn code_block(&mut self, lang: Option<&str>, content: &str) {
        self.output
            .push_str(r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#);
        if let Some(lang) = lang {
            write!(
                self.output,
                r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
                escape_html(lang)
            )
            .unwrap();
        }
        // CDATA can't contain its own terminator; split it across sections
        let content = content.replace("]]>", "]]]]><![CDATA[>");
        write!(
            self.output,
            r"<ac:plain-text-body><![CDATA[{content}]]></ac:plain-text-body>"
        )
        .unwrap();
        self.output.push_str("</ac:structured-macro>");
    }

    fn image_tag(&mut self, src: &str) {
        let is_external = src.starts_with("http://") || src.starts_with("https://");
        if is_external {
            write!(
                self.output,
                r#"<ac:image><ri:url ri:value="{}" /></ac:image>"#,
                escape_html(src)
            )
            .unwrap();
        } else {
            let filename = src.rsplit(['/', '\\']).next().unwrap_or(src);
            write!(
                self.output,
                r#"<ac:image><ri:attachment ri:filename="{}" /></ac:image>"#,
                escape_html(filename)
            )
            .unwrap();
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    use super::*;
    use crate::parser_options;

    fn render(markdown: &str) -> String {
        StorageRenderer::new().render(Parser::new_ext(markdown, parser_options()))
    }

    #[test]
    fn test_paragraph_and_inline() {
        assert_eq!(
            render("Hello **bold** _em_ ~~gone~~ `x < y`"),
            "<p>Hello <strong>bold</strong> <em>em</em> <s>gone</s> <code>x &lt; y</code></p>"
        );
    }

    #[test]
    fn test_headings_keep_levels() {
        assert_eq!(render("# Title\n\n## Section"), "<h1>Title</h1><h2>Section</h2>");
    }

    #[test]
    fn test_code_block_with_language() {
        let out = render("```python\nprint('hi')\n```");
        assert_eq!(
            out,
            concat!(
                r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#,
                r#"<ac:parameter ac:name="language">python</ac:parameter>"#,
                "<ac:plain-text-body><![CDATA[print('hi')\n]]></ac:plain-text-body>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn test_code_block_escapes_cdata_terminator() {
        let out = render("```\na]]>b\n```");
        assert!(out.contains("a]]]]><![CDATA[>b"));
        assert!(!out.contains(r#"ac:name="language""#));
    }

    #[test]
    fn test_blockquote_is_info_panel() {
        let out = render("> Note");
        assert_eq!(
            out,
            r#"<ac:structured-macro ac:name="info" ac:schema-version="1"><ac:rich-text-body><p>Note</p></ac:rich-text-body></ac:structured-macro>"#
        );
    }

    #[test]
    fn test_local_image_is_attachment() {
        assert_eq!(
            render("![Diagram](./img/diagram.png)"),
            r#"<p><ac:image><ri:attachment ri:filename="diagram.png" /></ac:image></p>"#
        );
    }

    #[test]
    fn test_external_image_is_url() {
        assert_eq!(
            render("![Logo](https://example.com/logo.png)"),
            r#"<p><ac:image><ri:url ri:value="https://example.com/logo.png" /></ac:image></p>"#
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            render("- a\n- b\n\n3. c\n"),
            "<ul><li>a</li><li>b</li></ul><ol start=\"3\"><li>c</li></ol>"
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render("- [x] done\n- [ ] todo\n"),
            "<ul><li>[x] done</li><li>[ ] todo</li></ul>"
        );
    }

    #[test]
    fn test_table_with_alignment() {
        let out = render("| A | B |\n|:--|--:|\n| 1 | 2 |\n");
        assert_eq!(
            out,
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align:left">A</th><th style="text-align:right">B</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align:left">1</td><td style="text-align:right">2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_link_and_breaks() {
        assert_eq!(
            render("[docs](https://example.com/?a=1&b=2)\n\n---"),
            r#"<p><a href="https://example.com/?a=1&amp;b=2">docs</a></p><hr />"#
        );
    }
}

//! Readable text from fetched HTML pages.
//!
//! Only `title`, `h1`-`h3`, `p` and `li` text is kept. Everything inside
//! `script`, `style`, `noscript` and `template` is dropped along with comments,
//! so navigation chrome and inline code never reach the summarizer. Missing
//! `</p>` and `</li>` end tags are implied the way browsers imply them.

use crate::text::collapse_whitespace;

const KEPT_ELEMENTS: [&str; 7] = ["title", "h1", "h2", "h3", "p", "li", "caption"];
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];
const INLINE_ELEMENTS: [&str; 13] = [
    "a", "abbr", "b", "code", "em", "i", "mark", "small", "span", "strong", "sub", "sup", "u",
];
const LIST_ELEMENTS: [&str; 2] = ["ul", "ol"];
// Opening or closing any of these ends an open `p`.
const BLOCK_ELEMENTS: [&str; 27] = [
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "pre", "section", "ul",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
}

struct Tag<'a> {
    kind: TagKind,
    name: &'a str,
    self_closing: bool,
    end: usize,
}

struct Capture {
    name: String,
    depth: usize,
    // Lists opened inside this capture; an `li` only closes its own level.
    nested_lists: usize,
    buffer: String,
}

impl Capture {
    /// `p` and `li` may omit their end tag; these tags close them implicitly.
    fn ends_before(&self, tag: &Tag<'_>) -> bool {
        match self.name.as_str() {
            "p" => {
                (tag.kind == TagKind::Open && tag.name == "p")
                    || BLOCK_ELEMENTS.contains(&tag.name)
            }
            "li" => {
                self.nested_lists == 0
                    && match tag.kind {
                        TagKind::Open => tag.name == "li",
                        TagKind::Close => LIST_ELEMENTS.contains(&tag.name),
                    }
            }
            _ => false,
        }
    }
}

const fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-'
}

// Quotes delimit only attribute values, i.e. right after `=`.
fn find_tag_end(bytes: &[u8], mut cursor: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    while cursor < bytes.len() {
        let byte = bytes[cursor];
        if let Some(active_quote) = quote {
            if byte == active_quote {
                quote = None;
            }
        } else if byte == b'>' {
            return Some(cursor);
        } else if byte == b'=' {
            after_equals = true;
        } else if after_equals && (byte == b'\'' || byte == b'"') {
            quote = Some(byte);
            after_equals = false;
        } else if !byte.is_ascii_whitespace() {
            after_equals = false;
        }
        cursor += 1;
    }
    None
}

// `lowered` is the ASCII-lowercased page, so byte offsets match `html`.
fn read_tag<'a>(lowered: &'a str, start: usize) -> Option<Tag<'a>> {
    let bytes = lowered.as_bytes();
    let end = find_tag_end(bytes, start + 1)?;
    let inner = &lowered[start + 1..end];
    let trimmed = inner.trim_start();
    let (kind, rest) = match trimmed.strip_prefix('/') {
        Some(rest) => (TagKind::Close, rest.trim_start()),
        None => (TagKind::Open, trimmed),
    };
    let name_len = rest
        .bytes()
        .take_while(|byte| is_tag_name_char(*byte))
        .count();
    if name_len == 0 {
        return None;
    }
    Some(Tag {
        kind,
        name: &rest[..name_len],
        self_closing: inner.trim_end().ends_with('/'),
        end: end + 1,
    })
}

#[must_use]
pub fn extract_html(html: &str) -> ExtractedPage {
    let lowered = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let mut page = ExtractedPage::default();
    let mut blocks = Vec::<String>::new();
    let mut capture: Option<Capture> = None;
    let mut offset = 0usize;
    let mut text_start = 0usize;

    while offset < bytes.len() {
        if bytes[offset] != b'<' {
            offset += 1;
            continue;
        }
        if let Some(active) = capture.as_mut() {
            active.buffer.push_str(&html[text_start..offset]);
        }

        if lowered[offset..].starts_with("<!--") {
            offset = lowered[offset + 4..]
                .find("-->")
                .map_or(bytes.len(), |idx| offset + 4 + idx + 3);
            text_start = offset;
            continue;
        }

        let Some(tag) = read_tag(&lowered, offset) else {
            // Not markup: keep the `<` as text.
            offset += 1;
            text_start = offset - 1;
            continue;
        };
        offset = tag.end;
        text_start = offset;
        if let Some(active) = capture.as_mut()
            && !INLINE_ELEMENTS.contains(&tag.name)
        {
            active.buffer.push(' ');
        }
        if capture.as_ref().is_some_and(|active| active.ends_before(&tag))
            && let Some(done) = capture.take()
        {
            finish_block(done, &mut page, &mut blocks);
        }

        match tag.kind {
            TagKind::Open if SKIPPED_ELEMENTS.contains(&tag.name) && !tag.self_closing => {
                let closing = format!("</{}", tag.name);
                offset = lowered[offset..]
                    .find(&closing)
                    .and_then(|idx| find_tag_end(bytes, offset + idx).map(|end| end + 1))
                    .unwrap_or(bytes.len());
                text_start = offset;
            }
            TagKind::Open if tag.self_closing => {}
            TagKind::Open => match capture.as_mut() {
                Some(active) if active.name == tag.name => active.depth += 1,
                Some(active) if LIST_ELEMENTS.contains(&tag.name) => active.nested_lists += 1,
                Some(_) => {}
                None if KEPT_ELEMENTS.contains(&tag.name) => {
                    capture = Some(Capture {
                        name: tag.name.to_string(),
                        depth: 1,
                        nested_lists: 0,
                        buffer: String::new(),
                    });
                }
                None => {}
            },
            TagKind::Close => {
                let finished = match capture.as_mut() {
                    Some(active) if active.name == tag.name => {
                        active.depth -= 1;
                        active.depth == 0
                    }
                    Some(active) if LIST_ELEMENTS.contains(&tag.name) => {
                        active.nested_lists = active.nested_lists.saturating_sub(1);
                        false
                    }
                    _ => false,
                };
                if finished && let Some(done) = capture.take() {
                    finish_block(done, &mut page, &mut blocks);
                }
            }
        }
    }
    if let Some(mut active) = capture.take() {
        active.buffer.push_str(&html[text_start.min(bytes.len())..]);
        finish_block(active, &mut page, &mut blocks);
    }

    page.text = blocks.join("\n");
    page
}

fn finish_block(capture: Capture, page: &mut ExtractedPage, blocks: &mut Vec<String>) {
    let text = collapse_whitespace(&decode_entities(&capture.buffer));
    if text.is_empty() {
        return;
    }
    if capture.name == "title" && page.title.is_none() {
        page.title = Some(text.clone());
    }
    blocks.push(text);
}

#[must_use]
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi + 1)));
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_content_elements_and_drops_scripts_and_navigation() {
        let html = r#"<html><head><title>Retail Outlook 2025</title>
            <script>var x = "<p>not text</p>";</script>
            <style>p { color: red }</style></head>
            <body><nav><a href="/">Home</a></nav>
            <h1>Market &amp; Demand</h1>
            <!-- <p>hidden</p> -->
            <p>Demand grew   4% <b>year</b> on year.</p>
            <ul><li>Online share rising</li><li>Store counts flat</li></ul>
            <footer>Copyright</footer></body></html>"#;
        let page = extract_html(html);
        assert_eq!(page.title.as_deref(), Some("Retail Outlook 2025"));
        assert_eq!(
            page.text,
            "Retail Outlook 2025\nMarket & Demand\nDemand grew 4% year on year.\nOnline share rising\nStore counts flat"
        );
    }

    #[test]
    fn outermost_match_wins_for_nested_content_elements() {
        let page = extract_html("<li>outer <p>inner</p> tail</li>");
        assert_eq!(page.text, "outer inner tail");
    }

    #[test]
    fn uppercase_tags_and_quoted_angle_brackets_are_handled() {
        let page = extract_html(r#"<P CLASS="a>b">Hello</P><SCRIPT>x</SCRIPT>"#);
        assert_eq!(page.text, "Hello");
        assert_eq!(page.title, None);
    }

    #[test]
    fn unterminated_paragraph_is_still_collected() {
        let page = extract_html("<p>first<p>second without end tag");
        assert_eq!(page.text, "first\nsecond without end tag");
    }

    #[test]
    fn omitted_end_tags_do_not_swallow_following_boilerplate() {
        let page = extract_html(
            "<ul><li>Home<li>About</ul><div>Cookie banner boilerplate</div>\
             <footer>Copyright 2025</footer><p>Real content</p>",
        );
        assert_eq!(page.text, "Home\nAbout\nReal content");

        let page = extract_html(
            "<p>Para one<p>Para two<div class=nav>Menu Login Signup</div><h2>Heading</h2>",
        );
        assert_eq!(page.text, "Para one\nPara two\nHeading");
    }

    #[test]
    fn nested_list_items_stay_inside_their_outer_item() {
        let page = extract_html("<ul><li>outer<ul><li>inner</ul> tail<li>next</ul><div>nav</div>");
        assert_eq!(page.text, "outer inner tail\nnext");
    }

    #[test]
    fn apostrophes_in_stray_brackets_do_not_open_quotes() {
        let page = extract_html("<p>a<b isn't</p><p>Tom's note</p><div>menu</div>");
        assert_eq!(page.text, "a\nTom's note");
    }

    #[test]
    fn decode_entities_handles_named_and_numeric_forms() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &copy; &"), "a <b> AB &copy; &");
    }

    #[test]
    fn plain_text_without_markup_yields_nothing() {
        assert_eq!(extract_html("just words").text, "");
    }
}

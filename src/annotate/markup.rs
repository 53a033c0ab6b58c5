//! Plain-text view of markup-bearing fragment content
//!
//! Fragments coming from the renderer may already carry tags and character
//! references. Matching runs on the decoded plain text; splice offsets are
//! mapped back onto the source only at character boundaries, and a range
//! that would swallow a tag is rejected so existing markup stays outside
//! every replaced region.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy)]
struct CharSpan {
    plain: usize,
    src_start: usize,
    src_end: usize,
}

#[derive(Debug, Clone)]
pub struct MarkupText<'a> {
    source: &'a str,
    plain: Cow<'a, str>,
    /// None when source has no markup: plain offsets == source offsets
    spans: Option<Vec<CharSpan>>,
}

impl<'a> MarkupText<'a> {
    pub fn parse(source: &'a str) -> Self {
        if !source.contains(['<', '&']) {
            return Self {
                source,
                plain: Cow::Borrowed(source),
                spans: None,
            };
        }

        let mut plain = String::with_capacity(source.len());
        let mut spans = Vec::with_capacity(source.len());
        let mut i = 0;

        while i < source.len() {
            let rest = &source[i..];

            if rest.starts_with('<') {
                if let Some(close) = rest.find('>') {
                    i += close + 1;
                    continue;
                }
            } else if rest.starts_with('&') {
                if let Some((ch, len)) = decode_reference(rest) {
                    spans.push(CharSpan { plain: plain.len(), src_start: i, src_end: i + len });
                    plain.push(ch);
                    i += len;
                    continue;
                }
            }

            let Some(ch) = rest.chars().next() else { break };
            spans.push(CharSpan { plain: plain.len(), src_start: i, src_end: i + ch.len_utf8() });
            plain.push(ch);
            i += ch.len_utf8();
        }

        Self {
            source,
            plain: Cow::Owned(plain),
            spans: Some(spans),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn plain(&self) -> &str {
        &self.plain
    }

    pub fn has_markup(&self) -> bool {
        self.spans.is_some()
    }

    /// Map plain range `[start, end)` onto the source.
    ///
    /// Returns `None` for empty ranges, offsets off a character boundary, or
    /// when the source region would contain a tag.
    pub fn source_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end || end > self.plain.len() {
            return None;
        }
        let Some(spans) = &self.spans else {
            if self.source.is_char_boundary(start) && self.source.is_char_boundary(end) {
                return Some((start, end));
            }
            return None;
        };

        let first = spans.binary_search_by_key(&start, |s| s.plain).ok()?;
        let last = match spans.binary_search_by_key(&end, |s| s.plain) {
            Ok(next) => next.checked_sub(1)?,
            Err(_) if end == self.plain.len() => spans.len().checked_sub(1)?,
            Err(_) => return None,
        };

        let (src_start, src_end) = (spans[first].src_start, spans[last].src_end);
        if self.source[src_start..src_end].contains('<') {
            return None;
        }
        Some((src_start, src_end))
    }
}

/// Decode one `&...;` character reference at the start of `s`.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let semi = s.get(..12).unwrap_or(s).find(';')?;
    let name = &s[1..semi];
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}

/// Escape for a double-quoted attribute value
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape for element text content
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content_is_identity() {
        let text = MarkupText::parse("Neural Network [3]");
        assert!(!text.has_markup());
        assert_eq!(text.plain(), "Neural Network [3]");
        assert_eq!(text.source_range(0, 6), Some((0, 6)));
    }

    #[test]
    fn test_tags_are_stripped() {
        let text = MarkupText::parse("<b>Deep</b> learning");
        assert_eq!(text.plain(), "Deep learning");
        // "Deep" maps inside the <b> element
        assert_eq!(text.source_range(0, 4), Some((3, 7)));
        // "learning" maps after </b>
        assert_eq!(text.source_range(5, 13), Some((12, 20)));
    }

    #[test]
    fn test_range_across_tag_rejected() {
        let text = MarkupText::parse("<b>Deep</b> learning");
        assert_eq!(text.source_range(0, 13), None);
    }

    #[test]
    fn test_entities_decoded() {
        let text = MarkupText::parse("R&amp;D at AT&#38;T");
        assert_eq!(text.plain(), "R&D at AT&T");
        // "R&D" covers the full reference in the source
        assert_eq!(text.source_range(0, 3), Some((0, 7)));
    }

    #[test]
    fn test_unknown_entity_kept_literally() {
        let text = MarkupText::parse("a &bogus; b");
        assert_eq!(text.plain(), "a &bogus; b");
    }

    #[test]
    fn test_unclosed_tag_is_text() {
        let text = MarkupText::parse("x < y");
        assert_eq!(text.plain(), "x < y");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"Smith "et al" <2020> & co"#), "Smith &quot;et al&quot; &lt;2020&gt; &amp; co");
        assert_eq!(escape_text("a<b"), "a&lt;b");
    }
}

//! Inline markup editing for article content.
//!
//! A low-rigor editing aid: tags are inserted around the current selection
//! without checking that the result is well-formed. Offsets are character
//! (not byte) positions so a selection can never split a code point.

use serde::{Deserialize, Serialize};

const LIST_OPEN: &str = "<ul>\n  <li>";
const LIST_FIRST_ITEM: &str = "First item";
const LIST_REST: &str = "</li>\n  <li>Second item</li>\n  <li>Third item</li>\n</ul>";

/// Half-open character range `[start, end)` within a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Ordered and clamped to `len` characters.
    fn normalized(self, len: usize) -> Self {
        let (a, b) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        Self::new(a.min(len), b.min(len))
    }
}

/// Toolbar presets offered by the article editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupTag {
    Paragraph,
    Heading,
    Bold,
    Italic,
    Link,
}

impl MarkupTag {
    pub fn tags(self) -> (&'static str, &'static str) {
        match self {
            MarkupTag::Paragraph => ("<p>", "</p>"),
            MarkupTag::Heading => ("<h2>", "</h2>"),
            MarkupTag::Bold => ("<strong>", "</strong>"),
            MarkupTag::Italic => ("<em>", "</em>"),
            MarkupTag::Link => ("<a href=\"\" target=\"_blank\">", "</a>"),
        }
    }
}

impl std::str::FromStr for MarkupTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p" | "paragraph" => Ok(MarkupTag::Paragraph),
            "h2" | "heading" => Ok(MarkupTag::Heading),
            "strong" | "bold" => Ok(MarkupTag::Bold),
            "em" | "italic" => Ok(MarkupTag::Italic),
            "a" | "link" => Ok(MarkupTag::Link),
            other => Err(format!("Unknown tag '{}'", other)),
        }
    }
}

/// Byte offset of the `idx`-th character (or the end of `s`).
fn byte_offset(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Text buffer with a selection, as held by the article content editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupBuffer {
    content: String,
    selection: Selection,
}

impl MarkupBuffer {
    /// Buffer with the caret at the end of `content`.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let end = content.chars().count();
        Self {
            content,
            selection: Selection::caret(end),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection.normalized(self.char_len());
    }

    pub fn selected_text(&self) -> &str {
        let sel = self.selection.normalized(self.char_len());
        let (a, b) = (
            byte_offset(&self.content, sel.start),
            byte_offset(&self.content, sel.end),
        );
        &self.content[a..b]
    }

    /// Wrap the selection in `start_tag`/`end_tag`. The previously selected text
    /// stays selected; an empty selection leaves the caret right after `start_tag`.
    pub fn insert_tag_pair(&mut self, start_tag: &str, end_tag: &str) {
        let sel = self.selection.normalized(self.char_len());
        let (a, b) = (
            byte_offset(&self.content, sel.start),
            byte_offset(&self.content, sel.end),
        );

        let mut next =
            String::with_capacity(self.content.len() + start_tag.len() + end_tag.len());
        next.push_str(&self.content[..a]);
        next.push_str(start_tag);
        next.push_str(&self.content[a..b]);
        next.push_str(end_tag);
        next.push_str(&self.content[b..]);

        let shift = start_tag.chars().count();
        self.content = next;
        self.selection = Selection::new(sel.start + shift, sel.end + shift);
    }

    pub fn apply(&mut self, tag: MarkupTag) {
        let (open, close) = tag.tags();
        self.insert_tag_pair(open, close);
    }

    /// Replace the selection with a three item list skeleton and select the
    /// first placeholder so it can be typed over.
    pub fn insert_list(&mut self) {
        let sel = self.selection.normalized(self.char_len());
        let template = format!("{}{}{}", LIST_OPEN, LIST_FIRST_ITEM, LIST_REST);
        self.selection = Selection::caret(sel.start);

        // Drop the selected text, then insert the template as a bare "start tag".
        let (a, b) = (
            byte_offset(&self.content, sel.start),
            byte_offset(&self.content, sel.end),
        );
        self.content.replace_range(a..b, "");
        self.insert_tag_pair(&template, "");

        let first = sel.start + LIST_OPEN.chars().count();
        self.selection = Selection::new(first, first + LIST_FIRST_ITEM.chars().count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_selection_keeps_text_selected() {
        let mut buffer = MarkupBuffer::new("ab1234cd");
        buffer.select(Selection::new(2, 6));
        buffer.insert_tag_pair("<strong>", "</strong>");

        assert_eq!(buffer.content(), "ab<strong>1234</strong>cd");
        assert_eq!(buffer.selection(), Selection::new(10, 14));
        assert_eq!(buffer.selected_text(), "1234");
    }

    #[test]
    fn test_empty_selection_places_caret_after_start_tag() {
        let mut buffer = MarkupBuffer::new("hello");
        buffer.select(Selection::caret(5));
        buffer.apply(MarkupTag::Paragraph);

        assert_eq!(buffer.content(), "hello<p></p>");
        assert_eq!(buffer.selection(), Selection::caret(8));
    }

    #[test]
    fn test_empty_end_tag() {
        let mut buffer = MarkupBuffer::new("x");
        buffer.select(Selection::caret(0));
        buffer.insert_tag_pair("<br>", "");
        assert_eq!(buffer.content(), "<br>x");
        assert_eq!(buffer.selection(), Selection::caret(4));
    }

    #[test]
    fn test_multibyte_offsets_are_characters() {
        let mut buffer = MarkupBuffer::new("héllo wörld");
        buffer.select(Selection::new(6, 11));
        buffer.apply(MarkupTag::Italic);
        assert_eq!(buffer.content(), "héllo <em>wörld</em>");
        assert_eq!(buffer.selected_text(), "wörld");
    }

    #[test]
    fn test_out_of_range_selection_is_clamped() {
        let mut buffer = MarkupBuffer::new("abc");
        buffer.select(Selection::new(5, 1));
        assert_eq!(buffer.selection(), Selection::new(1, 3));
        buffer.apply(MarkupTag::Bold);
        assert_eq!(buffer.content(), "a<strong>bc</strong>");
    }

    #[test]
    fn test_insert_list_selects_first_item() {
        let mut buffer = MarkupBuffer::new("<p>x</p>");
        buffer.select(Selection::new(3, 4));
        buffer.insert_list();

        assert_eq!(
            buffer.content(),
            "<p><ul>\n  <li>First item</li>\n  <li>Second item</li>\n  <li>Third item</li>\n</ul></p>"
        );
        assert_eq!(buffer.selected_text(), "First item");
    }

    #[test]
    fn test_link_preset() {
        let mut buffer = MarkupBuffer::new("docs");
        buffer.select(Selection::new(0, 4));
        buffer.apply("link".parse().unwrap());
        assert_eq!(buffer.content(), "<a href=\"\" target=\"_blank\">docs</a>");
    }
}

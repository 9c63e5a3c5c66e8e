//! Inline emphasis markup: `*text*` marks a span for highlighting.
//!
//! Text is split on `\*(.*?)\*` and every captured span becomes an
//! emphasized segment. Plain segments sit between them, so a string with
//! `n` spans always yields `2n + 1` segments, including empty ones at the
//! edges. An unpaired `*` and everything after it stays plain, and a span
//! never crosses a line break.

use once_cell::sync::Lazy;
use regex::Regex;

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'t> {
    Plain(&'t str),
    Emphasized(&'t str),
}

impl<'t> Segment<'t> {
    pub fn text(&self) -> &'t str {
        match self {
            Segment::Plain(s) | Segment::Emphasized(s) => s,
        }
    }

    pub fn is_emphasized(&self) -> bool {
        matches!(self, Segment::Emphasized(_))
    }
}

/// Lazily yields the segments of `text`.
pub fn segments(text: &str) -> Segments<'_> {
    Segments {
        text,
        cursor: 0,
        pending: None,
        done: false,
    }
}

/// Iterator over the segments of one string. It only holds a cursor, so a
/// clone continues from the same position and [`segments`] starts over.
#[derive(Clone, Debug)]
pub struct Segments<'t> {
    text: &'t str,
    cursor: usize,
    pending: Option<&'t str>,
    done: bool,
}

impl<'t> Iterator for Segments<'t> {
    type Item = Segment<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(span) = self.pending.take() {
            return Some(Segment::Emphasized(span));
        }
        if self.done {
            return None;
        }
        let text = self.text;
        match EMPHASIS.captures_at(text, self.cursor) {
            Some(caps) => {
                // group 1 always participates when the pattern matches
                let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                    self.done = true;
                    return Some(Segment::Plain(&text[self.cursor..]));
                };
                let plain = &text[self.cursor..whole.start()];
                self.cursor = whole.end();
                self.pending = Some(inner.as_str());
                Some(Segment::Plain(plain))
            }
            None => {
                self.done = true;
                Some(Segment::Plain(&text[self.cursor..]))
            }
        }
    }
}

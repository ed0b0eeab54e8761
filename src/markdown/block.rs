//! Line-oriented block classification.
//!
//! Every physical line of the source becomes exactly one [`Block`]. There is
//! no lookahead and no joining of lines, so block order and count are a
//! direct function of the input and every renderer sees the same sequence.

use super::inline::{Inline, parse_inline};

/// Heading depth. Only second and third level headings are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H2,
    H3,
}

/// One classified line of Markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: HeadingLevel, text: String },
    ListItem { text: String },
    Paragraph { text: String },
    Blank,
}

impl Block {
    /// Raw (unparsed) text content. Empty for [`Block::Blank`].
    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } | Block::ListItem { text } | Block::Paragraph { text } => {
                text
            }
            Block::Blank => "",
        }
    }

    /// Inline runs of this block's text.
    pub fn inlines(&self) -> Vec<Inline> {
        parse_inline(self.text())
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::ListItem { .. })
    }
}

/// Classify a single line.
///
/// Prefixes are checked in a fixed order and the first match wins:
/// `"## "`, `"### "`, `"- "` / `"* "`, blank, then paragraph.
pub fn classify_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("## ") {
        Block::Heading {
            level: HeadingLevel::H2,
            text: rest.to_string(),
        }
    } else if let Some(rest) = line.strip_prefix("### ") {
        Block::Heading {
            level: HeadingLevel::H3,
            text: rest.to_string(),
        }
    } else if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
    {
        Block::ListItem {
            text: rest.to_string(),
        }
    } else if line.trim().is_empty() {
        Block::Blank
    } else {
        Block::Paragraph {
            text: line.to_string(),
        }
    }
}

/// Parse a Markdown string into its block sequence.
///
/// Never fails. The result always holds one block per `\n`-separated line,
/// so the empty string yields a single [`Block::Blank`].
///
/// # Examples
///
/// ```
/// use gijiroku::markdown::{Block, HeadingLevel, parse};
///
/// let blocks = parse("## 決定事項\n- 予算承認\n\n以上");
/// assert_eq!(blocks.len(), 4);
/// assert_eq!(
///     blocks[0],
///     Block::Heading { level: HeadingLevel::H2, text: "決定事項".into() }
/// );
/// assert!(blocks[1].is_list_item());
/// assert_eq!(blocks[2], Block::Blank);
/// ```
pub fn parse(markdown: &str) -> Vec<Block> {
    markdown.split('\n').map(classify_line).collect()
}

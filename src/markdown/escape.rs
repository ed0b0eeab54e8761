//! Pure text escaping utilities.
//!
//! Every literal character that reaches HTML or XML output passes through
//! [`escape_html`]. Inline markup is only ever produced from the parsed
//! [`Inline`](super::Inline) tree, never from the source characters.

/// Escape text for embedding in HTML element content or attribute values.
///
/// # Examples
///
/// ```
/// use gijiroku::markdown::escape_html;
///
/// assert_eq!(escape_html("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
/// assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text for XML 1.0 character data, dropping characters XML forbids.
///
/// C0 control characters other than tab, newline and carriage return cannot
/// appear in an XML document even as character references, so they are
/// removed rather than escaped.
pub fn escape_xml_text(text: &str) -> String {
    let filtered: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    escape_html(&filtered)
}

fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => false,
        _ => true,
    }
}

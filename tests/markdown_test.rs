//! Block classification and preview rendering tests.
//!
//! Uses a generated-minutes fixture plus property tests over arbitrary input.

use gijiroku::markdown::{Block, HeadingLevel, Inline, parse, parse_inline};
use gijiroku::preview::{Preview, render, render_markdown};
use proptest::prelude::*;

const MINUTES: &str = include_str!("fixtures/minutes.md");

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_fixture_block_sequence() {
    let blocks = parse(MINUTES);
    assert_eq!(blocks.len(), MINUTES.split('\n').count());

    assert_eq!(
        blocks[0],
        Block::Heading {
            level: HeadingLevel::H2,
            text: "会議概要".into()
        }
    );
    assert!(matches!(blocks[1], Block::Paragraph { .. }));
    assert_eq!(blocks[2], Block::Blank);

    let h3: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading {
                level: HeadingLevel::H3,
                text,
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(h3, ["予算計画", "採用方針"]);
}

#[test]
fn test_both_bullet_markers() {
    let blocks = parse("- dash\n* star");
    assert_eq!(
        blocks,
        vec![
            Block::ListItem { text: "dash".into() },
            Block::ListItem { text: "star".into() },
        ]
    );
}

#[test]
fn test_unsupported_headings_are_paragraphs() {
    for line in ["# h1", "#### h4", "##no-space", "-no-space"] {
        assert!(
            matches!(parse(line)[0], Block::Paragraph { .. }),
            "{line:?} should be a paragraph"
        );
    }
}

#[test]
fn test_carriage_return_is_text() {
    let blocks = parse("## A\r\nb\r");
    assert_eq!(blocks[0].text(), "A\r");
    assert_eq!(blocks[1].text(), "b\r");
}

// ============================================================================
// Inline runs
// ============================================================================

#[test]
fn test_bold_and_italic() {
    assert_eq!(
        parse_inline("**bold** and *italic*"),
        vec![
            Inline::Bold(vec![Inline::Text("bold".into())]),
            Inline::Text(" and ".into()),
            Inline::Italic(vec![Inline::Text("italic".into())]),
        ]
    );
}

#[test]
fn test_link_inside_bold() {
    assert_eq!(
        parse_inline("**see [x](u)**"),
        vec![Inline::Bold(vec![
            Inline::Text("see ".into()),
            Inline::Link {
                href: "u".into(),
                children: vec![Inline::Text("x".into())],
            },
        ])]
    );
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_fixture_preview() {
    let html = render_markdown(MINUTES);
    assert!(html.starts_with("<h2>会議概要</h2><p>"));
    assert!(html.contains("<h3>予算計画</h3>"));
    assert!(html.contains("<strong>マーケティング費</strong>"));
    assert!(html.contains("<em>佐藤</em>"));
    assert!(html.contains("<code>hiring-2025</code>"));
    assert!(html.contains(
        "<a href=\"https://example.com/budget?q=1&amp;r=2\" target=\"_blank\" \
         rel=\"noopener noreferrer\">共有資料</a>"
    ));
    assert_eq!(html.matches("<ul>").count(), 5);
    assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
}

#[test]
fn test_list_grouping() {
    assert_eq!(
        render_markdown("- a\n- b\n\nc"),
        "<ul><li>a</li><li>b</li></ul><br><p>c</p>"
    );
    assert_eq!(
        render_markdown("- a\n## h\n- b"),
        "<ul><li>a</li></ul><h2>h</h2><ul><li>b</li></ul>"
    );
}

#[test]
fn test_markup_in_source_is_escaped() {
    assert_eq!(
        render_markdown("<script>alert(1)</script>"),
        "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
    );
    assert_eq!(
        render_markdown("[x](\"onmouseover=\"y)"),
        "<p><a href=\"&quot;onmouseover=&quot;y\" target=\"_blank\" \
         rel=\"noopener noreferrer\">x</a></p>"
    );
}

#[test]
fn test_preview_memoizes() {
    let mut preview = Preview::new();
    let first = preview.render(MINUTES).to_string();
    assert_eq!(preview.render(MINUTES), first);
    assert_eq!(preview.render("## x"), "<h2>x</h2>");
}

// ============================================================================
// Properties
// ============================================================================

const ALLOWED_TAGS: &[&str] = &[
    "h2", "/h2", "h3", "/h3", "ul", "/ul", "li", "/li", "p", "/p", "br", "strong", "/strong",
    "em", "/em", "code", "/code", "/a",
];

const LINK_PREFIX: &str = "a href=\"";
const LINK_SUFFIX: &str = "\" target=\"_blank\" rel=\"noopener noreferrer\"";

const ALLOWED_ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

/// Check that every `<` opens a tag the renderer emits and every `&` starts
/// an entity the escaper emits.
fn only_renderer_markup(html: &str) -> bool {
    let mut rest = html;
    while let Some(pos) = rest.find(['<', '>', '&']) {
        let tail = &rest[pos..];
        if tail.starts_with('>') {
            return false;
        }
        if tail.starts_with('&') {
            let Some(entity) = ALLOWED_ENTITIES.iter().find(|e| tail.starts_with(*e)) else {
                return false;
            };
            rest = &tail[entity.len()..];
            continue;
        }
        let Some(end) = tail.find('>') else {
            return false;
        };
        let tag = &tail[1..end];
        if let Some(href) = tag
            .strip_prefix(LINK_PREFIX)
            .and_then(|t| t.strip_suffix(LINK_SUFFIX))
        {
            if href.contains(['<', '"']) {
                return false;
            }
        } else if !ALLOWED_TAGS.contains(&tag) {
            return false;
        }
        rest = &tail[end + 1..];
    }
    true
}

fn markdownish() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("## ".to_string()),
            Just("### ".to_string()),
            Just("- ".to_string()),
            Just("* ".to_string()),
            Just("**".to_string()),
            Just("*".to_string()),
            Just("`".to_string()),
            Just("[".to_string()),
            Just("](".to_string()),
            Just(")".to_string()),
            Just("\n".to_string()),
            Just("<".to_string()),
            Just(">".to_string()),
            Just("&".to_string()),
            Just("\"".to_string()),
            "[a-z 議事]{1,4}",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn prop_one_block_per_line(s in "(?s).{0,64}") {
        prop_assert_eq!(parse(&s).len(), s.split('\n').count());
    }

    #[test]
    fn prop_render_is_idempotent(s in markdownish()) {
        let blocks = parse(&s);
        prop_assert_eq!(render(&blocks), render(&blocks));
    }

    #[test]
    fn prop_input_cannot_forge_markup(s in markdownish()) {
        let html = render_markdown(&s);
        prop_assert!(only_renderer_markup(&html), "unexpected markup in {:?}", html);
    }

    #[test]
    fn prop_arbitrary_input_cannot_forge_markup(s in "\\PC*") {
        prop_assert!(only_renderer_markup(&render_markdown(&s)));
    }

    #[test]
    fn prop_plain_text_survives(s in "[a-zA-Z0-9 ]{0,40}") {
        let blocks = parse(&s);
        let text: String = blocks[0].inlines().iter().map(Inline::plain_text).collect();
        prop_assert_eq!(text, blocks[0].text());
    }
}

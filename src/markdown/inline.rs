//! Inline span parsing.
//!
//! Substitution passes run in a fixed order over the block text:
//! bold (`**x**`), italic (`*x*`), code (`` `x` ``), then links
//! (`[label](url)`). Each pass scans the text left by the earlier ones,
//! including the text inside runs they produced, and treats those runs as
//! opaque atoms it may enclose but never split. Matches are non-greedy and
//! non-overlapping.
//!
//! Text is kept unescaped in the tree. Escaping happens when a renderer
//! writes each [`Inline::Text`] leaf, so delimiter characters can only ever
//! become markup through this parser.

/// A styled sub-span of a block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Code(Vec<Inline>),
    Link { href: String, children: Vec<Inline> },
}

impl Inline {
    /// Concatenated text of this run with all markup removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Code(children)
            | Inline::Link { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Flattened working form: literal characters interleaved with finished runs.
#[derive(Debug, Clone)]
enum Piece {
    Char(char),
    Run(Inline),
}

/// Parse a block's text into inline runs.
///
/// # Examples
///
/// ```
/// use gijiroku::markdown::{Inline, parse_inline};
///
/// let runs = parse_inline("**bold** and *italic*");
/// assert_eq!(runs[0], Inline::Bold(vec![Inline::Text("bold".into())]));
/// assert_eq!(runs[1], Inline::Text(" and ".into()));
/// assert_eq!(runs[2], Inline::Italic(vec![Inline::Text("italic".into())]));
/// ```
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut pieces: Vec<Piece> = text.chars().map(Piece::Char).collect();
    pieces = wrap_delimited(pieces, "**", Inline::Bold);
    pieces = wrap_delimited(pieces, "*", Inline::Italic);
    pieces = wrap_delimited(pieces, "`", Inline::Code);
    pieces = wrap_links(pieces);
    collapse(pieces)
}

/// Apply one symmetric-delimiter pass at this level and inside existing runs.
fn wrap_delimited(pieces: Vec<Piece>, delim: &str, make: fn(Vec<Inline>) -> Inline) -> Vec<Piece> {
    let pieces: Vec<Piece> = pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Run(run) => Piece::Run(map_children(run, |children| {
                collapse(wrap_delimited(expand(children), delim, make))
            })),
            other => other,
        })
        .collect();

    let delim: Vec<char> = delim.chars().collect();
    let mut out = Vec::with_capacity(pieces.len());
    let mut pos = 0;

    while pos < pieces.len() {
        if starts_with(&pieces, pos, &delim) {
            let inner_start = pos + delim.len();
            if let Some(close) = find_delim(&pieces, inner_start, &delim) {
                let inner = pieces[inner_start..close].to_vec();
                out.push(Piece::Run(make(collapse(inner))));
                pos = close + delim.len();
                continue;
            }
            // No closing delimiter anywhere after the first opener means no
            // later opener can close either.
            out.extend_from_slice(&pieces[pos..]);
            return out;
        }
        out.push(pieces[pos].clone());
        pos += 1;
    }

    out
}

/// Apply the `[label](url)` pass at this level and inside existing runs.
fn wrap_links(pieces: Vec<Piece>) -> Vec<Piece> {
    let pieces: Vec<Piece> = pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Run(run) => Piece::Run(map_children(run, |children| {
                collapse(wrap_links(expand(children)))
            })),
            other => other,
        })
        .collect();

    let mut out = Vec::with_capacity(pieces.len());
    let mut pos = 0;

    while pos < pieces.len() {
        if let Piece::Char('[') = pieces[pos]
            && let Some((label_end, href, end)) = match_link(&pieces, pos)
        {
            let label = pieces[pos + 1..label_end].to_vec();
            out.push(Piece::Run(Inline::Link {
                href,
                children: collapse(label),
            }));
            pos = end;
            continue;
        }
        out.push(pieces[pos].clone());
        pos += 1;
    }

    out
}

/// Match a link starting at the `[` at `open`.
///
/// Returns the index of the closing `]`, the target, and the index just past
/// the closing `)`. The label needs at least one element and no `]`; the
/// target needs at least one literal character and no `)`.
fn match_link(pieces: &[Piece], open: usize) -> Option<(usize, String, usize)> {
    let mut pos = open + 1;
    while pos < pieces.len() && !matches!(pieces[pos], Piece::Char(']')) {
        pos += 1;
    }
    if pos == open + 1 || pos >= pieces.len() {
        return None;
    }
    let label_end = pos;

    if !matches!(pieces.get(label_end + 1), Some(Piece::Char('('))) {
        return None;
    }

    let mut href = String::new();
    pos = label_end + 2;
    loop {
        match pieces.get(pos)? {
            Piece::Char(')') => break,
            Piece::Char(c) => href.push(*c),
            Piece::Run(_) => return None,
        }
        pos += 1;
    }
    if href.is_empty() {
        return None;
    }

    Some((label_end, href, pos + 1))
}

fn starts_with(pieces: &[Piece], pos: usize, delim: &[char]) -> bool {
    pieces.len() >= pos + delim.len()
        && delim
            .iter()
            .zip(&pieces[pos..])
            .all(|(d, p)| matches!(p, Piece::Char(c) if c == d))
}

fn find_delim(pieces: &[Piece], from: usize, delim: &[char]) -> Option<usize> {
    (from..pieces.len()).find(|&i| starts_with(pieces, i, delim))
}

fn map_children(run: Inline, f: impl Fn(Vec<Inline>) -> Vec<Inline>) -> Inline {
    match run {
        Inline::Bold(children) => Inline::Bold(f(children)),
        Inline::Italic(children) => Inline::Italic(f(children)),
        Inline::Code(children) => Inline::Code(f(children)),
        Inline::Link { href, children } => Inline::Link {
            href,
            children: f(children),
        },
        text @ Inline::Text(_) => text,
    }
}

fn expand(runs: Vec<Inline>) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for run in runs {
        match run {
            Inline::Text(text) => pieces.extend(text.chars().map(Piece::Char)),
            other => pieces.push(Piece::Run(other)),
        }
    }
    pieces
}

/// Merge consecutive characters back into text runs.
fn collapse(pieces: Vec<Piece>) -> Vec<Inline> {
    let mut runs = Vec::new();
    let mut text = String::new();
    for piece in pieces {
        match piece {
            Piece::Char(c) => text.push(c),
            Piece::Run(run) => {
                if !text.is_empty() {
                    runs.push(Inline::Text(std::mem::take(&mut text)));
                }
                runs.push(run);
            }
        }
    }
    if !text.is_empty() {
        runs.push(Inline::Text(text));
    }
    runs
}

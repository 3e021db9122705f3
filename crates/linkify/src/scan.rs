//! Protected-region scanner.
//!
//! A single left-to-right pass splits markdown into spans. Only
//! [`Span::Text`] is eligible for reference rewriting; fenced code, inline
//! code and existing links are carried through byte-for-byte. Because the
//! scanner commits to the first region that opens, a fence line beats an
//! inline code span, and an inline code span beats a link that starts inside
//! it.

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    FencedCode,
    InlineCode,
    MarkdownLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    /// The whole `[text](target)` source.
    pub raw: &'a str,
    pub text: &'a str,
    /// Target without angle brackets.
    pub target: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    FencedCode(&'a str),
    InlineCode(&'a str),
    Link(Link<'a>),
}

impl<'a> Span<'a> {
    /// Source text of the span.
    #[must_use]
    pub fn raw(&self) -> &'a str {
        match self {
            Span::Text(s) | Span::FencedCode(s) | Span::InlineCode(s) => s,
            Span::Link(link) => link.raw,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Span::Text(_) => Mode::Normal,
            Span::FencedCode(_) => Mode::FencedCode,
            Span::InlineCode(_) => Mode::InlineCode,
            Span::Link(_) => Mode::MarkdownLink,
        }
    }
}

/// Splits `text` into spans whose raw slices concatenate back to `text`.
#[must_use]
pub fn scan(text: &str) -> Vec<Span<'_>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut mode = Mode::Normal;
    let mut text_start = 0usize;
    let mut region_start = 0usize;
    let mut region_end = 0usize;
    let mut link: Option<Link<'_>> = None;
    let mut i = 0usize;

    while i < bytes.len() || mode != Mode::Normal {
        match mode {
            Mode::Normal => {
                let at_line_start = i == 0 || bytes[i - 1] == b'\n';
                let next = if at_line_start && is_fence_line(&text[i..]) {
                    Some((Mode::FencedCode, fenced_block_end(text, i)))
                } else if bytes[i] == b'`' {
                    inline_code_end(text, i).map(|end| (Mode::InlineCode, end))
                } else if bytes[i] == b'[' {
                    parse_link(text, i).map(|(parsed, end)| {
                        link = Some(parsed);
                        (Mode::MarkdownLink, end)
                    })
                } else {
                    None
                };

                match next {
                    Some((next_mode, end)) => {
                        if text_start < i {
                            spans.push(Span::Text(&text[text_start..i]));
                        }
                        mode = next_mode;
                        region_start = i;
                        region_end = end;
                    }
                    None => i += utf8_len(bytes[i]),
                }
            }
            Mode::FencedCode => {
                spans.push(Span::FencedCode(&text[region_start..region_end]));
                (mode, i, text_start) = (Mode::Normal, region_end, region_end);
            }
            Mode::InlineCode => {
                spans.push(Span::InlineCode(&text[region_start..region_end]));
                (mode, i, text_start) = (Mode::Normal, region_end, region_end);
            }
            Mode::MarkdownLink => {
                if let Some(parsed) = link.take() {
                    spans.push(Span::Link(parsed));
                }
                (mode, i, text_start) = (Mode::Normal, region_end, region_end);
            }
        }
    }

    if text_start < bytes.len() {
        spans.push(Span::Text(&text[text_start..]));
    }
    spans
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Up to three spaces of indentation, then three backticks.
fn is_fence_line(rest: &str) -> bool {
    let indent = rest.bytes().take_while(|&b| b == b' ').count();
    indent <= 3 && rest[indent..].starts_with(FENCE)
}

/// End of the fenced block opened at `start`: through the closing fence line
/// (excluding its newline), or end of text when unclosed.
fn fenced_block_end(text: &str, start: usize) -> usize {
    let Some(first_newline) = text[start..].find('\n') else {
        return text.len();
    };
    let mut line_start = start + first_newline + 1;
    while line_start < text.len() {
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |off| line_start + off);
        if is_fence_line(&text[line_start..line_end]) {
            return line_end;
        }
        line_start = line_end + 1;
    }
    text.len()
}

/// Closing backtick on the same line; `None` leaves the backtick literal.
fn inline_code_end(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start + 1..];
    let close = rest.find(['`', '\n'])?;
    (rest.as_bytes()[close] == b'`').then_some(start + 1 + close + 1)
}

/// Parses `[text](target)` or `[text](<target>)` at `start`.
fn parse_link(text: &str, start: usize) -> Option<(Link<'_>, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut close_bracket = None;
    for (off, &b) in bytes[start + 1..].iter().enumerate() {
        match b {
            b'\n' => return None,
            b'[' => depth += 1,
            b']' if depth == 0 => {
                close_bracket = Some(start + 1 + off);
                break;
            }
            b']' => depth -= 1,
            _ => {}
        }
    }
    let close_bracket = close_bracket?;
    if bytes.get(close_bracket + 1) != Some(&b'(') {
        return None;
    }

    let target_start = close_bracket + 2;
    let (target, end) = if bytes.get(target_start) == Some(&b'<') {
        let inner_start = target_start + 1;
        let close_angle = inner_start + text[inner_start..].find(['>', '\n'])?;
        if bytes[close_angle] != b'>' || bytes.get(close_angle + 1) != Some(&b')') {
            return None;
        }
        (&text[inner_start..close_angle], close_angle + 2)
    } else {
        let mut parens = 0usize;
        let mut close_paren = None;
        for (off, &b) in bytes[target_start..].iter().enumerate() {
            match b {
                b' ' | b'\t' | b'\n' => return None,
                b'(' => parens += 1,
                b')' if parens == 0 => {
                    close_paren = Some(target_start + off);
                    break;
                }
                b')' => parens -= 1,
                _ => {}
            }
        }
        let close_paren = close_paren?;
        (&text[target_start..close_paren], close_paren + 1)
    };

    Some((
        Link {
            raw: &text[start..end],
            text: &text[start + 1..close_bracket],
            target,
        },
        end,
    ))
}

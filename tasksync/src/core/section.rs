//! Header-delimited sections in a markdown document.
//!
//! A section starts at a line holding the header literal (optionally followed
//! by horizontal whitespace) and its body runs until the first later line that
//! begins with one of the terminator literals, or to end of text. Lines that
//! are not terminators, including blank lines and nested sub-headers, are body.
//!
//! Only the first header occurrence is considered. A second occurrence of the
//! same header before the terminator is plain body text and is replaced along
//! with the rest of the body; occurrences after the terminator are untouched.

/// Byte offsets of a located section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Start of the header line.
    pub header_start: usize,
    /// First byte after the header line.
    pub body_start: usize,
    /// Start of the terminator line, or `text.len()`.
    pub body_end: usize,
}

/// Find the first section named `header` in `text`.
pub fn locate(text: &str, header: &str, terminators: &[String]) -> Option<SectionSpan> {
    if header.is_empty() {
        return None;
    }

    let mut offset = 0;
    let mut found: Option<(usize, usize)> = None;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        match found {
            None => {
                if is_header_line(line, header) {
                    found = Some((start, offset));
                }
            }
            Some((header_start, body_start)) => {
                if is_terminator(line, terminators) {
                    return Some(SectionSpan {
                        header_start,
                        body_start,
                        body_end: start,
                    });
                }
            }
        }
    }

    found.map(|(header_start, body_start)| SectionSpan {
        header_start,
        body_start,
        body_end: text.len(),
    })
}

/// Body of the first section named `header`, without trailing newlines.
pub fn extract<'a>(text: &'a str, header: &str, terminators: &[String]) -> Option<&'a str> {
    let span = locate(text, header, terminators)?;
    Some(trim_trailing_newlines(&text[span.body_start..span.body_end]))
}

/// Replace the body of the first section named `header` with `body`.
///
/// The rewritten section is `header`, the body, then exactly one blank line
/// before whatever followed (the terminator line or end of text). When the
/// section is missing, `\n\n<header>\n<body>\n` is appended and `text` stays
/// a strict prefix of the result.
pub fn merge(text: &str, header: &str, terminators: &[String], body: &str) -> String {
    let body = trim_trailing_newlines(body);
    let Some(span) = locate(text, header, terminators) else {
        return format!("{text}\n\n{header}\n{body}\n");
    };

    let rest = &text[span.body_end..];
    let mut out = String::with_capacity(text.len() + body.len());
    out.push_str(&text[..span.header_start]);
    out.push_str(header);
    out.push('\n');
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(rest);
    out
}

fn is_header_line(line: &str, header: &str) -> bool {
    line.strip_prefix(header)
        .is_some_and(|rest| rest.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')))
}

fn is_terminator(line: &str, terminators: &[String]) -> bool {
    terminators
        .iter()
        .any(|t| !t.is_empty() && line.starts_with(t.as_str()))
}

fn trim_trailing_newlines(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

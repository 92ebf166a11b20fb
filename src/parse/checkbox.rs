use std::sync::LazyLock;

use regex::Regex;

use crate::model::item::CheckboxStatus;

/// Inline `#sphere/…` and `#context/…` tokens, with the whitespace before them.
static SCOPE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s+)#(?:sphere|context)/[^\s#]+").expect("scope tag regex is valid")
});

/// First `#sphere/<name>` token on a line.
static SPHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#sphere/([^\s#]+)").expect("sphere regex is valid")
});

/// A checkbox list line split into its parts: `<indent><bullet> [<status>] <text>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckboxLine<'a> {
    pub indent: &'a str,
    pub bullet: char,
    pub status: char,
    pub text: &'a str,
}

impl CheckboxLine<'_> {
    pub fn status(&self) -> CheckboxStatus {
        CheckboxStatus::from_char(self.status)
    }
}

/// Parse a `- [c] text` or `* [c] text` line (any leading whitespace).
/// The space after `]` is optional: `- [ ]text` is a checkbox too.
pub fn parse_checkbox(line: &str) -> Option<CheckboxLine<'_>> {
    let content = line.trim_start();
    let indent = &line[..line.len() - content.len()];

    let mut chars = content.chars();
    let bullet = chars.next()?;
    if bullet != '-' && bullet != '*' {
        return None;
    }
    let rest = chars.as_str().strip_prefix(" [")?;
    let mut chars = rest.chars();
    let status = chars.next()?;
    let after = chars.as_str().strip_prefix(']')?;
    let text = after.strip_prefix(' ').unwrap_or(after);

    Some(CheckboxLine {
        indent,
        bullet,
        status,
        text,
    })
}

pub fn is_checkbox_line(line: &str) -> bool {
    parse_checkbox(line).is_some()
}

/// Human-readable action text for a line: bullet, checkbox, sphere/context
/// tags and any `extra_tags` removed, surrounding whitespace trimmed.
pub fn display_text(line: &str, extra_tags: &[&str]) -> String {
    let text = match parse_checkbox(line) {
        Some(cb) => cb.text.to_string(),
        None => {
            let t = line.trim_start();
            t.strip_prefix("- ")
                .or_else(|| t.strip_prefix("* "))
                .unwrap_or(t)
                .to_string()
        }
    };
    let mut text = SCOPE_TAG_RE.replace_all(&text, "").into_owned();
    for tag in extra_tags {
        if let Some(stripped) = strip_tag(&text, tag) {
            text = stripped;
        }
    }
    text.trim().to_string()
}

/// The sphere named by the first `#sphere/<name>` tag on the line.
pub fn sphere_of(line: &str) -> Option<String> {
    SPHERE_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rewrite the status character of a checkbox line, leaving every other
/// byte alone. Returns `None` if the line is not a checkbox line.
pub fn set_status(line: &str, status: CheckboxStatus) -> Option<String> {
    let cb = parse_checkbox(line)?;
    // `<indent><bullet> [` precedes the status; the bullet is one byte
    let at = cb.indent.len() + 3;
    let rest = &line[at + cb.status.len_utf8()..];
    Some(format!("{}{}{}", &line[..at], status.to_char(), rest))
}

/// Byte offsets of every whole-token occurrence of `tag` in `line`.
fn tag_positions(line: &str, tag: &str) -> Vec<usize> {
    if tag.is_empty() {
        return Vec::new();
    }
    line.match_indices(tag)
        .map(|(pos, _)| pos)
        .filter(|&pos| {
            let before_ok = line[..pos]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace);
            let after_ok = line[pos + tag.len()..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace);
            before_ok && after_ok
        })
        .collect()
}

/// Whether `tag` appears in `line` as a whole whitespace-delimited token.
pub fn has_tag(line: &str, tag: &str) -> bool {
    !tag_positions(line, tag).is_empty()
}

/// Remove every whole-token occurrence of `tag` from `line`, along with the
/// one space its removal would leave doubled (or dangling at the end).
/// Everything else on the line is kept byte-for-byte.
/// Returns `None` if the tag does not occur.
pub fn strip_tag(line: &str, tag: &str) -> Option<String> {
    let positions = tag_positions(line, tag);
    if positions.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for pos in positions {
        out.push_str(&line[cursor..pos]);
        cursor = pos + tag.len();
        let after = &line[cursor..];
        if out.ends_with(' ') && (after.is_empty() || after.starts_with(' ')) {
            out.pop();
        }
    }
    out.push_str(&line[cursor..]);
    Some(out)
}

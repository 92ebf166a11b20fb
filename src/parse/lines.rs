/// Split text into lines for 1-based addressing.
///
/// Splits on `\n` and drops a trailing `\r` from each line, so `\r\n` files
/// address the same lines as `\n` files. A final empty segment is kept:
/// `"a\n"` is two lines (`"a"` and `""`), which keeps line numbers stable
/// whether or not the file ends with a newline.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Return the content of the 1-based line `line_number`, if it exists.
pub fn line_at(text: &str, line_number: usize) -> Option<&str> {
    if line_number == 0 {
        return None;
    }
    split_lines(text).get(line_number - 1).copied()
}

/// Replace the 1-based line `line_number` with `new_line`, keeping that
/// line's original ending and every other byte of the text.
/// Returns `None` when the line does not exist.
pub fn replace_line(text: &str, line_number: usize, new_line: &str) -> Option<String> {
    if line_number == 0 {
        return None;
    }
    let mut segments: Vec<&str> = text.split('\n').collect();
    let idx = line_number - 1;
    let old = *segments.get(idx)?;
    let replacement = if old.ends_with('\r') {
        format!("{}\r", new_line)
    } else {
        new_line.to_string()
    };
    let mut out = String::with_capacity(text.len() + new_line.len());
    for (i, seg) in segments.drain(..).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if i == idx {
            out.push_str(&replacement);
        } else {
            out.push_str(seg);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_keeps_trailing_empty_segment() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b", ""]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
    }

    #[test]
    fn split_strips_carriage_returns() {
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b", ""]);
    }

    #[test]
    fn split_empty_text_is_one_empty_line() {
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn line_at_is_one_based() {
        assert_eq!(line_at("x\ny\nz", 1), Some("x"));
        assert_eq!(line_at("x\ny\nz", 3), Some("z"));
        assert_eq!(line_at("x\ny\nz", 4), None);
        assert_eq!(line_at("x\ny\nz", 0), None);
    }

    #[test]
    fn replace_line_preserves_other_lines() {
        let out = replace_line("# T\n- [ ] a\n- [ ] b\n", 2, "- [x] a").unwrap();
        assert_eq!(out, "# T\n- [x] a\n- [ ] b\n");
    }

    #[test]
    fn replace_line_preserves_crlf() {
        let out = replace_line("a\r\nb\r\nc", 2, "B").unwrap();
        assert_eq!(out, "a\r\nB\r\nc");
    }

    #[test]
    fn replace_line_out_of_range() {
        assert!(replace_line("a\nb", 3, "c").is_none());
        assert!(replace_line("a\nb", 0, "c").is_none());
    }
}

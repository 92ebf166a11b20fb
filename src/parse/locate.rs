use crate::parse::lines::split_lines;

/// Where a previously captured line sits in the current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Still at the expected 1-based line
    ExactMatch(usize),
    /// Found verbatim at a different 1-based line (first occurrence)
    Moved(usize),
    /// No line equals the captured content
    NotFound,
}

impl Location {
    /// The current 1-based line number, if the line still exists.
    pub fn line_number(self) -> Option<usize> {
        match self {
            Location::ExactMatch(n) | Location::Moved(n) => Some(n),
            Location::NotFound => None,
        }
    }
}

/// Find the current position of a captured line.
///
/// Comparison is exact (no trimming). Any edit to the line itself, a
/// checkbox being ticked included, makes it `NotFound`. The expected
/// position wins over an identical line elsewhere; otherwise the first
/// occurrence from the top wins.
pub fn locate(full_text: &str, expected_line_number: usize, expected_content: &str) -> Location {
    let lines = split_lines(full_text);

    if expected_line_number >= 1
        && lines.get(expected_line_number - 1) == Some(&expected_content)
    {
        return Location::ExactMatch(expected_line_number);
    }

    match lines.iter().position(|l| *l == expected_content) {
        Some(idx) => Location::Moved(idx + 1),
        None => Location::NotFound,
    }
}

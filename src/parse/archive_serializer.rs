use chrono::{DateTime, TimeZone};

use crate::model::item::TrackedItem;

/// Line written when a clear ran with nothing on the hotlist.
pub const EMPTY_PLACEHOLDER: &str = "- No items on the hotlist";

/// Render one archive entry: a heading stamped with the clear time, then a
/// bullet per item (or the placeholder). Ends with a blank line so entries
/// stay separated when stacked.
pub fn format_archive_entry<Tz: TimeZone>(items: &[TrackedItem], cleared_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = format!(
        "## Cleared {} at {}\n\n",
        cleared_at.format("%-d %B %Y"),
        cleared_at.format("%H:%M")
    );
    if items.is_empty() {
        out.push_str(EMPTY_PLACEHOLDER);
        out.push('\n');
    } else {
        for item in items {
            out.push_str(&format_archive_bullet(item));
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Project actions link to their file and follow with the text; general
/// actions use the text as the link label.
pub fn format_archive_bullet(item: &TrackedItem) -> String {
    let target = link_target(&item.file_path);
    if item.is_general_action {
        format!("- [[{}|{}]]", target, item.display_text)
    } else {
        format!("- [[{}]] {}", target, item.display_text)
    }
}

/// Wiki-link target for a vault path: the path without its `.md` extension.
pub fn link_target(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}

/// Put a new entry above whatever the archive already holds.
pub fn prepend_entry(entry: &str, existing: &str) -> String {
    if existing.is_empty() {
        return entry.to_string();
    }
    let mut out = String::with_capacity(entry.len() + existing.len());
    out.push_str(entry);
    out.push_str(existing);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn cleared_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 15, 3, 0, 0)
            .unwrap()
    }

    fn items() -> Vec<TrackedItem> {
        let project = TrackedItem::new(
            "Projects/Website.md",
            7,
            "- [ ] Draft copy",
            "Draft copy",
            1,
        );
        let mut general = TrackedItem::new(
            "Next Actions.md",
            2,
            "- [ ] Call plumber #sphere/home",
            "Call plumber",
            2,
        );
        general.is_general_action = true;
        vec![project, general]
    }

    #[test]
    fn entry_with_items() {
        let entry = format_archive_entry(&items(), &cleared_at());
        assert_snapshot!(entry.trim_end(), @r"
        ## Cleared 15 October 2025 at 03:00

        - [[Projects/Website]] Draft copy
        - [[Next Actions|Call plumber]]
        ");
    }

    #[test]
    fn entry_without_items_has_placeholder() {
        let entry = format_archive_entry(&[], &cleared_at());
        assert_eq!(
            entry,
            "## Cleared 15 October 2025 at 03:00\n\n- No items on the hotlist\n\n"
        );
    }

    #[test]
    fn single_digit_day_has_no_padding() {
        let at = Utc.with_ymd_and_hms(2025, 3, 5, 21, 7, 0).unwrap();
        let entry = format_archive_entry(&[], &at);
        assert!(entry.starts_with("## Cleared 5 March 2025 at 21:07\n"));
    }

    #[test]
    fn link_target_strips_md_only() {
        assert_eq!(link_target("Projects/A.md"), "Projects/A");
        assert_eq!(link_target("notes.txt"), "notes.txt");
    }

    #[test]
    fn prepend_keeps_existing_content_intact() {
        let existing = "## Cleared 14 October 2025 at 03:00\n\n- old\n";
        let out = prepend_entry("## new\n\n", existing);
        assert!(out.starts_with("## new\n\n"));
        assert!(out.ends_with(existing));
    }

    #[test]
    fn prepend_into_empty_file() {
        assert_eq!(prepend_entry("## new\n", ""), "## new\n");
    }
}

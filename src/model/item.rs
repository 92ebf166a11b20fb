use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Checkbox state, the character inside `[ ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckboxStatus {
    Todo,
    Done,
    Waiting,
    /// Any other status character some plugins use (`>`, `-`, `/`, …)
    Other(char),
}

impl CheckboxStatus {
    pub fn from_char(c: char) -> Self {
        match c {
            ' ' => CheckboxStatus::Todo,
            'x' | 'X' => CheckboxStatus::Done,
            'w' => CheckboxStatus::Waiting,
            other => CheckboxStatus::Other(other),
        }
    }

    /// The character written inside the checkbox
    pub fn to_char(self) -> char {
        match self {
            CheckboxStatus::Todo => ' ',
            CheckboxStatus::Done => 'x',
            CheckboxStatus::Waiting => 'w',
            CheckboxStatus::Other(c) => c,
        }
    }
}

/// Unique identifier generated when an item is first tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        ItemId(Uuid::new_v4())
    }

    /// First 8 hex digits, enough to address an item from the CLI
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        ItemId::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An action on the hotlist, bound to one line of one markdown file.
///
/// `line_content` is the exact text of the line when it was captured or last
/// reconciled. It is the key used to find the line again, so it is never
/// refreshed from the file unless the line is rewritten through this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    /// Records written before ids existed get a fresh one on load
    #[serde(default)]
    pub id: ItemId,
    pub file_path: String,
    /// 1-based
    pub line_number: usize,
    pub line_content: String,
    pub display_text: String,
    /// Sphere or project key, used for grouping only
    #[serde(default, alias = "sphere")]
    pub category: String,
    #[serde(default)]
    pub is_general_action: bool,
    #[serde(default)]
    pub is_pinned: bool,
    /// Epoch milliseconds
    pub added_at: i64,
    /// Epoch milliseconds; only set by stores that retain completed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl TrackedItem {
    pub fn new(
        file_path: impl Into<String>,
        line_number: usize,
        line_content: impl Into<String>,
        display_text: impl Into<String>,
        added_at: i64,
    ) -> Self {
        TrackedItem {
            id: ItemId::new(),
            file_path: file_path.into(),
            line_number,
            line_content: line_content.into(),
            display_text: display_text.into(),
            category: String::new(),
            is_general_action: false,
            is_pinned: false,
            added_at,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether this item matches a legacy `(file, line, added)` address
    pub fn matches_legacy(&self, file_path: &str, line_number: usize, added_at: i64) -> bool {
        self.file_path == file_path && self.line_number == line_number && self.added_at == added_at
    }
}

/// How callers address an item in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Id(ItemId),
    /// Composite address used before ids existed. Not guaranteed unique:
    /// resolves to the first match in store order.
    Legacy {
        file_path: String,
        line_number: usize,
        added_at: i64,
    },
}

impl From<ItemId> for ItemRef {
    fn from(id: ItemId) -> Self {
        ItemRef::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_status_chars() {
        assert_eq!(CheckboxStatus::from_char(' '), CheckboxStatus::Todo);
        assert_eq!(CheckboxStatus::from_char('x'), CheckboxStatus::Done);
        assert_eq!(CheckboxStatus::from_char('X'), CheckboxStatus::Done);
        assert_eq!(CheckboxStatus::from_char('w'), CheckboxStatus::Waiting);
        assert_eq!(CheckboxStatus::from_char('>'), CheckboxStatus::Other('>'));
        assert_eq!(CheckboxStatus::Done.to_char(), 'x');
        assert_eq!(CheckboxStatus::Other('/').to_char(), '/');
    }

    #[test]
    fn ids_are_unique_and_short_form_is_prefix() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
        assert!(a.to_string().replace('-', "").starts_with(&a.short()));
    }

    #[test]
    fn record_without_id_or_flags_gets_defaults() {
        let json = r#"{"filePath":"A.md","lineNumber":3,"lineContent":"- [ ] a","displayText":"a","sphere":"work","addedAt":5}"#;
        let item: TrackedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, "work");
        assert!(!item.is_pinned);
        assert!(!item.is_general_action);
        assert!(item.completed_at.is_none());
    }

    #[test]
    fn matches_legacy_address() {
        let item = TrackedItem::new("A.md", 3, "- [ ] a", "a", 42);
        assert!(item.matches_legacy("A.md", 3, 42));
        assert!(!item.matches_legacy("A.md", 4, 42));
    }
}

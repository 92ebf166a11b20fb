use serde_json::Value;

use crate::model::item::TrackedItem;

/// Which on-disk layout a store file used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    /// One JSON record per line
    Lines,
    /// A single JSON document holding every item
    LegacyBlob,
}

/// A line (or legacy blob element) that could not be parsed as a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    /// 1-based line number in the store file, or the 1-based element
    /// position for a legacy blob
    pub line_number: usize,
    pub content: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ParsedStore {
    pub items: Vec<TrackedItem>,
    pub dropped: Vec<DroppedRecord>,
    pub format: StoreFormat,
    /// Records that had no `id` and were given a fresh one
    pub missing_ids: usize,
}

impl ParsedStore {
    /// Whether the file should be rewritten in the current layout
    pub fn needs_upgrade(&self) -> bool {
        self.format == StoreFormat::LegacyBlob || self.missing_ids > 0
    }
}

/// Keys a legacy `{ "...": [items] }` envelope stored its array under.
const ENVELOPE_KEYS: [&str; 3] = ["items", "hotlist", "hotlistItems"];

/// Parse a store file.
///
/// Empty or whitespace-only text is an empty store. A whole-file JSON array
/// or `{"items": [...]}` object is the legacy blob layout; its elements are
/// read one at a time so a bad element only drops itself. Anything else is
/// read line by line; blank lines are skipped and malformed lines are
/// returned in `dropped` without affecting the rest.
pub fn parse_store(text: &str) -> ParsedStore {
    if text.trim().is_empty() {
        return ParsedStore {
            items: Vec::new(),
            dropped: Vec::new(),
            format: StoreFormat::Lines,
            missing_ids: 0,
        };
    }

    let mut parsed = ParsedStore {
        items: Vec::new(),
        dropped: Vec::new(),
        format: StoreFormat::Lines,
        missing_ids: 0,
    };

    if let Some(elements) = legacy_blob_elements(text) {
        parsed.format = StoreFormat::LegacyBlob;
        for (idx, value) in elements.into_iter().enumerate() {
            let content = value.to_string();
            parsed.push(idx + 1, content, record_from_value(value));
        }
        return parsed;
    }

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str(trimmed).and_then(record_from_value);
        parsed.push(idx + 1, line.to_string(), record);
    }
    parsed
}

impl ParsedStore {
    fn push(
        &mut self,
        line_number: usize,
        content: String,
        record: Result<(TrackedItem, bool), serde_json::Error>,
    ) {
        match record {
            Ok((item, had_id)) => {
                if !had_id {
                    self.missing_ids += 1;
                }
                self.items.push(item);
            }
            Err(e) => self.dropped.push(DroppedRecord {
                line_number,
                content,
                error: e.to_string(),
            }),
        }
    }
}

/// Deserialize one record, reporting whether it carried its own id.
fn record_from_value(value: Value) -> Result<(TrackedItem, bool), serde_json::Error> {
    let had_id = value.get("id").is_some();
    let item = serde_json::from_value(value)?;
    Ok((item, had_id))
}

/// The raw elements of a legacy blob, or `None` when `text` is not one.
fn legacy_blob_elements(text: &str) -> Option<Vec<Value>> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('[') && !trimmed.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(elements) => Some(elements),
        // A single-record line file is also a JSON object, so only treat an
        // object as a blob when it carries an items array.
        Value::Object(mut map) => ENVELOPE_KEYS.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(elements)) => Some(elements),
            _ => None,
        }),
        _ => None,
    }
}

/// Serialize items one record per line, each line newline-terminated.
pub fn serialize_store<'a>(items: impl IntoIterator<Item = &'a TrackedItem>) -> String {
    let mut out = String::new();
    for item in items {
        // TrackedItem has only string/number/bool fields; this cannot fail
        if let Ok(line) = serde_json::to_string(item) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

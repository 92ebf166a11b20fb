use crate::io::vault::{Vault, VaultError};
use crate::parse::checkbox::{display_text, parse_checkbox};
use crate::parse::lines::split_lines;

/// A checkbox line whose action text matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundAction {
    /// 1-based
    pub line_number: usize,
    /// The raw line, unmodified
    pub line_content: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FindError {
    #[error("File not found")]
    FileNotFound,
    #[error("Action not found in file")]
    ActionNotFound,
}

/// Find the first checkbox line whose action text equals `action_text`.
///
/// The line's text is compared after removing the bullet, checkbox,
/// sphere/context tags and any `extra_tags`. Surrounding whitespace on both
/// sides is ignored; the comparison is otherwise exact and case-sensitive.
pub fn find_action_line(
    file_content: &str,
    action_text: &str,
    extra_tags: &[&str],
) -> Result<FoundAction, FindError> {
    let wanted = action_text.trim();
    split_lines(file_content)
        .into_iter()
        .enumerate()
        .find(|(_, line)| {
            parse_checkbox(line).is_some() && display_text(line, extra_tags) == wanted
        })
        .map(|(idx, line)| FoundAction {
            line_number: idx + 1,
            line_content: line.to_string(),
        })
        .ok_or(FindError::ActionNotFound)
}

/// Resolve `path` in the vault, then scan it for the action.
/// A missing file is reported before any line is read.
pub fn find_action_in_vault<V: Vault + ?Sized>(
    vault: &V,
    path: &str,
    action_text: &str,
    extra_tags: &[&str],
) -> Result<FoundAction, FindError> {
    if !vault.exists(path) {
        return Err(FindError::FileNotFound);
    }
    let content = match vault.read(path) {
        Ok(c) => c,
        Err(VaultError::NotFound(_)) => return Err(FindError::FileNotFound),
        Err(e) => {
            tracing::warn!(path, error = %e, "could not read file while finding action");
            return Err(FindError::FileNotFound);
        }
    };
    find_action_line(&content, action_text, extra_tags)
}

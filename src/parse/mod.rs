pub mod action_finder;
pub mod archive_serializer;
pub mod checkbox;
pub mod lines;
pub mod locate;
pub mod store_codec;

pub use action_finder::{FindError, FoundAction, find_action_in_vault, find_action_line};
pub use archive_serializer::format_archive_entry;
pub use checkbox::{display_text, parse_checkbox, set_status, sphere_of, strip_tag};
pub use lines::{replace_line, split_lines};
pub use locate::{Location, locate};
pub use store_codec::{parse_store, serialize_store};

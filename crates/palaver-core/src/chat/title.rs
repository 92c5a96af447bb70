//! Chat title derivation from the first user message.

use palaver_types::chat::DERIVED_TITLE_MAX_CHARS;

/// Derive a chat title from a message: its first 50 characters, with
/// `"..."` appended when the message was longer.
///
/// Counts `char`s, not bytes, so multi-byte text is never split.
pub fn derive_title(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(DERIVED_TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// Output formatting: colored terminal tables and JSON.

pub mod terminal;

use anyhow::Result;
use serde::Serialize;

/// Shorten text to at most `max_chars` characters, marking the cut with "...".
///
/// Counts characters rather than bytes, so titles with emoji or accented
/// letters never split mid-character.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Pretty-printed JSON for `--json` output.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("Fog", 10), "Fog");
        assert_eq!(preview("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        assert_eq!(preview("Café au lait", 4), "Café...");
        assert_eq!(preview("📷📷📷", 2), "📷📷...");
    }
}

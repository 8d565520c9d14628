use crate::types::TranscriptItem;

/// Join caption fragments into one blob: each trimmed, single-space separated, in order.
pub fn combine_transcript(items: &[TranscriptItem]) -> String {
    items
        .iter()
        .map(|item| item.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rough token count used to decide whether a prompt fits the model context.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// First `max_chars` characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

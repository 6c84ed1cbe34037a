//! Input token budget enforcement.
//!
//! Trims a message list to fit an input-token budget. The system
//! instruction always survives, whole turns are kept newest-to-oldest
//! while they fit, and if even the single newest turn would exceed the
//! remaining budget its text is truncated to fit rather than dropped.

use crate::domain::coaching::{ChatMessage, ChatRole};

/// Estimates token count with the cheap character-count heuristic the
/// providers use (~4 characters per token).
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() / 4).max(1) as u32
}

/// Trims `turns` to fit `budget_tokens` together with the system message.
///
/// Returns the system message followed by the surviving turns in
/// chronological order. At least one turn always survives, truncated if
/// necessary; the estimated total never exceeds the budget unless the
/// system message alone does.
pub fn fit_to_budget(
    system: &ChatMessage,
    turns: &[ChatMessage],
    budget_tokens: u32,
) -> Vec<ChatMessage> {
    let system_cost = estimate_tokens(&system.content);
    let mut remaining = budget_tokens.saturating_sub(system_cost);

    let mut kept: Vec<ChatMessage> = Vec::new();
    for turn in turns.iter().rev() {
        let cost = estimate_tokens(&turn.content);
        if cost <= remaining {
            kept.push(turn.clone());
            remaining -= cost;
        } else {
            break;
        }
    }

    // Even the newest turn was over budget: truncate it instead of
    // dropping it, so the model always sees the user's latest words.
    if kept.is_empty() {
        if let Some(newest) = turns.last() {
            let max_chars = (remaining as usize) * 4;
            let truncated = truncate_chars(&newest.content, max_chars);
            kept.push(ChatMessage::new(newest.role, truncated));
        }
    }

    let mut result = Vec::with_capacity(kept.len() + 1);
    result.push(ChatMessage::new(ChatRole::System, system.content.clone()));
    result.extend(kept.into_iter().rev());
    result
}

/// Truncates on a char boundary so multi-byte text cannot panic.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

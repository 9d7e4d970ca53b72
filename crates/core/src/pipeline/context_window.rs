//! Conversation context window
//!
//! Reduces an unbounded ordered history of turns to a bounded, role-tagged
//! text block suitable for prompting. Pure; no failure cases.

use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Vietnamese label used when rendering prompts
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Người dùng",
            Role::Assistant => "Trợ lý",
        }
    }
}

/// One role-tagged message in a conversation. Immutable once created;
/// ordering within a history is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Maximum turns rendered into the context block
pub const MAX_CONTEXT_TURNS: usize = 10;

/// Build a prompt-ready context block from a history and the current
/// utterance.
///
/// With an empty history the block is a single labeled line. Otherwise the
/// last [`MAX_CONTEXT_TURNS`] turns are rendered oldest-first under a
/// history header, followed by the current utterance as a labeled line.
pub fn build(history: &[Turn], current_message: &str) -> String {
    if history.is_empty() {
        return format!("{}: {}", Role::User.label(), current_message);
    }

    let start = history.len().saturating_sub(MAX_CONTEXT_TURNS);

    let mut context = String::from("LỊCH SỬ HỘI THOẠI:\n");
    for turn in &history[start..] {
        context.push_str(&format!("{}: {}\n", turn.role.label(), turn.text));
    }

    context.push_str(&format!(
        "\nTIN NHẮN HIỆN TẠI:\n{}: {}",
        Role::User.label(),
        current_message
    ));
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("msg-{}", i))
                } else {
                    Turn::assistant(format!("msg-{}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_empty_history_single_line() {
        let block = build(&[], "tôi bị đau đầu");
        assert_eq!(block, "Người dùng: tôi bị đau đầu");
        assert_eq!(block.lines().count(), 1);
    }

    #[test]
    fn test_short_history_includes_every_turn() {
        let history = history_of(4);
        let block = build(&history, "hiện tại");
        for turn in &history {
            assert!(block.contains(&turn.text));
        }
        assert!(block.contains("LỊCH SỬ HỘI THOẠI:"));
        assert!(block.ends_with("Người dùng: hiện tại"));
    }

    #[test]
    fn test_long_history_keeps_last_ten_in_order() {
        let history = history_of(15);
        let block = build(&history, "hiện tại");

        for i in 0..5 {
            assert!(!block.contains(&format!("msg-{}\n", i)));
        }
        for i in 5..15 {
            assert!(block.contains(&format!("msg-{}", i)));
        }

        // Oldest of the kept turns renders before the newest
        let first = block.find("msg-5").unwrap();
        let last = block.find("msg-14").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_role_labels() {
        let history = vec![Turn::user("hỏi"), Turn::assistant("đáp")];
        let block = build(&history, "tiếp");
        assert!(block.contains("Người dùng: hỏi"));
        assert!(block.contains("Trợ lý: đáp"));
    }
}

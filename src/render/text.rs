use crate::models::{Participant, Turn};
use crate::stages::parse::resolve_participant;

/// Terminal-friendly transcript view
pub struct PlainTranscript<'a> {
    turns: &'a [Turn],
    participants: &'a [Participant],
    width: usize,
}

impl<'a> PlainTranscript<'a> {
    pub fn new(turns: &'a [Turn], participants: &'a [Participant]) -> Self {
        Self {
            turns,
            participants,
            width: 60,
        }
    }

    /// Format the transcript as wrapped text blocks
    pub fn format(&self) -> String {
        let mut output = String::new();

        for turn in self.turns {
            let number = resolve_participant(&turn.participant_code, self.participants)
                .filter(|_| !turn.is_moderator())
                .and_then(|p| self.participants.iter().position(|c| c.id == p.id))
                .map(|i| format!(" #{}", i + 1))
                .unwrap_or_default();

            output.push_str(&format!(
                "[第 {} 輪 {}] {}{}:\n",
                turn.round,
                turn.timestamp.format("%H:%M"),
                turn.participant_code,
                number
            ));
            output.push_str(&wrap_text(&turn.content, self.width));
            output.push_str("\n\n");
        }

        output
    }
}

/// Wrap text at the given width, counted in characters
///
/// Whitespace-separated words are kept whole; runs without spaces (CJK
/// text) are broken at the width.
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + word_len + 1 > width {
            result.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }

        for c in word.chars() {
            if line_len >= width {
                result.push('\n');
                line_len = 0;
            }
            result.push(c);
            line_len += 1;
        }
    }

    result
}

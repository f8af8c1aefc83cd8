use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Participant id assigned to turns whose speaker label matched nobody
pub const UNKNOWN_PARTICIPANT_ID: &str = "unknown";

/// Speaker label reserved for the moderator
pub const MODERATOR_CODE: &str = "主持人";

/// A `(speaker label, content)` pair extracted from one transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerLine {
    pub label: String,
    pub content: String,
}

/// One parsed utterance with its round number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Position in parse order, starting at 0 on every pass
    pub id: usize,
    /// Resolved participant id, or [`UNKNOWN_PARTICIPANT_ID`]
    pub participant_id: String,
    /// Speaker label exactly as it appeared in the text
    pub participant_code: String,
    pub content: String,
    /// When the turn was first observed
    pub timestamp: DateTime<Utc>,
    /// 1-based discussion round
    pub round: u32,
}

impl Turn {
    pub fn is_moderator(&self) -> bool {
        self.participant_code == MODERATOR_CODE
    }

    pub fn is_unknown(&self) -> bool {
        self.participant_id == UNKNOWN_PARTICIPANT_ID
    }
}

/// Result of one parse pass over the raw buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// All turns in order
    pub turns: Vec<Turn>,
    /// Non-empty lines that did not match the line grammar
    pub skipped: Vec<String>,
}

impl ParsedTranscript {
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Round of the latest turn, 0 before anything was parsed
    pub fn current_round(&self) -> u32 {
        self.turns.last().map(|t| t.round).unwrap_or(0)
    }
}

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::models::{
    ParsedTranscript, Participant, SpeakerLine, Turn, UNKNOWN_PARTICIPANT_ID,
};

/// `[label]: (optional annotation) content`
fn line_pattern() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^\[([^\]]+)\]:\s*(?:\([^)]+\)\s*)?(.+)$").expect("valid regex")
    })
}

/// Apply the line grammar to a single line
///
/// Returns `None` for lines that do not match from the start.
pub fn parse_line(line: &str) -> Option<SpeakerLine> {
    let caps = line_pattern().captures(line)?;
    Some(SpeakerLine {
        label: caps.get(1)?.as_str().trim().to_string(),
        content: caps.get(2)?.as_str().trim().to_string(),
    })
}

/// Split text into lines, dropping those that are blank
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').filter(|line| !line.trim().is_empty())
}

/// Extract speaker lines from text, collecting the lines that were skipped
pub fn extract_speaker_lines(text: &str) -> (Vec<SpeakerLine>, Vec<String>) {
    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for line in non_empty_lines(text) {
        match parse_line(line) {
            Some(parsed) => lines.push(parsed),
            None => skipped.push(line.to_string()),
        }
    }

    (lines, skipped)
}

/// Resolve a speaker label to a known participant
///
/// Exact match on `name` across the roster first, then on `role`.
pub fn resolve_participant<'p>(
    label: &str,
    participants: &'p [Participant],
) -> Option<&'p Participant> {
    participants
        .iter()
        .find(|p| p.name == label)
        .or_else(|| participants.iter().find(|p| p.role == label))
}

/// Round number for the turn at `index`
pub fn round_for_index(index: usize, participant_count: usize) -> u32 {
    (index / participant_count.max(1)) as u32 + 1
}

/// Build the turn sequence with sequential ids and rounds
pub fn assign_rounds(
    lines: &[SpeakerLine],
    participants: &[Participant],
    timestamp: DateTime<Utc>,
) -> Vec<Turn> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| Turn {
            id: index,
            participant_id: resolve_participant(&line.label, participants)
                .map(|p| p.id.clone())
                .unwrap_or_else(|| UNKNOWN_PARTICIPANT_ID.to_string()),
            participant_code: line.label.clone(),
            content: line.content.clone(),
            timestamp,
            round: round_for_index(index, participants.len()),
        })
        .collect()
}

/// Parse the whole buffer from scratch
///
/// Every turn is stamped with `timestamp`.
pub fn parse_transcript(
    text: &str,
    participants: &[Participant],
    timestamp: DateTime<Utc>,
) -> ParsedTranscript {
    let (lines, skipped) = extract_speaker_lines(text);
    if !skipped.is_empty() {
        debug!("Skipped {} line(s) not matching the turn grammar", skipped.len());
    }

    ParsedTranscript {
        turns: assign_rounds(&lines, participants, timestamp),
        skipped,
    }
}

/// Parser for an append-only buffer that only re-reads the unterminated tail
///
/// Lines ending in a newline never change once written, so their parse is
/// cached. The output is identical to [`parse_transcript`] on the same text,
/// except that each turn keeps the timestamp of the pass that first saw it.
#[derive(Debug, Default)]
pub struct IncrementalParser {
    /// Byte offset just past the last newline already parsed
    parsed_upto: usize,
    lines: Vec<SpeakerLine>,
    skipped: Vec<String>,
    first_seen: Vec<DateTime<Utc>>,
}

impl IncrementalParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all cached state, ready for a new buffer
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse the current buffer
    ///
    /// `text` must extend the text given on the previous call; anything else
    /// triggers a reset and a full reparse.
    pub fn parse(
        &mut self,
        text: &str,
        participants: &[Participant],
        now: DateTime<Utc>,
    ) -> ParsedTranscript {
        if text.len() < self.parsed_upto || !text.is_char_boundary(self.parsed_upto) {
            debug!("Buffer no longer extends the parsed prefix, reparsing from scratch");
            self.reset();
        }

        let unread = &text[self.parsed_upto..];
        let tail = match unread.rfind('\n') {
            Some(pos) => {
                let (complete, tail) = unread.split_at(pos + 1);
                let (lines, skipped) = extract_speaker_lines(complete);
                self.lines.extend(lines);
                self.skipped.extend(skipped);
                self.parsed_upto += complete.len();
                tail
            }
            None => unread,
        };

        let (tail_lines, tail_skipped) = extract_speaker_lines(tail);
        let mut lines = self.lines.clone();
        lines.extend(tail_lines);
        let mut skipped = self.skipped.clone();
        skipped.extend(tail_skipped);

        let mut turns = assign_rounds(&lines, participants, now);
        self.first_seen.truncate(turns.len());
        for turn in turns.iter_mut() {
            match self.first_seen.get(turn.id) {
                Some(seen) => turn.timestamp = *seen,
                None => self.first_seen.push(now),
            }
        }

        debug!(
            "Parsed {} turn(s), {} skipped line(s), {} cached bytes",
            turns.len(),
            skipped.len(),
            self.parsed_upto
        );

        ParsedTranscript { turns, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn roster() -> Vec<Participant> {
        vec![
            Participant {
                id: "p1".to_string(),
                name: "王小明".to_string(),
                role: "工程師".to_string(),
                tags: vec!["男".to_string()],
                system_prompt: String::new(),
            },
            Participant {
                id: "p2".to_string(),
                name: "林美華".to_string(),
                role: "設計師".to_string(),
                tags: vec!["女".to_string()],
                system_prompt: String::new(),
            },
            Participant {
                id: "p3".to_string(),
                name: "陳大同".to_string(),
                role: "主管".to_string(),
                tags: vec![],
                system_prompt: String::new(),
            },
        ]
    }

    #[test]
    fn test_parse_line_with_annotation() {
        let line = parse_line("[ 林美華 ]: (笑) 我覺得可以 ").unwrap();
        assert_eq!(line.label, "林美華");
        assert_eq!(line.content, "我覺得可以");
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(parse_line("random text without brackets").is_none());
        assert!(parse_line("  [王小明]: 前面有空白").is_none());
        assert!(parse_line("[王小明] 少了冒號").is_none());
        assert!(parse_line("[]: 空標籤").is_none());
    }

    #[test]
    fn test_parse_line_keeps_crlf_content_trimmed() {
        let line = parse_line("[主持人]: 歡迎大家\r").unwrap();
        assert_eq!(line.content, "歡迎大家");
    }

    #[test]
    fn test_resolve_prefers_name_over_role() {
        let mut participants = roster();
        // p1's role collides with p2's name
        participants[0].role = "林美華".to_string();

        let resolved = resolve_participant("林美華", &participants).unwrap();
        assert_eq!(resolved.id, "p2");
        assert_eq!(resolve_participant("主管", &participants).unwrap().id, "p3");
        assert!(resolve_participant("王小", &participants).is_none());
    }

    #[test]
    fn test_round_formula() {
        let text: String = (0..9)
            .map(|i| format!("[王小明]: 第{}句\n", i))
            .collect();
        let parsed = parse_transcript(&text, &roster(), stamp());

        let rounds: Vec<u32> = parsed.turns.iter().map(|t| t.round).collect();
        assert_eq!(rounds, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
        let ids: Vec<usize> = parsed.turns.iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_round_with_empty_roster() {
        let parsed = parse_transcript("[甲]: 一\n[乙]: 二\n", &[], stamp());
        assert_eq!(parsed.turns[0].round, 1);
        assert_eq!(parsed.turns[1].round, 2);
    }

    #[test]
    fn test_unknown_speaker() {
        let parsed = parse_transcript("[陌生人]: 你好", &roster(), stamp());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.turns[0].participant_id, UNKNOWN_PARTICIPANT_ID);
        assert_eq!(parsed.turns[0].participant_code, "陌生人");
        assert_eq!(parsed.turns[0].content, "你好");
    }

    #[test]
    fn test_resolved_by_role_keeps_raw_label() {
        let parsed = parse_transcript("[設計師]: 我補充一下", &roster(), stamp());
        assert_eq!(parsed.turns[0].participant_id, "p2");
        assert_eq!(parsed.turns[0].participant_code, "設計師");
    }

    #[test]
    fn test_malformed_line_does_not_shift_rounds() {
        let text = "[王小明]: 一\n[林美華]: 二\nrandom text without brackets\n\n   \n[陳大同]: 三\n[王小明]: 四";
        let parsed = parse_transcript(text, &roster(), stamp());

        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed.skipped, vec!["random text without brackets"]);
        assert_eq!(parsed.turns[2].round, 1);
        assert_eq!(parsed.turns[3].round, 2);
        assert_eq!(parsed.turns[3].id, 3);
    }

    #[test]
    fn test_full_reparse_is_idempotent() {
        let text = "[主持人]: 歡迎\n[王小明]: 大家好\n[林美華]: (點頭) 你好\n";
        let first = parse_transcript(text, &roster(), stamp());
        let second = parse_transcript(text, &roster(), stamp());
        assert_eq!(first, second);
    }

    #[test]
    fn test_appending_lines_preserves_prefix() {
        let base = "[主持人]: 歡迎\n[王小明]: 大家好\n";
        let extended = format!("{}[林美華]: 你好\n[陳大同]: 開始吧\n", base);

        let before = parse_transcript(base, &roster(), stamp());
        let after = parse_transcript(&extended, &roster(), stamp());

        assert_eq!(after.turns[..before.len()], before.turns[..]);
        assert_eq!(after.len(), 4);
    }

    #[test]
    fn test_incremental_matches_full_reparse() {
        let text = "[主持人]: 歡迎各位\n雜訊\n[王小明]: (清喉嚨) 我先說\n\n[林美華]: 好的\n[陳大同]: 我同意\n[陌生人]: 路過";
        let participants = roster();
        let mut parser = IncrementalParser::new();

        // Feed in uneven pieces, including splits in the middle of a line
        let mut end = 0;
        for step in [5, 17, 1, 30, 3, 40, 200] {
            end = (end + step).min(text.len());
            while !text.is_char_boundary(end) {
                end += 1;
            }
            let incremental = parser.parse(&text[..end], &participants, stamp());
            let full = parse_transcript(&text[..end], &participants, stamp());
            assert_eq!(incremental, full, "mismatch at byte {}", end);
        }
    }

    #[test]
    fn test_incremental_keeps_first_seen_timestamps() {
        let participants = roster();
        let mut parser = IncrementalParser::new();
        let early = stamp();
        let later = early + chrono::Duration::seconds(5);

        let first = parser.parse("[王小明]: 我覺", &participants, early);
        assert_eq!(first.turns[0].timestamp, early);

        let second = parser.parse("[王小明]: 我覺得\n[林美華]: 嗯", &participants, later);
        assert_eq!(second.turns[0].timestamp, early);
        assert_eq!(second.turns[0].content, "我覺得");
        assert_eq!(second.turns[1].timestamp, later);
    }

    #[test]
    fn test_incremental_resets_on_shorter_buffer() {
        let participants = roster();
        let mut parser = IncrementalParser::new();
        parser.parse("[王小明]: 一\n[林美華]: 二\n", &participants, stamp());

        let parsed = parser.parse("[陳大同]: 三\n", &participants, stamp());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.turns[0].participant_id, "p3");
    }
}

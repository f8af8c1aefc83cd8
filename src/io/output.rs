use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Participant, Turn};
use crate::render::{AvatarContext, avatar_url, format_csv};
use crate::stages::parse::resolve_participant;

/// Machine-readable export of a transcript
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineTranscript {
    pub topic: String,
    pub turns: Vec<MachineTurn>,
    pub metadata: TranscriptMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineTurn {
    pub id: usize,
    pub round: u32,
    pub participant_id: String,
    pub participant_code: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Screen-context avatar for the speaker
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMetadata {
    pub total_turns: usize,
    pub unknown_speaker_turns: usize,
    pub skipped_lines: usize,
    pub current_round: u32,
    pub target_rounds: u32,
}

impl MachineTranscript {
    pub fn from_turns(
        topic: &str,
        turns: &[Turn],
        participants: &[Participant],
        metadata: TranscriptMetadata,
    ) -> Self {
        let turns = turns
            .iter()
            .map(|t| MachineTurn {
                id: t.id,
                round: t.round,
                participant_id: t.participant_id.clone(),
                participant_code: t.participant_code.clone(),
                content: t.content.clone(),
                timestamp: t.timestamp,
                avatar_url: avatar_url(
                    &t.participant_code,
                    resolve_participant(&t.participant_code, participants),
                    AvatarContext::Screen,
                ),
            })
            .collect();

        Self {
            topic: topic.to_string(),
            turns,
            metadata,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Default CSV file name, `chat-<unix millis>.csv`
pub fn default_csv_file_name(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("chat-{}.csv", now.timestamp_millis()))
}

/// Write turns as CSV
pub fn write_csv(turns: &[Turn], path: &Path) -> Result<()> {
    write_text(&format_csv(turns), path)
}

/// Write already-rendered text to a file
pub fn write_text(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_PARTICIPANT_ID;
    use chrono::TimeZone;

    fn turns(participant: &Participant) -> Vec<Turn> {
        vec![
            Turn {
                id: 0,
                participant_id: participant.id.clone(),
                participant_code: participant.name.clone(),
                content: "他說\"好\"".to_string(),
                timestamp: DateTime::<Utc>::UNIX_EPOCH,
                round: 1,
            },
            Turn {
                id: 1,
                participant_id: UNKNOWN_PARTICIPANT_ID.to_string(),
                participant_code: "陌生人".to_string(),
                content: "你好".to_string(),
                timestamp: DateTime::<Utc>::UNIX_EPOCH,
                round: 2,
            },
        ]
    }

    #[test]
    fn test_default_csv_file_name() {
        let now = Utc.timestamp_millis_opt(1_714_557_600_123).unwrap();
        assert_eq!(default_csv_file_name(now), PathBuf::from("chat-1714557600123.csv"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.csv");
        let participant = Participant::new("王小明", "工程師");

        write_csv(&turns(&participant), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with("2,\"陌生人\",\"你好\""));
    }

    #[test]
    fn test_machine_transcript_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        let participant = Participant::new("王小明", "工程師");
        let metadata = TranscriptMetadata {
            total_turns: 2,
            unknown_speaker_turns: 1,
            skipped_lines: 0,
            current_round: 2,
            target_rounds: 3,
        };

        let machine = MachineTranscript::from_turns(
            "遠距工作",
            &turns(&participant),
            std::slice::from_ref(&participant),
            metadata,
        );
        machine.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["topic"], "遠距工作");
        assert_eq!(value["metadata"]["unknownSpeakerTurns"], 1);
        let avatar = value["turns"][0]["avatarUrl"].as_str().unwrap();
        assert!(avatar.contains(&participant.id));
        assert!(avatar.ends_with("backgroundColor=ffffff"));
    }
}

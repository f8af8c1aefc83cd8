use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::io::{MachineTranscript, TranscriptMetadata, write_csv, write_text};
use crate::models::{ParsedTranscript, SessionSettings};
use crate::render::{PlainTranscript, PrintConfig, PrintTrigger, print_document, render_document};

/// Which artifacts to write
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub generate_csv: bool,
    pub generate_json: bool,
    pub generate_document: bool,
    pub generate_text: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            generate_csv: true,
            generate_json: true,
            generate_document: true,
            generate_text: false,
        }
    }
}

/// Destination paths, `None` skips the artifact
#[derive(Debug, Clone, Default)]
pub struct ExportPaths {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub text: Option<PathBuf>,
}

/// Result of an export
#[derive(Debug, Default)]
pub struct ExportResult {
    pub csv_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub document_path: Option<PathBuf>,
    pub text_path: Option<PathBuf>,
    /// User-facing notice when nothing was exported
    pub notice: Option<String>,
}

impl ExportResult {
    fn nothing_to_export() -> Self {
        let notice = ExportError::EmptyTranscript.to_string();
        warn!("{}", notice);
        Self {
            notice: Some(notice),
            ..Default::default()
        }
    }

    pub fn written(&self) -> Vec<&Path> {
        [
            &self.csv_path,
            &self.json_path,
            &self.document_path,
            &self.text_path,
        ]
        .into_iter()
        .flatten()
        .map(PathBuf::as_path)
        .collect()
    }
}

pub fn transcript_metadata(
    transcript: &ParsedTranscript,
    settings: &SessionSettings,
) -> TranscriptMetadata {
    TranscriptMetadata {
        total_turns: transcript.len(),
        unknown_speaker_turns: transcript.turns.iter().filter(|t| t.is_unknown()).count(),
        skipped_lines: transcript.skipped.len(),
        current_round: transcript.current_round(),
        target_rounds: settings.rounds,
    }
}

/// Write the requested export artifacts
///
/// An empty transcript writes nothing and returns a notice instead.
pub fn execute_export(
    transcript: &ParsedTranscript,
    settings: &SessionSettings,
    paths: &ExportPaths,
    config: &ExportConfig,
    rendered_at: NaiveDateTime,
) -> Result<ExportResult> {
    if transcript.is_empty() {
        return Ok(ExportResult::nothing_to_export());
    }

    let mut result = ExportResult::default();

    if let (true, Some(path)) = (config.generate_csv, &paths.csv) {
        info!("Writing CSV to {:?}", path);
        write_csv(&transcript.turns, path)?;
        result.csv_path = Some(path.clone());
    }

    if let (true, Some(path)) = (config.generate_json, &paths.json) {
        info!("Writing JSON transcript to {:?}", path);
        let machine = MachineTranscript::from_turns(
            &settings.topic,
            &transcript.turns,
            &settings.participants,
            transcript_metadata(transcript, settings),
        );
        machine.write_json(path)?;
        result.json_path = Some(path.clone());
    }

    if let (true, Some(path)) = (config.generate_document, &paths.document) {
        info!("Writing printable document to {:?}", path);
        let html = render_document(settings, &transcript.turns, rendered_at);
        write_text(&html, path)?;
        result.document_path = Some(path.clone());
    }

    if let (true, Some(path)) = (config.generate_text, &paths.text) {
        info!("Writing text transcript to {:?}", path);
        let text = PlainTranscript::new(&transcript.turns, &settings.participants).format();
        write_text(&text, path)?;
        result.text_path = Some(path.clone());
    }

    Ok(result)
}

/// Render the printable document and hand it to the print trigger
///
/// Returns the notice instead when there is nothing to print.
pub async fn execute_print<T>(
    transcript: &ParsedTranscript,
    settings: &SessionSettings,
    trigger: &T,
    config: &PrintConfig,
    rendered_at: NaiveDateTime,
) -> Result<Option<String>, ExportError>
where
    T: PrintTrigger + ?Sized,
{
    if transcript.is_empty() {
        let notice = "目前沒有對話紀錄可供列印".to_string();
        warn!("{}", notice);
        return Ok(Some(notice));
    }

    let html = render_document(settings, &transcript.turns, rendered_at);
    print_document(&html, trigger, config).await?;
    Ok(None)
}

use chrono::Utc;
use futures_util::{Stream, StreamExt};
use std::ops::RangeInclusive;

use tracing::{debug, info, warn};

use crate::client::DialogueClient;
use crate::error::SessionError;
use crate::io::StreamAccumulator;
use crate::models::{ParsedTranscript, SessionSettings};
use crate::stages::parse::IncrementalParser;

/// Target rounds a session may be started with
pub const ROUND_RANGE: RangeInclusive<u32> = 1..=10;

/// Lifecycle of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Complete,
    /// Holds the single user-facing failure message
    Failed(String),
}

/// Owns the raw buffer and the parsed turns of one session
///
/// Each chunk is accumulated and reparsed before the next one is read, so
/// the transcript always reflects a whole number of processed chunks.
#[derive(Debug)]
pub struct SessionController {
    settings: SessionSettings,
    accumulator: StreamAccumulator,
    parser: IncrementalParser,
    transcript: ParsedTranscript,
    state: SessionState,
}

impl SessionController {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            accumulator: StreamAccumulator::new(),
            parser: IncrementalParser::new(),
            transcript: ParsedTranscript::default(),
            state: SessionState::Idle,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn transcript(&self) -> &ParsedTranscript {
        &self.transcript
    }

    pub fn current_text(&self) -> &str {
        self.accumulator.current_text()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Validate settings and clear everything left from a previous session
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.settings.topic.trim().is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        if self.settings.participants.is_empty() {
            return Err(SessionError::NoParticipants);
        }
        if !ROUND_RANGE.contains(&self.settings.rounds) {
            return Err(SessionError::RoundsOutOfRange {
                rounds: self.settings.rounds,
                min: *ROUND_RANGE.start(),
                max: *ROUND_RANGE.end(),
            });
        }

        self.accumulator.reset();
        self.parser.reset();
        self.transcript = ParsedTranscript::default();
        self.state = SessionState::Running;
        info!(
            "Session started: topic {:?}, {} participant(s), {} round(s)",
            self.settings.topic,
            self.settings.participants.len(),
            self.settings.rounds
        );
        Ok(())
    }

    /// Append a chunk and reparse the buffer
    pub fn ingest(&mut self, chunk: &[u8]) -> &ParsedTranscript {
        self.accumulator.append(chunk);
        debug!(
            "Received {} byte(s), buffer now {} byte(s)",
            chunk.len(),
            self.accumulator.len()
        );
        self.reparse();
        &self.transcript
    }

    /// Flush the decoder and mark the session complete
    pub fn finish(&mut self) -> &ParsedTranscript {
        self.accumulator.finish();
        self.reparse();
        self.state = SessionState::Complete;
        info!(
            "Session complete: {} turn(s), {} skipped line(s)",
            self.transcript.len(),
            self.transcript.skipped.len()
        );
        &self.transcript
    }

    /// Stop processing, keeping whatever was parsed so far
    pub fn fail(&mut self, error: &SessionError) {
        let message = format!("發生錯誤：{}", error);
        warn!("{} ({} turn(s) kept)", message, self.transcript.len());
        self.state = SessionState::Failed(message);
    }

    /// Drain a chunk stream to completion or first error
    pub async fn consume<S, B>(&mut self, stream: S) -> Result<&ParsedTranscript, SessionError>
    where
        S: Stream<Item = Result<B, SessionError>>,
        B: AsRef<[u8]>,
    {
        let mut stream = std::pin::pin!(stream);

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    self.ingest(bytes.as_ref());
                }
                Err(e) => {
                    self.fail(&e);
                    return Err(e);
                }
            }
        }

        Ok(self.finish())
    }

    /// Start a session against the dialogue service and consume its stream
    pub async fn run(&mut self, client: &DialogueClient) -> Result<&ParsedTranscript, SessionError> {
        self.start()?;

        let stream = match client.open_stream(&self.settings).await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        self.consume(stream).await
    }

    fn reparse(&mut self) {
        let previous_round = self.transcript.current_round();
        self.transcript = self.parser.parse(
            self.accumulator.current_text(),
            &self.settings.participants,
            Utc::now(),
        );

        let round = self.transcript.current_round();
        if round != previous_round {
            info!("進度：第 {} / {} 輪", round, self.settings.rounds);
        }
    }
}

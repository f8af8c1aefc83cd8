pub mod client;
pub mod error;
pub mod io;
pub mod models;
pub mod render;
pub mod session;
pub mod stages;

pub use client::{DialogueClient, ServiceConfig};
pub use error::{ExportError, SessionError};
pub use io::{StreamAccumulator, load_session_settings, parse_participants_file, parse_participants_string};
pub use models::{
    MODERATOR_CODE, ParsedTranscript, Participant, SessionSettings, SubTopic, Turn,
    UNKNOWN_PARTICIPANT_ID,
};
pub use render::{AvatarContext, AvatarReference, CommandTrigger, PrintConfig, avatar_url};
pub use session::{ROUND_RANGE, SessionController, SessionState};
pub use stages::{
    ExportConfig, ExportPaths, IncrementalParser, execute_export, execute_print, parse_transcript,
};

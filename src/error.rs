//! Error types for sessions and exports.

use thiserror::Error;

/// Failures while running a dialogue session
#[derive(Error, Debug)]
pub enum SessionError {
    /// A session needs a non-blank topic
    #[error("請輸入主題")]
    EmptyTopic,

    /// A session needs at least one participant
    #[error("請至少新增一位參與者")]
    NoParticipants,

    /// Target rounds must fall within the supported range
    #[error("討論輪數必須介於 {min} 到 {max} 之間（目前為 {rounds}）")]
    RoundsOutOfRange { rounds: u32, min: u32, max: u32 },

    /// The dialogue service answered with a non-success status
    #[error("伺服器回應錯誤: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The request could not be sent
    #[error("failed to reach dialogue service: {0}")]
    Request(#[source] reqwest::Error),

    /// Reading the response body failed part way through
    #[error("stream read failed: {0}")]
    StreamRead(#[source] reqwest::Error),
}

/// Failures while exporting a transcript
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing has been parsed yet
    #[error("目前沒有對話紀錄可供匯出")]
    EmptyTranscript,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The print command could not be started or exited unsuccessfully
    #[error("print trigger failed: {0}")]
    PrintTrigger(String),
}

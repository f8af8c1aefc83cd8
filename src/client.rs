use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::{Participant, SessionSettings, SubTopic};

/// Endpoint used when `ROUNDTABLE_ENDPOINT` is not set
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

/// Raw response body chunks
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, SessionError>>;

/// Configuration for the dialogue service client
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// URL of the streaming chat endpoint
    pub endpoint: String,
    /// Limit on establishing the connection; the body may stream for longer
    pub connect_timeout: Duration,
}

impl ServiceConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("ROUNDTABLE_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint)
    }

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the service that writes the focus-group dialogue
pub struct DialogueClient {
    client: Client,
    config: ServiceConfig,
}

impl DialogueClient {
    pub fn new(config: ServiceConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(SessionError::Request)?;
        Ok(Self { client, config })
    }

    /// Start a session and return the raw response body as a chunk stream
    ///
    /// Chunk boundaries are arbitrary and may split UTF-8 characters.
    pub async fn open_stream(
        &self,
        settings: &SessionSettings,
    ) -> Result<ChunkStream, SessionError> {
        let request = ChatRequest::from_settings(settings);
        info!("Requesting dialogue from {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(SessionError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::UpstreamStatus { status, body });
        }

        debug!("Dialogue stream opened ({})", response.status());
        Ok(response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(SessionError::StreamRead)
        })
        .boxed())
    }
}

/// Opening prompt sent as the user message
pub fn opening_message(topic: &str) -> String {
    format!("模擬焦點座談：{}", topic)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    messages: Vec<Message>,
    characters: &'a [Participant],
    topic: &'a str,
    sub_topics: &'a [SubTopic],
    rounds: u32,
}

impl<'a> ChatRequest<'a> {
    fn from_settings(settings: &'a SessionSettings) -> Self {
        Self {
            messages: vec![Message {
                role: "user".to_string(),
                content: opening_message(&settings.topic),
            }],
            characters: &settings.participants,
            topic: &settings.topic,
            sub_topics: &settings.sub_topics,
            rounds: settings.rounds,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

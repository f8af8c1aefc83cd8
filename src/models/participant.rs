use serde::{Deserialize, Serialize};

/// A configured persona taking part in the focus group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier, survives renames
    pub id: String,
    /// Display name, matched against speaker labels first
    pub name: String,
    /// Role, matched against speaker labels when no name matches
    pub role: String,
    /// Descriptive tags (e.g. "女", "35歲", "資深工程師")
    #[serde(default)]
    pub tags: Vec<String>,
    /// Behavior prompt handed to the dialogue service
    #[serde(default)]
    pub system_prompt: String,
}

impl Participant {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            role: role.into(),
            tags: Vec::new(),
            system_prompt: String::new(),
        }
    }

    /// Tags joined the way they are searched and displayed
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

/// A sub-topic queued for discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub content: String,
}

impl SubTopic {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
        }
    }
}

fn default_rounds() -> u32 {
    3
}

/// Everything configured before a session starts
///
/// Read-only for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(alias = "characters")]
    pub participants: Vec<Participant>,
    pub topic: String,
    #[serde(default, alias = "sub_topics")]
    pub sub_topics: Vec<SubTopic>,
    /// Target number of discussion rounds
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

impl SessionSettings {
    pub fn new(topic: impl Into<String>, participants: Vec<Participant>) -> Self {
        Self {
            participants,
            topic: topic.into(),
            sub_topics: Vec::new(),
            rounds: default_rounds(),
        }
    }
}

//! Deterministic avatar references for speakers.
//!
//! References are DiceBear image URLs. The same label and participant always
//! yield the same URL; nothing here is random.

use std::fmt;

use crate::models::{MODERATOR_CODE, Participant};

const AVATAR_API_BASE: &str = "https://api.dicebear.com/9.x";
const PARTICIPANT_STYLE: &str = "notionists";
const MODERATOR_STYLE: &str = "bottts-neutral";
const MODERATOR_SEED: &str = "Host";

/// Accent color used for everything moderator-related
pub const MODERATOR_ACCENT: &str = "facc15";
/// Background behind participant avatars on screen
pub const SCREEN_BACKGROUND: &str = "ffffff";

const FEMALE_MARKER: &str = "女";
const FEMALE_BASE_COLOR: &str = "f9c9b6";

/// Where the avatar is going to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarContext {
    /// Interactive views, solid background
    Screen,
    /// Printed documents, transparent background
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Infer the avatar variant from a participant's tags
pub fn infer_gender(participant: &Participant) -> Gender {
    if participant.joined_tags().contains(FEMALE_MARKER) {
        Gender::Female
    } else {
        Gender::Male
    }
}

/// Parameters of a resolvable avatar image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarReference {
    pub style: &'static str,
    pub seed: String,
    /// Secondary color tweak, only set for the female variant
    pub base_color: Option<&'static str>,
    pub background_color: &'static str,
}

impl AvatarReference {
    /// Derive the avatar for a speaker label and its resolved participant
    pub fn for_speaker(
        label: &str,
        participant: Option<&Participant>,
        context: AvatarContext,
    ) -> Self {
        if label == MODERATOR_CODE {
            return Self {
                style: MODERATOR_STYLE,
                seed: MODERATOR_SEED.to_string(),
                base_color: None,
                background_color: MODERATOR_ACCENT,
            };
        }

        // The id outlives renames, so it wins over the label
        let (seed, gender) = match participant {
            Some(p) => (p.id.as_str(), infer_gender(p)),
            None => (label, Gender::Male),
        };

        Self {
            style: PARTICIPANT_STYLE,
            seed: format!("{}{}", seed, gender.as_str()),
            base_color: (gender == Gender::Female).then_some(FEMALE_BASE_COLOR),
            background_color: match context {
                AvatarContext::Screen => SCREEN_BACKGROUND,
                AvatarContext::Print => "transparent",
            },
        }
    }

    pub fn url(&self) -> String {
        let mut url = format!(
            "{}/{}/svg?seed={}",
            AVATAR_API_BASE,
            self.style,
            urlencoding::encode(&self.seed)
        );
        if let Some(color) = self.base_color {
            url.push_str("&baseColor=");
            url.push_str(color);
        }
        url.push_str("&backgroundColor=");
        url.push_str(self.background_color);
        url
    }
}

impl fmt::Display for AvatarReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Avatar URL for a speaker
pub fn avatar_url(label: &str, participant: Option<&Participant>, context: AvatarContext) -> String {
    AvatarReference::for_speaker(label, participant, context).url()
}

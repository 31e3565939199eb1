//! Reactions and the emoji whitelist.

use super::ChatDomainError;
use crate::marketplace::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whitelisted reaction emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionEmoji {
    /// 👍
    ThumbsUp,
    /// ❤️
    Heart,
    /// 😂
    Laugh,
    /// 😮
    Surprised,
    /// 😢
    Sad,
    /// 🎉
    Celebrate,
}

impl ReactionEmoji {
    /// Every whitelisted emoji.
    pub const ALL: [Self; 6] = [
        Self::ThumbsUp,
        Self::Heart,
        Self::Laugh,
        Self::Surprised,
        Self::Sad,
        Self::Celebrate,
    ];

    /// Returns the emoji glyph.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::ThumbsUp => "👍",
            Self::Heart => "❤️",
            Self::Laugh => "😂",
            Self::Surprised => "😮",
            Self::Sad => "😢",
            Self::Celebrate => "🎉",
        }
    }

    /// Returns the snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ThumbsUp => "thumbs_up",
            Self::Heart => "heart",
            Self::Laugh => "laugh",
            Self::Surprised => "surprised",
            Self::Sad => "sad",
            Self::Celebrate => "celebrate",
        }
    }
}

impl TryFrom<&str> for ReactionEmoji {
    type Error = ChatDomainError;

    /// Accepts either the glyph or the snake-case name.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let bare = trimmed.trim_end_matches('\u{fe0f}');
        Self::ALL
            .into_iter()
            .find(|emoji| {
                emoji.glyph().trim_end_matches('\u{fe0f}') == bare
                    || emoji.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ChatDomainError::UnknownEmoji(value.to_owned()))
    }
}

impl fmt::Display for ReactionEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// One user's reaction to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Reacting user.
    pub user: UserId,
    /// Chosen emoji.
    pub emoji: ReactionEmoji,
    /// When the reaction was set.
    pub reacted_at: DateTime<Utc>,
}

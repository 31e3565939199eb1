//! Tunable chat limits.

use chrono::Duration;

/// Limits applied by the chat service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRules {
    /// How long after sending a message its sender may edit it.
    pub edit_window: Duration,
    /// Maximum message length in characters after trimming.
    pub max_content_length: usize,
    /// Maximum attachments per message.
    pub max_attachments: usize,
    /// Largest page returned by a history query.
    pub page_size: usize,
}

impl Default for ChatRules {
    fn default() -> Self {
        Self {
            edit_window: Duration::minutes(15),
            max_content_length: 2000,
            max_attachments: 5,
            page_size: 50,
        }
    }
}

//! Unit tests for chat messages and reactions.

use super::fixtures::{attachment, start_instant};
use crate::chat::domain::{ChatDomainError, ChatMessage, ChatRules, NewChatMessage, ReactionEmoji};
use crate::clock::ManualClock;
use crate::marketplace::domain::{TaskId, UserId};
use chrono::Duration;
use mockable::Clock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> ManualClock {
    ManualClock::new(start_instant())
}

fn input(content: &str) -> NewChatMessage {
    NewChatMessage {
        task_id: TaskId::new(),
        sender: UserId::new(),
        receiver: UserId::new(),
        content: content.to_owned(),
        attachments: Vec::new(),
        reply_to: None,
    }
}

#[rstest]
#[case("👍", ReactionEmoji::ThumbsUp)]
#[case("❤️", ReactionEmoji::Heart)]
#[case("❤", ReactionEmoji::Heart)]
#[case("celebrate", ReactionEmoji::Celebrate)]
#[case(" Sad ", ReactionEmoji::Sad)]
fn emoji_parses_from_glyph_or_name(#[case] raw: &str, #[case] expected: ReactionEmoji) {
    assert_eq!(ReactionEmoji::try_from(raw), Ok(expected));
}

#[rstest]
#[case("🦀")]
#[case("thumbsup")]
#[case("")]
fn emoji_outside_whitelist_is_rejected(#[case] raw: &str) {
    assert_eq!(
        ReactionEmoji::try_from(raw),
        Err(ChatDomainError::UnknownEmoji(raw.to_owned()))
    );
}

#[rstest]
fn content_is_trimmed(clock: ManualClock) {
    let message = ChatMessage::new(input("  on my way  "), &ChatRules::default(), &clock)
        .expect("valid message");
    assert_eq!(message.content(), "on my way");
    assert_eq!(message.created_at(), clock.utc());
}

#[rstest]
#[case("   ".to_owned(), ChatDomainError::EmptyContent)]
#[case("x".repeat(2001), ChatDomainError::ContentTooLong { max: 2000 })]
fn content_limits_apply(
    clock: ManualClock,
    #[case] content: String,
    #[case] expected: ChatDomainError,
) {
    let result = ChatMessage::new(input(&content), &ChatRules::default(), &clock);
    assert_eq!(result, Err(expected));
}

#[rstest]
fn attachment_only_messages_are_allowed(clock: ManualClock) {
    let mut draft = input("");
    draft.attachments = vec![attachment("receipt")];

    let message = ChatMessage::new(draft, &ChatRules::default(), &clock).expect("valid message");

    assert!(message.content().is_empty());
    assert_eq!(message.attachments().len(), 1);
}

#[rstest]
fn messages_cannot_address_their_sender(clock: ManualClock) {
    let mut draft = input("hello me");
    draft.receiver = draft.sender;

    let result = ChatMessage::new(draft, &ChatRules::default(), &clock);

    assert_eq!(result, Err(ChatDomainError::SelfAddressed));
}

#[rstest]
fn first_edit_keeps_the_original(clock: ManualClock) {
    let draft = input("see you at 5");
    let sender = draft.sender;
    let rules = ChatRules::default();
    let mut message = ChatMessage::new(draft, &rules, &clock).expect("valid message");

    clock.advance(Duration::minutes(1));
    message.edit(sender, "see you at 6", &rules, &clock).expect("first edit");
    message.edit(sender, "see you at 7", &rules, &clock).expect("second edit");

    assert_eq!(message.content(), "see you at 7");
    assert_eq!(message.original_content(), Some("see you at 5"));
    assert_eq!(message.edited_at(), Some(clock.utc()));
}

#[rstest]
fn only_the_receiver_marks_read(clock: ManualClock) {
    let draft = input("done");
    let sender = draft.sender;
    let receiver = draft.receiver;
    let mut message =
        ChatMessage::new(draft, &ChatRules::default(), &clock).expect("valid message");

    assert!(!message.mark_read(sender, clock.utc()));
    assert!(message.mark_read(receiver, clock.utc()));
    assert!(!message.mark_read(receiver, clock.utc()), "already read");
    assert_eq!(message.read_at(), Some(clock.utc()));
}

#[rstest]
fn deleted_messages_refuse_reactions(clock: ManualClock) {
    let draft = input("oops");
    let sender = draft.sender;
    let receiver = draft.receiver;
    let mut message =
        ChatMessage::new(draft, &ChatRules::default(), &clock).expect("valid message");
    message.soft_delete(sender, &clock).expect("sender may delete");

    let result = message.react(receiver, ReactionEmoji::Laugh, &clock);

    assert_eq!(result, Err(ChatDomainError::MessageDeleted(message.id())));
}

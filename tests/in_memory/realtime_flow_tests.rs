//! Delivery of marketplace activity to live connections.

use super::helpers::{Campus, campus};
use bidboard::{
    chat::services::SendMessageRequest,
    marketplace::{domain::UserId, services::Caller},
    realtime::domain::{Channel, ClientCommand, EventKind, ServerFrame},
};
use eyre::{OptionExt, bail, ensure};
use rstest::rstest;
use serde_json::json;
use std::collections::HashSet;

#[rstest]
#[tokio::test]
async fn chat_message_reaches_counterparty_but_not_origin(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let helper = UserId::new();
    let task_id = campus.assigned_task(poster, helper).await?;
    let mut poster_client = campus.connect_as(poster).await?;
    let mut helper_client = campus.connect_as(helper).await?;
    campus.join_task(&poster_client, task_id).await?;
    campus.join_task(&helper_client, task_id).await?;
    poster_client.drain();
    helper_client.drain();

    campus
        .market
        .chat()
        .send_message(SendMessageRequest::new(
            task_id,
            Caller::new(poster).via(poster_client.connection),
            "It's the blue box",
        ))
        .await?;

    let received = helper_client.drain();
    let message = received
        .iter()
        .find(|event| event.event == EventKind::NewMessage)
        .ok_or_eyre("helper should receive the message")?;
    ensure!(message.channel == Channel::Task(task_id));
    ensure!(message.payload["content"] == "It's the blue box");
    ensure!(received.iter().any(|event| {
        event.event == EventKind::Notification && event.channel == Channel::User(helper)
    }));
    ensure!(
        poster_client.drain_kind(EventKind::NewMessage).is_empty(),
        "the sending connection gets no echo"
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn bidders_hear_the_outcome_on_personal_channels(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let winner = UserId::new();
    let loser = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();
    let winning_bid = campus.bid(task_id, winner, 180).await?;
    campus.bid(task_id, loser, 120).await?;
    let mut winner_client = campus.connect_as(winner).await?;
    let mut loser_client = campus.connect_as(loser).await?;

    campus
        .market
        .lifecycle()
        .accept_bid(task_id, winning_bid.id(), poster)
        .await?;

    let accepted = winner_client.drain_kind(EventKind::BidAccepted);
    ensure!(accepted.len() == 1);
    ensure!(accepted
        .first()
        .is_some_and(|event| event.payload["bidId"] == json!(winning_bid.id())));
    let rejected = loser_client.drain_kind(EventKind::BidRejected);
    ensure!(rejected.len() == 1);
    ensure!(rejected
        .first()
        .is_some_and(|event| event.payload["actor"]["type"] == "user"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn gateway_verifies_tokens_issued_by_the_marketplace(campus: Campus) -> eyre::Result<()> {
    let (connection, _frames) = campus.market.gateway().connect();
    let refused = campus
        .market
        .gateway()
        .handle(
            connection,
            ClientCommand::Authenticate {
                token: "never-issued".to_owned(),
            },
        )
        .await;
    ensure!(refused.is_err(), "unknown tokens are refused");

    let user = UserId::new();
    campus.market.tokens().issue("freshly-issued".to_owned(), user);
    let reply = campus
        .market
        .gateway()
        .handle(
            connection,
            ClientCommand::Authenticate {
                token: "freshly-issued".to_owned(),
            },
        )
        .await?;
    ensure!(reply == ServerFrame::Authenticated { user_id: user });
    Ok(())
}

#[rstest]
#[tokio::test]
async fn strangers_cannot_join_task_rooms(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();
    let stranger = campus.connect_as(UserId::new()).await?;

    let reply = campus
        .market
        .gateway()
        .handle_frame(
            stranger.connection,
            &json!({ "type": "join_channel", "data": { "channel": format!("task:{task_id}") } })
                .to_string(),
        )
        .await;

    let ServerFrame::Error { code, .. } = reply else {
        bail!("join should be refused");
    };
    ensure!(code == "ACCESS_DENIED");
    ensure!(!campus
        .market
        .registry()
        .is_member(stranger.connection, Channel::Task(task_id)));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn typing_is_shown_to_the_other_party(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let helper = UserId::new();
    let task_id = campus.assigned_task(poster, helper).await?;
    let mut poster_client = campus.connect_as(poster).await?;
    let mut helper_client = campus.connect_as(helper).await?;
    campus.join_task(&poster_client, task_id).await?;
    campus.join_task(&helper_client, task_id).await?;

    campus
        .market
        .gateway()
        .handle(helper_client.connection, ClientCommand::TypingStart { task_id })
        .await?;

    let typing = poster_client.drain_kind(EventKind::UserTyping);
    ensure!(typing
        .first()
        .is_some_and(|event| event.payload["userId"] == json!(helper)));
    ensure!(helper_client.drain_kind(EventKind::UserTyping).is_empty());

    campus.market.gateway().disconnect(helper_client.connection).await;
    ensure!(poster_client.drain_kind(EventKind::StoppedTyping).len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn presence_follows_active_assignments(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let helper = UserId::new();
    campus.assigned_task(poster, helper).await?;
    let mut poster_client = campus.connect_as(poster).await?;

    let helper_client = campus.connect_as(helper).await?;
    let online = poster_client.drain_kind(EventKind::UserOnline);
    ensure!(online
        .first()
        .is_some_and(|event| event.payload["userId"] == json!(helper)));

    campus.market.gateway().disconnect(helper_client.connection).await;
    ensure!(poster_client.drain_kind(EventKind::UserOffline).len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn room_events_are_numbered_in_order(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let helper = UserId::new();
    let task_id = campus.assigned_task(poster, helper).await?;
    let mut helper_client = campus.connect_as(helper).await?;
    campus.join_task(&helper_client, task_id).await?;

    for text in ["first", "second", "third"] {
        campus
            .market
            .chat()
            .send_message(SendMessageRequest::new(task_id, poster, text))
            .await?;
    }

    let room: Vec<_> = helper_client
        .drain()
        .into_iter()
        .filter(|event| event.channel == Channel::Task(task_id))
        .collect();
    let sequences: Vec<u64> = room.iter().map(|event| event.sequence).collect();
    ensure!(sequences == [1, 2, 3]);
    let ids: HashSet<_> = room.iter().map(|event| event.event_id).collect();
    ensure!(ids.len() == 3);
    Ok(())
}

//! Task and bid lifecycle through the composed marketplace.

use super::helpers::{Campus, campus};
use bidboard::{
    api::ApiResponse,
    chat::services::SendMessageRequest,
    marketplace::{
        domain::{BidStatus, TaskStatus, UserId},
        services::CompleteTaskRequest,
    },
};
use chrono::Duration;
use eyre::ensure;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

#[rstest]
#[tokio::test]
async fn errand_runs_from_posting_to_review(campus: Campus) -> eyre::Result<()> {
    let lifecycle = campus.market.lifecycle();
    let poster = UserId::new();
    let helper = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();
    let chosen = campus.bid(task_id, helper, 140).await?;
    for amount in [200, 260] {
        campus.bid(task_id, UserId::new(), amount).await?;
    }

    let accepted = lifecycle.accept_bid(task_id, chosen.id(), poster).await?;
    ensure!(accepted.task.status() == TaskStatus::Assigned);
    ensure!(accepted.rejected.len() == 2);
    ensure!(accepted.task.bid_count() == 1);

    let repeat = ApiResponse::from_result(
        lifecycle.accept_bid(task_id, chosen.id(), poster).await,
        "bid accepted",
    );
    ensure!(repeat.status == 409);
    ensure!(repeat.error_code() == Some("ALREADY_DECIDED"));

    lifecycle.start_task(task_id, helper).await?;
    let done = lifecycle
        .complete_task(
            CompleteTaskRequest::new(task_id, poster)
                .with_rating(5)
                .with_review("Quick and careful"),
        )
        .await?;
    ensure!(done.status() == TaskStatus::Completed);

    let stats = lifecycle.user_stats(helper).await?;
    ensure!(stats.tasks_completed == 1);
    ensure!(stats.total_earned == 140);
    ensure!(stats.average_rating_tenths() == Some(50));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn closing_rejects_every_pending_bid(campus: Campus) -> eyre::Result<()> {
    let lifecycle = campus.market.lifecycle();
    let poster = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();
    for amount in [110, 120, 130] {
        campus.bid(task_id, UserId::new(), amount).await?;
    }

    let closed = lifecycle.close_task(task_id, poster).await?;

    ensure!(closed.status() == TaskStatus::Closed);
    ensure!(closed.bid_count() == 0);
    let bids = lifecycle.bids_for_task(task_id, poster).await?;
    ensure!(bids.iter().all(|bid| bid.status() == BidStatus::Rejected));
    let again = ApiResponse::from_result(lifecycle.close_task(task_id, poster).await, "closed");
    ensure!(again.error_code() == Some("INVALID_TRANSITION"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn out_of_range_bid_is_reported_as_a_client_error(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();

    let response = ApiResponse::from_result(
        campus
            .market
            .lifecycle()
            .place_bid(bidboard::marketplace::services::PlaceBidRequest::new(
                task_id,
                UserId::new(),
                301,
                "tonight",
            ))
            .await,
        "bid placed",
    );

    ensure!(!response.success);
    ensure!(response.status == 400);
    ensure!(response.error_code() == Some("BUDGET_OUT_OF_RANGE"));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn background_sweep_withdraws_stale_bids(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let bidder = UserId::new();
    let task_id = campus.post_task(poster, (100, 300)).await?.task.id();
    campus.bid(task_id, bidder, 150).await?;
    campus.clock.advance(Duration::days(8));

    let shutdown = CancellationToken::new();
    let sweeper = campus.market.spawn_scheduler(shutdown.clone());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    shutdown.cancel();
    sweeper.await?;

    let bids = campus.market.lifecycle().bids_by(bidder).await?;
    ensure!(bids.iter().all(|bid| bid.status() == BidStatus::Withdrawn));
    let view = campus.market.lifecycle().find_task(task_id).await?;
    ensure!(view.is_some_and(|found| found.task.bid_count() == 0));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn conversation_tracks_unread_messages(campus: Campus) -> eyre::Result<()> {
    let poster = UserId::new();
    let helper = UserId::new();
    let task_id = campus.assigned_task(poster, helper).await?;
    let chat = campus.market.chat();

    chat.send_message(SendMessageRequest::new(task_id, poster, "Thanks for taking this"))
        .await?;
    chat.send_message(SendMessageRequest::new(task_id, poster, "Signature name is Sam"))
        .await?;
    ensure!(chat.unread_count(helper).await? == 2);

    ensure!(chat.mark_as_read(task_id, helper).await? == 2);
    ensure!(chat.unread_count(helper).await? == 0);
    let history = chat.list_messages(task_id, helper, None, None).await?;
    ensure!(history.iter().all(|message| message.is_read()));
    Ok(())
}

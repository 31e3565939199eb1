//! Then steps for bid acceptance scenarios.

use super::world::{BidWorld, run_async};
use bidboard::{
    error::Classify,
    marketplace::domain::{BidStatus, TaskStatus},
};
use rstest_bdd_macros::then;

#[then("the task is assigned to the first bidder")]
fn task_assigned_to_first_bidder(world: &BidWorld) -> Result<(), eyre::Report> {
    let accepted = world
        .last_accept
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing accept result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected acceptance failure: {err}"))?;
    let first = world
        .bids
        .first()
        .ok_or_else(|| eyre::eyre!("no bids in scenario world"))?;

    if accepted.task.status() != TaskStatus::Assigned {
        return Err(eyre::eyre!(
            "expected assigned task, found {}",
            accepted.task.status()
        ));
    }
    if accepted.task.assigned_to() != Some(first.bidder()) {
        return Err(eyre::eyre!("task assigned to the wrong bidder"));
    }
    Ok(())
}

#[then("{count:usize} bids are rejected")]
fn bids_are_rejected(world: &BidWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let bids = run_async(world.market.lifecycle().bids_for_task(task_id, world.poster))
        .map_err(|err| eyre::eyre!("bid listing failed: {err}"))?;
    let rejected = bids
        .iter()
        .filter(|bid| bid.status() == BidStatus::Rejected)
        .count();
    if rejected != count {
        return Err(eyre::eyre!("expected {count} rejected bids, found {rejected}"));
    }
    Ok(())
}

#[then("the task shows {count:u32} live bid")]
fn task_shows_live_bids(world: &BidWorld, count: u32) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let view = run_async(world.market.lifecycle().find_task(task_id))
        .map_err(|err| eyre::eyre!("task lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("scenario task disappeared"))?;
    if view.task.bid_count() != count {
        return Err(eyre::eyre!(
            "expected {count} live bids, found {}",
            view.task.bid_count()
        ));
    }
    Ok(())
}

#[then(r#"the acceptance fails with code "{code}""#)]
fn acceptance_fails_with(world: &BidWorld, code: String) -> Result<(), eyre::Report> {
    let result = world
        .last_accept
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing accept result in scenario world"))?;
    match result {
        Err(err) if err.kind().code() == code => Ok(()),
        other => Err(eyre::eyre!("expected {code} failure, got {other:?}")),
    }
}

#[then("the task is closed")]
fn task_is_closed(world: &BidWorld) -> Result<(), eyre::Report> {
    let closed = world
        .last_close
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing close result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected close failure: {err}"))?;
    if closed.status() != TaskStatus::Closed {
        return Err(eyre::eyre!("expected closed task, found {}", closed.status()));
    }
    Ok(())
}

#[then(r#"the bid is refused with code "{code}""#)]
fn bid_is_refused_with(world: &BidWorld, code: String) -> Result<(), eyre::Report> {
    let result = world
        .last_bid
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing bid result in scenario world"))?;
    match result {
        Err(err) if err.kind().code() == code => Ok(()),
        other => Err(eyre::eyre!("expected {code} failure, got {other:?}")),
    }
}

//! When steps for bid acceptance scenarios.

use super::world::{BidWorld, ordinal_index, run_async};
use bidboard::marketplace::{domain::UserId, services::PlaceBidRequest};
use rstest_bdd_macros::when;

#[when("the poster accepts the {ordinal} bid")]
fn poster_accepts_bid(world: &mut BidWorld, ordinal: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let bid_id = world
        .bids
        .get(ordinal_index(&ordinal)?)
        .map(bidboard::marketplace::domain::Bid::id)
        .ok_or_else(|| eyre::eyre!("no {ordinal} bid in scenario world"))?;
    world.last_accept = Some(run_async(
        world.market.lifecycle().accept_bid(task_id, bid_id, world.poster),
    ));
    Ok(())
}

#[when("the poster closes the task")]
fn poster_closes_task(world: &mut BidWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    world.last_close = Some(run_async(
        world.market.lifecycle().close_task(task_id, world.poster),
    ));
    Ok(())
}

#[when("a helper bids {amount:u32}")]
fn helper_bids(world: &mut BidWorld, amount: u32) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let request = PlaceBidRequest::new(task_id, UserId::new(), amount, "tomorrow morning");
    world.last_bid = Some(run_async(world.market.lifecycle().place_bid(request)));
    Ok(())
}

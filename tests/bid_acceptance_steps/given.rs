//! Given steps for bid acceptance scenarios.

use super::world::{BidWorld, run_async};
use bidboard::marketplace::{
    domain::UserId,
    services::{CreateTaskRequest, PlaceBidRequest},
};
use chrono::Duration;
use eyre::WrapErr;
use mockable::Clock;
use rstest_bdd_macros::given;

#[given("an open task with a budget of {min:u32} to {max:u32}")]
fn open_task_with_budget(world: &mut BidWorld, min: u32, max: u32) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(
        world.poster,
        "Return library books",
        "Four books due back at the main library before closing.",
        "errands",
        (min, max),
        world.clock.utc() + Duration::days(2),
    );
    let view = run_async(world.market.lifecycle().create_task(request))
        .wrap_err("create scenario task")?;
    world.task_id = Some(view.task.id());
    Ok(())
}

#[given("{count:usize} bids have been placed on the task")]
fn bids_placed(world: &mut BidWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    for offset in 0..count {
        let amount = 120 + 20 * u32::try_from(offset).wrap_err("bid offset fits in u32")?;
        let request = PlaceBidRequest::new(task_id, UserId::new(), amount, "this afternoon");
        let bid = run_async(world.market.lifecycle().place_bid(request))
            .wrap_err("place scenario bid")?;
        world.bids.push(bid);
    }
    Ok(())
}

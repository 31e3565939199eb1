//! Behaviour tests for bid acceptance and task closure.

mod bid_acceptance_steps;

use bid_acceptance_steps::world::{BidWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/bid_acceptance.feature",
    name = "Accepting a bid assigns the task and rejects the rest"
)]
#[tokio::test(flavor = "multi_thread")]
async fn accepting_assigns_and_rejects(world: BidWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bid_acceptance.feature",
    name = "A second acceptance is refused"
)]
#[tokio::test(flavor = "multi_thread")]
async fn second_acceptance_is_refused(world: BidWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bid_acceptance.feature",
    name = "Closing a task rejects every pending bid"
)]
#[tokio::test(flavor = "multi_thread")]
async fn closing_rejects_pending_bids(world: BidWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bid_acceptance.feature",
    name = "Bids outside the budget are refused"
)]
#[tokio::test(flavor = "multi_thread")]
async fn out_of_budget_bid_is_refused(world: BidWorld) {
    let _ = world;
}

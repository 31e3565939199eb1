//! In-memory bid repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::marketplace::{
    domain::{Bid, BidId, BidStatus, TaskId, UserId},
    ports::{BidRepository, BidRepositoryError, BidRepositoryResult},
};

type BidMap = HashMap<BidId, Bid>;

/// Thread-safe in-memory bid repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBidRepository {
    state: Arc<RwLock<BidMap>>,
}

impl InMemoryBidRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BidRepositoryResult<RwLockReadGuard<'_, BidMap>> {
        self.state.read().map_err(|err| {
            BidRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> BidRepositoryResult<RwLockWriteGuard<'_, BidMap>> {
        self.state.write().map_err(|err| {
            BidRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn collect_sorted<'a>(bids: impl Iterator<Item = &'a Bid>) -> Vec<Bid> {
    let mut found: Vec<Bid> = bids.cloned().collect();
    found.sort_by_key(|bid| (bid.created_at(), bid.id()));
    found
}

#[async_trait]
impl BidRepository for InMemoryBidRepository {
    async fn store(&self, bid: &Bid) -> BidRepositoryResult<()> {
        let mut bids = self.write()?;
        if bids.contains_key(&bid.id()) {
            return Err(BidRepositoryError::DuplicateBid(bid.id()));
        }
        let blocked = bids.values().any(|existing| {
            existing.task_id() == bid.task_id()
                && existing.bidder() == bid.bidder()
                && existing.status().blocks_rebid()
        });
        if blocked {
            return Err(BidRepositoryError::DuplicateActiveBid {
                task_id: bid.task_id(),
                bidder: bid.bidder(),
            });
        }
        bids.insert(bid.id(), bid.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BidId) -> BidRepositoryResult<Option<Bid>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_task(&self, task_id: TaskId) -> BidRepositoryResult<Vec<Bid>> {
        let bids = self.read()?;
        Ok(collect_sorted(
            bids.values().filter(|bid| bid.task_id() == task_id),
        ))
    }

    async fn find_by_bidder(&self, bidder: UserId) -> BidRepositoryResult<Vec<Bid>> {
        let bids = self.read()?;
        Ok(collect_sorted(
            bids.values().filter(|bid| bid.bidder() == bidder),
        ))
    }

    async fn transition_if(&self, bid: &Bid, expected: BidStatus) -> BidRepositoryResult<bool> {
        let mut bids = self.write()?;
        let stored = bids
            .get_mut(&bid.id())
            .ok_or(BidRepositoryError::NotFound(bid.id()))?;
        if stored.status() != expected {
            return Ok(false);
        }
        *stored = bid.clone();
        Ok(true)
    }

    async fn accept_if_pending(&self, bid: &Bid) -> BidRepositoryResult<bool> {
        let mut bids = self.write()?;
        let stored_status = bids
            .get(&bid.id())
            .map(Bid::status)
            .ok_or(BidRepositoryError::NotFound(bid.id()))?;
        let already_accepted = bids.values().any(|other| {
            other.task_id() == bid.task_id() && other.status() == BidStatus::Accepted
        });
        if stored_status != BidStatus::Pending || already_accepted {
            return Ok(false);
        }
        bids.insert(bid.id(), bid.clone());
        Ok(true)
    }

    async fn reject_pending(
        &self,
        task_id: TaskId,
        except: Option<BidId>,
        at: DateTime<Utc>,
    ) -> BidRepositoryResult<Vec<Bid>> {
        let mut bids = self.write()?;
        let mut rejected = Vec::new();
        for bid in bids.values_mut() {
            if bid.task_id() != task_id
                || bid.status() != BidStatus::Pending
                || Some(bid.id()) == except
            {
                continue;
            }
            if bid.reject_at(at).is_ok() {
                rejected.push(bid.clone());
            }
        }
        rejected.sort_by_key(|bid| (bid.created_at(), bid.id()));
        Ok(rejected)
    }

    async fn count_live(&self, task_id: TaskId) -> BidRepositoryResult<u32> {
        let bids = self.read()?;
        let live = bids
            .values()
            .filter(|bid| bid.task_id() == task_id && bid.status().is_live())
            .count();
        Ok(u32::try_from(live).unwrap_or(u32::MAX))
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> BidRepositoryResult<Vec<Bid>> {
        let bids = self.read()?;
        Ok(collect_sorted(bids.values().filter(|bid| bid.is_expired(now))))
    }

    async fn delete_if_terminal(&self, id: BidId) -> BidRepositoryResult<bool> {
        let mut bids = self.write()?;
        let stored = bids.get(&id).ok_or(BidRepositoryError::NotFound(id))?;
        if !stored.is_deletable() {
            return Ok(false);
        }
        bids.remove(&id);
        Ok(true)
    }

    async fn delete_by_task(&self, task_id: TaskId) -> BidRepositoryResult<()> {
        self.write()?.retain(|_, bid| bid.task_id() != task_id);
        Ok(())
    }
}

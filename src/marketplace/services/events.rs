//! Publishes lifecycle events for task and bid transitions.

use crate::marketplace::domain::{Actor, Bid, BidStatus, Task, TaskStatus, UserId};
use crate::realtime::{
    domain::{Channel, ConnectionId, EventKind, OutboundEvent},
    ports::EventPublisher,
    services::{NotificationKind, notification},
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Routes lifecycle events to the task channel and to the user channel of
/// each party that did not act.
#[derive(Clone)]
pub(crate) struct LifecycleEvents {
    publisher: Arc<dyn EventPublisher>,
}

impl LifecycleEvents {
    pub(crate) fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    fn fan_out(
        &self,
        task: &Task,
        kind: EventKind,
        payload: &Value,
        recipients: impl IntoIterator<Item = UserId>,
        origin: Option<ConnectionId>,
    ) {
        self.publisher.publish(
            OutboundEvent::new(Channel::Task(task.id()), kind, payload.clone())
                .with_origin(origin),
        );
        for user in recipients {
            self.publisher
                .publish(OutboundEvent::new(Channel::User(user), kind, payload.clone()));
        }
    }

    pub(crate) fn task_status_changed(
        &self,
        task: &Task,
        from: TaskStatus,
        actor: Actor,
        origin: Option<ConnectionId>,
    ) {
        let payload = json!({
            "taskId": task.id(),
            "from": from,
            "to": task.status(),
            "actor": actor,
            "assignedTo": task.assigned_to(),
        });
        let recipients = [Some(task.poster()), task.assigned_to()]
            .into_iter()
            .flatten()
            .filter(|party| actor.user() != Some(*party));
        self.fan_out(task, EventKind::TaskStatusChanged, &payload, recipients, origin);
    }

    pub(crate) fn bid_transition(
        &self,
        task: &Task,
        bid: &Bid,
        from: BidStatus,
        actor: Actor,
        origin: Option<ConnectionId>,
    ) {
        let kind = match bid.status() {
            BidStatus::Accepted => EventKind::BidAccepted,
            BidStatus::Withdrawn => EventKind::BidWithdrawn,
            BidStatus::Rejected | BidStatus::Pending => EventKind::BidRejected,
        };
        let payload = json!({
            "taskId": task.id(),
            "bidId": bid.id(),
            "bidder": bid.bidder(),
            "amount": bid.amount(),
            "from": from,
            "to": bid.status(),
            "actor": actor,
        });
        let recipients = [task.poster(), bid.bidder()]
            .into_iter()
            .filter(|party| actor.user() != Some(*party));
        self.fan_out(task, kind, &payload, recipients, origin);
    }

    pub(crate) fn new_bid(&self, task: &Task, bid: &Bid) {
        let mut context = Map::new();
        context.insert("taskId".to_owned(), json!(task.id()));
        context.insert("bidId".to_owned(), json!(bid.id()));
        context.insert("title".to_owned(), Value::String(task.title().to_owned()));
        context.insert("amount".to_owned(), json!(bid.amount()));
        self.publisher
            .publish(notification(task.poster(), NotificationKind::NewBid, context));
    }

    pub(crate) fn deadline_approaching(&self, task: &Task) {
        let mut context = Map::new();
        context.insert("taskId".to_owned(), json!(task.id()));
        context.insert("title".to_owned(), Value::String(task.title().to_owned()));
        context.insert(
            "deadline".to_owned(),
            Value::String(task.deadline().to_rfc3339()),
        );
        context.insert("bid_count".to_owned(), json!(task.bid_count()));
        self.publisher.publish(notification(
            task.poster(),
            NotificationKind::DeadlineApproaching,
            context,
        ));
    }
}

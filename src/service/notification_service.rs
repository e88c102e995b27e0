// services/notification_service.rs
use std::sync::Arc;

use crate::db::notificationdb::NotificationExt;
use crate::db::MarketStore;
use crate::models::jobmodel::{Bid, Job};
use crate::models::supportmodel::{SupportMessage, SupportTicket};

/// Fire-and-forget event sink. Delivery never influences the outcome of the
/// operation that triggered it: failures are logged and dropped.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn MarketStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn notify_bid_received(&self, job: &Job, bid: &Bid) {
        tracing::info!(
            "New bid of {} on {} job '{}' from provider {}",
            bid.amount,
            job.category.to_str(),
            job.title,
            bid.provider_id
        );

        self.deliver(
            job.customer_id,
            "bid_received",
            Some(job.id),
            format!("New bid of {} on your job: {}", bid.amount, job.title),
        )
        .await;
    }

    pub async fn notify_bid_accepted(&self, job: &Job, bid: &Bid) {
        tracing::info!("Bid {} accepted for job {}", bid.id, job.id);

        self.deliver(
            bid.provider_id,
            "bid_accepted",
            Some(job.id),
            format!("Your bid was accepted for job: {}", job.title),
        )
        .await;
    }

    pub async fn notify_bid_rejected(&self, job: &Job, bid: &Bid) {
        tracing::info!("Bid {} rejected for job {}", bid.id, job.id);

        self.deliver(
            bid.provider_id,
            "bid_rejected",
            Some(job.id),
            format!("Your bid was not selected for job: {}", job.title),
        )
        .await;
    }

    pub async fn notify_job_cancelled(&self, job: &Job, bid: &Bid) {
        tracing::info!("Job {} cancelled, bid {} released", job.id, bid.id);

        self.deliver(
            bid.provider_id,
            "job_cancelled",
            Some(job.id),
            format!("The job you bid on was cancelled: {}", job.title),
        )
        .await;
    }

    pub async fn notify_job_completed(&self, job: &Job, bid: &Bid) {
        tracing::info!("Job {} marked completed", job.id);

        self.deliver(
            bid.provider_id,
            "job_completed",
            Some(job.id),
            format!("The customer marked this job completed: {}", job.title),
        )
        .await;
    }

    pub async fn notify_ticket_reply(&self, ticket: &SupportTicket, message: &SupportMessage) {
        tracing::info!("Staff reply on ticket {}", ticket.id);

        self.deliver(
            ticket.user_id,
            "ticket_reply",
            Some(ticket.id),
            format!("Support replied to '{}': {}", ticket.title, message.message),
        )
        .await;
    }

    async fn deliver(
        &self,
        user_id: uuid::Uuid,
        kind: &str,
        reference_id: Option<uuid::Uuid>,
        body: String,
    ) {
        if let Err(err) = self
            .store
            .store_notification(user_id, kind, reference_id, body)
            .await
        {
            tracing::warn!("Failed to store {} notification: {}", kind, err);
        }
    }
}

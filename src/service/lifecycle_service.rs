// services/lifecycle_service.rs
//
// The lifecycle engine: every status change on jobs, bids and tickets goes
// through here. Handlers supply the acting user; the engine checks ownership,
// consults the transition rules, and hands the compound write to the store as
// one atomic unit.

use std::sync::Arc;

use chrono::Utc;
use num_traits::FromPrimitive;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, supportdb::SupportExt, MarketStore},
    dtos::jobdtos::{CreateJobDto, SubmitBidDto},
    models::jobmodel::*,
    models::supportmodel::*,
    service::{error::ServiceError, notification_service::NotificationService, transitions},
};

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn MarketStore>,
    notifications: Arc<NotificationService>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn MarketStore>, notifications: Arc<NotificationService>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn create_job(
        &self,
        customer_id: Uuid,
        data: CreateJobDto,
    ) -> Result<Job, ServiceError> {
        let new_job = NewJob {
            category: data.category,
            title: data.title,
            description: data.description,
            location_address: data.location_address,
            payment_type: data.payment_type,
            fixed_price: data.fixed_price.map(|v| to_decimal(v, "fixed_price")).transpose()?,
            hourly_rate: data.hourly_rate.map(|v| to_decimal(v, "hourly_rate")).transpose()?,
            budget_max: data.budget_max.map(|v| to_decimal(v, "budget_max")).transpose()?,
            urgency: data.urgency,
            materials_provided: data.materials_provided,
            bidding_start_date: data.bidding_start_date,
            bidding_end_date: data.bidding_end_date,
            project_start_date: data.project_start_date,
            project_end_date: data.project_end_date,
        };

        self.store.create_job(customer_id, new_job).await
    }

    /// Opens bidding. The job must carry a future bidding deadline by now;
    /// drafts without one cannot go live.
    pub async fn activate_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;
        transitions::check_job_transition(job.status, JobStatus::Active)?;

        let end = job
            .bidding_end_date
            .ok_or_else(|| ServiceError::Validation("Bidding end date is required to open bidding".to_string()))?;
        if end <= Utc::now() {
            return Err(ServiceError::Validation(
                "Bidding end date must be in the future".to_string(),
            ));
        }
        if let Some(start) = job.bidding_start_date {
            if end <= start {
                return Err(ServiceError::Validation(
                    "Bidding end date must be after the start date".to_string(),
                ));
            }
        }

        self.store
            .update_job_status(job_id, job.status, JobStatus::Active)
            .await
    }

    pub async fn submit_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        data: SubmitBidDto,
    ) -> Result<Bid, ServiceError> {
        let now = Utc::now();

        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.customer_id == provider_id {
            return Err(ServiceError::Validation(
                "You cannot bid on your own job".to_string(),
            ));
        }

        if !transitions::bidding_window_open(&job, now) {
            return Err(ServiceError::BiddingClosed(job_id));
        }

        let amount = to_decimal(data.amount, "amount")?;
        let percentage = data
            .deposit_option
            .deposit_percentage(data.custom_deposit_percentage);
        let deposit_amount =
            amount.clone() * BigDecimal::from(percentage) / BigDecimal::from(100);

        let new_bid = NewBid {
            amount,
            estimated_hours: data.estimated_hours,
            hourly_rate: data.hourly_rate.map(|v| to_decimal(v, "hourly_rate")).transpose()?,
            deposit_option: data.deposit_option,
            custom_deposit_percentage: data.custom_deposit_percentage,
            deposit_amount,
            proposal: data.proposal,
        };

        // The store re-checks the window under its own lock; this pre-check
        // only exists to answer fast with the precise domain error.
        let bid = self.store.create_bid(job_id, provider_id, new_bid, now).await?;

        tracing::debug!(
            "Provider {} bid {} ({} deposit) on job {}",
            provider_id,
            bid.amount,
            bid.deposit_option.to_str(),
            job_id
        );

        self.notifications.notify_bid_received(&job, &bid).await;

        Ok(bid)
    }

    /// Awards the job: the chosen bid wins, every other pending bid loses, and
    /// the job moves to in_progress, all in one committed unit. A concurrent
    /// acceptance that commits first turns this call into `AcceptConflict`.
    pub async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(Job, Bid), ServiceError> {
        self.owned_job(job_id, customer_id).await?;

        let (job, winner, losers) = self.store.accept_bid(job_id, bid_id, Utc::now()).await?;

        self.notifications.notify_bid_accepted(&job, &winner).await;
        for loser in &losers {
            self.notifications.notify_bid_rejected(&job, loser).await;
        }

        Ok((job, winner))
    }

    pub async fn reject_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Bid, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;

        let bid = self
            .store
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;
        if bid.job_id != job_id {
            return Err(ServiceError::BidNotFound(bid_id));
        }
        transitions::check_bid_transition(bid_id, bid.status, BidStatus::Rejected)?;

        let rejected = self.store.reject_bid(bid_id).await?;
        self.notifications.notify_bid_rejected(&job, &rejected).await;

        Ok(rejected)
    }

    pub async fn withdraw_bid(&self, bid_id: Uuid, provider_id: Uuid) -> Result<Bid, ServiceError> {
        let bid = self
            .store
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.provider_id != provider_id {
            return Err(ServiceError::UnauthorizedBidAccess(provider_id, bid_id));
        }
        transitions::check_bid_transition(bid_id, bid.status, BidStatus::Withdrawn)?;

        self.store.withdraw_bid(bid_id).await
    }

    /// Owner-forced closure. Idempotent: closing an already-closed job simply
    /// returns it unchanged.
    pub async fn close_bidding(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;

        match job.status {
            JobStatus::BiddingClosed => Ok(job),
            JobStatus::Active => {
                self.store
                    .update_job_status(job_id, JobStatus::Active, JobStatus::BiddingClosed)
                    .await
            }
            other => Err(ServiceError::InvalidJobStatus(
                job_id,
                other.to_str().to_string(),
            )),
        }
    }

    pub async fn complete_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;
        transitions::check_job_transition(job.status, JobStatus::Completed)?;

        let (job, winning_bid) = self.store.complete_job(job_id, Utc::now()).await?;
        self.notifications.notify_job_completed(&job, &winning_bid).await;

        Ok(job)
    }

    pub async fn cancel_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(job_id, customer_id).await?;
        transitions::check_job_transition(job.status, JobStatus::Cancelled)?;

        let (job, released_bids) = self.store.cancel_job(job_id).await?;
        for bid in &released_bids {
            self.notifications.notify_job_cancelled(&job, bid).await;
        }

        Ok(job)
    }

    pub async fn create_ticket(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        category: TicketCategory,
        priority: TicketPriority,
    ) -> Result<SupportTicket, ServiceError> {
        self.store
            .create_support_ticket(user_id, title, description, category, priority)
            .await
    }

    /// Appends to the ticket thread; closed tickets refuse new messages. A
    /// staff reply on a fresh ticket also moves it into triage.
    pub async fn append_ticket_message(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        message: String,
        is_staff_reply: bool,
    ) -> Result<SupportMessage, ServiceError> {
        let ticket = self
            .store
            .get_support_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if ticket.status == TicketStatus::Closed {
            return Err(ServiceError::TicketClosed(ticket_id));
        }

        let msg = self
            .store
            .add_ticket_message(ticket_id, user_id, message, is_staff_reply)
            .await?;

        if is_staff_reply {
            if ticket.status == TicketStatus::Open {
                self.store
                    .update_ticket_status(ticket_id, TicketStatus::InProgress)
                    .await?;
            }
            self.notifications.notify_ticket_reply(&ticket, &msg).await;
        }

        Ok(msg)
    }

    pub async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, ServiceError> {
        self.store.update_ticket_status(ticket_id, status).await
    }

    async fn owned_job(&self, job_id: Uuid, customer_id: Uuid) -> Result<Job, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.customer_id != customer_id {
            return Err(ServiceError::UnauthorizedJobAccess(customer_id, job_id));
        }

        Ok(job)
    }
}

fn to_decimal(value: f64, field: &str) -> Result<BigDecimal, ServiceError> {
    BigDecimal::from_f64(value)
        .ok_or_else(|| ServiceError::Validation(format!("{} is not a valid amount", field)))
}

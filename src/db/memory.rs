//! In-memory [`MarketStore`](super::MarketStore) backend for engine tests.
//! One mutex around the whole dataset is the atomic-commit primitive: every
//! compound cascade runs inside a single critical section, so racing callers
//! observe either none or all of its writes, exactly like the SQL transaction
//! in the Postgres backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::jobdb::JobExt;
use super::notificationdb::NotificationExt;
use super::supportdb::SupportExt;
use crate::models::jobmodel::*;
use crate::models::notificationmodel::Notification;
use crate::models::supportmodel::*;
use crate::service::error::ServiceError;
use crate::service::transitions;

#[derive(Debug, Default)]
struct MemInner {
    jobs: HashMap<Uuid, Job>,
    bids: HashMap<Uuid, Bid>,
    tickets: HashMap<Uuid, SupportTicket>,
    messages: Vec<SupportMessage>,
    notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobExt for MemStore {
    async fn create_job(&self, customer_id: Uuid, new_job: NewJob) -> Result<Job, ServiceError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            customer_id,
            winning_bid_id: None,
            category: new_job.category,
            title: new_job.title,
            description: new_job.description,
            location_address: new_job.location_address,
            payment_type: new_job.payment_type,
            fixed_price: new_job.fixed_price,
            hourly_rate: new_job.hourly_rate,
            budget_max: new_job.budget_max,
            urgency: new_job.urgency,
            materials_provided: new_job.materials_provided,
            bidding_start_date: new_job.bidding_start_date,
            bidding_end_date: new_job.bidding_end_date,
            project_start_date: new_job.project_start_date,
            project_end_date: new_job.project_end_date,
            status: JobStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.get(&job_id).cloned())
    }

    async fn list_jobs(
        &self,
        category: Option<JobCategory>,
        status: Option<JobStatus>,
        urgency: Option<UrgencyLevel>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| category.map_or(true, |c| job.category == c))
            .filter(|job| status.map_or(true, |s| job.status == s))
            .filter(|job| urgency.map_or(true, |u| job.urgency == u))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| job.customer_id == customer_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Job, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.status != from {
            return Err(ServiceError::InvalidJobStatus(
                job_id,
                job.status.to_str().to_string(),
            ));
        }

        job.status = to;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn close_expired_bidding(&self, now: DateTime<Utc>) -> Result<Vec<Job>, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let mut closed = Vec::new();
        for job in inner.jobs.values_mut() {
            if job.status == JobStatus::Active
                && job.bidding_end_date.map_or(false, |end| end <= now)
            {
                job.status = JobStatus::BiddingClosed;
                job.updated_at = now;
                closed.push(job.clone());
            }
        }
        Ok(closed)
    }

    async fn create_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        new_bid: NewBid,
        now: DateTime<Utc>,
    ) -> Result<Bid, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .get(&job_id)
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !transitions::bidding_window_open(job, now) {
            return Err(ServiceError::BiddingClosed(job_id));
        }

        let bid = Bid {
            id: Uuid::new_v4(),
            job_id,
            provider_id,
            amount: new_bid.amount,
            estimated_hours: new_bid.estimated_hours,
            hourly_rate: new_bid.hourly_rate,
            deposit_option: new_bid.deposit_option,
            custom_deposit_percentage: new_bid.custom_deposit_percentage,
            deposit_amount: new_bid.deposit_amount,
            proposal: new_bid.proposal,
            status: BidStatus::Pending,
            submitted_at: now,
            accepted_at: None,
            completed_at: None,
        };
        inner.bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.bids.get(&bid_id).cloned())
    }

    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<Bid>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut bids: Vec<Bid> = inner
            .bids
            .values()
            .filter(|bid| bid.job_id == job_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(bids)
    }

    async fn get_provider_bids(&self, provider_id: Uuid) -> Result<Vec<Bid>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut bids: Vec<Bid> = inner
            .bids
            .values()
            .filter(|bid| bid.provider_id == provider_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(bids)
    }

    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid, Vec<Bid>), ServiceError> {
        let mut inner = self.inner.lock().unwrap();

        let job = inner
            .jobs
            .get(&job_id)
            .ok_or(ServiceError::JobNotFound(job_id))?
            .clone();
        let bid = inner
            .bids
            .get(&bid_id)
            .ok_or(ServiceError::BidNotFound(bid_id))?
            .clone();

        transitions::check_bid_acceptance(&job, &bid)?;

        let winner = {
            let bid = inner.bids.get_mut(&bid_id).expect("bid checked above");
            bid.status = BidStatus::Accepted;
            bid.accepted_at = Some(now);
            bid.clone()
        };

        let mut losers = Vec::new();
        for sibling in inner.bids.values_mut() {
            if sibling.job_id == job_id && sibling.id != bid_id && sibling.status == BidStatus::Pending
            {
                sibling.status = BidStatus::Rejected;
                losers.push(sibling.clone());
            }
        }

        let updated_job = {
            let job = inner.jobs.get_mut(&job_id).expect("job checked above");
            job.status = JobStatus::InProgress;
            job.winning_bid_id = Some(bid_id);
            job.updated_at = now;
            job.clone()
        };

        Ok((updated_job, winner, losers))
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let bid = inner
            .bids
            .get_mut(&bid_id)
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.status != BidStatus::Pending {
            return Err(ServiceError::BidNotPending(bid_id));
        }

        bid.status = BidStatus::Rejected;
        Ok(bid.clone())
    }

    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let bid = inner
            .bids
            .get_mut(&bid_id)
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.status != BidStatus::Pending {
            return Err(ServiceError::BidNotPending(bid_id));
        }

        bid.status = BidStatus::Withdrawn;
        Ok(bid.clone())
    }

    async fn cancel_job(&self, job_id: Uuid) -> Result<(Job, Vec<Bid>), ServiceError> {
        let mut inner = self.inner.lock().unwrap();

        let job = inner
            .jobs
            .get(&job_id)
            .ok_or(ServiceError::JobNotFound(job_id))?
            .clone();
        transitions::check_job_transition(job.status, JobStatus::Cancelled)?;

        let mut rejected = Vec::new();
        for bid in inner.bids.values_mut() {
            if bid.job_id == job_id && bid.status == BidStatus::Pending {
                bid.status = BidStatus::Rejected;
                rejected.push(bid.clone());
            }
        }

        let cancelled = {
            let job = inner.jobs.get_mut(&job_id).expect("job checked above");
            job.status = JobStatus::Cancelled;
            job.updated_at = Utc::now();
            job.clone()
        };

        Ok((cancelled, rejected))
    }

    async fn complete_job(
        &self,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid), ServiceError> {
        let mut inner = self.inner.lock().unwrap();

        let job = inner
            .jobs
            .get(&job_id)
            .ok_or(ServiceError::JobNotFound(job_id))?
            .clone();
        transitions::check_job_transition(job.status, JobStatus::Completed)?;

        let winning_bid_id = job.winning_bid_id.ok_or_else(|| {
            ServiceError::InvalidJobStatus(job_id, job.status.to_str().to_string())
        })?;

        let winning_bid = {
            let bid = inner
                .bids
                .get_mut(&winning_bid_id)
                .ok_or(ServiceError::BidNotFound(winning_bid_id))?;
            bid.completed_at = Some(now);
            bid.clone()
        };

        let completed = {
            let job = inner.jobs.get_mut(&job_id).expect("job checked above");
            job.status = JobStatus::Completed;
            job.updated_at = now;
            job.clone()
        };

        Ok((completed, winning_bid))
    }
}

#[async_trait]
impl SupportExt for MemStore {
    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        category: TicketCategory,
        priority: TicketPriority,
    ) -> Result<SupportTicket, ServiceError> {
        let now = Utc::now();
        let ticket = SupportTicket {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            category,
            priority,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn get_support_tickets(
        &self,
        limit: i64,
        offset: i64,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut tickets: Vec<SupportTicket> = inner
            .tickets
            .values()
            .filter(|ticket| status.map_or(true, |s| ticket.status == s))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_user_support_tickets(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut tickets: Vec<SupportTicket> = inner
            .tickets
            .values()
            .filter(|ticket| ticket.user_id == user_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn get_support_ticket(&self, ticket_id: Uuid) -> Result<Option<SupportTicket>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tickets.get(&ticket_id).cloned())
    }

    async fn get_support_ticket_with_messages(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<SupportTicketWithMessages>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let ticket = match inner.tickets.get(&ticket_id) {
            Some(ticket) => ticket.clone(),
            None => return Ok(None),
        };
        let mut messages: Vec<SupportMessage> = inner
            .messages
            .iter()
            .filter(|msg| msg.ticket_id == ticket_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(Some(SupportTicketWithMessages { ticket, messages }))
    }

    async fn add_ticket_message(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        message: String,
        is_staff_reply: bool,
    ) -> Result<SupportMessage, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let ticket = inner
            .tickets
            .get(&ticket_id)
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if ticket.status == TicketStatus::Closed {
            return Err(ServiceError::TicketClosed(ticket_id));
        }

        let msg = SupportMessage {
            id: Uuid::new_v4(),
            ticket_id,
            user_id,
            message,
            is_staff_reply,
            created_at: Utc::now(),
        };
        inner.messages.push(msg.clone());
        Ok(msg)
    }

    async fn get_ticket_messages(&self, ticket_id: Uuid) -> Result<Vec<SupportMessage>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<SupportMessage> = inner
            .messages
            .iter()
            .filter(|msg| msg.ticket_id == ticket_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let ticket = inner
            .tickets
            .get_mut(&ticket_id)
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        transitions::check_ticket_transition(ticket_id, ticket.status, status)?;

        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }
}

#[async_trait]
impl NotificationExt for MemStore {
    async fn store_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        reference_id: Option<Uuid>,
        body: String,
    ) -> Result<Notification, ServiceError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: kind.to_string(),
            reference_id,
            body,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.lock().unwrap();
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut notifications: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

//! Transition legality for jobs, bids and support tickets.
//!
//! Every status-change rule lives here, as pure functions over current state.
//! Callers (the lifecycle service and both store backends) consult these
//! instead of comparing raw status values.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::jobmodel::{Bid, BidStatus, Job, JobStatus};
use crate::models::supportmodel::TicketStatus;
use crate::service::error::ServiceError;

/// A job takes new bids only while `active` and before its bidding deadline.
pub fn bidding_window_open(job: &Job, now: DateTime<Utc>) -> bool {
    job.status.accepts_new_bids()
        && job
            .bidding_end_date
            .map_or(true, |end| now < end)
}

pub fn check_job_transition(from: JobStatus, to: JobStatus) -> Result<(), ServiceError> {
    use JobStatus::*;

    let allowed = match (from, to) {
        (Draft, Active) => true,
        // Deadline reached, owner forced closure, or a bid acceptance in flight.
        (Active, BiddingClosed) => true,
        // Only ever reached as the job side of a bid acceptance.
        (Active, InProgress) | (BiddingClosed, InProgress) => true,
        (InProgress, Completed) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            entity: "job",
            from: from.to_str().to_string(),
            to: to.to_str().to_string(),
        })
    }
}

pub fn check_bid_transition(bid_id: Uuid, from: BidStatus, to: BidStatus) -> Result<(), ServiceError> {
    use BidStatus::*;

    match (from, to) {
        (Pending, Accepted) | (Pending, Rejected) | (Pending, Withdrawn) => Ok(()),
        _ if from.is_terminal() => Err(ServiceError::BidNotPending(bid_id)),
        _ => Err(ServiceError::InvalidTransition {
            entity: "bid",
            from: from.to_str().to_string(),
            to: to.to_str().to_string(),
        }),
    }
}

/// Full precondition set for awarding a bid: the job must still be awardable,
/// the bid must belong to the job, and no sibling may already have won.
pub fn check_bid_acceptance(job: &Job, bid: &Bid) -> Result<(), ServiceError> {
    if bid.job_id != job.id {
        return Err(ServiceError::BidNotFound(bid.id));
    }

    match job.status {
        JobStatus::Active | JobStatus::BiddingClosed => {}
        JobStatus::InProgress | JobStatus::Completed if job.winning_bid_id.is_some() => {
            return Err(ServiceError::AcceptConflict(job.id));
        }
        other => {
            return Err(ServiceError::InvalidJobStatus(
                job.id,
                other.to_str().to_string(),
            ));
        }
    }

    if job.winning_bid_id.is_some() {
        return Err(ServiceError::AcceptConflict(job.id));
    }

    check_bid_transition(bid.id, bid.status, BidStatus::Accepted)
}

pub fn check_ticket_transition(
    ticket_id: Uuid,
    from: TicketStatus,
    to: TicketStatus,
) -> Result<(), ServiceError> {
    use TicketStatus::*;

    let allowed = matches!(
        (from, to),
        (Open, InProgress) | (Open, Closed) | (InProgress, Resolved) | (InProgress, Closed) | (Resolved, Closed)
    );

    if allowed {
        Ok(())
    } else if from == Closed {
        Err(ServiceError::TicketClosed(ticket_id))
    } else {
        Err(ServiceError::InvalidTransition {
            entity: "ticket",
            from: from.to_str().to_string(),
            to: to.to_str().to_string(),
        })
    }
}

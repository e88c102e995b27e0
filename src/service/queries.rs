//! Read-only projections over jobs and bids, consumed by the HTTP layer.
//! Nothing here mutates state; time is always an explicit parameter.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::Serialize;
use sqlx::types::BigDecimal;
use std::fmt;

use crate::models::jobmodel::{Bid, BidStatus, Job};
use crate::service::transitions;

pub fn is_bidding_open(job: &Job, now: DateTime<Utc>) -> bool {
    transitions::bidding_window_open(job, now)
}

/// Countdown to the bidding deadline. `Closed` is reported as soon as the
/// deadline has passed, whatever the job status says, so displays can show
/// closure distinctly from a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BiddingCountdown {
    Closed,
    Remaining {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
}

impl fmt::Display for BiddingCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiddingCountdown::Closed => write!(f, "closed"),
            BiddingCountdown::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => write!(f, "{}d {}h {}m {}s", days, hours, minutes, seconds),
        }
    }
}

pub fn time_remaining(job: &Job, now: DateTime<Utc>) -> BiddingCountdown {
    let end = match job.bidding_end_date {
        Some(end) => end,
        None => return BiddingCountdown::Closed,
    };

    let remaining = end - now;
    if remaining <= chrono::Duration::zero() {
        return BiddingCountdown::Closed;
    }

    let total_seconds = remaining.num_seconds();
    BiddingCountdown::Remaining {
        days: total_seconds / 86_400,
        hours: (total_seconds % 86_400) / 3_600,
        minutes: (total_seconds % 3_600) / 60,
        seconds: total_seconds % 60,
    }
}

/// Mean amount over live bids (pending or accepted). `None` when no live bid
/// exists; the caller reports "no bids yet" rather than treating it as zero.
pub fn average_bid_amount(bids: &[Bid]) -> Option<f64> {
    let live: Vec<&BigDecimal> = bids
        .iter()
        .filter(|bid| matches!(bid.status, BidStatus::Pending | BidStatus::Accepted))
        .map(|bid| &bid.amount)
        .collect();

    if live.is_empty() {
        return None;
    }

    let sum = live
        .iter()
        .fold(BigDecimal::from(0), |acc, amount| acc + *amount);
    (sum / BigDecimal::from(live.len() as i64)).to_f64()
}

pub fn winning_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().find(|bid| bid.status == BidStatus::Accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jobmodel::{DepositOption, JobCategory, JobStatus, PaymentType, UrgencyLevel};
    use chrono::Duration;
    use uuid::Uuid;

    fn job_with_deadline(status: JobStatus, end: Option<DateTime<Utc>>) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            winning_bid_id: None,
            category: JobCategory::Cleaning,
            title: "Deep clean apartment".to_string(),
            description: "Two-bedroom apartment, full deep clean".to_string(),
            location_address: "4 Birch Street".to_string(),
            payment_type: PaymentType::Hourly,
            fixed_price: None,
            hourly_rate: Some(BigDecimal::from(35)),
            budget_max: Some(BigDecimal::from(300)),
            urgency: UrgencyLevel::WithinWeek,
            materials_provided: true,
            bidding_start_date: Some(now - Duration::hours(2)),
            bidding_end_date: end,
            project_start_date: None,
            project_end_date: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn bid(amount: i64, status: BidStatus) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            amount: BigDecimal::from(amount),
            estimated_hours: None,
            hourly_rate: None,
            deposit_option: DepositOption::FullPayment,
            custom_deposit_percentage: None,
            deposit_amount: BigDecimal::from(amount),
            proposal: "Available this week".to_string(),
            status,
            submitted_at: Utc::now(),
            accepted_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn countdown_breaks_down_remaining_time() {
        let now = Utc::now();
        let end = now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5);
        let job = job_with_deadline(JobStatus::Active, Some(end));

        assert_eq!(
            time_remaining(&job, now),
            BiddingCountdown::Remaining {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(time_remaining(&job, now).to_string(), "2d 3h 4m 5s");
    }

    #[test]
    fn countdown_is_closed_after_deadline_regardless_of_status() {
        let now = Utc::now();
        let past = now - Duration::seconds(1);

        // Status still says active, deadline passed: the sentinel wins.
        let stale = job_with_deadline(JobStatus::Active, Some(past));
        assert_eq!(time_remaining(&stale, now), BiddingCountdown::Closed);
        assert_eq!(time_remaining(&stale, now).to_string(), "closed");

        let closed = job_with_deadline(JobStatus::BiddingClosed, Some(past));
        assert_eq!(time_remaining(&closed, now), BiddingCountdown::Closed);

        let no_deadline = job_with_deadline(JobStatus::Draft, None);
        assert_eq!(time_remaining(&no_deadline, now), BiddingCountdown::Closed);
    }

    #[test]
    fn bidding_open_tracks_status_and_deadline() {
        let now = Utc::now();
        let open = job_with_deadline(JobStatus::Active, Some(now + Duration::hours(1)));
        assert!(is_bidding_open(&open, now));

        let expired = job_with_deadline(JobStatus::Active, Some(now - Duration::seconds(1)));
        assert!(!is_bidding_open(&expired, now));

        let closed = job_with_deadline(JobStatus::BiddingClosed, Some(now + Duration::hours(1)));
        assert!(!is_bidding_open(&closed, now));
    }

    #[test]
    fn average_ignores_withdrawn_and_rejected() {
        let bids = vec![
            bid(100, BidStatus::Pending),
            bid(150, BidStatus::Accepted),
            bid(900, BidStatus::Withdrawn),
            bid(500, BidStatus::Rejected),
        ];
        assert_eq!(average_bid_amount(&bids), Some(125.0));
    }

    #[test]
    fn average_is_undefined_for_empty_set() {
        assert_eq!(average_bid_amount(&[]), None);
        // Only dead bids count as empty too.
        assert_eq!(average_bid_amount(&[bid(40, BidStatus::Withdrawn)]), None);
    }

    #[test]
    fn winning_bid_finds_the_single_accepted() {
        let bids = vec![
            bid(100, BidStatus::Rejected),
            bid(150, BidStatus::Accepted),
            bid(120, BidStatus::Rejected),
        ];
        let winner = winning_bid(&bids).expect("one accepted bid");
        assert_eq!(winner.amount, BigDecimal::from(150));

        assert!(winning_bid(&[bid(100, BidStatus::Pending)]).is_none());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Plumbing,
    Electrical,
    Carpentry,
    Painting,
    Cleaning,
    Landscaping,
    Moving,
    Roofing,
    Hvac,
    Handyman,
    Other,
}

impl JobCategory {
    pub fn to_str(&self) -> &str {
        match self {
            JobCategory::Plumbing => "plumbing",
            JobCategory::Electrical => "electrical",
            JobCategory::Carpentry => "carpentry",
            JobCategory::Painting => "painting",
            JobCategory::Cleaning => "cleaning",
            JobCategory::Landscaping => "landscaping",
            JobCategory::Moving => "moving",
            JobCategory::Roofing => "roofing",
            JobCategory::Hvac => "hvac",
            JobCategory::Handyman => "handyman",
            JobCategory::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Fixed,
    Hourly,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "urgency_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Asap,
    WithinWeek,
    Flexible,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    BiddingClosed,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::BiddingClosed => "bidding_closed",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transition of any kind.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Statuses past which no new bid may ever be created.
    pub fn accepts_new_bids(&self) -> bool {
        matches!(self, JobStatus::Active)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl BidStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Accepted => "accepted",
            BidStatus::Rejected => "rejected",
            BidStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BidStatus::Pending)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "deposit_option", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DepositOption {
    #[sqlx(rename = "25_percent")]
    #[serde(rename = "25_percent")]
    TwentyFivePercent,
    Custom,
    FullPayment,
}

impl DepositOption {
    pub fn to_str(&self) -> &str {
        match self {
            DepositOption::TwentyFivePercent => "25_percent",
            DepositOption::Custom => "custom",
            DepositOption::FullPayment => "full_payment",
        }
    }

    /// Upfront percentage of the bid amount. `custom` carries its own
    /// percentage, validated to [10, 75] at submission.
    pub fn deposit_percentage(&self, custom_percentage: Option<i32>) -> i32 {
        match self {
            DepositOption::TwentyFivePercent => 25,
            DepositOption::Custom => custom_percentage.unwrap_or(0),
            DepositOption::FullPayment => 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub winning_bid_id: Option<Uuid>,
    pub category: JobCategory,
    pub title: String,
    pub description: String,
    pub location_address: String,
    pub payment_type: PaymentType,
    pub fixed_price: Option<BigDecimal>,
    pub hourly_rate: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub urgency: UrgencyLevel,
    pub materials_provided: bool,
    pub bidding_start_date: Option<DateTime<Utc>>,
    pub bidding_end_date: Option<DateTime<Utc>>,
    pub project_start_date: Option<DateTime<Utc>>,
    pub project_end_date: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub job_id: Uuid,
    pub provider_id: Uuid,
    pub amount: BigDecimal,
    pub estimated_hours: Option<i32>,
    pub hourly_rate: Option<BigDecimal>,
    pub deposit_option: DepositOption,
    pub custom_deposit_percentage: Option<i32>,
    pub deposit_amount: BigDecimal,
    pub proposal: String,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Field bundle for job creation, already converted out of the transport DTO.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub category: JobCategory,
    pub title: String,
    pub description: String,
    pub location_address: String,
    pub payment_type: PaymentType,
    pub fixed_price: Option<BigDecimal>,
    pub hourly_rate: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub urgency: UrgencyLevel,
    pub materials_provided: bool,
    pub bidding_start_date: Option<DateTime<Utc>>,
    pub bidding_end_date: Option<DateTime<Utc>>,
    pub project_start_date: Option<DateTime<Utc>>,
    pub project_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewBid {
    pub amount: BigDecimal,
    pub estimated_hours: Option<i32>,
    pub hourly_rate: Option<BigDecimal>,
    pub deposit_option: DepositOption,
    pub custom_deposit_percentage: Option<i32>,
    pub deposit_amount: BigDecimal,
    pub proposal: String,
}

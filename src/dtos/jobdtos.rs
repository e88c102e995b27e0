use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::jobmodel::*;
use crate::service::queries::BiddingCountdown;

#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_job_pricing_and_dates", skip_on_field_errors = false))]
pub struct CreateJobDto {
    pub category: JobCategory,

    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 20, max = 2000, message = "Description must be between 20 and 2000 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub location_address: String,

    pub payment_type: PaymentType,

    #[validate(range(min = 0.01, message = "Fixed price must be positive"))]
    pub fixed_price: Option<f64>,

    #[validate(range(min = 0.01, message = "Hourly rate must be positive"))]
    pub hourly_rate: Option<f64>,

    #[validate(range(min = 0.01, message = "Budget must be positive"))]
    pub budget_max: Option<f64>,

    pub urgency: UrgencyLevel,

    pub materials_provided: bool,

    pub bidding_start_date: Option<DateTime<Utc>>,
    pub bidding_end_date: Option<DateTime<Utc>>,
    pub project_start_date: Option<DateTime<Utc>>,
    pub project_end_date: Option<DateTime<Utc>>,
}

fn validate_job_pricing_and_dates(dto: &CreateJobDto) -> Result<(), ValidationError> {
    match dto.payment_type {
        PaymentType::Fixed if dto.fixed_price.is_none() => {
            let mut err = ValidationError::new("fixed_price_required");
            err.message = Some("Fixed-price jobs must set fixed_price".into());
            return Err(err);
        }
        PaymentType::Hourly if dto.hourly_rate.is_none() => {
            let mut err = ValidationError::new("hourly_rate_required");
            err.message = Some("Hourly jobs must set hourly_rate".into());
            return Err(err);
        }
        _ => {}
    }

    if let (Some(start), Some(end)) = (dto.bidding_start_date, dto.bidding_end_date) {
        if end <= start {
            let mut err = ValidationError::new("bidding_window_order");
            err.message = Some("Bidding end date must be after the start date".into());
            return Err(err);
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_bid_deposit", skip_on_field_errors = false))]
pub struct SubmitBidDto {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    #[validate(range(min = 1, max = 2000, message = "Estimated hours must be between 1 and 2000"))]
    pub estimated_hours: Option<i32>,

    #[validate(range(min = 0.01, message = "Hourly rate must be positive"))]
    pub hourly_rate: Option<f64>,

    pub deposit_option: DepositOption,

    #[validate(range(min = 10, max = 75, message = "Custom deposit must be between 10% and 75%"))]
    pub custom_deposit_percentage: Option<i32>,

    #[validate(length(min = 20, max = 2500, message = "Proposal must be between 20 and 2500 characters"))]
    pub proposal: String,
}

fn validate_bid_deposit(dto: &SubmitBidDto) -> Result<(), ValidationError> {
    if dto.deposit_option == DepositOption::Custom && dto.custom_deposit_percentage.is_none() {
        let mut err = ValidationError::new("custom_deposit_required");
        err.message = Some("Custom deposits must set custom_deposit_percentage".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SearchJobsDto {
    pub category: Option<JobCategory>,
    pub status: Option<JobStatus>,
    pub urgency: Option<UrgencyLevel>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Job plus the derived read-model fields the listing and detail pages need.
#[derive(Debug, Serialize)]
pub struct JobDetailDto {
    pub job: Job,
    pub bid_count: usize,
    pub average_bid: Option<f64>,
    pub winning_bid: Option<Bid>,
    pub bidding_open: bool,
    pub time_remaining: BiddingCountdown,
    pub countdown: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptBidResponseDto {
    pub job: Job,
    pub bid: Bid,
}

// Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32) -> Self {
        Self {
            status: "success".to_string(),
            data,
            page,
            limit,
        }
    }
}

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Job {0} is not in status {1}")]
    InvalidJobStatus(Uuid, String),

    #[error("Bidding is closed for job {0}")]
    BiddingClosed(Uuid),

    #[error("Bid {0} is no longer pending")]
    BidNotPending(Uuid),

    #[error("Ticket {0} is closed and accepts no further messages")]
    TicketClosed(Uuid),

    #[error("Another bid was already accepted for job {0}")]
    AcceptConflict(Uuid),

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on bid {1}")]
    UnauthorizedBidAccess(Uuid, Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::TicketNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidTransition { .. }
            | ServiceError::InvalidJobStatus(_, _)
            | ServiceError::BiddingClosed(_)
            | ServiceError::BidNotPending(_)
            | ServiceError::TicketClosed(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::AcceptConflict(_) => StatusCode::CONFLICT,

            ServiceError::UnauthorizedJobAccess(_, _)
            | ServiceError::UnauthorizedBidAccess(_, _) => StatusCode::FORBIDDEN,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}

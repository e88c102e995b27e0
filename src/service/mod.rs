pub mod background_jobs;
pub mod error;
pub mod lifecycle_service;
pub mod notification_service;
pub mod queries;
pub mod transitions;

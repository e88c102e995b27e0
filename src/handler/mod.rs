pub mod auth;
pub mod jobs;
pub mod notifications;
pub mod support;
pub mod users;

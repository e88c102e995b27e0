pub mod db;
pub mod jobdb;
#[cfg(test)]
pub mod memory;
pub mod notificationdb;
pub mod supportdb;
pub mod userdb;

use jobdb::JobExt;
use notificationdb::NotificationExt;
use supportdb::SupportExt;

/// Everything the lifecycle engine needs from a storage backend. Satisfied by
/// [`db::DBClient`] in production and by the in-memory store in tests, so the
/// engine never depends on a concrete database.
pub trait MarketStore: JobExt + SupportExt + NotificationExt + Send + Sync {}

impl<T> MarketStore for T where T: JobExt + SupportExt + NotificationExt + Send + Sync {}

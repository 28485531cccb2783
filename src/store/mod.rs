//! Boundary to wherever logs live. Handlers only see [`LogStore`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::calendar::LocalDate;
use crate::error::AppResult;
use crate::models::log::{DateRange, Log};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLogStore;
pub use postgres::PgLogStore;

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Logs for `user_id`, ascending by date. `None` means every log.
    async fn fetch_logs(&self, user_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Log>>;

    /// Insert-or-replace keyed by (user, date). Returns the stored row.
    async fn upsert_log(&self, user_id: Uuid, log: Log) -> AppResult<Log>;

    /// Returns whether a row was removed.
    async fn delete_log(&self, user_id: Uuid, date: LocalDate) -> AppResult<bool>;

    async fn is_ready(&self) -> bool;
}

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::LogStore;
use crate::calendar::LocalDate;
use crate::error::AppResult;
use crate::models::log::{DateRange, Log};

/// Process-local store, used when no database is configured and in tests.
/// Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    entries: Arc<Mutex<BTreeMap<(Uuid, LocalDate), Log>>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn fetch_logs(&self, user_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Log>> {
        let entries = self.entries.lock().await;
        let logs = entries
            .range((user_id, LocalDate::new(i32::MIN, 0, 1))..=(user_id, LocalDate::new(i32::MAX, 11, 31)))
            .map(|(_, log)| log)
            .filter(|log| range.map_or(true, |r| r.contains(log.date)))
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn upsert_log(&self, user_id: Uuid, log: Log) -> AppResult<Log> {
        let mut entries = self.entries.lock().await;
        entries.insert((user_id, log.date), log.clone());
        Ok(log)
    }

    async fn delete_log(&self, user_id: Uuid, date: LocalDate) -> AppResult<bool> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(&(user_id, date)).is_some())
    }

    async fn is_ready(&self) -> bool {
        true
    }
}

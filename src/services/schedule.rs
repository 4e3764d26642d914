use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::{queries, SharedConnection};

/// Where slot availability comes from: the times already taken on a day.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn booked_times(&self, date: NaiveDate) -> anyhow::Result<Vec<String>>;
}

pub struct SqliteSchedule {
    db: SharedConnection,
}

impl SqliteSchedule {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduleSource for SqliteSchedule {
    async fn booked_times(&self, date: NaiveDate) -> anyhow::Result<Vec<String>> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        queries::get_booked_times(&db, date)
    }
}

/// Used when bookings live with the hosting application and we have no view
/// of its calendar: only business hours restrict slots.
pub struct OpenSchedule;

#[async_trait]
impl ScheduleSource for OpenSchedule {
    async fn booked_times(&self, _date: NaiveDate) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

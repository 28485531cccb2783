use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::LogStore;
use crate::calendar::LocalDate;
use crate::error::{AppError, AppResult};
use crate::models::log::{DateRange, Log, LogRow};

pub struct PgLogStore {
    db: PgPool,
}

impl PgLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn to_db_date(date: LocalDate) -> AppResult<chrono::NaiveDate> {
    date.to_naive()
        .ok_or_else(|| AppError::Validation(format!("Date '{}' does not exist", date)))
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn fetch_logs(&self, user_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Log>> {
        let rows = match range {
            Some(range) => {
                sqlx::query_as::<_, LogRow>(
                    r#"
                    SELECT date, mood, worked_out, exercises, drinks, notes FROM daily_logs
                    WHERE user_id = $1 AND date >= $2 AND date < $3
                    ORDER BY date ASC
                    "#,
                )
                .bind(user_id)
                .bind(to_db_date(range.start)?)
                .bind(to_db_date(range.end)?)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, LogRow>(
                    r#"
                    SELECT date, mood, worked_out, exercises, drinks, notes FROM daily_logs
                    WHERE user_id = $1
                    ORDER BY date ASC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows.into_iter().map(Log::from).collect())
    }

    async fn upsert_log(&self, user_id: Uuid, log: Log) -> AppResult<Log> {
        let row = sqlx::query_as::<_, LogRow>(
            r#"
            INSERT INTO daily_logs (id, user_id, date, mood, worked_out, exercises, drinks, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, date) DO UPDATE SET
                mood = EXCLUDED.mood,
                worked_out = EXCLUDED.worked_out,
                exercises = EXCLUDED.exercises,
                drinks = EXCLUDED.drinks,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING date, mood, worked_out, exercises, drinks, notes
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(to_db_date(log.date)?)
        .bind(log.mood)
        .bind(log.worked_out)
        .bind(&log.exercises)
        .bind(log.drinks)
        .bind(&log.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn delete_log(&self, user_id: Uuid, date: LocalDate) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM daily_logs WHERE user_id = $1 AND date = $2")
            .bind(user_id)
            .bind(to_db_date(date)?)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_ready(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await
            .is_ok()
    }
}

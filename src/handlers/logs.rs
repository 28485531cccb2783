use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use validator::Validate;

use crate::auth::AuthUser;
use crate::calendar::{days_between, step_day, today_local, LocalDate};
use crate::error::{AppError, AppResult};
use crate::models::log::{DateRange, DayQuery, Log, LogQuery, UpsertLogRequest};
use crate::AppState;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;
/// Time zones span UTC-12 to UTC+14, so a caller's day is at most one off ours.
const MAX_DAY_SKEW: i64 = 1;
const MAX_STEP_DAYS: i64 = 366;

/// The caller's calendar day, or ours when they did not say.
fn caller_today(claimed: Option<LocalDate>) -> AppResult<LocalDate> {
    let server_today = today_local();
    match claimed {
        None => Ok(server_today),
        Some(today) if days_between(server_today, today).abs() <= MAX_DAY_SKEW => Ok(today),
        Some(today) => Err(AppError::Validation(format!(
            "today '{}' is too far from the server date {}",
            today, server_today
        ))),
    }
}

async fn find_log(state: &AppState, user: &AuthUser, date: LocalDate) -> AppResult<Option<Log>> {
    let logs = state
        .store
        .fetch_logs(user.id, Some(DateRange::inclusive(date, date)))
        .await?;
    Ok(logs.into_iter().next().map(|log| state.cipher.open_log(log)))
}

pub async fn upsert_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertLogRequest>,
) -> AppResult<Json<Log>> {
    body.validate()?;

    let today = caller_today(body.today)?;
    let date = body.date.unwrap_or(today);
    if date > today {
        return Err(AppError::Validation("Cannot log a future date".into()));
    }
    let mood = body
        .mood
        .ok_or_else(|| AppError::Validation("Mood is required".into()))?;

    let log = Log {
        date,
        mood,
        worked_out: body.worked_out,
        exercises: body
            .exercises
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        drinks: body.drinks,
        notes: body.notes.filter(|n| !n.trim().is_empty()),
    };

    let stored = state
        .store
        .upsert_log(auth_user.id, state.cipher.seal_log(log))
        .await?;

    tracing::info!(user_id = %auth_user.id, date = %stored.date, "Log saved");

    Ok(Json(state.cipher.open_log(stored)))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Log>>> {
    let Query(query) = query?;

    let end = query.end.unwrap_or_else(today_local);
    let start = query
        .start
        .unwrap_or_else(|| end.add_days(-DEFAULT_LOOKBACK_DAYS));
    if start > end {
        return Err(AppError::Validation("start must not be after end".into()));
    }

    let logs = state
        .store
        .fetch_logs(auth_user.id, Some(DateRange::inclusive(start, end)))
        .await?;

    Ok(Json(
        logs.into_iter().map(|log| state.cipher.open_log(log)).collect(),
    ))
}

pub async fn get_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    date: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Log>> {
    let Path(raw) = date?;
    let date: LocalDate = raw.parse()?;

    find_log(&state, &auth_user, date)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No log for {}", date)))
}

/// Deleting a day that has no log is not an error.
pub async fn delete_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    date: Result<Path<String>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(raw) = date?;
    let date: LocalDate = raw.parse()?;

    let removed = state.store.delete_log(auth_user.id, date).await?;
    tracing::info!(user_id = %auth_user.id, %date, removed, "Log deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: LocalDate,
    pub is_today: bool,
    pub can_step_forward: bool,
    pub log: Option<Log>,
}

/// Previous/next day navigation for the entry form.
pub async fn step(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> AppResult<Json<DayResponse>> {
    let Query(query) = query?;
    if !(-MAX_STEP_DAYS..=MAX_STEP_DAYS).contains(&query.delta) {
        return Err(AppError::Validation(format!(
            "delta must be within {} days",
            MAX_STEP_DAYS
        )));
    }

    let today = caller_today(query.today)?;
    let date = step_day(query.date.unwrap_or(today), query.delta, today);

    Ok(Json(DayResponse {
        date,
        is_today: date == today,
        can_step_forward: date < today,
        log: find_log(&state, &auth_user, date).await?,
    }))
}

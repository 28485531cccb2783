use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::calendar::{today_local, LocalDate};
use crate::error::{AppError, AppResult};
use crate::models::log::DateRange;
use crate::period::{
    summarize, summarize_range, workout_streaks, PeriodSummary, Streaks, ViewKind, ViewWindow,
};
use crate::AppState;

/// A century of months either way.
const MAX_OFFSET: i32 = 1200;

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    #[serde(default)]
    pub view: ViewKind,
    #[serde(default)]
    pub offset: i32,
    pub today: Option<LocalDate>,
}

#[derive(Debug, Deserialize)]
pub struct CustomRangeQuery {
    pub start: LocalDate,
    /// Inclusive.
    pub end: LocalDate,
    pub today: Option<LocalDate>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub summary: PeriodSummary,
    pub streaks: Streaks,
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> AppResult<Json<InsightsResponse>> {
    let Query(query) = query?;
    if !(-MAX_OFFSET..=MAX_OFFSET).contains(&query.offset) {
        return Err(AppError::Validation(format!(
            "offset must be between -{0} and {0}",
            MAX_OFFSET
        )));
    }
    let today = query.today.unwrap_or_else(today_local);
    let window = ViewWindow::new(query.view, query.offset);

    // streaks need the whole history, so fetch everything once
    let logs = state.store.fetch_logs(auth_user.id, None).await?;

    Ok(Json(InsightsResponse {
        summary: summarize(&logs, window, today),
        streaks: workout_streaks(&logs, today),
    }))
}

pub async fn get_custom_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CustomRangeQuery>, QueryRejection>,
) -> AppResult<Json<InsightsResponse>> {
    let Query(query) = query?;
    if query.start > query.end {
        return Err(AppError::Validation("start must not be after end".into()));
    }
    let today = query.today.unwrap_or_else(today_local);

    let logs = state.store.fetch_logs(auth_user.id, None).await?;

    Ok(Json(InsightsResponse {
        summary: summarize_range(&logs, DateRange::inclusive(query.start, query.end)),
        streaks: workout_streaks(&logs, today),
    }))
}

//! Grid endpoints. Each one returns the cells plus the legend for the
//! chosen metric so the client never re-derives buckets.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::AuthUser;
use crate::calendar::{first_of_month, today_local, LocalDate};
use crate::error::AppResult;
use crate::grid::{
    build_activity_grid, build_month_grid, build_timeline, build_year_grid, GridContext,
    LogIndex, Metric, MonthCursor,
};
use crate::models::log::{DateRange, Log};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CalendarQuery {
    #[validate(range(min = 0, max = 9999, message = "year must be between 0 and 9999"))]
    pub year: Option<i32>,
    /// 1-based.
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: Option<u32>,
    pub selected: Option<LocalDate>,
    pub today: Option<LocalDate>,
    #[serde(default)]
    pub metric: Metric,
}

impl CalendarQuery {
    fn context(&self) -> GridContext {
        GridContext {
            today: self.today.unwrap_or_else(today_local),
            selected: self.selected,
            metric: self.metric,
        }
    }

    fn year(&self, ctx: &GridContext) -> i32 {
        self.year.unwrap_or(ctx.today.year)
    }

    fn cursor(&self, ctx: &GridContext) -> MonthCursor {
        let month0 = self.month.map_or(ctx.today.month0, |m| m - 1);
        MonthCursor::new(self.year(ctx), month0)
    }
}

/// Rejects out-of-range values before any date arithmetic runs.
fn checked(query: Result<Query<CalendarQuery>, QueryRejection>) -> AppResult<CalendarQuery> {
    let Query(query) = query?;
    query.validate()?;
    Ok(query)
}

async fn load(
    state: &AppState,
    user: &AuthUser,
    range: Option<DateRange>,
) -> AppResult<Vec<Log>> {
    let logs = state.store.fetch_logs(user.id, range).await?;
    Ok(logs.into_iter().map(|log| state.cipher.open_log(log)).collect())
}

pub async fn month(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let query = checked(query)?;
    let ctx = query.context();
    let cursor = query.cursor(&ctx);

    let range = DateRange::new(
        LocalDate::new(cursor.year, cursor.month0, 1),
        first_of_month(cursor.year, cursor.month0 as i32 + 1),
    );
    let logs = load(&state, &auth_user, Some(range)).await?;
    let index = LogIndex::new(&logs);
    let grid = build_month_grid(cursor.year, cursor.month0, &index, &ctx);

    Ok(Json(json!({
        "metric": ctx.metric,
        "legend": ctx.metric.legend(),
        "prev": cursor.prev(),
        "next": cursor.next(ctx.today),
        "grid": grid,
    })))
}

pub async fn year(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let query = checked(query)?;
    let ctx = query.context();
    let year = query.year(&ctx);

    let range = DateRange::new(LocalDate::new(year, 0, 1), LocalDate::new(year + 1, 0, 1));
    let logs = load(&state, &auth_user, Some(range)).await?;
    let index = LogIndex::new(&logs);

    Ok(Json(json!({
        "metric": ctx.metric,
        "legend": ctx.metric.legend(),
        "grid": build_year_grid(year, &index, &ctx),
    })))
}

pub async fn activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let query = checked(query)?;
    let ctx = query.context();
    let year = query.year(&ctx);

    // padding weeks reach at most six days into the neighbouring years
    let range = DateRange::new(
        LocalDate::new(year, 0, 1).add_days(-7),
        LocalDate::new(year + 1, 0, 1).add_days(7),
    );
    let logs = load(&state, &auth_user, Some(range)).await?;
    let index = LogIndex::new(&logs);

    Ok(Json(json!({
        "metric": ctx.metric,
        "legend": ctx.metric.legend(),
        "grid": build_activity_grid(year, &index, &ctx),
    })))
}

pub async fn timeline(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let query = checked(query)?;
    let ctx = query.context();
    let anchor = query.cursor(&ctx);

    let logs = load(&state, &auth_user, None).await?;
    let index = LogIndex::new(&logs);
    let months = build_timeline(anchor, &index, &ctx);

    tracing::debug!(user_id = %auth_user.id, months = months.len(), "Built timeline");

    Ok(Json(json!({
        "metric": ctx.metric,
        "legend": ctx.metric.legend(),
        "months": months,
    })))
}

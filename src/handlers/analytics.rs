use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::analytics::calendar::{legend, CalendarProjector};
use crate::analytics::labels::range_title;
use crate::analytics::trend::plot;
use crate::analytics::window::{DateBucketer, Granularity};
use crate::analytics::MoodAnalyticsEngine;
use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::dto::{
    AnalyticsQuery, AnalyticsResponse, CalendarQuery, CalendarResponse, NavigateQuery,
    NavigateResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::mood_entry::MoodEntry;
use crate::AppState;

const DEFAULT_PLOT_WIDTH: f64 = 320.0;
const DEFAULT_PLOT_HEIGHT: f64 = 180.0;
const MAX_PLOT_SIDE: f64 = 10_000.0;

pub fn resolve_timezone(config: &Config, tz: Option<&str>) -> AppResult<Tz> {
    match tz.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(config.default_timezone),
        Some(name) => name
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown time zone: {}", name))),
    }
}

pub fn resolve_week_start(config: &Config, week_start: Option<&str>) -> AppResult<Weekday> {
    match week_start.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(config.week_start),
        Some(day) => day
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown weekday: {}", day))),
    }
}

pub fn bucketer_for(
    config: &Config,
    tz: Option<&str>,
    week_start: Option<&str>,
) -> AppResult<DateBucketer<Tz>> {
    Ok(DateBucketer::new(
        resolve_timezone(config, tz)?,
        resolve_week_start(config, week_start)?,
    ))
}

/// Local noon of `date`, or now when no date is given. Noon keeps the
/// instant on the same calendar day even on transition days.
pub fn reference_instant(
    bucketer: &DateBucketer<Tz>,
    date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(date) = date else {
        return now;
    };
    let noon = date
        .and_hms_opt(12, 0, 0)
        .and_then(|naive| bucketer.timezone().from_local_datetime(&naive).earliest());
    match noon {
        Some(local) => local.with_timezone(&Utc),
        None => {
            tracing::warn!(%date, "No local noon for reference date, using now");
            now
        }
    }
}

/// Entries for the analytics path. A failing store yields an empty list.
pub async fn load_entries(state: &AppState, owner: Uuid) -> Vec<MoodEntry> {
    match state.moods.fetch_entries(owner).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(user_id = %owner, error = %e, "Entry fetch failed, showing empty analytics");
            Vec::new()
        }
    }
}

fn plot_side(value: Option<f64>, default: f64, name: &str) -> AppResult<f64> {
    let side = value.unwrap_or(default);
    if side.is_finite() && side > 0.0 && side <= MAX_PLOT_SIDE {
        Ok(side)
    } else {
        Err(AppError::Validation(format!(
            "{} must be between 0 and {}",
            name, MAX_PLOT_SIDE
        )))
    }
}

pub async fn get_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<AnalyticsResponse>> {
    let bucketer = bucketer_for(
        &state.config,
        query.tz.as_deref(),
        query.week_start.as_deref(),
    )?;
    let width = plot_side(query.width, DEFAULT_PLOT_WIDTH, "width")?;
    let height = plot_side(query.height, DEFAULT_PLOT_HEIGHT, "height")?;

    let reference = reference_instant(&bucketer, query.date, Utc::now());
    let entries = load_entries(&state, auth_user.id).await;

    let timezone = bucketer.timezone().name().to_string();
    let week_start = bucketer.week_start();
    let date = bucketer.local_date(reference);
    let engine = MoodAnalyticsEngine::new(bucketer);
    let report = engine.report(&entries, reference, query.granularity);
    let plot = plot(&report.trend, query.style, width, height);

    Ok(Json(AnalyticsResponse {
        date,
        timezone,
        week_start,
        svg_path: plot.svg_path(),
        report,
        plot,
    }))
}

pub async fn navigate(
    State(state): State<AppState>,
    Query(query): Query<NavigateQuery>,
) -> AppResult<Json<NavigateResponse>> {
    let bucketer = bucketer_for(
        &state.config,
        query.tz.as_deref(),
        query.week_start.as_deref(),
    )?;
    let reference = reference_instant(&bucketer, query.date, Utc::now());
    Ok(Json(navigate_from(
        &bucketer,
        reference,
        query.granularity,
        query.step.unwrap_or(1),
    )))
}

pub fn navigate_from(
    bucketer: &DateBucketer<Tz>,
    reference: DateTime<Utc>,
    granularity: Granularity,
    step: i32,
) -> NavigateResponse {
    let shifted = bucketer.shift(reference, granularity, step);
    let date = bucketer.local_date(shifted);
    NavigateResponse {
        granularity,
        date,
        title: range_title(bucketer, date, granularity),
        window: bucketer.window_for(shifted, granularity).ok(),
    }
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarResponse>> {
    let bucketer = bucketer_for(
        &state.config,
        query.tz.as_deref(),
        query.week_start.as_deref(),
    )?;
    let month = query
        .month
        .unwrap_or_else(|| bucketer.local_date(Utc::now()));
    let month = month.with_day(1).unwrap_or(month);

    let entries = load_entries(&state, auth_user.id).await;
    let days = CalendarProjector::new(bucketer).month_grid(&entries, month);

    Ok(Json(CalendarResponse {
        title: month.format("%B %Y").to_string(),
        month,
        days,
        legend: legend(),
    }))
}

//! # Mood Journal: Request/Response DTOs
//!
//! API contract types that are not plain models.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//! - Validation is expressed via `validator` derive macros

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::analytics::calendar::{CalendarDay, CellColor, LegendItem};
use crate::analytics::trend::{CurveStyle, TrendPlot};
use crate::analytics::window::{Granularity, Window};
use crate::analytics::AnalyticsReport;
use crate::models::mood_entry::MoodEntry;

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

/// DELETE /api/entries
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearEntriesResponse {
    pub deleted: u64,
}

/// GET /api/export
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub tz: Option<String>,
}

// ============================================================================
// Moods
// ============================================================================

/// One row of GET /api/moods
#[derive(Debug, Serialize)]
pub struct MoodCatalogItem {
    pub mood: &'static str,
    pub emoji: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub color: CellColor,
    pub chart_color: &'static str,
    pub sub_moods: &'static [&'static str],
}

// ============================================================================
// Analytics
// ============================================================================

/// GET /api/analytics
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub granularity: Granularity,
    /// Any local date inside the wanted window. Default: today.
    pub date: Option<NaiveDate>,
    pub tz: Option<String>,
    pub week_start: Option<String>,
    #[serde(default)]
    pub style: CurveStyle,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub date: NaiveDate,
    pub timezone: String,
    pub week_start: Weekday,
    #[serde(flatten)]
    pub report: AnalyticsReport,
    pub plot: TrendPlot,
    pub svg_path: String,
}

/// GET /api/analytics/navigate
#[derive(Debug, Default, Deserialize)]
pub struct NavigateQuery {
    #[serde(default)]
    pub granularity: Granularity,
    pub date: Option<NaiveDate>,
    /// Signed number of granularity units to move. Default: 1.
    pub step: Option<i32>,
    pub tz: Option<String>,
    pub week_start: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub granularity: Granularity,
    pub date: NaiveDate,
    pub title: String,
    pub window: Option<Window>,
}

/// GET /api/analytics/calendar
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// Any date in the month to show. Default: this month.
    pub month: Option<NaiveDate>,
    pub tz: Option<String>,
    pub week_start: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub title: String,
    pub month: NaiveDate,
    pub days: Vec<CalendarDay>,
    pub legend: Vec<LegendItem>,
}

// ============================================================================
// Live channel
// ============================================================================

/// Published on the broadcast channel whenever a user's entries change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    EntryCreated { user_id: Uuid, entry: MoodEntry },
    EntriesCleared { user_id: Uuid, deleted: u64 },
}

impl LiveEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            LiveEvent::EntryCreated { user_id, .. } | LiveEvent::EntriesCleared { user_id, .. } => {
                *user_id
            }
        }
    }
}

/// Messages a client sends over /ws.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Select a view; absent fields keep their current value.
    Select {
        granularity: Option<Granularity>,
        date: Option<NaiveDate>,
        tz: Option<String>,
        week_start: Option<String>,
    },
    /// Move the current view by `step` units (default 1).
    Navigate { step: Option<i32> },
    Refresh,
}

/// Messages the server sends over /ws.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Report {
        ticket: u64,
        date: NaiveDate,
        report: AnalyticsReport,
    },
    Event {
        event: LiveEvent,
    },
    Error {
        message: String,
    },
}

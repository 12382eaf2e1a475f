use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::mood::Mood;

/// A single logged mood. Entries are never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub main_mood: String,
    pub sub_mood: Option<String>,
    pub notes: Option<String>,
}

/// An entry that has been validated but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMoodEntry {
    pub timestamp: DateTime<Utc>,
    pub main_mood: String,
    pub sub_mood: Option<String>,
    pub notes: Option<String>,
}

impl NewMoodEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        mood: Mood,
        sub_mood: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            main_mood: mood.label().to_string(),
            sub_mood: sub_mood.filter(|s| !s.trim().is_empty()),
            notes: notes.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    pub main_mood: String,

    #[validate(length(max = 200, message = "Sub mood must be under 200 characters"))]
    pub sub_mood: Option<String>,

    #[validate(length(max = 5000, message = "Notes must be under 5000 characters"))]
    pub notes: Option<String>,

    /// Past entry date. Absent means "current mood" (now).
    pub date: Option<NaiveDate>,

    /// Time of day for a past entry. Defaults to the current time of day.
    pub time: Option<NaiveTime>,

    /// IANA zone the date and time are expressed in.
    pub timezone: Option<String>,
}

impl CreateEntryRequest {
    /// Resolves the entry instant: now for a current mood, otherwise the local
    /// date and time in `tz`. A local time that does not exist falls back to now.
    pub fn resolve_timestamp<Tz: TimeZone>(&self, tz: &Tz, now: DateTime<Utc>) -> DateTime<Utc> {
        let Some(date) = self.date else {
            return now;
        };
        let time = self
            .time
            .unwrap_or_else(|| now.with_timezone(tz).time());

        match tz.from_local_datetime(&date.and_time(time)).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => {
                tracing::warn!(%date, %time, "Local entry time does not exist, using now");
                now
            }
        }
    }
}

//! Mood analytics: pure transformations from a list of entries to the views
//! the clients draw (frequency bars, trend line, calendar heat-map).
//!
//! Nothing in here touches storage or holds state between calls. Callers
//! fetch a snapshot of entries and recompute whenever it changes.

pub mod calendar;
pub mod frequency;
pub mod labels;
pub mod score;
pub mod stats;
pub mod trend;
pub mod window;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::mood_entry::MoodEntry;
use frequency::FrequencyRow;
use stats::MoodSummary;
use trend::TrendPoint;
use window::{DateBucketer, Granularity, Window};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub granularity: Granularity,
    /// Absent when the window could not be computed in this zone.
    pub window: Option<Window>,
    pub title: String,
    pub frequencies: Vec<FrequencyRow>,
    pub trend: Vec<TrendPoint>,
    pub axis_labels: Vec<Option<String>>,
    pub summary: MoodSummary,
}

/// Filters entries to the active window and derives every chart view from them.
#[derive(Debug, Clone)]
pub struct MoodAnalyticsEngine<Tz: TimeZone> {
    bucketer: DateBucketer<Tz>,
}

impl<Tz: TimeZone> MoodAnalyticsEngine<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn new(bucketer: DateBucketer<Tz>) -> Self {
        Self { bucketer }
    }

    pub fn report(
        &self,
        entries: &[MoodEntry],
        reference: DateTime<Utc>,
        granularity: Granularity,
    ) -> AnalyticsReport {
        let local_date = self.bucketer.local_date(reference);
        let title = labels::range_title(&self.bucketer, local_date, granularity);

        let window = match self.bucketer.window_for(reference, granularity) {
            Ok(window) => Some(window),
            Err(e) => {
                tracing::warn!(error = %e, %reference, %granularity, "Could not compute analytics window");
                None
            }
        };
        let filtered: Vec<&MoodEntry> = match &window {
            Some(window) => self.bucketer.filter(entries, window),
            None => Vec::new(),
        };

        let trend = trend::series(filtered.iter().copied());
        let axis_labels = labels::axis_labels(self.bucketer.timezone(), &trend, granularity);

        AnalyticsReport {
            granularity,
            window,
            title,
            frequencies: frequency::frequencies(filtered.iter().copied()),
            trend,
            axis_labels,
            summary: stats::summarize(filtered.iter().copied()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use crate::models::mood_entry::MoodEntry;

    pub fn ts(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    pub fn entry(mood: &str, rfc3339: &str) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            owner_id: None,
            timestamp: ts(rfc3339),
            main_mood: mood.to_string(),
            sub_mood: None,
            notes: None,
        }
    }
}

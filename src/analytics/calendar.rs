use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::analytics::window::DateBucketer;
use crate::models::mood::Mood;
use crate::models::mood_entry::MoodEntry;

/// Six weeks of seven days.
pub const GRID_DAYS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellColor {
    pub hex: &'static str,
    pub opacity: f64,
}

const FALLBACK_CELL: CellColor = CellColor {
    hex: "#C7C7CC",
    opacity: 0.7,
};
const FALLBACK_CHART: &str = "#8E8E93";

/// Calendar cell color for a mood label. Unrecognized labels get a neutral gray.
pub fn cell_color(label: &str) -> CellColor {
    let (hex, opacity) = match label.parse::<Mood>() {
        Ok(Mood::Happy) => ("#34C759", 0.7),
        Ok(Mood::Calm) => ("#007AFF", 0.7),
        Ok(Mood::Neutral) => ("#8E8E93", 0.7),
        Ok(Mood::Sad) => ("#0A84FF", 0.8),
        Ok(Mood::Stressed) => ("#FF9500", 0.7),
        Ok(Mood::Angry) => ("#FF3B30", 0.7),
        Ok(Mood::Tired) => ("#AF52DE", 0.6),
        Ok(Mood::Sick) => ("#A2845E", 0.6),
        Ok(Mood::Unknown) | Err(_) => return FALLBACK_CELL,
    };
    CellColor { hex, opacity }
}

/// Solid bar color used by frequency charts.
pub fn chart_color(label: &str) -> &'static str {
    match label.parse::<Mood>() {
        Ok(Mood::Unknown) | Err(_) => FALLBACK_CHART,
        Ok(_) => cell_color(label).hex,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub moods: Vec<String>,
    pub colors: Vec<CellColor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendItem {
    pub mood: &'static str,
    pub color: CellColor,
}

pub fn legend() -> Vec<LegendItem> {
    Mood::SCORED
        .iter()
        .map(|m| LegendItem {
            mood: m.label(),
            color: cell_color(m.label()),
        })
        .collect()
}

/// Groups entries by local calendar day for a month view.
#[derive(Debug, Clone)]
pub struct CalendarProjector<Tz: TimeZone> {
    bucketer: DateBucketer<Tz>,
}

impl<Tz: TimeZone> CalendarProjector<Tz> {
    pub fn new(bucketer: DateBucketer<Tz>) -> Self {
        Self { bucketer }
    }

    /// The 42 dates shown for the month containing `month_reference`,
    /// starting on the first weekday on or before the 1st.
    pub fn grid_days(&self, month_reference: NaiveDate) -> Vec<NaiveDate> {
        let Some(first) = self.grid_start(month_reference) else {
            return Vec::new();
        };
        first.iter_days().take(GRID_DAYS).collect()
    }

    fn grid_start(&self, month_reference: NaiveDate) -> Option<NaiveDate> {
        self.bucketer.start_of_week(month_reference.with_day(1)?)
    }

    /// Mood labels per grid day, in encounter order. Days without entries are absent.
    pub fn buckets_for_month(
        &self,
        entries: &[MoodEntry],
        month_reference: NaiveDate,
    ) -> BTreeMap<NaiveDate, Vec<String>> {
        let mut buckets: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
        let Some(first) = self.grid_start(month_reference) else {
            return buckets;
        };
        let last = first.checked_add_days(Days::new(GRID_DAYS as u64));

        for entry in entries {
            let day = self.bucketer.local_date(entry.timestamp);
            let in_grid = day >= first && last.map_or(true, |last| day < last);
            if in_grid {
                buckets.entry(day).or_default().push(entry.main_mood.clone());
            }
        }
        buckets
    }

    pub fn month_grid(&self, entries: &[MoodEntry], month_reference: NaiveDate) -> Vec<CalendarDay> {
        let mut buckets = self.buckets_for_month(entries, month_reference);
        self.grid_days(month_reference)
            .into_iter()
            .map(|date| {
                let moods = buckets.remove(&date).unwrap_or_default();
                let colors = moods.iter().map(|m| cell_color(m)).collect();
                CalendarDay {
                    date,
                    in_current_month: date.year() == month_reference.year()
                        && date.month() == month_reference.month(),
                    moods,
                    colors,
                }
            })
            .collect()
    }
}

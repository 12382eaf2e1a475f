use chrono::TimeZone;

use crate::models::mood_entry::MoodEntry;

pub const CSV_HEADER: &str = "Date,Main Mood,Sub Mood,Notes";

const DATE_FORMAT: &str = "%b %-d, %Y at %-I:%M %p";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Renders entries as CSV, one row per entry in the given order, with dates
/// shown in `tz`. Every field is quoted.
pub fn entries_to_csv<Tz: TimeZone>(entries: &[MoodEntry], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(64 * (entries.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for entry in entries {
        let date = entry.timestamp.with_timezone(tz).format(DATE_FORMAT).to_string();
        let row = [
            quote(&date),
            quote(&entry.main_mood),
            quote(entry.sub_mood.as_deref().unwrap_or("")),
            quote(entry.notes.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Attachment name for an export generated on `date`.
pub fn export_filename(date: chrono::NaiveDate) -> String {
    format!("mood-journal-{}.csv", date.format("%Y-%m-%d"))
}

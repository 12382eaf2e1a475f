use serde::Serialize;

use crate::analytics::frequency::frequencies;
use crate::analytics::score::score_for;
use crate::models::mood_entry::MoodEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub total_entries: usize,
    pub most_common: Option<String>,
    pub average_score: Option<f64>,
}

pub fn summarize<'a, I>(entries: I) -> MoodSummary
where
    I: IntoIterator<Item = &'a MoodEntry>,
    I::IntoIter: Clone,
{
    let entries = entries.into_iter();
    let total_entries = entries.clone().count();
    let most_common = frequencies(entries.clone())
        .into_iter()
        .next()
        .map(|row| row.mood);

    let scores: Vec<f64> = entries.filter_map(|e| score_for(&e.main_mood)).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    MoodSummary {
        total_entries,
        most_common,
        average_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::entry;

    #[test]
    fn test_summary() {
        let entries = vec![
            entry("Calm", "2024-01-01T09:00:00Z"),
            entry("Happy", "2024-01-02T09:00:00Z"),
            entry("Happy", "2024-01-03T09:00:00Z"),
            entry("Unknown", "2024-01-04T09:00:00Z"),
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total_entries, 4);
        assert_eq!(summary.most_common.as_deref(), Some("Happy"));
        // Unknown is counted but not averaged.
        assert_eq!(summary.average_score, Some(14.0 / 3.0));
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = summarize(&Vec::<MoodEntry>::new());
        assert_eq!(summary.total_entries, 0);
        assert_eq!(summary.most_common, None);
        assert_eq!(summary.average_score, None);
    }

    #[test]
    fn test_unscored_only_has_no_average() {
        let entries = vec![entry("Unknown", "2024-01-04T09:00:00Z")];
        assert_eq!(summarize(&entries).average_score, None);
    }
}

use std::collections::HashMap;

use serde::Serialize;

use crate::models::mood_entry::MoodEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRow {
    pub mood: String,
    pub count: usize,
}

/// Counts entries per `main_mood` label, every label included.
///
/// Rows are sorted by descending count. The sort is stable, so labels with
/// equal counts keep the order in which they were first seen.
pub fn frequencies<'a, I>(entries: I) -> Vec<FrequencyRow>
where
    I: IntoIterator<Item = &'a MoodEntry>,
{
    let mut rows: Vec<FrequencyRow> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for entry in entries {
        match index.get(entry.main_mood.as_str()) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(entry.main_mood.as_str(), rows.len());
                rows.push(FrequencyRow {
                    mood: entry.main_mood.clone(),
                    count: 1,
                });
            }
        }
    }

    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::entry;

    fn counts(rows: &[FrequencyRow]) -> Vec<(&str, usize)> {
        rows.iter().map(|r| (r.mood.as_str(), r.count)).collect()
    }

    #[test]
    fn test_counts_and_orders_by_frequency() {
        let entries = vec![
            entry("Happy", "2024-01-01T09:00:00Z"),
            entry("Happy", "2024-01-02T09:00:00Z"),
            entry("Sad", "2024-01-03T09:00:00Z"),
        ];
        assert_eq!(counts(&frequencies(&entries)), vec![("Happy", 2), ("Sad", 1)]);
    }

    #[test]
    fn test_ties_keep_first_encounter_order() {
        let entries = vec![
            entry("Tired", "2024-01-01T09:00:00Z"),
            entry("Calm", "2024-01-01T10:00:00Z"),
            entry("Angry", "2024-01-01T11:00:00Z"),
            entry("Calm", "2024-01-01T12:00:00Z"),
            entry("Tired", "2024-01-01T13:00:00Z"),
        ];
        assert_eq!(
            counts(&frequencies(&entries)),
            vec![("Tired", 2), ("Calm", 2), ("Angry", 1)]
        );
    }

    #[test]
    fn test_unknown_and_unrecognized_labels_are_counted() {
        let entries = vec![
            entry("Unknown", "2024-01-01T09:00:00Z"),
            entry("Elated", "2024-01-01T10:00:00Z"),
        ];
        let rows = frequencies(&entries);
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(frequencies(&Vec::<MoodEntry>::new()).is_empty());
    }
}

use axum::Json;

use crate::analytics::calendar::{cell_color, chart_color};
use crate::dto::MoodCatalogItem;
use crate::models::mood::Mood;

pub fn catalog() -> Vec<MoodCatalogItem> {
    Mood::ALL
        .iter()
        .map(|mood| MoodCatalogItem {
            mood: mood.label(),
            emoji: mood.emoji(),
            score: mood.score(),
            color: cell_color(mood.label()),
            chart_color: chart_color(mood.label()),
            sub_moods: mood.suggested_sub_moods(),
        })
        .collect()
}

pub async fn list_moods() -> Json<Vec<MoodCatalogItem>> {
    Json(catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_closed_set() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog[0].mood, "Happy");
        assert_eq!(catalog[0].score, Some(5.0));

        let unknown = catalog.last().unwrap();
        assert_eq!(unknown.mood, "Unknown");
        assert_eq!(unknown.score, None);
        assert_eq!(unknown.color.hex, "#C7C7CC");
        assert_eq!(unknown.chart_color, "#8E8E93");
    }
}

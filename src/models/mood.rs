use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analytics::score;

/// The closed set of primary moods a user can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Calm,
    Neutral,
    Sad,
    Stressed,
    Angry,
    Tired,
    Sick,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
#[error("Unrecognized mood: {0}")]
pub struct UnknownMood(pub String);

impl Mood {
    pub const ALL: [Mood; 9] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Neutral,
        Mood::Sad,
        Mood::Stressed,
        Mood::Angry,
        Mood::Tired,
        Mood::Sick,
        Mood::Unknown,
    ];

    /// Moods that carry a trend score, in legend order.
    pub const SCORED: [Mood; 8] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Neutral,
        Mood::Sad,
        Mood::Stressed,
        Mood::Angry,
        Mood::Tired,
        Mood::Sick,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Neutral => "Neutral",
            Mood::Sad => "Sad",
            Mood::Stressed => "Stressed",
            Mood::Angry => "Angry",
            Mood::Tired => "Tired",
            Mood::Sick => "Sick",
            Mood::Unknown => "Unknown",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Calm => "😌",
            Mood::Neutral => "😐",
            Mood::Sad => "😔",
            Mood::Stressed => "😥",
            Mood::Angry => "😠",
            Mood::Tired => "😴",
            Mood::Sick => "🤒",
            Mood::Unknown => "❓",
        }
    }

    /// Refinements offered when logging this mood. Users may still type their own.
    pub fn suggested_sub_moods(&self) -> &'static [&'static str] {
        match self {
            Mood::Happy => &["Joyful", "Grateful", "Content", "Excited", "Hopeful"],
            Mood::Calm => &["Relaxed", "At ease", "Meditation"],
            Mood::Neutral => &["Detached", "Numbed", "Bored", "Normal"],
            Mood::Sad => &["Lonely", "Heartbroken", "Disappointed", "Grieving"],
            Mood::Stressed => &["Anxious", "Overwhelmed", "Worried", "Burned Out"],
            Mood::Angry => &["Irritated", "Frustrated", "Resentful", "Furious"],
            Mood::Tired => &["Sleepy", "No motivation", "Drained", "Burnt Out"],
            Mood::Sick => &["Cold", "In Pain", "Period", "Other"],
            Mood::Unknown => &["The feelings can't be named"],
        }
    }

    pub fn score(&self) -> Option<f64> {
        score::score_for(self.label())
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.label() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(mood.label().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("happy".parse::<Mood>().is_err());
        assert!("Ecstatic".parse::<Mood>().is_err());
    }

    #[test]
    fn test_unknown_has_no_score() {
        assert_eq!(Mood::Unknown.score(), None);
        assert!(Mood::SCORED.iter().all(|m| m.score().is_some()));
    }

    #[test]
    fn test_every_mood_has_suggestions() {
        for mood in Mood::ALL {
            assert!(!mood.suggested_sub_moods().is_empty(), "{mood} has no sub-moods");
        }
    }
}

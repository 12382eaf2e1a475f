//! Numeric proxy for each scored mood, used to chart a trend line.

pub const MIN_SCORE: f64 = 0.5;
pub const MAX_SCORE: f64 = 5.0;

const SCORES: [(&str, f64); 8] = [
    ("Happy", 5.0),
    ("Calm", 4.0),
    ("Neutral", 3.0),
    ("Tired", 2.5),
    ("Stressed", 2.0),
    ("Sad", 1.5),
    ("Angry", 1.0),
    ("Sick", 0.5),
];

/// Score for a mood label. `Unknown` and unrecognized labels have none.
pub fn score_for(label: &str) -> Option<f64> {
    SCORES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, score)| *score)
}

/// Maps a score onto [0, 1] for plotting.
pub fn normalize(score: f64) -> f64 {
    (score - MIN_SCORE) / (MAX_SCORE - MIN_SCORE)
}

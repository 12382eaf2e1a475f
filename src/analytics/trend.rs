use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::score::{normalize, score_for};
use crate::models::mood_entry::MoodEntry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

/// Scored entries in ascending time order. Unscored labels are dropped and
/// entries sharing a timestamp keep their input order.
pub fn series<'a, I>(entries: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a MoodEntry>,
{
    let mut points: Vec<TrendPoint> = entries
        .into_iter()
        .filter_map(|entry| {
            score_for(&entry.main_mood).map(|score| TrendPoint {
                timestamp: entry.timestamp,
                score,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveStyle {
    #[default]
    Sharp,
    Smooth,
}

impl FromStr for CurveStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sharp" => Ok(CurveStyle::Sharp),
            "smooth" => Ok(CurveStyle::Smooth),
            other => Err(format!("Unknown curve style: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo { to: Point },
    LineTo { to: Point },
    CurveTo { control1: Point, control2: Point, to: Point },
}

/// Trend line laid out in a `width` x `height` viewport, y growing downward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPlot {
    pub width: f64,
    pub height: f64,
    pub markers: Vec<Point>,
    pub path: Vec<PathSegment>,
}

const CONTROL_RATIO: f64 = 0.3;

/// Points are spaced evenly by index, not by elapsed time. With fewer than
/// two points no line is drawn.
pub fn plot(points: &[TrendPoint], style: CurveStyle, width: f64, height: f64) -> TrendPlot {
    let step_x = width / (points.len().saturating_sub(1).max(1)) as f64;
    let markers: Vec<Point> = points
        .iter()
        .enumerate()
        .map(|(i, p)| Point {
            x: i as f64 * step_x,
            y: height - normalize(p.score) * height,
        })
        .collect();

    let mut path = Vec::new();
    if markers.len() > 1 {
        path.push(PathSegment::MoveTo { to: markers[0] });
        for pair in markers.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let segment = match style {
                CurveStyle::Sharp => PathSegment::LineTo { to: cur },
                CurveStyle::Smooth => {
                    let dx = cur.x - prev.x;
                    PathSegment::CurveTo {
                        control1: Point {
                            x: prev.x + dx * CONTROL_RATIO,
                            y: prev.y,
                        },
                        control2: Point {
                            x: cur.x - dx * CONTROL_RATIO,
                            y: cur.y,
                        },
                        to: cur,
                    }
                }
            };
            path.push(segment);
        }
    }

    TrendPlot {
        width,
        height,
        markers,
        path,
    }
}

impl TrendPlot {
    /// SVG path data (`d` attribute) for the line.
    pub fn svg_path(&self) -> String {
        let mut d = String::new();
        for segment in &self.path {
            if !d.is_empty() {
                d.push(' ');
            }
            d.push_str(&match segment {
                PathSegment::MoveTo { to } => format!("M {:.2} {:.2}", to.x, to.y),
                PathSegment::LineTo { to } => format!("L {:.2} {:.2}", to.x, to.y),
                PathSegment::CurveTo {
                    control1,
                    control2,
                    to,
                } => format!(
                    "C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
                    control1.x, control1.y, control2.x, control2.y, to.x, to.y
                ),
            });
        }
        d
    }
}

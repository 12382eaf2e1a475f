use chrono::{Datelike, Days, NaiveDate, TimeZone};

use crate::analytics::trend::TrendPoint;
use crate::analytics::window::{DateBucketer, Granularity};

/// Heading for the bucket containing `date`, e.g. "Feb 11 - 17, 2024".
pub fn range_title<Tz: TimeZone>(
    bucketer: &DateBucketer<Tz>,
    date: NaiveDate,
    granularity: Granularity,
) -> String {
    match granularity {
        Granularity::Day => date.format("%B %-d, %Y").to_string(),
        Granularity::Week => {
            let Some((start, end)) = bucketer.date_range(date, granularity) else {
                return date.format("%b %-d, %Y").to_string();
            };
            let last = end.checked_sub_days(Days::new(1)).unwrap_or(end);
            if start.year() == last.year() && start.month() == last.month() {
                format!(
                    "{} - {}",
                    start.format("%b %-d"),
                    last.format("%-d, %Y")
                )
            } else {
                format!(
                    "{} - {}",
                    start.format("%b %-d, %Y"),
                    last.format("%b %-d, %Y")
                )
            }
        }
        Granularity::Month => date.format("%B %Y").to_string(),
        Granularity::Year => date.format("%Y").to_string(),
    }
}

fn axis_format(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Day => "%H:%M",
        Granularity::Week => "%a",
        Granularity::Month => "%-m/%-d",
        Granularity::Year => "%b",
    }
}

/// X-axis labels for a trend series: first, last and every `n / 4`-th point.
pub fn axis_labels<Tz: TimeZone>(
    tz: &Tz,
    points: &[TrendPoint],
    granularity: Granularity,
) -> Vec<Option<String>>
where
    Tz::Offset: std::fmt::Display,
{
    let n = points.len();
    let every = (n / 4).max(1);
    let fmt = axis_format(granularity);

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            (i == 0 || i + 1 == n || i % every == 0)
                .then(|| p.timestamp.with_timezone(tz).format(fmt).to_string())
        })
        .collect()
}

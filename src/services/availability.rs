use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A date span the external calendar marks as taken. Half-open: the end
/// date is the checkout day.
#[derive(Debug, Clone, Serialize)]
pub struct BusyRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    pub busy: Vec<BusyRange>,
}

/// Outcome of a display-only availability lookup. `available` is `None`
/// when the feed is missing or unreachable; pricing never gates on it.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityStatus {
    pub available: Option<bool>,
    pub message: String,
    pub conflicts: Vec<BusyRange>,
}

pub async fn check_range(
    state: &AppState,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> AvailabilityStatus {
    let Some(feed_url) = state.config.ical_feed_url.clone() else {
        return AvailabilityStatus {
            available: None,
            message: "No availability feed is configured.".to_string(),
            conflicts: Vec::new(),
        };
    };

    let client = state.http_client.clone();
    let timeout = state.config.availability_fetch_timeout_seconds;
    let snapshot = state
        .availability_cache
        .try_get_with(feed_url.clone(), async move {
            fetch_snapshot(&client, &feed_url, timeout).await.map(Arc::new)
        })
        .await;

    match snapshot {
        Ok(snapshot) => {
            let conflicts = overlapping(&snapshot.busy, check_in, check_out);
            if conflicts.is_empty() {
                AvailabilityStatus {
                    available: Some(true),
                    message: "The requested dates look free.".to_string(),
                    conflicts,
                }
            } else {
                AvailabilityStatus {
                    available: Some(false),
                    message: format!(
                        "The requested dates overlap {} existing booking(s).",
                        conflicts.len()
                    ),
                    conflicts,
                }
            }
        }
        Err(error) => AvailabilityStatus {
            available: None,
            message: format!("Availability is unknown: {error}"),
            conflicts: Vec::new(),
        },
    }
}

pub async fn fetch_snapshot(
    client: &reqwest::Client,
    feed_url: &str,
    timeout_seconds: u64,
) -> AppResult<AvailabilitySnapshot> {
    let url = Url::parse(feed_url.trim())
        .map_err(|_| AppError::BadRequest("Invalid iCal feed URL.".to_string()))?;

    let response = client
        .get(url)
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .header("Accept", "text/calendar, text/plain;q=0.9, */*;q=0.1")
        .send()
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "iCal fetch request failed");
            if error.is_timeout() {
                AppError::Dependency("iCal fetch timed out.".to_string())
            } else {
                AppError::Dependency("iCal fetch failed.".to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(status = %status, "iCal fetch returned non-success status");
        return Err(AppError::Dependency(
            "iCal fetch failed with non-success status.".to_string(),
        ));
    }

    let body = response.text().await.map_err(|error| {
        tracing::error!(error = %error, "iCal fetch body read failed");
        AppError::Dependency("iCal fetch failed.".to_string())
    })?;

    Ok(AvailabilitySnapshot {
        busy: parse_busy_ranges(&body),
    })
}

/// Inclusive-exclusive overlap: a booking that ends on the requested
/// check-in day does not conflict.
pub fn overlapping(busy: &[BusyRange], check_in: NaiveDate, check_out: NaiveDate) -> Vec<BusyRange> {
    busy.iter()
        .filter(|range| range.start < check_out && range.end > check_in)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// iCal parsing
// ---------------------------------------------------------------------------

fn unfold_ical_lines(text: &str) -> Vec<String> {
    let mut unfolded: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        if (line.starts_with(' ') || line.starts_with('\t')) && !unfolded.is_empty() {
            if let Some(last) = unfolded.last_mut() {
                last.push_str(&line[1..]);
            }
        } else {
            unfolded.push(line.to_string());
        }
    }
    unfolded
}

/// Both all-day and date-time values carry a YYYYMMDD prefix.
fn parse_ical_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() < 8 {
        return None;
    }
    NaiveDate::parse_from_str(&value[..8], "%Y%m%d").ok()
}

/// Extract busy date ranges from VEVENT blocks. Cancelled events and events
/// without a positive date span are skipped.
pub fn parse_busy_ranges(ics_text: &str) -> Vec<BusyRange> {
    let mut ranges = Vec::new();
    let mut start: Option<NaiveDate> = None;
    let mut end: Option<NaiveDate> = None;
    let mut summary = String::new();
    let mut cancelled = false;
    let mut in_event = false;

    for line in unfold_ical_lines(ics_text) {
        let upper = line.to_uppercase();
        if upper == "BEGIN:VEVENT" {
            in_event = true;
            start = None;
            end = None;
            summary.clear();
            cancelled = false;
            continue;
        }
        if upper == "END:VEVENT" {
            if in_event && !cancelled {
                if let (Some(start), Some(end)) = (start, end) {
                    if end > start {
                        ranges.push(BusyRange {
                            start,
                            end,
                            summary: summary.clone(),
                        });
                    }
                }
            }
            in_event = false;
            continue;
        }
        if !in_event {
            continue;
        }

        let Some(colon) = line.find(':') else {
            continue;
        };
        let key = line[..colon]
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let value = line[colon + 1..].trim();

        match key.as_str() {
            "DTSTART" => start = parse_ical_date(value),
            "DTEND" => end = parse_ical_date(value),
            "SUMMARY" => summary = value.to_string(),
            "STATUS" => cancelled = value.eq_ignore_ascii_case("CANCELLED"),
            _ => {}
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:one\r\nDTSTART;VALUE=DATE:20250810\r\nDTEND;VALUE=DATE:20250814\r\nSUMMARY:Reserved\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nUID:two\r\nDTSTART;VALUE=DATE:20250820\r\nDTEND;VALUE=DATE:20250822\r\nSTATUS:CANCELLED\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_events_and_skips_cancelled() {
        let busy = parse_busy_ranges(SAMPLE_FEED);
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].start, date(2025, 8, 10));
        assert_eq!(busy[0].end, date(2025, 8, 14));
        assert_eq!(busy[0].summary, "Reserved");
    }

    #[test]
    fn unfolds_continuation_lines() {
        let folded = "BEGIN:VEVENT\r\nSUMMARY:Long\r\n  booking name\r\nDTSTART:20250810\r\nDTEND:20250812\r\nEND:VEVENT\r\n";
        let busy = parse_busy_ranges(folded);
        assert_eq!(busy[0].summary, "Long booking name");
    }

    #[test]
    fn ignores_events_without_positive_span() {
        let degenerate = "BEGIN:VEVENT\r\nDTSTART:20250810\r\nDTEND:20250810\r\nEND:VEVENT\r\n";
        assert!(parse_busy_ranges(degenerate).is_empty());
    }

    #[test]
    fn overlap_is_inclusive_exclusive() {
        let busy = vec![BusyRange {
            start: date(2025, 8, 10),
            end: date(2025, 8, 14),
            summary: String::new(),
        }];

        // Checking out on the day a booking starts is fine, and so is
        // checking in on the day one ends.
        assert!(overlapping(&busy, date(2025, 8, 6), date(2025, 8, 10)).is_empty());
        assert!(overlapping(&busy, date(2025, 8, 14), date(2025, 8, 17)).is_empty());
        assert_eq!(overlapping(&busy, date(2025, 8, 13), date(2025, 8, 16)).len(), 1);
        assert_eq!(overlapping(&busy, date(2025, 8, 8), date(2025, 8, 11)).len(), 1);
    }
}

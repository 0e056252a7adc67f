use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    schemas::{parse_iso_date, SeasonPath, SeasonYearPath},
    services::pricing::{
        classify_season, day_kind, easter_sunday, high_season_start, last_monday_of_july,
        third_october_sunday,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/seasons/calendar/{year}",
            axum::routing::get(season_calendar),
        )
        .route("/seasons/{date}", axum::routing::get(classify_date))
}

/// Classify one date: rate tier, day kind and the nightly rates in effect.
async fn classify_date(
    State(state): State<AppState>,
    Path(path): Path<SeasonPath>,
) -> AppResult<Json<Value>> {
    let date = parse_iso_date(&path.date, "season")?;
    let season = classify_season(date);
    let kind = day_kind(date);
    let rates = state.config.rate_table.season(season);

    Ok(Json(json!({
        "date": date,
        "season": season,
        "day_kind": kind,
        "rates": rates,
    })))
}

/// The computed season windows for a year, for calendar display.
async fn season_calendar(Path(path): Path<SeasonYearPath>) -> AppResult<Json<Value>> {
    let year = path.year;
    if !(1583..=4099).contains(&year) {
        return Err(AppError::BadRequest(
            "Year must be between 1583 and 4099.".to_string(),
        ));
    }

    let easter = easter_sunday(year);
    let high_start = high_season_start(year);
    let summer_monday = last_monday_of_july(year);

    Ok(Json(json!({
        "year": year,
        "easter_sunday": easter,
        "easter_window": {
            "start": easter - Duration::days(5),
            "end": easter + Duration::days(2),
        },
        "high_season": {
            "start": high_start,
            "end": summer_monday - Duration::days(1),
        },
        "mid_windows": [
            { "label": "spring", "start": ymd(year, 4, 1)?, "end": high_start - Duration::days(1) },
            { "label": "late_summer", "start": summer_monday, "end": ymd(year, 8, 31)? },
            { "label": "autumn", "start": ymd(year, 9, 1)?, "end": third_october_sunday(year) },
            { "label": "christmas", "start": ymd(year, 12, 20)?, "end": ymd(year, 12, 31)? },
            { "label": "new_year", "start": ymd(year, 1, 1)?, "end": ymd(year, 1, 6)? },
        ],
    })))
}

fn ymd(year: i32, month: u32, day: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::Internal("Calendar date out of range.".to_string()))
}

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    schemas::{parse_iso_date, AvailabilityQuery},
    services::availability,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/availability", axum::routing::get(check_availability))
}

/// Display-only availability lookup against the external iCal feed. A
/// missing or unreachable feed reports "unknown" rather than failing; the
/// quote calculator never gates on this result.
async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Value>> {
    let check_in = parse_iso_date(&query.check_in, "check-in")?;
    let check_out = parse_iso_date(&query.check_out, "check-out")?;
    if check_out <= check_in {
        return Err(AppError::BadRequest(
            "Check-out must be after check-in.".to_string(),
        ));
    }

    let status = availability::check_range(&state, check_in, check_out).await;
    Ok(Json(json!({
        "check_in": check_in,
        "check_out": check_out,
        "availability": status,
    })))
}

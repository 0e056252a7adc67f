use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    schemas::{parse_iso_date, validate_input, QuoteRequestInput},
    services::{
        export::{export_filename, quote_csv_document},
        pricing::{
            compute_quote, DiscountInputs, PricingError, Quote, StayRequest, SERVICE_CATALOG,
        },
        sheet::{build_quote_row, QuoteRowContext},
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/quotes",
            axum::routing::get(list_quotes).post(submit_quote),
        )
        .route("/quotes/preview", axum::routing::post(preview_quote))
        .route("/quotes/export", axum::routing::post(export_quote))
}

/// Compute a quote without persisting anything. Recomputed from scratch on
/// every call; there is no in-flight state to cancel.
async fn preview_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequestInput>,
) -> AppResult<Json<Value>> {
    let (quote, _) = build_quote(&state, &payload)?;
    Ok(Json(json!({ "data": quote })))
}

/// Compute a quote and append one finalized row to the sheet sink.
///
/// Persistence is decoupled from computation: if the sink is missing or the
/// append fails, the response still carries the full quote, with
/// `persisted: false` and the sink error verbatim. No retry.
async fn submit_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequestInput>,
) -> AppResult<impl IntoResponse> {
    let (quote, channel_label) = build_quote(&state, &payload)?;
    for warning in &quote.capacity_warnings {
        tracing::warn!(warning = %warning, "Quote exceeds seasonal capacity");
    }

    let reference = Uuid::new_v4();
    let quote_date = Utc::now()
        .with_timezone(&state.config.venue_timezone)
        .date_naive();
    let author = payload
        .author
        .as_deref()
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .unwrap_or(&state.config.quote_author)
        .to_string();
    let context = QuoteRowContext {
        author: &author,
        channel_label: &channel_label,
        quote_date,
        client_name: payload.client_name.as_deref().unwrap_or_default(),
        notes: payload.notes.as_deref().unwrap_or_default(),
    };
    let row = build_quote_row(&context, &quote, SERVICE_CATALOG);

    let (persisted, sink_error) = match &state.sheet {
        Some(sheet) => match sheet.append_row(&row).await {
            Ok(()) => (true, None),
            Err(error) => {
                let detail = error.detail_message();
                tracing::warn!(error = %detail, "Quote computed but sheet append failed");
                (false, Some(detail))
            }
        },
        None => (
            false,
            Some("Sheet sink is not configured. Set SHEET_ENDPOINT_URL.".to_string()),
        ),
    };

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({
            "reference": reference,
            "quote": quote,
            "persisted": persisted,
            "sink_error": sink_error,
        })),
    ))
}

/// Read back every row stored in the sheet sink.
async fn list_quotes(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let sheet = state.sheet.as_ref().ok_or_else(|| {
        AppError::Dependency("Sheet sink is not configured. Set SHEET_ENDPOINT_URL.".to_string())
    })?;
    let rows = sheet.read_all().await?;
    Ok(Json(json!({ "data": rows })))
}

/// Compute a quote and return it as a CSV attachment mirroring the sink
/// row layout, one four-column block per configured service.
async fn export_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequestInput>,
) -> AppResult<impl IntoResponse> {
    let (quote, channel_label) = build_quote(&state, &payload)?;

    let quote_date = Utc::now()
        .with_timezone(&state.config.venue_timezone)
        .date_naive();
    let author = payload
        .author
        .as_deref()
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .unwrap_or(&state.config.quote_author)
        .to_string();
    let client_name = payload.client_name.as_deref().unwrap_or_default();
    let context = QuoteRowContext {
        author: &author,
        channel_label: &channel_label,
        quote_date,
        client_name,
        notes: payload.notes.as_deref().unwrap_or_default(),
    };

    let document = quote_csv_document(&context, &quote, SERVICE_CATALOG);
    let filename = export_filename(client_name, quote_date);

    Ok((
        [
            (
                axum::http::header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                axum::http::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        document,
    ))
}

/// Shared input-to-quote path: validation, date parsing, engine call.
/// Returns the quote and the resolved channel label for row building.
fn build_quote(state: &AppState, input: &QuoteRequestInput) -> AppResult<(Quote, String)> {
    validate_input(input)?;

    let check_in = parse_iso_date(&input.check_in, "check-in")?;
    let check_out = parse_iso_date(&input.check_out, "check-out")?;
    if check_out <= check_in {
        return Err(AppError::BadRequest(
            "Check-out must be after check-in.".to_string(),
        ));
    }
    let nights = (check_out - check_in).num_days() as u32;

    let stay = StayRequest {
        arrival: check_in,
        nights,
        guests: input.guests,
    };
    let selections: Vec<_> = input
        .services
        .iter()
        .map(|selection| selection.to_selection())
        .collect();
    let channel = input
        .channel
        .as_ref()
        .map(|channel| channel.to_channel_config(&state.config));
    let discounts = DiscountInputs {
        manual_discount: input.manual_discount.unwrap_or(0.0),
    };

    let quote = compute_quote(
        &stay,
        &state.config.rate_table,
        SERVICE_CATALOG,
        &selections,
        &discounts,
        channel.as_ref(),
    )
    .map_err(map_pricing_error)?;

    let channel_label = channel
        .map(|config| config.label)
        .unwrap_or_else(|| state.config.default_channel_label.clone());
    Ok((quote, channel_label))
}

fn map_pricing_error(error: PricingError) -> AppError {
    match error {
        PricingError::StayTooShort { .. } | PricingError::NoGuests => {
            AppError::UnprocessableEntity(error.to_string())
        }
        PricingError::InvalidCommissionRate(_) => AppError::BadRequest(error.to_string()),
    }
}

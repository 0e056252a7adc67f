use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::pricing::{format_amount, Quote, ServiceDefinition};

/// Client for the remote spreadsheet bridge: an opaque, append-only row
/// store. One resource, POST appends a row, GET returns every row.
pub struct SheetClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SheetClient {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Append one finalized quote row. No retry: a failure is reported to
    /// the caller and the computed quote stays valid.
    pub async fn append_row(&self, values: &[String]) -> AppResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(std::time::Duration::from_secs(20))
            .json(&json!({ "values": values }));
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|error| {
            tracing::error!(error = %error, "Sheet append request failed");
            AppError::Dependency(format!("Sheet append failed: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Sheet append returned non-success status");
            return Err(AppError::Dependency(format!(
                "Sheet append failed with status {status}."
            )));
        }
        Ok(())
    }

    /// Read every stored row. Cells come back as strings regardless of how
    /// the bridge typed them.
    pub async fn read_all(&self) -> AppResult<Vec<Vec<String>>> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .timeout(std::time::Duration::from_secs(20))
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|error| {
            tracing::error!(error = %error, "Sheet read request failed");
            AppError::Dependency(format!("Sheet read failed: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Dependency(format!(
                "Sheet read failed with status {status}."
            )));
        }

        let payload: Value = response.json().await.map_err(|error| {
            tracing::error!(error = %error, "Sheet read body was not valid JSON");
            AppError::Dependency(format!("Sheet read failed: {error}"))
        })?;

        let rows = payload
            .get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(rows
            .iter()
            .filter_map(Value::as_array)
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Row layout
// ---------------------------------------------------------------------------

pub struct QuoteRowContext<'a> {
    pub author: &'a str,
    pub channel_label: &'a str,
    pub quote_date: NaiveDate,
    pub client_name: &'a str,
    pub notes: &'a str,
}

/// All dates are DD/MM/YYYY in the sheet.
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// One row per finalized quote, in fixed column order: header fields, one
/// four-column block per configured service (blank when inactive), then
/// discount, total and notes. Money uses dot decimals; legacy comma-decimal
/// sheets are read, never written.
pub fn build_quote_row(
    context: &QuoteRowContext<'_>,
    quote: &Quote,
    catalog: &[ServiceDefinition],
) -> Vec<String> {
    let mut row = vec![
        context.author.to_string(),
        context.channel_label.to_string(),
        format_sheet_date(context.quote_date),
        context.client_name.to_string(),
        format_sheet_date(quote.stay.arrival),
        format_sheet_date(quote.stay.departure()),
        quote.stay.nights.to_string(),
        quote.stay.guests.to_string(),
        format_amount(quote.rental_amount),
        format_amount(quote.average_nightly_rate),
        format_amount(quote.cleaning_fee),
    ];

    for definition in catalog {
        match quote
            .service_charges
            .iter()
            .find(|charge| charge.name == definition.name)
        {
            Some(charge) => {
                row.push(format_amount(charge.unit_price));
                row.push(charge.attendees.to_string());
                row.push(charge.quantity.to_string());
                row.push(format_amount(charge.subtotal));
            }
            None => row.extend((0..4).map(|_| String::new())),
        }
    }

    row.push(format_amount(quote.manual_discount));
    row.push(format_amount(quote.total));
    row.push(context.notes.to_string());
    row
}

/// Number of columns a row occupies for a given catalog.
pub fn row_width(catalog: &[ServiceDefinition]) -> usize {
    11 + catalog.len() * 4 + 3
}

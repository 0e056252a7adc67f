use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::pricing::{
    parse_optional_currency, ChannelConfig, ChannelDirection, ServiceSelection,
};

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

pub fn parse_iso_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {field} date, expected YYYY-MM-DD.")))
}

// ---------------------------------------------------------------------------
// Quote inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteRequestInput {
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    pub check_in: String,
    pub check_out: String,
    #[validate(range(min = 1))]
    pub guests: u32,
    #[serde(default)]
    pub services: Vec<ServiceSelectionInput>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub manual_discount: Option<f64>,
    pub channel: Option<ChannelInput>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
}

/// One form row per catalog service. Lump-sum services send `total_cost`
/// instead of a unit price; both land in the same slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSelectionInput {
    pub name: String,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub total_cost: Option<f64>,
    pub attendees: Option<u32>,
    pub quantity: Option<u32>,
}

impl ServiceSelectionInput {
    pub fn to_selection(&self) -> ServiceSelection {
        ServiceSelection {
            name: self.name.trim().to_string(),
            unit_price: self.unit_price.or(self.total_cost),
            attendees: self.attendees,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInput {
    pub label: Option<String>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub commission_rate: Option<f64>,
    #[serde(default = "default_channel_direction")]
    pub direction: ChannelDirection,
}

impl ChannelInput {
    pub fn to_channel_config(&self, config: &AppConfig) -> ChannelConfig {
        ChannelConfig {
            label: self
                .label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .unwrap_or(&config.default_channel_label)
                .to_string(),
            commission_rate: self
                .commission_rate
                .unwrap_or(config.default_commission_rate),
            direction: self.direction,
        }
    }
}

fn default_channel_direction() -> ChannelDirection {
    ChannelDirection::NetToListing
}

/// Amounts arrive as JSON numbers from the current UI or as legacy numeric
/// strings (dot or comma decimals) from older sheets. Anything malformed is
/// absent, not an error.
fn flexible_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64().filter(|amount| amount.is_finite()),
        Some(Value::String(text)) => parse_optional_currency(&text),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: String,
    pub check_out: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonPath {
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonYearPath {
    pub year: i32,
}

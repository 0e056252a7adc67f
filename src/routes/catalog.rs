use axum::{extract::Path, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::pricing::{ServiceCategory, ServiceDefinition, SERVICE_CATALOG};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/catalog/services", axum::routing::get(list_services))
        .route(
            "/catalog/services/{name}",
            axum::routing::get(get_service),
        )
}

#[derive(Debug, Deserialize)]
struct ServicePath {
    name: String,
}

/// The configured service catalog, including which input fields each
/// category surfaces on the quote form.
async fn list_services() -> Json<Value> {
    let data: Vec<Value> = SERVICE_CATALOG.iter().map(service_json).collect();
    Json(json!({ "data": data }))
}

async fn get_service(Path(path): Path<ServicePath>) -> AppResult<Json<Value>> {
    let wanted = path.name.trim();
    let definition = SERVICE_CATALOG
        .iter()
        .find(|definition| definition.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| AppError::NotFound(format!("Service '{wanted}' is not in the catalog.")))?;
    Ok(Json(service_json(definition)))
}

fn service_json(definition: &ServiceDefinition) -> Value {
    json!({
        "name": definition.name,
        "category": definition.category,
        "default_unit_price": definition.default_unit_price,
        "fields": fields_for(definition.category),
    })
}

fn fields_for(category: ServiceCategory) -> &'static [&'static str] {
    match category {
        ServiceCategory::HeadcountFee => &["unit_price", "attendees"],
        ServiceCategory::LumpSum => &["total_cost"],
        ServiceCategory::PerUse => &["unit_price", "quantity"],
        ServiceCategory::Standard => &["unit_price", "attendees", "quantity"],
    }
}

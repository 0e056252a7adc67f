use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::availability::AvailabilitySnapshot;
use crate::services::sheet::SheetClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
    pub sheet: Option<Arc<SheetClient>>,
    pub availability_cache: moka::future::Cache<String, Arc<AvailabilitySnapshot>>,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .user_agent(format!("{}/0.1", config.app_name.replace(' ', "-")))
            .build()?;

        let sheet = config.sheet_endpoint_url.as_ref().map(|endpoint| {
            Arc::new(SheetClient::new(
                http_client.clone(),
                endpoint.clone(),
                config.sheet_api_key.clone(),
            ))
        });

        let availability_cache = moka::future::Cache::builder()
            .time_to_live(Duration::from_secs(config.availability_cache_ttl_seconds))
            .max_capacity(16)
            .build();

        Ok(Self {
            config: Arc::new(config),
            http_client,
            sheet,
            availability_cache,
        })
    }
}

mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use crate::config::Settings;
use crate::core::{MapsLinkBuilder, MatchEnricher, StreamOrchestrator};
use crate::routes::matches::AppState;
use crate::services::{CityList, OpenAiClient, UnsplashClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration comes first so the log level can be taken from it
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting CityMatch service...");

    // Model service client
    let llm_timeout = Duration::from_secs(settings.llm.timeout_secs.unwrap_or(120));
    let llm = OpenAiClient::new(
        settings.llm.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.llm.model.clone(),
        settings.llm.temperature,
        llm_timeout,
    );

    if settings.llm.api_key.as_deref().unwrap_or_default().is_empty() {
        warn!("No model API key configured, match requests will fail");
    }
    info!("Model client initialized (model: {})", llm.model());

    // Photo search is optional; without a key matches simply carry no images
    let photo_timeout = Duration::from_secs(settings.photos.timeout_secs);
    let photos = UnsplashClient::new(
        settings.photos.base_url.clone(),
        settings.photos.access_key.clone(),
        photo_timeout,
    );

    if photos.is_configured() {
        info!("Photo search enabled");
    } else {
        warn!("No photo access key configured, matches will have no images");
    }

    let enricher = MatchEnricher::new(
        Arc::new(photos),
        MapsLinkBuilder::new(settings.maps.search_url.clone()),
        photo_timeout,
    );

    let options = settings.stream.options();
    info!("Stream options: {:?}", options);

    let orchestrator = Arc::new(StreamOrchestrator::new(Arc::new(llm), enricher, options));

    // Build application state
    let app_state = AppState {
        orchestrator,
        cities: CityList::new(&settings.cities.path),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))
    .map_err(|e| {
        error!("Failed to bind HTTP server: {}", e);
        e
    })?
    .run()
    .await
}

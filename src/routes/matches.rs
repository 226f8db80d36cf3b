use actix_web::http::header::{CacheControl, CacheDirective, ContentEncoding};
use actix_web::{web, HttpResponse, Responder};
use bytes::Bytes;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use validator::Validate;
use crate::core::StreamOrchestrator;
use crate::models::{MatchRequest, HealthResponse, ServiceInfo, ErrorResponse};
use crate::services::CityList;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<StreamOrchestrator>,
    pub cities: CityList,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/cities", web::get().to(get_cities))
        .route("/match-neighborhoods", web::post().to(match_neighborhoods));
}

/// Service banner, served at the root outside the `/api` scope
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(ServiceInfo {
        message: "CityMatch AI API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Static city list
///
/// GET /api/cities
async fn get_cities(state: web::Data<AppState>) -> impl Responder {
    match state.cities.load().await {
        Ok(catalog) => HttpResponse::Ok().json(catalog),
        Err(e) => {
            tracing::error!("Failed to load city list from {}: {}", state.cities.path().display(), e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load cities".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Match neighborhoods endpoint
///
/// POST /api/match-neighborhoods
///
/// Request body:
/// ```json
/// {
///   "city1": "Paris",
///   "country1": "France",
///   "city2": "London",
///   "country2": "United Kingdom"
/// }
/// ```
///
/// Responds with one JSON event per line: `processing`, then `match` events
/// in index order, then exactly one `complete` or `error`.
async fn match_neighborhoods(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request = req.into_inner();
    tracing::info!(
        "Matching neighborhoods: {}, {} <-> {}, {}",
        request.city1,
        request.country1,
        request.city2,
        request.country2
    );

    let events = match Arc::clone(&state.orchestrator).start(request) {
        Ok(rx) => rx,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    let body = ReceiverStream::new(events).map(|event| event.to_line().map(Bytes::from));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        // Keep the compression middleware from buffering the stream
        .insert_header(ContentEncoding::Identity)
        .insert_header(CacheControl(vec![CacheDirective::NoCache]))
        .streaming(body)
}

use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_booking, decide_booking, get_adjacent_bookings, get_booking,
    list_booker_bookings, list_owner_bookings,
};

/// Creates the API router with all booking endpoints
///
/// Command endpoints (Write operations):
/// - POST /bookings - Request a new booking
/// - PATCH /bookings/:id?approved= - Approve or reject a booking
///
/// Query endpoints (Read operations):
/// - GET /bookings/:id - Get booking details
/// - GET /bookings?state=&from=&size= - List the acting user's bookings
/// - GET /bookings/owner?state=&from=&size= - List bookings on owned items
/// - GET /items/:id/bookings/adjacent - Previous/next approved booking
///
/// Every route expects the authenticated acting user in the
/// X-Sharer-User-Id header.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/bookings", post(create_booking).get(list_booker_bookings))
        .route("/bookings/owner", get(list_owner_bookings))
        .route("/bookings/:id", patch(decide_booking).get(get_booking))
        // Item-centric query endpoints
        .route("/items/:id/bookings/adjacent", get(get_adjacent_bookings))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

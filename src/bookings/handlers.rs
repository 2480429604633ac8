use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::services::require_fields,
    bookings::{
        dto::CreateBookingRequest,
        repo_types::{Booking, BookingPatch, NewBooking},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id", get(get_booking).patch(update_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/users/:id/bookings", get(list_user_bookings))
}

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    require_fields(&[("tripName", payload.trip_name.as_str())])?;
    let booking = Booking::create(
        &state.store,
        NewBooking {
            user_id: payload.user_id,
            trip_name: payload.trip_name,
            status: payload.status,
            trip_date: payload.trip_date,
            details: payload.details,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Booking>> {
    let booking = Booking::find_by_id(&state.store, id)
        .await
        .ok_or(AppError::NotFound { entity: "booking", id })?;
    Ok(Json(booking))
}

/// Admin view, ascending by id.
#[instrument(skip(state))]
pub async fn list_bookings(State(state): State<AppState>) -> Json<Vec<Booking>> {
    Json(Booking::list_all(&state.store).await)
}

/// Traveller view, newest booking first.
#[instrument(skip(state))]
pub async fn list_user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<Vec<Booking>> {
    Json(Booking::list_by_user(&state.store, user_id).await)
}

#[instrument(skip(state, payload))]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingPatch>,
) -> AppResult<Json<Booking>> {
    if matches!(payload.trip_name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(AppError::validation("tripName cannot be empty"));
    }
    Ok(Json(Booking::update(&state.store, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Booking>> {
    Ok(Json(Booking::cancel(&state.store, id).await?))
}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use berth_booking::{BookingRequest, BookingSummary};
use berth_core::identity::Actor;
use serde_json::{json, Value};

use crate::{error::AppError, middleware::user_auth_middleware, state::AppState};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/pnr/{pnr}", get(get_booking))
        .route("/api/bookings/cancel/{pnr}", put(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, user_auth_middleware))
}

fn rejected(state: &AppState, err: impl Into<AppError>) -> AppError {
    let err = err.into();
    state.metrics.record_rejection(err.kind());
    err
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload.map_err(|e| rejected(&state, e))?;
    let booking = state
        .bookings
        .create_booking(&actor, &request)
        .await
        .map_err(|e| rejected(&state, e))?;

    state.metrics.record_created(booking.seat_count());
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "booking": BookingSummary::from(&booking),
        })),
    ))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let bookings = state.bookings.list_bookings(&actor).await?;
    Ok(Json(json!({ "bookings": bookings })))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(pnr): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = state.bookings.get_booking(&actor, &pnr).await?;
    Ok(Json(json!({ "booking": booking })))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(pnr): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = state.bookings.cancel_booking(&actor, &pnr).await?;
    state.metrics.record_cancelled();
    Ok(Json(json!({ "message": "Booking cancelled successfully", "booking": booking })))
}

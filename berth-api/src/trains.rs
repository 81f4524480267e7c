use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use berth_catalog::Train;
use berth_core::search::{TrainSearchRequest, TrainSearchResponse};
use berth_core::CoreError;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{error::AppError, middleware::admin_auth_middleware, state::AppState};

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/trains", get(list_trains).post(add_train))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    Router::new()
        .route("/api/trains/search", get(search_trains))
        .route("/api/trains/{id}", get(get_train))
        .merge(admin)
}

async fn search_trains(
    State(state): State<AppState>,
    Query(query): Query<TrainSearchRequest>,
) -> Result<Json<TrainSearchResponse>, AppError> {
    Ok(Json(state.search.search(&query).await?))
}

async fn get_train(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    let not_found = || AppError::from(CoreError::NotFound("Train".to_string()));
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let train = state
        .trains
        .get_train(id)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(not_found)?;
    Ok(Json(json!({ "train": train })))
}

async fn list_trains(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let trains = state.trains.list_trains().await.map_err(CoreError::from)?;
    Ok(Json(json!({ "trains": trains })))
}

async fn add_train(
    State(state): State<AppState>,
    payload: Result<Json<Train>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(train) = payload?;
    train.validate().map_err(|e| CoreError::invalid(e.to_string()))?;
    state.trains.insert_train(&train).await.map_err(CoreError::from)?;

    tracing::info!(train_number = %train.train_number, id = %train.id, "Train added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Train added successfully", "train": train })),
    ))
}

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::controller::ApiResponse;
use crate::{AppState, Error};
use domain::exchange_rate::{self as ExchangeRateApi, RateInput, RateUpdate};
use domain::Id;
use log::*;

/// GET all Exchange Rates, most recently updated first
#[utoipa::path(
    get,
    path = "/api/exchange-rates",
    responses(
        (status = 200, description = "Successfully retrieved all Exchange Rates", body = [domain::exchange_rates::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let rates = ExchangeRateApi::find_all(app_state.store_ref()).await?;

    Ok(Json(ApiResponse::new(rates)))
}

/// GET a particular Exchange Rate specified by its id.
#[utoipa::path(
    get,
    path = "/api/exchange-rates/{id}",
    params(("id" = String, Path, description = "Exchange Rate id to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved an Exchange Rate", body = domain::exchange_rates::Model),
        (status = 404, description = "Exchange Rate not found")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let rate = ExchangeRateApi::find_by_id(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::new(rate)))
}

/// POST create the rate of a currency pair, or update it if it exists
#[utoipa::path(
    post,
    path = "/api/exchange-rates",
    request_body = RateInput,
    responses(
        (status = 200, description = "Successfully saved the Exchange Rate", body = domain::exchange_rates::Model),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn upsert(
    State(app_state): State<AppState>,
    Json(params): Json<RateInput>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Upsert Exchange Rate from: {params:?}");

    let rate = ExchangeRateApi::upsert(
        app_state.store_ref(),
        &app_state.event_publisher,
        params,
    )
    .await?;

    Ok(Json(
        ApiResponse::new(rate).with_message("Exchange rate updated successfully"),
    ))
}

/// PUT update an Exchange Rate by id
#[utoipa::path(
    put,
    path = "/api/exchange-rates/{id}",
    params(("id" = String, Path, description = "Exchange Rate id to update")),
    request_body = RateUpdate,
    responses(
        (status = 200, description = "Successfully updated the Exchange Rate", body = domain::exchange_rates::Model),
        (status = 404, description = "Exchange Rate not found")
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<RateUpdate>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Exchange Rate with id: {id}");

    let rate = ExchangeRateApi::update(
        app_state.store_ref(),
        &app_state.event_publisher,
        id,
        params,
    )
    .await?;

    Ok(Json(
        ApiResponse::new(rate).with_message("Exchange rate updated successfully"),
    ))
}

/// POST mark an Exchange Rate as freshly checked
#[utoipa::path(
    post,
    path = "/api/exchange-rates/{id}/refresh",
    params(("id" = String, Path, description = "Exchange Rate id to refresh")),
    responses(
        (status = 200, description = "Successfully refreshed the Exchange Rate", body = domain::exchange_rates::Model),
        (status = 404, description = "Exchange Rate not found")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let rate = ExchangeRateApi::refresh(app_state.store_ref(), id).await?;

    Ok(Json(
        ApiResponse::new(rate).with_message("Exchange rate refreshed successfully"),
    ))
}

/// POST refresh every active auto-update Exchange Rate
#[utoipa::path(
    post,
    path = "/api/exchange-rates/refresh-all",
    responses(
        (status = 200, description = "All active auto-update rates refreshed")
    )
)]
pub async fn refresh_all(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let refreshed = ExchangeRateApi::refresh_all(app_state.store_ref()).await?;

    Ok(Json(
        ApiResponse::new(json!({ "refreshed": refreshed }))
            .with_message("All active auto-update rates refreshed"),
    ))
}

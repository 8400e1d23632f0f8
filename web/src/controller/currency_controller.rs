use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::{AppState, Error};
use domain::currency::{self as CurrencyApi, CurrencyUpdate, NewCurrency};
use domain::Id;
use log::*;

/// GET all Currencies ordered by code
#[utoipa::path(
    get,
    path = "/api/currencies",
    responses(
        (status = 200, description = "Successfully retrieved all Currencies", body = [domain::currencies::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let currencies = CurrencyApi::find_all(app_state.store_ref()).await?;
    debug!("Found {} currencies", currencies.len());

    Ok(Json(ApiResponse::new(currencies)))
}

/// GET a particular Currency specified by its id.
#[utoipa::path(
    get,
    path = "/api/currencies/{id}",
    params(("id" = String, Path, description = "Currency id to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved a Currency", body = domain::currencies::Model),
        (status = 404, description = "Currency not found")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let currency = CurrencyApi::find_by_id(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::new(currency)))
}

/// POST create a new Currency
#[utoipa::path(
    post,
    path = "/api/currencies",
    request_body = NewCurrency,
    responses(
        (status = 201, description = "Successfully Created a New Currency", body = domain::currencies::Model),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Currency with this code already exists")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<NewCurrency>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Currency from: {params:?}");

    let currency = CurrencyApi::create(
        app_state.store_ref(),
        &app_state.event_publisher,
        params,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(currency).with_message("Currency created successfully")),
    ))
}

/// PUT update a Currency; absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/currencies/{id}",
    params(("id" = String, Path, description = "Currency id to update")),
    request_body = CurrencyUpdate,
    responses(
        (status = 200, description = "Successfully Updated Currency", body = domain::currencies::Model),
        (status = 400, description = "Invalid currency type"),
        (status = 404, description = "Currency not found")
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<CurrencyUpdate>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Currency with id: {id}");

    let currency = CurrencyApi::update(
        app_state.store_ref(),
        &app_state.event_publisher,
        id,
        params,
    )
    .await?;

    Ok(Json(
        ApiResponse::new(currency).with_message("Currency updated successfully"),
    ))
}

/// POST flip whether a Currency is active
#[utoipa::path(
    post,
    path = "/api/currencies/{id}/toggle",
    params(("id" = String, Path, description = "Currency id to toggle")),
    responses(
        (status = 200, description = "Successfully toggled the Currency", body = domain::currencies::Model),
        (status = 404, description = "Currency not found")
    )
)]
pub async fn toggle(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let currency =
        CurrencyApi::toggle_active(app_state.store_ref(), &app_state.event_publisher, id).await?;
    let message = format!(
        "Currency {} successfully",
        if currency.active {
            "activated"
        } else {
            "deactivated"
        }
    );

    Ok(Json(ApiResponse::new(currency).with_message(message)))
}

/// DELETE a Currency that no exchange rate uses
#[utoipa::path(
    delete,
    path = "/api/currencies/{id}",
    params(("id" = String, Path, description = "Currency id to delete")),
    responses(
        (status = 200, description = "Successfully deleted the Currency"),
        (status = 404, description = "Currency not found"),
        (status = 409, description = "Currency is still used by an exchange rate")
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    info!("DELETE Currency with id: {id}");
    CurrencyApi::delete(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::<()>::message_only(
        "Currency deleted successfully",
    )))
}

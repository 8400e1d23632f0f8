use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::{AppState, Error};
use domain::payment_method::{self as PaymentMethodApi, NewPaymentMethod, PaymentMethodUpdate};
use domain::Id;
use log::*;

/// GET all Payment Methods with their currency, newest first
#[utoipa::path(
    get,
    path = "/api/payment-methods",
    responses(
        (status = 200, description = "Successfully retrieved all Payment Methods", body = [domain::payment_methods::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let methods = PaymentMethodApi::find_all(app_state.store_ref()).await?;
    debug!("Found {} payment methods", methods.len());

    Ok(Json(ApiResponse::new(methods)))
}

/// GET a particular Payment Method specified by its id.
#[utoipa::path(
    get,
    path = "/api/payment-methods/{id}",
    params(("id" = String, Path, description = "Payment Method id to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved a Payment Method", body = domain::payment_methods::Model),
        (status = 404, description = "Payment Method not found")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let method = PaymentMethodApi::find_by_id(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::new(method)))
}

/// POST create a new Payment Method
#[utoipa::path(
    post,
    path = "/api/payment-methods",
    request_body = NewPaymentMethod,
    responses(
        (status = 201, description = "Successfully Created a New Payment Method", body = domain::payment_methods::Model),
        (status = 400, description = "Missing required fields: name, type, currencyId")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<NewPaymentMethod>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Payment Method from: {params:?}");

    let method = PaymentMethodApi::create(app_state.store_ref(), params).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(method).with_message("Payment method created successfully")),
    ))
}

/// PUT update a Payment Method; absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/payment-methods/{id}",
    params(("id" = String, Path, description = "Payment Method id to update")),
    request_body = PaymentMethodUpdate,
    responses(
        (status = 200, description = "Successfully Updated Payment Method", body = domain::payment_methods::Model),
        (status = 400, description = "Unknown currency"),
        (status = 404, description = "Payment Method not found")
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<PaymentMethodUpdate>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Payment Method with id: {id}");

    let method = PaymentMethodApi::update(app_state.store_ref(), id, params).await?;

    Ok(Json(
        ApiResponse::new(method).with_message("Payment method updated successfully"),
    ))
}

/// DELETE a Payment Method that no order uses
#[utoipa::path(
    delete,
    path = "/api/payment-methods/{id}",
    params(("id" = String, Path, description = "Payment Method id to delete")),
    responses(
        (status = 200, description = "Successfully deleted the Payment Method"),
        (status = 404, description = "Payment Method not found"),
        (status = 409, description = "Payment Method is still used by an order")
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    info!("DELETE Payment Method with id: {id}");
    PaymentMethodApi::delete(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::<()>::message_only(
        "Payment method deleted successfully",
    )))
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::params::order::{ByUserParams, IndexParams};
use crate::{AppState, Error};
use domain::order::{self as OrderApi, NewOrder, StatusUpdate};
use domain::store::OrderQuery;
use domain::Id;
use log::*;

/// GET a page of Orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved a page of Orders", body = [domain::orders::Model]),
        (status = 400, description = "Invalid status")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Orders with params: {params:?}");
    let query = OrderQuery::try_from(params)?;

    let page = OrderApi::find_by(app_state.store_ref(), query).await?;

    Ok(Json(
        ApiResponse::new(page.items).with_pagination(page.pagination),
    ))
}

/// GET every Order of one customer
#[utoipa::path(
    get,
    path = "/api/orders/by-user",
    params(ByUserParams),
    responses(
        (status = 200, description = "Successfully retrieved the customer's Orders", body = [domain::orders::Model]),
        (status = 400, description = "User email is required")
    )
)]
pub async fn by_user(
    State(app_state): State<AppState>,
    Query(params): Query<ByUserParams>,
) -> Result<impl IntoResponse, Error> {
    let orders = OrderApi::find_by_user_email(app_state.store_ref(), params.email).await?;

    Ok(Json(ApiResponse::new(orders)))
}

/// GET a particular Order specified by its id.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved an Order", body = domain::orders::Model),
        (status = 404, description = "Order not found")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let order = OrderApi::find_by_id(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::new(order)))
}

/// POST place a new Order
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = NewOrder,
    responses(
        (status = 201, description = "Successfully Created a New Order", body = domain::orders::Model),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<NewOrder>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Order from: {params:?}");

    let order = OrderApi::create(
        app_state.store_ref(),
        &app_state.event_publisher,
        params,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(order).with_message("Order created successfully")),
    ))
}

/// PUT move an Order to a new status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = String, Path, description = "Order id to update")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Successfully updated the Order status", body = domain::orders::Model),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<StatusUpdate>,
) -> Result<impl IntoResponse, Error> {
    info!("PUT Update status of Order {id} to {:?}", params.status);

    let order = OrderApi::update_status(
        app_state.store_ref(),
        &app_state.event_publisher,
        id,
        params,
    )
    .await?;

    Ok(Json(
        ApiResponse::new(order).with_message("Order status updated successfully"),
    ))
}

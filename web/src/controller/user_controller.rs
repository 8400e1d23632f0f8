use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::params::user::IndexParams;
use crate::{AppState, Error};
use domain::store::UserQuery;
use domain::user::{self as UserApi, UserStatusUpdate, UserSync};
use domain::Id;
use log::*;

/// POST create or refresh a User from the identity provider's record
#[utoipa::path(
    post,
    path = "/api/users/sync",
    request_body = UserSync,
    responses(
        (status = 200, description = "Successfully synced the User", body = domain::users::Model),
        (status = 400, description = "Missing required fields: email, name")
    )
)]
pub async fn sync(
    State(app_state): State<AppState>,
    Json(params): Json<UserSync>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Sync User {:?}", params.email);

    let user = UserApi::sync(app_state.store_ref(), &app_state.event_publisher, params).await?;

    Ok(Json(ApiResponse::new(user)))
}

/// GET a page of Users, most recently joined first
#[utoipa::path(
    get,
    path = "/api/users",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved a page of Users", body = [domain::users::Model]),
        (status = 400, description = "Invalid status or role filter")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Users with params: {params:?}");
    let query = UserQuery::try_from(params)?;

    let page = UserApi::find_by(app_state.store_ref(), query).await?;

    Ok(Json(
        ApiResponse::new(page.items).with_pagination(page.pagination),
    ))
}

/// GET a particular User with their latest Orders
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved a User", body = domain::users::Model),
        (status = 404, description = "User not found")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::find_by_id(app_state.store_ref(), id).await?;

    Ok(Json(ApiResponse::new(user)))
}

/// PUT activate, suspend or park a User
#[utoipa::path(
    put,
    path = "/api/users/{id}/status",
    params(("id" = String, Path, description = "User id to update")),
    request_body = UserStatusUpdate,
    responses(
        (status = 200, description = "Successfully updated the User status", body = domain::users::Model),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UserStatusUpdate>,
) -> Result<impl IntoResponse, Error> {
    info!("PUT Update status of User {id} to {:?}", params.status);

    let user = UserApi::update_status(
        app_state.store_ref(),
        &app_state.event_publisher,
        id,
        params,
    )
    .await?;

    Ok(Json(ApiResponse::new(user)))
}

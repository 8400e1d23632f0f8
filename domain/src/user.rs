use crate::error::Error;
use crate::store::{OrderQuery, OrderStore, Page, UserQuery, UserStore};
use crate::users::{Model, UserRole, UserStatus, VerificationStatus, View};
use crate::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// How many orders a user's detail view carries.
pub const RECENT_ORDERS: u64 = 10;

/// Body of `POST /api/users/sync`: the identity provider's view of a user.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSync {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// Body of `PUT /api/users/:id/status`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserStatusUpdate {
    pub status: Option<String>,
}

pub async fn find_by<S>(store: &S, query: UserQuery) -> Result<Page<Model>, Error>
where
    S: UserStore + ?Sized,
{
    store.query_users(&query).await
}

/// A user with their most recent orders.
pub async fn find_by_id<S>(store: &S, id: Id) -> Result<View, Error>
where
    S: OrderStore + UserStore + ?Sized,
{
    let user = store.find_user(id).await?.ok_or_else(Error::not_found)?;
    let orders = store
        .query_orders(&OrderQuery {
            user_email: Some(user.email.clone()),
            limit: RECENT_ORDERS,
            ..Default::default()
        })
        .await?
        .items;
    Ok(View { user, orders })
}

/// Creates or refreshes the user with the given email. New users start
/// active and verified since the identity provider already vetted them.
pub async fn sync<S>(
    store: &S,
    event_publisher: &EventPublisher,
    params: UserSync,
) -> Result<Model, Error>
where
    S: UserStore + ?Sized,
{
    let email = params.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    let name = params.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let (Some(email), Some(name)) = (email, name) else {
        return Err(Error::invalid("Missing required fields: email, name"));
    };
    let role = match params.role.as_deref() {
        None | Some("") => UserRole::User,
        Some(role) => role.parse::<UserRole>().map_err(Error::invalid)?,
    };
    let phone = params.phone;
    let key = email.clone();

    let now = chrono::Utc::now();
    let user = store
        .upsert_user_by_email(
            &key,
            Box::new(move |existing: Option<Model>| match existing {
                Some(user) => Model {
                    name,
                    phone,
                    role,
                    last_active: Some(now),
                    ..user
                },
                None => Model {
                    id: Id::new_v4(),
                    name,
                    email,
                    phone,
                    role,
                    status: UserStatus::Active,
                    verification_status: VerificationStatus::Verified,
                    total_orders: 0,
                    total_volume: 0.0,
                    joined_at: now,
                    last_active: Some(now),
                },
            }),
        )
        .await?;
    debug!("Synced User: {user:?}");

    notify(event_publisher, &user).await?;
    Ok(user)
}

pub async fn update_status<S>(
    store: &S,
    event_publisher: &EventPublisher,
    id: Id,
    params: UserStatusUpdate,
) -> Result<Model, Error>
where
    S: UserStore + ?Sized,
{
    let status = params
        .status
        .as_deref()
        .and_then(|s| s.parse::<UserStatus>().ok())
        .ok_or_else(|| {
            Error::invalid("Invalid status. Must be: active, suspended, or pending")
        })?;

    let mut user = store.find_user(id).await?.ok_or_else(|| {
        error!("User with id {id} not found");
        Error::not_found()
    })?;
    info!("User {} status {} -> {}", user.email, user.status, status);
    user.status = status;

    let user = store.save_user(user).await?;
    notify(event_publisher, &user).await?;
    Ok(user)
}

/// Bumps the order count of the customer with `email`, if they are known.
/// Orders may be placed before the customer was synced.
pub(crate) async fn record_order<S>(store: &S, email: &str) -> Result<(), Error>
where
    S: UserStore + ?Sized,
{
    match store.find_user_by_email(email).await? {
        Some(mut user) => {
            user.total_orders += 1;
            store.save_user(user).await?;
        }
        None => debug!("Order placed by {email}, who has not been synced yet"),
    }
    Ok(())
}

async fn notify(event_publisher: &EventPublisher, user: &Model) -> Result<(), Error> {
    event_publisher
        .publish(DomainEvent::UserUpdated {
            user: serde_json::to_value(user)?,
        })
        .await;
    Ok(())
}

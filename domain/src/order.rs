use crate::error::Error;
use crate::orders::{Model, OrderStatus, View};
use crate::store::{CurrencyStore, OrderQuery, OrderStore, Page, PaymentMethodStore, UserStore};
use crate::{payment_method, user, Id};
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_email: Option<String>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub from_currency_id: Option<Id>,
    pub from_amount: Option<f64>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub to_currency_id: Option<Id>,
    pub to_amount: Option<f64>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub payment_method_id: Option<Id>,
    pub recipient_name: Option<String>,
    pub recipient_bank: Option<String>,
    pub recipient_account_number: Option<String>,
    pub recipient_swift: Option<String>,
    pub recipient_wallet_address: Option<String>,
    pub exchange_rate: Option<f64>,
    pub notes: Option<String>,
}

/// Body of `PUT /api/orders/:id/status`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
}

async fn view<S>(store: &S, order: Model) -> Result<View, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let from_currency = store.find_currency(order.from_currency_id).await?;
    let to_currency = store.find_currency(order.to_currency_id).await?;
    let payment_method = store.find_payment_method(order.payment_method_id).await?;
    Ok(View {
        order,
        from_currency,
        to_currency,
        payment_method,
    })
}

async fn view_page<S>(store: &S, page: Page<Model>) -> Result<Page<View>, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let mut items = Vec::with_capacity(page.items.len());
    for order in page.items {
        items.push(view(store, order).await?);
    }
    Ok(Page {
        items,
        pagination: page.pagination,
    })
}

pub async fn find_by<S>(store: &S, query: OrderQuery) -> Result<Page<View>, Error>
where
    S: CurrencyStore + OrderStore + PaymentMethodStore + ?Sized,
{
    let page = store.query_orders(&query).await?;
    view_page(store, page).await
}

/// Every order of one customer, newest first and unpaginated.
pub async fn find_by_user_email<S>(store: &S, email: Option<String>) -> Result<Vec<View>, Error>
where
    S: CurrencyStore + OrderStore + PaymentMethodStore + ?Sized,
{
    let email = email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| Error::invalid("User email is required"))?;

    let query = OrderQuery {
        user_email: Some(email),
        limit: 0,
        ..Default::default()
    };
    Ok(find_by(store, query).await?.items)
}

pub async fn find_by_id<S>(store: &S, id: Id) -> Result<View, Error>
where
    S: CurrencyStore + OrderStore + PaymentMethodStore + ?Sized,
{
    let order = store.find_order(id).await?.ok_or_else(Error::not_found)?;
    view(store, order).await
}

fn positive(value: f64, field: &str) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid(format!("{field} must be a positive number")))
    }
}

/// Places an order in `pending_payment`. The customer and the admins are told.
pub async fn create<S>(
    store: &S,
    event_publisher: &EventPublisher,
    params: NewOrder,
) -> Result<View, Error>
where
    S: CurrencyStore + OrderStore + PaymentMethodStore + UserStore + ?Sized,
{
    let user_email = params
        .user_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    let (
        Some(user_email),
        Some(from_currency_id),
        Some(from_amount),
        Some(to_currency_id),
        Some(to_amount),
        Some(payment_method_id),
        Some(exchange_rate),
    ) = (
        user_email,
        params.from_currency_id,
        params.from_amount,
        params.to_currency_id,
        params.to_amount,
        params.payment_method_id,
        params.exchange_rate,
    )
    else {
        return Err(Error::invalid("Missing required fields"));
    };

    let from_amount = positive(from_amount, "fromAmount")?;
    let to_amount = positive(to_amount, "toAmount")?;
    let exchange_rate = positive(exchange_rate, "exchangeRate")?;
    for currency_id in [from_currency_id, to_currency_id] {
        if store.find_currency(currency_id).await?.is_none() {
            return Err(Error::invalid(format!("Unknown currency {currency_id}")));
        }
    }
    payment_method::ensure_usable(store, payment_method_id).await?;

    let now = chrono::Utc::now();
    let order = store
        .save_order(Model {
            id: Id::new_v4(),
            user_email,
            from_currency_id,
            from_amount,
            to_currency_id,
            to_amount,
            payment_method_id,
            recipient_name: params.recipient_name,
            recipient_bank: params.recipient_bank,
            recipient_account_number: params.recipient_account_number,
            recipient_swift: params.recipient_swift,
            recipient_wallet_address: params.recipient_wallet_address,
            exchange_rate,
            fee: 0.0,
            notes: params.notes,
            status: OrderStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!("Order {} placed by {}", order.id, order.user_email);
    user::record_order(store, &order.user_email).await?;

    let order = view(store, order).await?;
    event_publisher
        .publish(DomainEvent::OrderCreated {
            user_email: order.order.user_email.clone(),
            order: serde_json::to_value(&order)?,
        })
        .await;
    Ok(order)
}

/// Moves an order to a new status, replacing its notes when given.
pub async fn update_status<S>(
    store: &S,
    event_publisher: &EventPublisher,
    id: Id,
    params: StatusUpdate,
) -> Result<View, Error>
where
    S: CurrencyStore + OrderStore + PaymentMethodStore + ?Sized,
{
    let status = params
        .status
        .as_deref()
        .and_then(|s| s.parse::<OrderStatus>().ok())
        .ok_or_else(|| Error::invalid("Invalid status"))?;

    let mut order = store.find_order(id).await?.ok_or_else(|| {
        error!("Order with id {id} not found");
        Error::not_found()
    })?;
    debug!("Order {} status {} -> {}", order.id, order.status, status);

    order.status = status;
    if params.notes.is_some() {
        order.notes = params.notes;
    }
    order.updated_at = chrono::Utc::now();
    let order = store.save_order(order).await?;

    let order = view(store, order).await?;
    event_publisher
        .publish(DomainEvent::OrderStatusUpdated {
            user_email: order.order.user_email.clone(),
            order: serde_json::to_value(&order)?,
        })
        .await;
    Ok(order)
}

use crate::error::Error;
use crate::exchange_rates::{Model, View};
use crate::store::{CurrencyStore, ExchangeRateStore};
use crate::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /api/exchange-rates`: create the pair, or update it if it exists.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateInput {
    #[schema(value_type = Option<String>, format = Uuid)]
    pub from_currency_id: Option<Id>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub to_currency_id: Option<Id>,
    pub rate: Option<f64>,
    pub buy_rate: Option<f64>,
    pub sell_rate: Option<f64>,
    pub auto_update: Option<bool>,
    pub active: Option<bool>,
}

/// Body of `PUT /api/exchange-rates/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    pub rate: Option<f64>,
    pub buy_rate: Option<f64>,
    pub sell_rate: Option<f64>,
    pub auto_update: Option<bool>,
    pub active: Option<bool>,
}

fn positive(value: f64, field: &str) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid(format!("{field} must be a positive number")))
    }
}

fn optional_positive(value: Option<f64>, field: &str) -> Result<Option<f64>, Error> {
    value.map(|v| positive(v, field)).transpose()
}

/// Attach both currencies to a rate.
pub async fn view<S>(store: &S, rate: Model) -> Result<View, Error>
where
    S: CurrencyStore + ?Sized,
{
    let from_currency = store.find_currency(rate.from_currency_id).await?;
    let to_currency = store.find_currency(rate.to_currency_id).await?;
    Ok(View {
        rate,
        from_currency,
        to_currency,
    })
}

/// All rates, most recently updated first.
pub async fn find_all<S>(store: &S) -> Result<Vec<View>, Error>
where
    S: CurrencyStore + ExchangeRateStore + ?Sized,
{
    let mut rates = store.list_rates().await?;
    rates.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

    let mut views = Vec::with_capacity(rates.len());
    for rate in rates {
        views.push(view(store, rate).await?);
    }
    Ok(views)
}

pub async fn find_by_id<S>(store: &S, id: Id) -> Result<View, Error>
where
    S: CurrencyStore + ExchangeRateStore + ?Sized,
{
    let rate = store.find_rate(id).await?.ok_or_else(Error::not_found)?;
    view(store, rate).await
}

/// Creates the rate for a currency pair or updates the existing one. On
/// update the old rate is kept as `previous_rate` and the pair keeps its id.
pub async fn upsert<S>(
    store: &S,
    event_publisher: &EventPublisher,
    params: RateInput,
) -> Result<Model, Error>
where
    S: CurrencyStore + ExchangeRateStore + ?Sized,
{
    let (Some(from_currency_id), Some(to_currency_id), Some(rate)) =
        (params.from_currency_id, params.to_currency_id, params.rate)
    else {
        return Err(Error::invalid("Missing required fields"));
    };
    if from_currency_id == to_currency_id {
        return Err(Error::invalid("Currencies of a rate must differ"));
    }
    let rate = positive(rate, "rate")?;
    let buy_rate = optional_positive(params.buy_rate, "buyRate")?.unwrap_or(rate);
    let sell_rate = optional_positive(params.sell_rate, "sellRate")?.unwrap_or(rate);

    for currency_id in [from_currency_id, to_currency_id] {
        if store.find_currency(currency_id).await?.is_none() {
            return Err(Error::invalid(format!("Unknown currency {currency_id}")));
        }
    }

    let now = chrono::Utc::now();
    let auto_update = params.auto_update;
    let active = params.active;
    let saved = store
        .upsert_rate_by_pair(
            from_currency_id,
            to_currency_id,
            Box::new(move |existing: Option<Model>| match existing {
                Some(existing) => Model {
                    rate,
                    previous_rate: Some(existing.rate),
                    buy_rate,
                    sell_rate,
                    auto_update: auto_update.unwrap_or(existing.auto_update),
                    active: active.unwrap_or(existing.active),
                    last_updated: now,
                    ..existing
                },
                None => Model {
                    id: Id::new_v4(),
                    from_currency_id,
                    to_currency_id,
                    rate,
                    previous_rate: None,
                    buy_rate,
                    sell_rate,
                    auto_update: auto_update.unwrap_or(false),
                    active: active.unwrap_or(true),
                    last_updated: now,
                },
            }),
        )
        .await?;
    debug!("Upserted Exchange Rate: {saved:?}");

    notify(store, event_publisher, &saved).await?;
    Ok(saved)
}

/// Updates a rate by id. `previous_rate` only moves when `rate` changes.
pub async fn update<S>(
    store: &S,
    event_publisher: &EventPublisher,
    id: Id,
    params: RateUpdate,
) -> Result<Model, Error>
where
    S: CurrencyStore + ExchangeRateStore + ?Sized,
{
    let mut model = store.find_rate(id).await?.ok_or_else(|| {
        error!("Exchange Rate with id {id} not found");
        Error::not_found()
    })?;

    if let Some(rate) = optional_positive(params.rate, "rate")? {
        model.previous_rate = Some(model.rate);
        model.rate = rate;
    }
    if let Some(buy_rate) = optional_positive(params.buy_rate, "buyRate")? {
        model.buy_rate = buy_rate;
    }
    if let Some(sell_rate) = optional_positive(params.sell_rate, "sellRate")? {
        model.sell_rate = sell_rate;
    }
    if let Some(auto_update) = params.auto_update {
        model.auto_update = auto_update;
    }
    if let Some(active) = params.active {
        model.active = active;
    }
    model.last_updated = chrono::Utc::now();

    let saved = store.save_rate(model).await?;
    notify(store, event_publisher, &saved).await?;
    Ok(saved)
}

/// Marks a rate as freshly checked. Rates are not sourced from any market,
/// so only the timestamp moves and nothing is broadcast.
pub async fn refresh<S>(store: &S, id: Id) -> Result<Model, Error>
where
    S: ExchangeRateStore + ?Sized,
{
    let mut model = store.find_rate(id).await?.ok_or_else(Error::not_found)?;
    model.last_updated = chrono::Utc::now();
    store.save_rate(model).await
}

/// Refreshes every active auto-update rate. Returns how many were touched.
pub async fn refresh_all<S>(store: &S) -> Result<usize, Error>
where
    S: ExchangeRateStore + ?Sized,
{
    let now = chrono::Utc::now();
    let mut refreshed = 0;
    for mut model in store.list_rates().await? {
        if model.active && model.auto_update {
            model.last_updated = now;
            store.save_rate(model).await?;
            refreshed += 1;
        }
    }
    info!("Refreshed {refreshed} auto-update exchange rate(s)");
    Ok(refreshed)
}

async fn notify<S>(store: &S, event_publisher: &EventPublisher, rate: &Model) -> Result<(), Error>
where
    S: CurrencyStore + ?Sized,
{
    let rate_view = view(store, rate.clone()).await?;
    event_publisher
        .publish(DomainEvent::ExchangeRateUpdated {
            exchange_rate: serde_json::to_value(&rate_view)?,
        })
        .await;
    Ok(())
}

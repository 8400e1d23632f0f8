use crate::currencies::{CurrencyType, Model, DEFAULT_DECIMALS};
use crate::error::Error;
use crate::store::{CurrencyStore, ExchangeRateStore, PaymentMethodStore};
use crate::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of a create request. Fields are optional so that missing ones are
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCurrency {
    pub code: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub flag: Option<String>,
    pub flag_url: Option<String>,
    #[serde(rename = "type")]
    pub currency_type: Option<String>,
    pub decimals: Option<u8>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub flag: Option<String>,
    pub flag_url: Option<String>,
    #[serde(rename = "type")]
    pub currency_type: Option<String>,
    pub decimals: Option<u8>,
    pub active: Option<bool>,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_type(value: &str) -> Result<CurrencyType, Error> {
    value.parse::<CurrencyType>().map_err(Error::invalid)
}

/// All currencies ordered by code.
pub async fn find_all<S>(store: &S) -> Result<Vec<Model>, Error>
where
    S: CurrencyStore + ?Sized,
{
    let mut currencies = store.list_currencies().await?;
    currencies.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(currencies)
}

pub async fn find_by_id<S>(store: &S, id: Id) -> Result<Model, Error>
where
    S: CurrencyStore + ?Sized,
{
    store.find_currency(id).await?.ok_or_else(Error::not_found)
}

pub async fn create<S>(
    store: &S,
    event_publisher: &EventPublisher,
    params: NewCurrency,
) -> Result<Model, Error>
where
    S: CurrencyStore + ?Sized,
{
    let (Some(code), Some(name), Some(symbol), Some(flag), Some(currency_type)) = (
        required(params.code),
        required(params.name),
        required(params.symbol),
        required(params.flag),
        required(params.currency_type),
    ) else {
        return Err(Error::invalid("Missing required fields"));
    };
    let currency_type = parse_type(&currency_type)?;

    if store.find_currency_by_code(&code).await?.is_some() {
        warn!("Rejecting duplicate currency code {code}");
        return Err(Error::conflict("Currency with this code already exists"));
    }

    let now = chrono::Utc::now();
    let currency = store
        .save_currency(Model {
            id: Id::new_v4(),
            code,
            name,
            symbol,
            flag,
            flag_url: params.flag_url,
            currency_type,
            decimals: params.decimals.unwrap_or(DEFAULT_DECIMALS),
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    debug!("New Currency: {currency:?}");
    notify(event_publisher, &currency).await?;
    Ok(currency)
}

pub async fn update<S>(
    store: &S,
    event_publisher: &EventPublisher,
    id: Id,
    params: CurrencyUpdate,
) -> Result<Model, Error>
where
    S: CurrencyStore + ?Sized,
{
    let mut currency = find_by_id(store, id).await?;
    debug!("Existing Currency to be updated: {currency:?}");

    if let Some(name) = required(params.name) {
        currency.name = name;
    }
    if let Some(symbol) = required(params.symbol) {
        currency.symbol = symbol;
    }
    if let Some(flag) = required(params.flag) {
        currency.flag = flag;
    }
    if let Some(flag_url) = params.flag_url {
        currency.flag_url = Some(flag_url).filter(|url| !url.is_empty());
    }
    if let Some(currency_type) = required(params.currency_type) {
        currency.currency_type = parse_type(&currency_type)?;
    }
    if let Some(decimals) = params.decimals {
        currency.decimals = decimals;
    }
    if let Some(active) = params.active {
        currency.active = active;
    }
    currency.updated_at = chrono::Utc::now();

    let currency = store.save_currency(currency).await?;
    notify(event_publisher, &currency).await?;
    Ok(currency)
}

pub async fn toggle_active<S>(
    store: &S,
    event_publisher: &EventPublisher,
    id: Id,
) -> Result<Model, Error>
where
    S: CurrencyStore + ?Sized,
{
    let mut currency = find_by_id(store, id).await?;
    currency.active = !currency.active;
    currency.updated_at = chrono::Utc::now();

    let currency = store.save_currency(currency).await?;
    info!(
        "Currency {} {}",
        currency.code,
        if currency.active {
            "activated"
        } else {
            "deactivated"
        }
    );
    notify(event_publisher, &currency).await?;
    Ok(currency)
}

/// Deletes a currency that no exchange rate or payment method refers to.
/// Deletion is not broadcast.
pub async fn delete<S>(store: &S, id: Id) -> Result<(), Error>
where
    S: CurrencyStore + ExchangeRateStore + PaymentMethodStore + ?Sized,
{
    let in_use = store
        .list_rates()
        .await?
        .iter()
        .any(|rate| rate.from_currency_id == id || rate.to_currency_id == id);
    if in_use {
        return Err(Error::conflict(
            "Currency is still used by one or more exchange rates",
        ));
    }
    let accepted = store
        .list_payment_methods()
        .await?
        .iter()
        .any(|method| method.currency_id == id);
    if accepted {
        return Err(Error::conflict(
            "Currency is still used by one or more payment methods",
        ));
    }

    if store.delete_currency(id).await? {
        Ok(())
    } else {
        Err(Error::not_found())
    }
}

async fn notify(event_publisher: &EventPublisher, currency: &Model) -> Result<(), Error> {
    event_publisher
        .publish(DomainEvent::CurrencyUpdated {
            currency: serde_json::to_value(currency)?,
        })
        .await;
    Ok(())
}

use crate::error::Error;
use crate::payment_methods::{Model, View};
use crate::store::{CurrencyStore, OrderQuery, OrderStore, PaymentMethodStore};
use crate::Id;
use log::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /api/payment-methods`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentMethod {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub currency_id: Option<Id>,
    pub active: Option<bool>,
    #[serde(flatten)]
    pub details: PaymentDetails,
}

/// Body of `PUT /api/payment-methods/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub currency_id: Option<Id>,
    pub active: Option<bool>,
    #[serde(flatten)]
    pub details: PaymentDetails,
}

/// Where and how the customer pays.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_number: Option<String>,
    pub swift: Option<String>,
    pub iban: Option<String>,
    pub wallet_address: Option<String>,
    pub network: Option<String>,
    pub instructions: Option<String>,
}

impl PaymentDetails {
    fn apply(self, method: &mut Model) {
        let PaymentDetails {
            bank_name,
            account_name,
            account_number,
            routing_number,
            swift,
            iban,
            wallet_address,
            network,
            instructions,
        } = self;
        for (field, value) in [
            (&mut method.bank_name, bank_name),
            (&mut method.account_name, account_name),
            (&mut method.account_number, account_number),
            (&mut method.routing_number, routing_number),
            (&mut method.swift, swift),
            (&mut method.iban, iban),
            (&mut method.wallet_address, wallet_address),
            (&mut method.network, network),
            (&mut method.instructions, instructions),
        ] {
            if value.is_some() {
                *field = value;
            }
        }
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn known_currency<S>(store: &S, currency_id: Id) -> Result<(), Error>
where
    S: CurrencyStore + ?Sized,
{
    match store.find_currency(currency_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::invalid(format!("Unknown currency {currency_id}"))),
    }
}

async fn view<S>(store: &S, method: Model) -> Result<View, Error>
where
    S: CurrencyStore + ?Sized,
{
    let currency = store.find_currency(method.currency_id).await?;
    Ok(View { method, currency })
}

/// All payment methods with their currency, newest first.
pub async fn find_all<S>(store: &S) -> Result<Vec<View>, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let mut methods = store.list_payment_methods().await?;
    methods.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut views = Vec::with_capacity(methods.len());
    for method in methods {
        views.push(view(store, method).await?);
    }
    Ok(views)
}

pub async fn find_by_id<S>(store: &S, id: Id) -> Result<View, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let method = store
        .find_payment_method(id)
        .await?
        .ok_or_else(Error::not_found)?;
    view(store, method).await
}

pub async fn create<S>(store: &S, params: NewPaymentMethod) -> Result<Model, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let (Some(name), Some(method_type), Some(currency_id)) = (
        required(params.name),
        required(params.method_type),
        params.currency_id,
    ) else {
        return Err(Error::invalid(
            "Missing required fields: name, type, currencyId",
        ));
    };
    known_currency(store, currency_id).await?;

    let now = chrono::Utc::now();
    let mut method = Model {
        id: Id::new_v4(),
        name,
        method_type,
        currency_id,
        active: params.active.unwrap_or(true),
        bank_name: None,
        account_name: None,
        account_number: None,
        routing_number: None,
        swift: None,
        iban: None,
        wallet_address: None,
        network: None,
        instructions: None,
        created_at: now,
        updated_at: now,
    };
    params.details.apply(&mut method);

    let method = store.save_payment_method(method).await?;
    debug!("New Payment Method: {method:?}");
    Ok(method)
}

pub async fn update<S>(store: &S, id: Id, params: PaymentMethodUpdate) -> Result<Model, Error>
where
    S: CurrencyStore + PaymentMethodStore + ?Sized,
{
    let mut method = store.find_payment_method(id).await?.ok_or_else(|| {
        error!("Payment Method with id {id} not found");
        Error::not_found()
    })?;

    if let Some(name) = required(params.name) {
        method.name = name;
    }
    if let Some(method_type) = required(params.method_type) {
        method.method_type = method_type;
    }
    if let Some(currency_id) = params.currency_id {
        known_currency(store, currency_id).await?;
        method.currency_id = currency_id;
    }
    if let Some(active) = params.active {
        method.active = active;
    }
    params.details.apply(&mut method);
    method.updated_at = chrono::Utc::now();

    store.save_payment_method(method).await
}

/// Deletes a payment method that no order refers to.
pub async fn delete<S>(store: &S, id: Id) -> Result<(), Error>
where
    S: OrderStore + PaymentMethodStore + ?Sized,
{
    let referencing = store
        .query_orders(&OrderQuery {
            payment_method_id: Some(id),
            limit: 1,
            ..Default::default()
        })
        .await?;
    if referencing.pagination.total > 0 {
        return Err(Error::conflict(
            "Payment method is still used by one or more orders",
        ));
    }

    if store.delete_payment_method(id).await? {
        info!("Payment Method {id} deleted");
        Ok(())
    } else {
        Err(Error::not_found())
    }
}

/// Fails unless `id` names an active payment method.
pub async fn ensure_usable<S>(store: &S, id: Id) -> Result<Model, Error>
where
    S: PaymentMethodStore + ?Sized,
{
    match store.find_payment_method(id).await? {
        Some(method) if method.active => Ok(method),
        Some(_) => Err(Error::invalid("Payment method is not active")),
        None => Err(Error::invalid(format!("Unknown payment method {id}"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::currency::{self, NewCurrency};
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::store::MemoryStore;
    use events::EventPublisher;

    pub(crate) async fn bank_transfer(store: &MemoryStore) -> Model {
        let currency = match store.find_currency_by_code("USD").await.unwrap() {
            Some(currency) => currency,
            None => currency::create(
                store,
                &EventPublisher::new(),
                NewCurrency {
                    code: Some("USD".to_string()),
                    name: Some("US Dollar".to_string()),
                    symbol: Some("$".to_string()),
                    flag: Some("US".to_string()),
                    currency_type: Some("fiat".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap(),
        };
        create(
            store,
            NewPaymentMethod {
                name: Some("Bank transfer".to_string()),
                method_type: Some("bank_transfer".to_string()),
                currency_id: Some(currency.id),
                details: PaymentDetails {
                    bank_name: Some("First Bank".to_string()),
                    iban: Some("DE89370400440532013000".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn entity_kind(err: Error) -> EntityErrorKind {
        match err.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(kind)) => kind,
            other => panic!("unexpected error kind {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_defaults_to_active_and_keeps_details() {
        let store = MemoryStore::new();

        let method = bank_transfer(&store).await;

        assert!(method.active);
        assert_eq!(method.bank_name.as_deref(), Some("First Bank"));
        assert_eq!(method.wallet_address, None);
        let found = find_by_id(&store, method.id).await.unwrap();
        assert_eq!(found.currency.map(|c| c.code), Some("USD".to_string()));
    }

    #[tokio::test]
    async fn create_requires_name_type_and_a_known_currency() {
        let store = MemoryStore::new();

        let missing = create(
            &store,
            NewPaymentMethod {
                name: Some("Wallet".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            entity_kind(missing),
            EntityErrorKind::Invalid("Missing required fields: name, type, currencyId".to_string())
        );

        let unknown = create(
            &store,
            NewPaymentMethod {
                name: Some("Wallet".to_string()),
                method_type: Some("crypto".to_string()),
                currency_id: Some(Id::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(entity_kind(unknown), EntityErrorKind::Invalid(_)));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemoryStore::new();
        let method = bank_transfer(&store).await;

        let updated = update(
            &store,
            method.id,
            PaymentMethodUpdate {
                active: Some(false),
                details: PaymentDetails {
                    instructions: Some("Use the order id as reference".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!updated.active);
        assert_eq!(updated.name, method.name);
        assert_eq!(updated.iban, method.iban);
        assert_eq!(
            updated.instructions.as_deref(),
            Some("Use the order id as reference")
        );
        assert!(matches!(
            entity_kind(ensure_usable(&store, method.id).await.unwrap_err()),
            EntityErrorKind::Invalid(_)
        ));
    }

    #[tokio::test]
    async fn delete_missing_method_is_not_found() {
        let store = MemoryStore::new();
        let err = delete(&store, Id::new_v4()).await.unwrap_err();
        assert_eq!(entity_kind(err), EntityErrorKind::NotFound);
    }
}

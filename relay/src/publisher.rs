use crate::error::Error;
use crate::{tag_origin, RATE_UPDATED_CHANNEL};
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Forwards exchange-rate updates to the other server instances.
///
/// Other domain events stay local. Publish failures are logged and dropped;
/// the local SSE delivery has already happened by then.
pub struct RelayPublisher {
    connection: ConnectionManager,
    instance_id: String,
}

impl RelayPublisher {
    pub async fn connect(redis_url: &str, instance_id: &str) -> Result<Self, Error> {
        let client = redis::Client::open(redis_url).map_err(Error::connection)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(Error::connection)?;
        info!("Relay publisher connected, instance id {instance_id}");

        Ok(Self {
            connection,
            instance_id: instance_id.to_string(),
        })
    }

    /// The channel message for `event`, if it is one that is relayed.
    pub fn encode(event: &DomainEvent, instance_id: &str) -> Result<Option<String>, Error> {
        match event {
            DomainEvent::ExchangeRateUpdated { exchange_rate } => {
                let payload = tag_origin(exchange_rate.clone(), instance_id);
                Ok(Some(serde_json::to_string(&payload)?))
            }
            _ => Ok(None),
        }
    }

    async fn publish(&self, body: String) -> Result<i64, Error> {
        let mut connection = self.connection.clone();
        connection
            .publish(RATE_UPDATED_CHANNEL, body)
            .await
            .map_err(Error::publish)
    }
}

#[async_trait]
impl EventHandler for RelayPublisher {
    async fn handle(&self, event: &DomainEvent) {
        let body = match Self::encode(event, &self.instance_id) {
            Ok(Some(body)) => body,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to encode {} for the relay: {e}", event.kind());
                return;
            }
        };

        match self.publish(body).await {
            Ok(receivers) => {
                debug!("Relayed {} to {receivers} subscriber(s)", event.kind())
            }
            Err(e) => warn!("Failed to relay {}: {e}", event.kind()),
        }
    }
}

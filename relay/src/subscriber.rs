use crate::error::Error;
use crate::{accept_remote, RATE_UPDATED_CHANNEL};
use futures::StreamExt;
use log::*;
use serde_json::Value;
use sse::message::{Room, Rooms};
use sse::Broadcaster;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const RATE_UPDATED_EVENT: &str = "rate_updated";

/// Listens on the relay channel and re-broadcasts remote rate updates to the
/// `public` room of this instance.
pub struct RelaySubscriber {
    redis_url: String,
    instance_id: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl RelaySubscriber {
    pub fn new(
        redis_url: impl Into<String>,
        instance_id: impl Into<String>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            redis_url: redis_url.into(),
            instance_id: instance_id.into(),
            max_retries,
            retry_delay,
        }
    }

    /// Runs the subscription until it has failed `max_retries` times in a row.
    /// A dropped subscription is re-established with the same retry budget.
    pub fn spawn(self, broadcaster: Arc<dyn Broadcaster>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(broadcaster.as_ref()).await })
    }

    async fn run(self, broadcaster: &dyn Broadcaster) {
        let mut failures: u32 = 0;
        loop {
            match self.subscribe().await {
                Ok(mut pubsub) => {
                    failures = 0;
                    info!("Relay subscribed to channel {RATE_UPDATED_CHANNEL}");

                    let mut messages = pubsub.on_message();
                    while let Some(message) = messages.next().await {
                        match message.get_payload::<String>() {
                            Ok(payload) => {
                                deliver(&payload, &self.instance_id, broadcaster);
                            }
                            Err(e) => warn!("Ignoring unreadable relay message: {e}"),
                        }
                    }
                    warn!("Relay subscription to {RATE_UPDATED_CHANNEL} ended, reconnecting");
                }
                Err(e) => {
                    failures += 1;
                    if failures > self.max_retries {
                        error!(
                            "Relay gave up after {failures} failed attempt(s): {e}. \
                             Cross-instance delivery is disabled"
                        );
                        return;
                    }
                    warn!(
                        "Relay connection attempt {failures}/{} failed: {e}",
                        self.max_retries
                    );
                }
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn subscribe(&self) -> Result<redis::aio::PubSub, Error> {
        let client = redis::Client::open(self.redis_url.as_str()).map_err(Error::connection)?;
        let mut pubsub = client.get_async_pubsub().await.map_err(Error::connection)?;
        pubsub
            .subscribe(RATE_UPDATED_CHANNEL)
            .await
            .map_err(Error::connection)?;
        Ok(pubsub)
    }
}

/// Hands one channel message to `broadcaster`. Returns whether it was delivered.
pub fn deliver(payload: &str, instance_id: &str, broadcaster: &dyn Broadcaster) -> bool {
    let payload: Value = match serde_json::from_str(payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Ignoring malformed relay payload: {e}");
            return false;
        }
    };

    match accept_remote(payload, instance_id) {
        Some(payload) => {
            broadcaster.broadcast(Rooms::from(Room::public()), RATE_UPDATED_EVENT, &payload);
            true
        }
        None => {
            trace!("Skipping relay message sent by this instance");
            false
        }
    }
}

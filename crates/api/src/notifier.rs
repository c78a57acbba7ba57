//! Alert / no-alert notification dispatch.
//!
//! Delivery failures are logged and dropped here: a message that cannot be
//! sent never aborts a monitoring run.

use std::sync::Arc;

use tracing::{error, info};

use crate::telegram::{BotDestination, MessageTransport};

/// Routes messages to one of two fixed destinations.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MessageTransport>,
    alert: BotDestination,
    no_alert: BotDestination,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("alert", &self.alert)
            .field("no_alert", &self.no_alert)
            .finish()
    }
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        alert: BotDestination,
        no_alert: BotDestination,
    ) -> Self {
        Self {
            transport,
            alert,
            no_alert,
        }
    }

    /// Destination for a message with the given alert flag.
    pub fn destination(&self, alert: bool) -> &BotDestination {
        if alert {
            &self.alert
        } else {
            &self.no_alert
        }
    }

    /// Alert channel.
    pub fn alert_destination(&self) -> &BotDestination {
        &self.alert
    }

    /// No-alert channel.
    pub fn no_alert_destination(&self) -> &BotDestination {
        &self.no_alert
    }

    /// Send `text` to `destination`. Never fails.
    pub async fn send(&self, destination: &BotDestination, text: &str) {
        match self.transport.send_message(destination, text).await {
            Ok(()) => info!(chat_id = %destination.chat_id, "Notification delivered"),
            Err(e) => error!(
                chat_id = %destination.chat_id,
                error = %e,
                "Notification delivery failed"
            ),
        }
    }

    /// Send `text` to the destination selected by `alert`.
    pub async fn route(&self, alert: bool, text: &str) {
        self.send(self.destination(alert), text).await
    }
}

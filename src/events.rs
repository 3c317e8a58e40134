//! Best-effort domain event publication over NATS.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: Uuid, order_number: String, user_id: Uuid, total_amount: Decimal },
    OrderStatusChanged { order_id: Uuid, status: String },
    BookingCreated { booking_id: Uuid, booking_number: String, user_id: Uuid, service_id: Uuid },
    BookingStatusChanged { booking_id: Uuid, status: String },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::OrderPlaced { .. } => "commerce.orders.placed",
            DomainEvent::OrderStatusChanged { .. } => "commerce.orders.status",
            DomainEvent::BookingCreated { .. } => "commerce.bookings.created",
            DomainEvent::BookingStatusChanged { .. } => "commerce.bookings.status",
        }
    }
}

#[derive(Clone)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client: Some(client) }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    /// Publishes the event when a NATS connection is configured. Failures
    /// are logged and never fail the request that raised the event.
    pub async fn publish(&self, event: &DomainEvent) {
        let Some(client) = &self.client else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize domain event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to publish domain event");
        }
    }
}

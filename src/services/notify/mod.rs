pub mod mailer;

use async_trait::async_trait;

use crate::models::Booking;

/// Fire-and-forget messages. Callers log failures and move on; booking
/// state never depends on delivery.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_booking_confirmation(&self, email: &str, booking: &Booking)
        -> anyhow::Result<()>;

    async fn send_welcome(&self, email: &str, name: &str) -> anyhow::Result<()>;
}

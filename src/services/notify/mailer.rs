use anyhow::Context;
use async_trait::async_trait;

use super::NotificationSender;
use crate::models::Booking;

/// Mailgun-style HTTP mail API sender.
pub struct MailgunSender {
    api_key: String,
    domain: String,
    from: String,
    client: reqwest::Client,
}

impl MailgunSender {
    pub fn new(api_key: String, domain: String, from: String) -> Self {
        Self {
            api_key,
            domain,
            from,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.api_key.is_empty() && !self.domain.is_empty(),
            "mail sender not configured"
        );

        let url = format!("https://api.mailgun.net/v3/{}/messages", self.domain);

        self.client
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", to),
                ("subject", subject),
                ("text", body),
            ])
            .send()
            .await
            .context("failed to send mail")?
            .error_for_status()
            .context("mail API returned error")?;

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for MailgunSender {
    async fn send_booking_confirmation(
        &self,
        email: &str,
        booking: &Booking,
    ) -> anyhow::Result<()> {
        let body = format!(
            "Your hotel booking is confirmed.\n\n\
             Booking ID: {}\n\
             Hotel: {}\n\
             Location: {}{}\n\
             Room type: {}\n\
             Days: {} | Rooms: {}\n\
             Total paid: {:.2}\n",
            booking.id,
            booking.hotel_name,
            booking.place,
            if booking.city.is_empty() {
                String::new()
            } else {
                format!(", {}", booking.city)
            },
            booking.room_type_label,
            booking.days,
            booking.rooms,
            booking.total,
        );
        self.send(email, "Booking Confirmed - Tour Guide", &body).await
    }

    async fn send_welcome(&self, email: &str, name: &str) -> anyhow::Result<()> {
        let body = format!(
            "Hi {},\n\nWelcome to Tour Guide! Plan journeys, book hotels and \
             keep your trip photos in one place.\n",
            if name.is_empty() { "traveler" } else { name },
        );
        self.send(email, "Welcome to Tour Guide!", &body).await
    }
}

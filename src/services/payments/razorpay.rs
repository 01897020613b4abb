use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{verify_order_signature, GatewayOrder, PaymentGateway, PaymentSnapshot};

const API_BASE: &str = "https://api.razorpay.com/v1";

pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    status: String,
    amount: i64,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn is_configured(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder> {
        let order: OrderResponse = self
            .client
            .post(format!("{API_BASE}/orders"))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .context("failed to reach payment gateway")?
            .error_for_status()
            .context("payment gateway rejected order")?
            .json()
            .await
            .context("failed to parse order response")?;

        Ok(GatewayOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> anyhow::Result<PaymentSnapshot> {
        let payment: PaymentResponse = self
            .client
            .get(format!("{API_BASE}/payments/{payment_id}"))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .context("failed to reach payment gateway")?
            .error_for_status()
            .context("payment gateway rejected status lookup")?
            .json()
            .await
            .context("failed to parse payment response")?;

        Ok(PaymentSnapshot {
            status: payment.status,
            amount: payment.amount as f64 / 100.0,
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_order_signature(order_id, payment_id, signature, &self.key_secret)
    }
}

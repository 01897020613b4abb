pub mod razorpay;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSnapshot {
    pub status: String,
    pub amount: f64,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    fn key_id(&self) -> &str;

    /// Open an order gateway-side. `amount_minor` is in the currency's
    /// smallest unit and was fixed server-side from the booking total.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder>;

    async fn fetch_payment(&self, payment_id: &str) -> anyhow::Result<PaymentSnapshot>;

    /// Local check of a client-supplied callback; no network call.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 and sends
/// the hex digest. `verify_slice` compares in constant time; a digest the
/// shared secret did not produce can only come from a tampered callback.
pub fn verify_order_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> bool {
    let raw = match hex::decode(signature) {
        Ok(raw) => raw,
        Err(_) => return false,
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&raw).is_ok()
}

#[cfg(test)]
pub fn sign_order(order_id: &str, payment_id: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub hotel_name: String,
    pub hotel_address: String,
    pub place: String,
    pub city: String,
    pub room_type: String,
    pub room_type_label: String,
    pub days: i64,
    pub rooms: i64,
    pub per_day: f64,
    pub total: f64,
    pub payment_status: PaymentStatus,
    pub payment_provider: String,
    pub payment_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        }
    }
}

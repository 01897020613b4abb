use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub user_id: String,
    pub place: String,
    pub arrive: String,
    pub hotel: String,
    pub nights: i64,
    pub price: f64,
    pub travel_mode: String,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

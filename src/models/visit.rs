use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub user_id: String,
    pub place: String,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub created_at: NaiveDateTime,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Photo metadata only; the image itself lives at the URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPhoto {
    pub id: String,
    pub user_id: String,
    pub photo_url: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_uids: Vec<String>,
    pub admin_emails: Vec<String>,
    pub firebase_api_key: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub currency: String,
    pub mail_api_key: String,
    pub mail_domain: String,
    pub mail_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "tourguide.db".to_string()),
            admin_uids: parse_list(&env::var("ADMIN_UIDS").unwrap_or_default(), false),
            admin_emails: parse_list(&env::var("ADMIN_EMAILS").unwrap_or_default(), true),
            firebase_api_key: env::var("FIREBASE_API_KEY").unwrap_or_default(),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_domain: env::var("MAIL_DOMAIN").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Tour Guide <noreply@tourguide.local>".to_string()),
        }
    }
}

fn parse_list(raw: &str, lowercase: bool) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if lowercase {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        })
        .collect()
}

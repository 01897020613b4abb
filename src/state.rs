use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::identity::TokenVerifier;
use crate::services::notify::NotificationSender;
use crate::services::payments::PaymentGateway;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub identity: Box<dyn TokenVerifier>,
    pub gateway: Box<dyn PaymentGateway>,
    pub notifier: Box<dyn NotificationSender>,
}

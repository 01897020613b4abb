use std::collections::HashMap;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::auth::{self, Principal};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Journey};
use crate::state::AppState;

// Bounded fetch windows keep the dashboard read cost predictable; rollups
// for users outside the window are under-enriched rather than fetched.
const BOOKING_WINDOW: i64 = 200;
const JOURNEY_WINDOW: i64 = 200;
const USER_WINDOW: i64 = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewJourney {
    #[serde(flatten)]
    pub journey: Journey,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
    pub bookings: i64,
    pub journeys: i64,
    pub last_booking_status: String,
    pub last_booking_total: f64,
    pub last_paid_at: Option<NaiveDateTime>,
    pub last_journey_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub bookings: Vec<OverviewBooking>,
    pub journeys: Vec<OverviewJourney>,
    pub users: Vec<OverviewUser>,
}

/// Read-only snapshot across the three collections; no transaction, so a
/// write racing the fetches may show up in one list and not another.
pub fn overview(state: &AppState, principal: &Principal) -> Result<Overview, AppError> {
    auth::ensure_admin(principal)?;

    let db = state.db.lock().unwrap();
    Ok(build_overview(&db)?)
}

fn build_overview(conn: &Connection) -> anyhow::Result<Overview> {
    let bookings = queries::get_recent_bookings(conn, BOOKING_WINDOW)?;
    let journeys = queries::get_recent_journeys(conn, JOURNEY_WINDOW)?;
    let users = queries::get_recent_users(conn, USER_WINDOW)?;

    let email_by_user: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.email.as_str()))
        .collect();

    let mut booking_count: HashMap<&str, i64> = HashMap::new();
    let mut journey_count: HashMap<&str, i64> = HashMap::new();
    let mut last_booking: HashMap<&str, &Booking> = HashMap::new();
    let mut last_journey: HashMap<&str, &Journey> = HashMap::new();

    // Lists are newest-first, so the first occurrence per user is the most
    // recent record.
    for booking in &bookings {
        *booking_count.entry(booking.user_id.as_str()).or_default() += 1;
        last_booking.entry(booking.user_id.as_str()).or_insert(booking);
    }
    for journey in &journeys {
        *journey_count.entry(journey.user_id.as_str()).or_default() += 1;
        last_journey.entry(journey.user_id.as_str()).or_insert(journey);
    }

    let users_out = users
        .iter()
        .map(|u| {
            let latest_booking = last_booking.get(u.id.as_str());
            OverviewUser {
                id: u.id.clone(),
                email: u.email.clone(),
                name: u.name.clone(),
                phone: u.phone.clone(),
                created_at: u.created_at,
                bookings: booking_count.get(u.id.as_str()).copied().unwrap_or(0),
                journeys: journey_count.get(u.id.as_str()).copied().unwrap_or(0),
                last_booking_status: latest_booking
                    .map(|b| b.payment_status.as_str().to_string())
                    .unwrap_or_else(|| "none".to_string()),
                last_booking_total: latest_booking.map(|b| b.total).unwrap_or(0.0),
                last_paid_at: latest_booking.and_then(|b| b.paid_at),
                last_journey_at: last_journey.get(u.id.as_str()).map(|j| j.created_at),
            }
        })
        .collect();

    let bookings_out = bookings
        .iter()
        .map(|b| OverviewBooking {
            user_email: email_by_user
                .get(b.user_id.as_str())
                .map(|e| e.to_string())
                .unwrap_or_default(),
            booking: b.clone(),
        })
        .collect();

    let journeys_out = journeys
        .iter()
        .map(|j| OverviewJourney {
            user_email: email_by_user
                .get(j.user_id.as_str())
                .map(|e| e.to_string())
                .unwrap_or_default(),
            journey: j.clone(),
        })
        .collect();

    Ok(Overview {
        bookings: bookings_out,
        journeys: journeys_out,
        users: users_out,
    })
}

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, Journey, PaymentStatus, TripPhoto, User, Visit};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, email, name, phone, created_at, updated_at FROM users WHERE id = ?1",
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, name, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
           email = excluded.email,
           name = excluded.name,
           phone = excluded.phone,
           updated_at = excluded.updated_at",
        params![
            user.id,
            user.email,
            user.name,
            user.phone,
            fmt_ts(&user.created_at),
            fmt_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_recent_users(conn: &Connection, limit: i64) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, name, phone, created_at, updated_at
         FROM users ORDER BY created_at DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_user_row(row)))?;

    let mut users = vec![];
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, user_id, hotel_name, hotel_address, place, city, room_type, \
     room_type_label, days, rooms, per_day, total, payment_status, payment_provider, \
     payment_order_id, payment_id, paid_at, created_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            booking.id,
            booking.user_id,
            booking.hotel_name,
            booking.hotel_address,
            booking.place,
            booking.city,
            booking.room_type,
            booking.room_type_label,
            booking.days,
            booking.rooms,
            booking.per_day,
            booking.total,
            booking.payment_status.as_str(),
            booking.payment_provider,
            booking.payment_order_id,
            booking.payment_id,
            booking.paid_at.as_ref().map(fmt_ts),
            fmt_ts(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_recent_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"
    ))?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Transition a booking to paid. The WHERE guard makes the pending→paid
/// transition atomic and keeps a paid booking paid no matter how often the
/// caller retries; returns whether this call performed the transition.
pub fn mark_booking_paid(
    conn: &Connection,
    id: &str,
    provider: &str,
    payment_id: Option<&str>,
    order_id: Option<&str>,
) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings
         SET payment_status = 'paid', payment_provider = ?1, payment_id = ?2,
             payment_order_id = ?3, paid_at = ?4
         WHERE id = ?5 AND payment_status != 'paid'",
        params![provider, payment_id, order_id, now, id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(12)?;
    let paid_at_str: Option<String> = row.get(16)?;
    let created_at_str: String = row.get(17)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        hotel_name: row.get(2)?,
        hotel_address: row.get(3)?,
        place: row.get(4)?,
        city: row.get(5)?,
        room_type: row.get(6)?,
        room_type_label: row.get(7)?,
        days: row.get(8)?,
        rooms: row.get(9)?,
        per_day: row.get(10)?,
        total: row.get(11)?,
        payment_status: PaymentStatus::parse(&status_str),
        payment_provider: row.get(13)?,
        payment_order_id: row.get(14)?,
        payment_id: row.get(15)?,
        paid_at: paid_at_str.as_deref().map(parse_ts),
        created_at: parse_ts(&created_at_str),
    })
}

// ── Journeys ──

pub fn create_journey(conn: &Connection, journey: &Journey) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO journeys (id, user_id, place, arrive, hotel, nights, price, travel_mode, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            journey.id,
            journey.user_id,
            journey.place,
            journey.arrive,
            journey.hotel,
            journey.nights,
            journey.price,
            journey.travel_mode,
            journey.notes,
            fmt_ts(&journey.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_journey(conn: &Connection, id: &str) -> anyhow::Result<Option<Journey>> {
    let result = conn.query_row(
        "SELECT id, user_id, place, arrive, hotel, nights, price, travel_mode, notes, created_at
         FROM journeys WHERE id = ?1",
        params![id],
        |row| Ok(parse_journey_row(row)),
    );

    match result {
        Ok(journey) => Ok(Some(journey?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_journeys_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Journey>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, place, arrive, hotel, nights, price, travel_mode, notes, created_at
         FROM journeys WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_journey_row(row)))?;

    let mut journeys = vec![];
    for row in rows {
        journeys.push(row??);
    }
    Ok(journeys)
}

pub fn get_recent_journeys(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Journey>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, place, arrive, hotel, nights, price, travel_mode, notes, created_at
         FROM journeys ORDER BY created_at DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_journey_row(row)))?;

    let mut journeys = vec![];
    for row in rows {
        journeys.push(row??);
    }
    Ok(journeys)
}

pub fn delete_journey(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM journeys WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_journey_row(row: &rusqlite::Row) -> anyhow::Result<Journey> {
    let created_at_str: String = row.get(9)?;

    Ok(Journey {
        id: row.get(0)?,
        user_id: row.get(1)?,
        place: row.get(2)?,
        arrive: row.get(3)?,
        hotel: row.get(4)?,
        nights: row.get(5)?,
        price: row.get(6)?,
        travel_mode: row.get(7)?,
        notes: row.get(8)?,
        created_at: parse_ts(&created_at_str),
    })
}

// ── Trip Photos ──

pub fn create_photo(conn: &Connection, photo: &TripPhoto) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO trip_photos (id, user_id, photo_url, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            photo.id,
            photo.user_id,
            photo.photo_url,
            photo.description,
            fmt_ts(&photo.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_photo(conn: &Connection, id: &str) -> anyhow::Result<Option<TripPhoto>> {
    let result = conn.query_row(
        "SELECT id, user_id, photo_url, description, created_at FROM trip_photos WHERE id = ?1",
        params![id],
        |row| Ok(parse_photo_row(row)),
    );

    match result {
        Ok(photo) => Ok(Some(photo?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_photos_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<TripPhoto>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, photo_url, description, created_at
         FROM trip_photos WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_photo_row(row)))?;

    let mut photos = vec![];
    for row in rows {
        photos.push(row??);
    }
    Ok(photos)
}

pub fn delete_photo(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM trip_photos WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_photo_row(row: &rusqlite::Row) -> anyhow::Result<TripPhoto> {
    let created_at_str: String = row.get(4)?;

    Ok(TripPhoto {
        id: row.get(0)?,
        user_id: row.get(1)?,
        photo_url: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_ts(&created_at_str),
    })
}

// ── Visits ──

pub fn create_visit(conn: &Connection, visit: &Visit) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO visits (id, user_id, place, start, duration_minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            visit.id,
            visit.user_id,
            visit.place,
            fmt_ts(&visit.start),
            visit.duration_minutes,
            fmt_ts(&visit.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_visits_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Visit>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, place, start, duration_minutes, created_at
         FROM visits WHERE user_id = ?1 ORDER BY start ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        let start_str: String = row.get(3)?;
        let created_at_str: String = row.get(5)?;
        Ok(Visit {
            id: row.get(0)?,
            user_id: row.get(1)?,
            place: row.get(2)?,
            start: parse_ts(&start_str),
            duration_minutes: row.get(4)?,
            created_at: parse_ts(&created_at_str),
        })
    })?;

    let mut visits = vec![];
    for row in rows {
        visits.push(row?);
    }
    Ok(visits)
}

pub mod admin;
pub mod bookings;
pub mod health;
pub mod journeys;
pub mod payments;
pub mod photos;
pub mod users;
pub mod visits;

pub mod booking_flow;
pub mod identity;
pub mod notify;
pub mod overview;
pub mod payments;

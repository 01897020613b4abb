pub mod booking;
pub mod journey;
pub mod photo;
pub mod user;
pub mod visit;

pub use booking::{Booking, PaymentStatus};
pub use journey::Journey;
pub use photo::TripPhoto;
pub use user::User;
pub use visit::Visit;

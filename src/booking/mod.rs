pub mod desk;
pub mod request;

pub use desk::{BookingDesk, BookingReceipt};
pub use request::{BookingRequest, load_bookings_csv, read_bookings};

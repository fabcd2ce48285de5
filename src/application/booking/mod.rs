mod booking_service;
mod errors;
mod queries;

pub use booking_service::{
    BookingDetail, ItemLockRegistry, ServiceDependencies, decide_booking, get_booking,
    request_booking,
};
pub use errors::{BookingApplicationError, Result};
pub use queries::{
    ActorRole, adjacent_bookings, has_completed_booking, item_booking_activity, list_bookings,
};

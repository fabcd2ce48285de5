pub mod booking_store;
pub mod clock;
pub mod item_catalog;
pub mod user_directory;

pub use booking_store::*;
pub use clock::{Clock, SystemClock};
pub use item_catalog::{ItemCatalog, ItemRecord};
pub use user_directory::{UserDirectory, UserSummary};

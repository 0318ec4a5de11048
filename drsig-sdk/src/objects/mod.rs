pub mod category;
pub mod events;
pub mod query;

pub use category::Category;
pub use events::{EventData, EventEntry, EventListing, SeriesPoint};
pub use query::ListEventsQuery;

//! Domain types: raw descriptors, decoded records and their payloads.

pub mod descriptor;
pub mod record;
pub mod series;

pub use descriptor::RawDescriptor;
pub use drsig_sdk::objects::Category;
pub use record::{EventRecord, InvalidWindow, Payload, Timeframe};
pub use series::TimeSeries;

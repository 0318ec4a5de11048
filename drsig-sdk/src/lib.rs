//! Shared types for the DR signal server and its consumers.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod timestamp;

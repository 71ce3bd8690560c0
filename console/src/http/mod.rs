//! Webhook HTTP access

pub mod client;
pub mod transport;

//! Local persistence

pub mod kv;
pub mod layout;
pub mod settings;
pub mod webhooks;

//! Flux Action Library
//!
//! Webhook configuration store and workflow query/mutation layer behind
//! the `flux-action` console.

pub mod app;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
pub mod workflows;

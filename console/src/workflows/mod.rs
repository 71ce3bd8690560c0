//! Workflow query and mutation layer

pub mod artifact;
pub mod fsm;
pub mod normalize;
pub mod service;
pub mod view;

//! Core recipe logic — description store, command menu, interpretation, execution.

pub mod chef;
pub mod config;
pub mod error;
pub mod executor;
pub mod menu;
pub mod state;
pub mod types;
pub mod validate;

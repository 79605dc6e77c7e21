//! Pierogi chef — deferred-execution recipe pipelines.
//!
//! Recipe text is read into a dish description (ingredients, file links,
//! seasonings, and stages addressed by opaque identifiers), which a kitchen
//! then cooks stage by stage into a final artifact.

pub mod cli;
pub mod core;
pub mod kitchen;

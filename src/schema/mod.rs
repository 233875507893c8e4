//! Schema module - Record and configuration types for trajectory animation.

mod config;
mod record;

pub use config::*;
pub use record::*;

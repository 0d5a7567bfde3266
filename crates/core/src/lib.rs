//! Core data types for the buy alert bot.

pub mod config;
pub mod market;
pub mod message;
pub mod schedule;

pub use config::*;
pub use market::*;
pub use message::*;
pub use schedule::*;

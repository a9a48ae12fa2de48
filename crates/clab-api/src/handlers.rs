//! Request handlers.

pub mod credits;
pub mod generate;
pub mod health;

pub use credits::*;
pub use health::*;

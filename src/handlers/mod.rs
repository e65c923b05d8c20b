//! HTTP handlers for the table gateway.

pub mod entity;
pub use entity::*;

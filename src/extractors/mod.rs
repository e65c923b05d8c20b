//! Request extractors.

pub mod forwarded;
pub use forwarded::{ForwardedHeaders, FORWARDED_HEADERS};

//! Fetch messages from a broker.
//!
//! A fetch that finds fewer than `min_bytes` available is held by the
//! broker for up to `max_wait_ms` before it is answered.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 4;

//! Grow the partition count of existing topics.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 0;
